//! Command execution

use anyhow::Context;
use colored::Colorize;
use tracing::info;

use crate::app::options::AppOptions;
use crate::app::state::AppState;
use crate::cli::args::{Command, CreateArgs, DeployCommand, ListArgs, RollbackArgs};
use crate::cli::output::{
    confirm, quoted_cyan, quoted_yellow, render_revisions, NO_DEPLOYS_MESSAGE, ROLLBACK_WARNING,
};
use crate::deploy::archive;
use crate::deploy::coordinator::{self, DeployOptions};
use crate::deploy::ignore_patterns::{load_ignore_patterns, IGNORE_FILE_NAME};
use crate::deploy::revisions::{self, RevisionListing};
use crate::deploy::source::Source;
use crate::logs::init_logging;
use crate::models::deploy::{DeployInfo, Revision};
use crate::utils::version_info;

/// Run one command to completion
pub async fn run(options: AppOptions, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Version => {
            println!("{}", serde_json::to_string_pretty(&version_info())?);
            Ok(())
        }
        Command::Deploy(args) => {
            let state = AppState::load(&options)
                .await
                .context("error reading config file")?;

            if let Err(e) = init_logging(options.log_options(state.settings().log_level)) {
                eprintln!("Failed to initialize logging: {e}");
            }

            match args.command {
                DeployCommand::Create(args) => deploy_create(&state, args).await,
                DeployCommand::List(args) => deploy_list(&state, args).await,
                DeployCommand::Rollback(args) => deploy_rollback(&state, args).await,
            }
        }
    }
}

async fn deploy_create(state: &AppState, args: CreateArgs) -> anyhow::Result<()> {
    let connection = state.connect().context("Error connecting to server")?;

    println!(
        "Deploying app {} to the cluster {}...",
        quoted_cyan(&args.app),
        quoted_yellow(&connection.cluster)
    );
    if !args.no_input && !confirm()? {
        return Ok(());
    }

    let source = Source::acquire(&args.source)
        .await
        .with_context(|| format!("Error accessing {}", args.source))?;

    let patterns = load_ignore_patterns(source.dir())
        .await
        .with_context(|| format!("Error accessing {} file", IGNORE_FILE_NAME))?;

    println!("Generating tarball of: {}", args.source);
    let tarball = archive::create_temp(source.dir(), &args.app, &patterns)
        .await
        .context("Error generating tarball")?;

    println!("Sending app tarball...");
    let info = DeployInfo {
        app: args.app,
        description: args.description,
    };
    let outcome = coordinator::deploy(
        &connection.streams,
        info,
        &tarball,
        tokio::io::stdout(),
        &DeployOptions::default(),
    )
    .await?;

    info!(
        "Deploy stream done: {} bytes, {} messages",
        outcome.bytes_sent, outcome.messages_received
    );
    Ok(())
}

async fn deploy_list(state: &AppState, args: ListArgs) -> anyhow::Result<()> {
    let connection = state.connect().context("Error connecting to server")?;

    match revisions::list_revisions(&connection.registry, &args.app).await? {
        RevisionListing::Empty => println!("{}", NO_DEPLOYS_MESSAGE),
        RevisionListing::Rows(rows) => print!("{}", render_revisions(&rows)),
    }
    Ok(())
}

async fn deploy_rollback(state: &AppState, args: RollbackArgs) -> anyhow::Result<()> {
    let connection = state.connect().context("Error connecting to server")?;

    println!(
        "Rolling back app {} to revision {} on cluster {}...",
        quoted_cyan(&args.app),
        quoted_cyan(&args.revision),
        quoted_yellow(&connection.cluster)
    );
    println!("{}", ROLLBACK_WARNING.yellow());
    if !args.no_input && !confirm()? {
        return Ok(());
    }

    let revision = Revision::new(args.revision);
    revisions::rollback(&connection.registry, &args.app, &revision).await?;

    println!("rollback done");
    Ok(())
}
