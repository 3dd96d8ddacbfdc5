//! Command line definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::options::AppOptions;

#[derive(Debug, Parser)]
#[command(name = "deployctl", version)]
#[command(about = "Deploy applications and manage their revisions", long_about = None)]
pub struct Cli {
    /// Settings file (default: ~/.deployctl/config.json)
    #[arg(long, global = true, env = "DEPLOYCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cluster to use instead of the configured current cluster
    #[arg(long, global = true, env = "DEPLOYCTL_CLUSTER")]
    pub cluster: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn app_options(&self) -> AppOptions {
        AppOptions {
            config_path: self.config.clone(),
            cluster: self.cluster.clone(),
            verbosity: self.verbose,
            json_logs: self.log_json,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Everything about deploys
    Deploy(DeployArgs),

    /// Print version information
    Version,
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    #[command(subcommand)]
    pub command: DeployCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeployCommand {
    /// Deploy an app
    ///
    /// The source is a directory, a gzip tarball or an http(s) URL of a
    /// tarball, e.g.:
    ///
    ///   deployctl deploy create . --app webapi --description "release 1.2"
    Create(CreateArgs),

    /// List app deploys, newest first
    List(ListArgs),

    /// Roll an app back to a given revision
    Rollback(RollbackArgs),
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// App folder, tarball or URL
    pub source: String,

    /// App name
    #[arg(long)]
    pub app: String,

    /// Deploy description, helps picking a revision on rollback
    #[arg(long, default_value = "")]
    pub description: String,

    /// Deploy without asking for confirmation
    #[arg(long)]
    pub no_input: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// App name
    #[arg(long)]
    pub app: String,
}

#[derive(Debug, Args)]
pub struct RollbackArgs {
    /// App name
    pub app: String,

    /// Revision to roll back to
    #[arg(long)]
    pub revision: String,

    /// Roll back without asking for confirmation
    #[arg(long)]
    pub no_input: bool,
}
