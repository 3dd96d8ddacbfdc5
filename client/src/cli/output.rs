//! Operator-facing output: prompts, tables and error rendering

use std::io::{BufRead, IsTerminal, Write};

use colored::Colorize;
use dialoguer::Input;

use crate::deploy::revisions::RevisionRow;

const CONFIRM_PROMPT: &str = "Are you sure? (yes/NO)";

pub const NO_DEPLOYS_MESSAGE: &str = "App doesn't have any deploys";

pub const ROLLBACK_WARNING: &str = "
WARNING: rollback only restores the app's build. Configuration, secrets and
         ingress settings stay as they are; a new deploy might be a better option.
";

/// Ask "Are you sure?" and report whether the answer starts with "yes".
///
/// On a terminal the prompt is interactive (dialoguer draws on stderr); otherwise one line is read
/// from stdin so answers can be piped in.
pub fn confirm() -> Result<bool, dialoguer::Error> {
    if std::io::stdin().is_terminal() && std::io::stderr().is_terminal() {
        let answer: String = Input::new()
            .with_prompt(CONFIRM_PROMPT)
            .allow_empty(true)
            .interact_text()?;
        return Ok(is_yes(&answer));
    }

    print!("{}? ", CONFIRM_PROMPT);
    std::io::stdout().flush()?;
    read_answer(std::io::stdin().lock()).map_err(Into::into)
}

/// Read one answer line from `reader`; end of input counts as "no"
pub fn read_answer<R: BufRead>(mut reader: R) -> std::io::Result<bool> {
    let mut answer = String::new();
    reader.read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

pub fn is_yes(answer: &str) -> bool {
    answer.trim_start().to_lowercase().starts_with("yes")
}

/// `"name"` in the given color, the way targets are shown in command banners
pub fn quoted_cyan(value: &str) -> String {
    format!("\"{}\"", value).cyan().to_string()
}

pub fn quoted_yellow(value: &str) -> String {
    format!("\"{}\"", value).yellow().to_string()
}

/// Render revisions as a left-aligned table with a rule between rows
pub fn render_revisions(rows: &[RevisionRow]) -> String {
    let header = ["REVISION", "CREATED AT", "DESCRIPTION"];
    let cells: Vec<[&str; 3]> = rows
        .iter()
        .map(|r| [r.label.as_str(), r.created_at.as_str(), r.description.as_str()])
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = {
        let parts: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("+{}+\n", parts.join("+"))
    };
    let line = |row: &[&str; 3]| {
        let parts: Vec<String> = row
            .iter()
            .zip(widths.iter())
            .map(|(cell, w)| format!(" {:<width$} ", cell, width = *w))
            .collect();
        format!("|{}|\n", parts.join("|"))
    };

    let mut out = rule.clone();
    out.push_str(&line(&header));
    out.push_str(&rule);
    for row in &cells {
        out.push_str(&line(row));
        out.push_str(&rule);
    }
    out
}

/// Print an error the way every command failure is reported
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);
}
