//! # sheetlink-cli
//!
//! Command-line tools for sheet snapshots saved as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use sheetlink_sheet::{ChangeSet, Formatting, RowStatus, SheetModel};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// sheetlink - inspect and reconcile sheet snapshots
#[derive(Parser)]
#[command(name = "sheetlink")]
#[command(author, version, about = "Inspect and reconcile sheet snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print identity, head and rows of a snapshot
    Show {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Fail if required headers are missing from a snapshot
    CheckHead {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Header that must be present (repeatable)
        #[arg(short, long = "require", value_name = "HEADER", required = true)]
        require: Vec<String>,
    },
    /// Print the pending changes of a snapshot
    Changes {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Merge a fresh remote snapshot into a local one
    Merge {
        #[arg(value_name = "LOCAL")]
        local: PathBuf,

        #[arg(value_name = "REMOTE")]
        remote: PathBuf,

        /// Write the merged snapshot here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Command::Show { file } => {
            let sheet = load(&file)?;
            print!("{}", render_sheet(&sheet));
        }
        Command::CheckHead { file, require } => {
            let sheet = load(&file)?;
            sheet
                .check_head(&require)
                .with_context(|| format!("Head check failed for {}", file.display()))?;
            println!("{} all {} headers present", "OK".green().bold(), require.len());
        }
        Command::Changes { file } => {
            let sheet = load(&file)?;
            print!("{}", render_changes(&sheet, &ChangeSet::from_sheet(&sheet)));
        }
        Command::Merge {
            local,
            remote,
            output,
            pretty,
        } => {
            let mut sheet = load(&local)?;
            let snapshot = load(&remote)?;
            sheet.merge(&snapshot).with_context(|| {
                format!("Cannot merge {} into {}", remote.display(), local.display())
            })?;

            let formatting = if pretty {
                Formatting::Indented
            } else {
                Formatting::Compact
            };
            match output {
                Some(path) => {
                    sheet
                        .save_as_json(&path, formatting)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(
                        path = %path.display(),
                        rows = sheet.row_count(),
                        "merged snapshot written"
                    );
                }
                None => println!("{}", sheet.to_json_string(formatting)?),
            }
        }
    }
    Ok(())
}

fn load(path: &Path) -> Result<SheetModel> {
    SheetModel::from_json(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn status_label(status: RowStatus) -> ColoredString {
    match status {
        RowStatus::Original => status.as_str().normal(),
        RowStatus::ToChange => status.as_str().yellow(),
        RowStatus::ToAppend => status.as_str().green(),
        RowStatus::ToDelete => status.as_str().red(),
    }
}

/// Identity block followed by one line per row.
fn render_sheet(sheet: &SheetModel) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", "Sheet:".cyan().bold(), sheet.title()));
    out.push_str(&format!(
        "{} {} ({})\n",
        "Spreadsheet:".cyan().bold(),
        sheet.spreadsheet_title(),
        sheet.spreadsheet_id()
    ));
    if let Some(gid) = sheet.gid() {
        out.push_str(&format!("{} {gid}\n", "Gid:".cyan().bold()));
    }
    out.push_str(&format!("{} {:?}\n", "Mode:".cyan().bold(), sheet.mode()));
    if let Some(key) = sheet.key_name() {
        out.push_str(&format!("{} {key}\n", "Key:".cyan().bold()));
    }
    if !sheet.head().is_empty() {
        let head = sheet.head().join(" | ");
        out.push_str(&format!("{} {head}\n", "Head:".cyan().bold()));
    }

    if sheet.is_empty() {
        out.push_str("(no rows)\n");
        return out;
    }
    for row in sheet.rows() {
        out.push_str(&format!(
            "{:>5}  {:<8}  {}\n",
            row.number(),
            status_label(row.status()),
            row.values().join(" | ")
        ));
    }
    out
}

fn render_changes(sheet: &SheetModel, changes: &ChangeSet) -> String {
    let mut out = String::new();
    if changes.is_empty() {
        out.push_str(&format!("No pending changes for {}\n", sheet.title()));
        return out;
    }

    for values in &changes.appends {
        out.push_str(&format!("{} {}\n", "append".green(), values.join(" | ")));
    }
    for update in &changes.updates {
        out.push_str(&format!(
            "{} {} ({} rows)\n",
            "update".yellow(),
            update.range,
            update.values.len()
        ));
    }
    for span in &changes.deletions {
        out.push_str(&format!(
            "{} rows {}..={}\n",
            "delete".red(),
            span.start + 1,
            span.end
        ));
    }
    out.push_str(&format!("{} rows touched\n", changes.row_count()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetlink_sheet::SheetIdentity;

    fn sheet() -> SheetModel {
        colored::control::set_override(false);
        SheetModel::with_head_and_key(
            SheetIdentity::new("1abc", "People")
                .with_gid(3)
                .with_spreadsheet_title("Staff"),
            "Id",
            vec![vec!["Id", "Name"], vec!["1", "Ann"], vec!["2", "Bob"]],
        )
        .unwrap()
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let args = ["sheetlink", "-v", "check-head", "a.json", "-r", "Id", "-r", "Name"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::CheckHead { ref require, .. } if require.len() == 2
        ));

        let args = ["sheetlink", "merge", "l.json", "r.json", "-o", "m.json", "--pretty"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Command::Merge { pretty: true, output: Some(_), .. }));

        assert!(Cli::try_parse_from(["sheetlink", "check-head", "a.json"]).is_err());
    }

    #[test]
    fn test_render_sheet() {
        let mut sheet = sheet();
        let id = sheet.rows()[1].id();
        sheet.delete_row(id).unwrap();

        let out = render_sheet(&sheet);

        assert!(out.contains("Sheet: People"));
        assert!(out.contains("Spreadsheet: Staff (1abc)"));
        assert!(out.contains("Gid: 3"));
        assert!(out.contains("Key: Id"));
        assert!(out.contains("Head: Id | Name"));
        assert!(out.contains("ToDelete"));
        assert!(out.contains("2 | Bob"));
    }

    #[test]
    fn test_render_changes() {
        let mut sheet = sheet();
        let out = render_changes(&sheet, &ChangeSet::from_sheet(&sheet));
        assert!(out.contains("No pending changes"));

        let id = sheet.rows()[0].id();
        sheet.set_value(id, 1, "Anna").unwrap();
        sheet.add_row(vec!["3", "Cid"]);
        let out = render_changes(&sheet, &ChangeSet::from_sheet(&sheet));

        assert!(out.contains("append 3 | Cid"));
        assert!(out.contains("update People!A2 (1 rows)"));
        assert!(out.contains("2 rows touched"));
    }
}
