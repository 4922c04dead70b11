//! Token and version CLI commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use dsync_core::design::CleanupLevel;
use dsync_core::tokens::contrast::check_contrast;
use dsync_core::tokens::TokenSet;

use super::{read_input, read_json, write_output};
use crate::context;
use crate::output;

#[derive(Subcommand)]
pub enum TokenCommands {
    /// List every token of the current version
    List,

    /// Show one token
    Get {
        /// Dotted token path, e.g. color.brand.primary
        path: String,
    },

    /// Set a token, creating a new version
    Set {
        /// Dotted token path
        path: String,
        /// Value; parsed as JSON when possible, otherwise taken as a string
        value: String,
    },

    /// Print the CSS custom properties for the current version
    Css,

    /// Export the current version as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Install an exported version as the new current version
    Import {
        /// Version JSON file
        file: PathBuf,
    },

    /// List versions, newest first
    Versions {
        /// Show the changelog of this version
        #[arg(long)]
        changelog: Option<String>,
    },

    /// Point the current version at an earlier one
    Rollback {
        /// Version id, e.g. 1.2.0
        version: String,
    },

    /// Check the WCAG contrast ratio of two hex colors
    Contrast {
        /// Foreground (text) color
        fg: String,
        /// Background color
        bg: String,
        /// Minimum ratio
        #[arg(long, default_value_t = dsync_core::tokens::WCAG_AA_NORMAL)]
        threshold: f64,
    },

    /// Preview the diff of a token file against the current version
    Diff {
        /// Token JSON file
        file: PathBuf,
    },

    /// Prune old versions, keeping the current one
    Cleanup {
        /// Keep only the three most recent versions
        #[arg(long)]
        aggressive: bool,
    },
}

pub async fn execute(cmd: TokenCommands, project_dir: &Path) -> Result<()> {
    match cmd {
        TokenCommands::Contrast { fg, bg, threshold } => cmd_contrast(&fg, &bg, threshold),
        TokenCommands::List => {
            let sync = context::open(project_dir).await?;
            let tokens = sync.tokens().current_tokens().await.unwrap_or_default();
            output::print_tokens_table(&tokens.flatten());
            Ok(())
        }
        TokenCommands::Get { path } => {
            let sync = context::open(project_dir).await?;
            let token = sync
                .tokens()
                .get_token(&path)
                .await
                .ok_or_else(|| anyhow::anyhow!("Token not found: {}", path))?;
            println!("{}", serde_json::to_string_pretty(&token)?);
            Ok(())
        }
        TokenCommands::Set { path, value } => {
            let sync = context::open(project_dir).await?;
            let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            match sync.tokens().set_token(&path, value).await? {
                Some(outcome) => println!(
                    "{} Set {} (version {}, impact {})",
                    "✓".green().bold(),
                    path.cyan(),
                    outcome.version.version.bold(),
                    output::impact_colored(outcome.diff.impact)
                ),
                None => println!("{} {} unchanged", "→".dimmed(), path),
            }
            Ok(())
        }
        TokenCommands::Css => {
            let sync = context::open(project_dir).await?;
            let css = sync
                .tokens()
                .css()
                .await
                .ok_or_else(|| anyhow::anyhow!("No active token set"))?;
            print!("{}", css);
            Ok(())
        }
        TokenCommands::Export { out } => {
            let sync = context::open(project_dir).await?;
            let json = sync.tokens().export().await?;
            if let Some(path) = write_output(project_dir, out.as_deref(), &json)? {
                println!("{} Exported to {}", "✓".green().bold(), path.display());
            }
            Ok(())
        }
        TokenCommands::Import { file } => {
            let sync = context::open(project_dir).await?;
            let raw = read_input(project_dir, &file)?;
            let version = sync.tokens().import(&raw).await?;
            println!("{} Imported version {}", "✓".green().bold(), version.version.bold());
            Ok(())
        }
        TokenCommands::Versions { changelog } => {
            let sync = context::open(project_dir).await?;
            match changelog {
                Some(id) => {
                    let version = sync
                        .tokens()
                        .version(&id)
                        .await
                        .ok_or_else(|| anyhow::anyhow!("Version not found: {}", id))?;
                    output::print_changelog(&version);
                }
                None => {
                    let versions = sync.tokens().list_versions().await;
                    let current = sync.tokens().current_version_id().await;
                    output::print_versions_table(&versions, current.as_deref());
                }
            }
            Ok(())
        }
        TokenCommands::Rollback { version } => {
            let sync = context::open(project_dir).await?;
            sync.tokens().rollback(&version).await?;
            println!("{} Current version is now {}", "✓".green().bold(), version.bold());
            Ok(())
        }
        TokenCommands::Diff { file } => {
            let sync = context::open(project_dir).await?;
            let incoming: TokenSet = read_json(project_dir, &file)?;
            let current = sync.tokens().current_tokens().await;
            let diff = dsync_core::diff::diff(current.as_ref(), &incoming);
            output::print_diff(&diff);
            Ok(())
        }
        TokenCommands::Cleanup { aggressive } => {
            let sync = context::open(project_dir).await?;
            let level = if aggressive { CleanupLevel::Aggressive } else { CleanupLevel::Standard };
            let removed = sync.tokens().cleanup(level).await?;
            println!("{} Removed {} old version(s)", "✓".green().bold(), removed);
            Ok(())
        }
    }
}

fn cmd_contrast(fg: &str, bg: &str, threshold: f64) -> Result<()> {
    let check = check_contrast(fg, bg, threshold).context("Cannot compute contrast")?;
    let verdict = if check.valid { "pass".green().bold() } else { "fail".red().bold() };
    println!("{}:1 {} (minimum {}:1)", check.ratio, verdict, threshold);
    Ok(())
}
