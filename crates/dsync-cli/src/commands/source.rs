//! Sync source CLI commands.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use dialoguer::Confirm;
use std::collections::BTreeMap;
use std::path::Path;

use dsync_core::sync::{SourceConfig, SyncSource};

use crate::context;
use crate::output;

#[derive(Subcommand)]
pub enum SourceCommands {
    /// Add a Figma file as a token source
    AddFigma {
        /// Display name
        name: String,
        /// Figma file key
        #[arg(long)]
        file_key: String,
        /// Personal access token
        #[arg(long, env = "FIGMA_TOKEN", hide_env_values = true)]
        token: String,
        /// Restrict extraction to these node ids (repeatable)
        #[arg(long = "node")]
        nodes: Vec<String>,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },

    /// Add a JSON token file in a GitHub repository
    AddGithub {
        /// Display name
        name: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        repo: String,
        #[arg(long, default_value = "main")]
        branch: String,
        /// Path of the token file inside the repository
        #[arg(long)]
        path: String,
        /// Token for private repositories
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },

    /// Add a URL serving token JSON
    AddUrl {
        /// Display name
        name: String,
        url: String,
        /// Extra request header as NAME=VALUE (repeatable)
        #[arg(long = "header")]
        headers: Vec<String>,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },

    /// List sources
    List,

    /// Remove a source and cancel its auto-sync
    Remove {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Enable a source
    Enable { id: String },

    /// Disable a source
    Disable { id: String },
}

#[derive(Args)]
pub struct ScheduleArgs {
    /// Sync automatically every N minutes
    #[arg(long, value_name = "MINUTES")]
    pub every: Option<u64>,

    /// Explicit source id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,
}

pub async fn execute(cmd: SourceCommands, project_dir: &Path) -> Result<()> {
    match cmd {
        SourceCommands::AddFigma {
            name,
            file_key,
            token,
            nodes,
            schedule,
        } => {
            let config = SourceConfig::Figma {
                file_key,
                access_token: token,
                node_ids: nodes,
            };
            cmd_add(project_dir, name, config, schedule).await
        }
        SourceCommands::AddGithub {
            name,
            owner,
            repo,
            branch,
            path,
            token,
            schedule,
        } => {
            let config = SourceConfig::Github {
                owner,
                repo,
                branch,
                path,
                token,
            };
            cmd_add(project_dir, name, config, schedule).await
        }
        SourceCommands::AddUrl {
            name,
            url,
            headers,
            schedule,
        } => {
            let headers = parse_headers(&headers)?;
            cmd_add(project_dir, name, SourceConfig::Url { url, headers }, schedule).await
        }
        SourceCommands::List => {
            let sync = context::open(project_dir).await?;
            output::print_sources_table(&sync.list_sources().await);
            Ok(())
        }
        SourceCommands::Remove { id, yes } => {
            let sync = context::open(project_dir).await?;
            let source = sync
                .source(&id)
                .await
                .ok_or_else(|| anyhow::anyhow!("Source not found: {}", id))?;
            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Remove source '{}' ({})?", source.name, source.config.summary()))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("{}", "Cancelled.".dimmed());
                    return Ok(());
                }
            }
            sync.remove_source(&id).await?;
            println!("{} Removed source {}", "✓".green().bold(), source.name.cyan());
            Ok(())
        }
        SourceCommands::Enable { id } => {
            let sync = context::open(project_dir).await?;
            sync.set_source_enabled(&id, true).await?;
            println!("{} Enabled {}", "✓".green().bold(), id);
            Ok(())
        }
        SourceCommands::Disable { id } => {
            let sync = context::open(project_dir).await?;
            sync.set_source_enabled(&id, false).await?;
            println!("{} Disabled {}", "✓".green().bold(), id);
            Ok(())
        }
    }
}

async fn cmd_add(project_dir: &Path, name: String, config: SourceConfig, schedule: ScheduleArgs) -> Result<()> {
    let sync = context::open(project_dir).await?;
    let mut source = SyncSource::new(schedule.id.unwrap_or_default(), name, config);
    if let Some(minutes) = schedule.every {
        if minutes == 0 {
            bail!("--every must be at least 1 minute");
        }
        source.auto_sync = true;
        source.sync_interval = Some(minutes);
    }

    let source = sync.add_source(source).await?;
    println!(
        "{} Added {} source {} ({})",
        "✓".green().bold(),
        source.config.type_name(),
        source.name.cyan(),
        source.id.dimmed()
    );
    if let Some(minutes) = source.sync_interval {
        println!("  {} Auto-sync every {} min while 'dsync sync watch' runs", "→".dimmed(), minutes);
    }
    Ok(())
}

fn parse_headers(raw: &[String]) -> Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|h| match h.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.trim().to_string())),
            _ => bail!("Invalid header '{}', expected NAME=VALUE", h),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(&["Authorization=Bearer abc".to_string(), "X-Env = prod".to_string()]).unwrap();
        assert_eq!(headers["Authorization"], "Bearer abc");
        assert_eq!(headers["X-Env"], "prod");
        assert!(parse_headers(&["broken".to_string()]).is_err());
        assert!(parse_headers(&["=value".to_string()]).is_err());
    }
}
