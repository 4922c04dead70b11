//! Sync CLI commands.

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use dsync_core::sync::{PipelineStage, StageStatus};

use crate::context;
use crate::output;

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Sync tokens from one source
    Run {
        /// Source id
        id: String,
    },

    /// Run the full pipeline (tokens, themes, components, layouts, content)
    Pipeline {
        /// Source id
        id: String,
    },

    /// Show recent sync results
    History {
        /// Number of entries to show
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: usize,
    },

    /// Keep running and sync sources on their auto-sync interval
    Watch,
}

pub async fn execute(cmd: SyncCommands, project_dir: &Path) -> Result<()> {
    let sync = context::open(project_dir).await?;

    match cmd {
        SyncCommands::Run { id } => {
            println!("{} Syncing {}", "→".dimmed(), id);
            let result = sync.sync(&id).await;
            output::print_sync_result(&result);
            if !result.success {
                bail!("Sync failed");
            }
            Ok(())
        }
        SyncCommands::Pipeline { id } => {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
            spinner.enable_steady_tick(Duration::from_millis(100));

            let report = sync
                .execute_sync_pipeline_with(&id, |stage| report_stage(&spinner, stage))
                .await;
            spinner.finish_and_clear();

            for stage in &report.stages {
                let marker = match stage.status {
                    StageStatus::Completed => "✓".green().bold(),
                    StageStatus::Failed => "✗".red().bold(),
                    StageStatus::Running => "…".yellow(),
                    StageStatus::Pending => "·".dimmed(),
                };
                println!("{} {}", marker, stage.name.as_str());
                for error in &stage.errors {
                    println!("    {}", error.red());
                }
            }
            if let Some(result) = &report.sync {
                println!();
                output::print_sync_result(result);
            }
            if !report.succeeded() {
                bail!("Pipeline stopped");
            }
            Ok(())
        }
        SyncCommands::History { limit } => {
            let history = sync.sync_history().await;
            let start = history.len().saturating_sub(limit);
            output::print_history(&history[start..]);
            Ok(())
        }
        SyncCommands::Watch => {
            let scheduled = sync.start_auto_sync().await;
            if scheduled == 0 {
                bail!("No sources have auto-sync enabled. Add one with --every <minutes>.");
            }
            println!(
                "{} Watching {} source(s). Press Ctrl+C to stop.",
                "→".dimmed(),
                scheduled.to_string().bold()
            );
            tokio::signal::ctrl_c().await?;
            sync.scheduler().cancel_all();
            println!("{}", "Stopped.".dimmed());
            Ok(())
        }
    }
}

fn report_stage(spinner: &ProgressBar, stage: &PipelineStage) {
    match stage.status {
        StageStatus::Running => spinner.set_message(format!("{}...", stage.name.as_str())),
        StageStatus::Failed => spinner.println(format!("{} {} failed", "✗".red().bold(), stage.name.as_str())),
        _ => {}
    }
}
