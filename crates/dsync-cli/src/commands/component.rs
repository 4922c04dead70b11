//! Design system component CLI commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use dsync_core::design::model::DsComponent;

use super::read_json;
use crate::context;
use crate::output;

#[derive(Subcommand)]
pub enum ComponentCommands {
    /// List components of the current version
    List,

    /// Show one component
    Show { id: String },

    /// Create or replace a component from a JSON file (creates a new version)
    Save { file: PathBuf },
}

pub async fn execute(cmd: ComponentCommands, project_dir: &Path) -> Result<()> {
    let sync = context::open(project_dir).await?;

    match cmd {
        ComponentCommands::List => output::print_components_table(&sync.tokens().list_components().await),
        ComponentCommands::Show { id } => {
            let component = sync
                .tokens()
                .component(&id)
                .await
                .ok_or_else(|| anyhow::anyhow!("Component not found: {}", id))?;
            output::print_component(&component);
        }
        ComponentCommands::Save { file } => {
            let component: DsComponent = read_json(project_dir, &file)?;
            let name = component.name.clone();
            let version = sync.tokens().save_component(component).await?;
            println!(
                "{} Saved {} (version {})",
                "✓".green().bold(),
                name.cyan(),
                version.version.bold()
            );
        }
    }
    Ok(())
}
