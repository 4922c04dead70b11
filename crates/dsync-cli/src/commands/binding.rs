//! Binding CLI commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use dsync_core::binding::Binding;

use super::{read_input, read_json, write_output};
use crate::context;
use crate::output;

#[derive(Subcommand)]
pub enum BindingCommands {
    /// List bindings
    List,

    /// Show one binding
    Show {
        /// Builder component type
        cms_type: String,
    },

    /// Create or replace a binding from a JSON file
    Save {
        /// Binding JSON file
        file: PathBuf,
    },

    /// Remove a binding
    Remove {
        /// Builder component type
        cms_type: String,
    },

    /// Rewrite token paths using the stored rename rules
    Migrate,

    /// Export integration config and bindings
    ExportConfig {
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Replace integration config and bindings from an export
    ImportConfig {
        file: PathBuf,
    },
}

pub async fn execute(cmd: BindingCommands, project_dir: &Path) -> Result<()> {
    let sync = context::open(project_dir).await?;

    match cmd {
        BindingCommands::List => {
            output::print_bindings_table(&sync.bindings().list().await);
        }
        BindingCommands::Show { cms_type } => {
            let binding = sync
                .bindings()
                .get(&cms_type)
                .await
                .ok_or_else(|| anyhow::anyhow!("No binding for '{}'", cms_type))?;
            output::print_binding(&binding);
        }
        BindingCommands::Save { file } => {
            let binding: Binding = read_json(project_dir, &file)?;
            let replaced = sync.bindings().get(&binding.cms_component_type).await.is_some();
            let ty = binding.cms_component_type.clone();
            sync.bindings().save(binding).await?;
            let verb = if replaced { "Replaced" } else { "Saved" };
            println!("{} {} binding for {}", "✓".green().bold(), verb, ty.cyan());
        }
        BindingCommands::Remove { cms_type } => {
            if sync.bindings().remove(&cms_type).await? {
                println!("{} Removed binding for {}", "✓".green().bold(), cms_type.cyan());
            } else {
                println!("{} No binding for {}", "!".yellow(), cms_type);
            }
        }
        BindingCommands::Migrate => {
            let rules = sync.tokens().migration_rules().await?;
            let rewritten = sync.bindings().migrate_token_paths(&rules).await?;
            println!("{} Rewrote {} token binding(s)", "✓".green().bold(), rewritten);
        }
        BindingCommands::ExportConfig { out } => {
            let json = sync.export_config().await?;
            if let Some(path) = write_output(project_dir, out.as_deref(), &json)? {
                println!("{} Exported to {}", "✓".green().bold(), path.display());
            }
        }
        BindingCommands::ImportConfig { file } => {
            let raw = read_input(project_dir, &file)?;
            let export = sync.import_config(&raw).await?;
            println!(
                "{} Imported config with {} binding(s)",
                "✓".green().bold(),
                export.bindings.len()
            );
        }
    }
    Ok(())
}
