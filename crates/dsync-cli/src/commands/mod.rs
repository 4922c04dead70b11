//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod binding;
pub mod component;
pub mod generate;
pub mod source;
pub mod sync;
pub mod tokens;
pub mod validate;

/// dsync - keep a page builder in step with its design system
#[derive(Parser)]
#[command(name = "dsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and edit design tokens and versions
    #[command(subcommand)]
    Tokens(tokens::TokenCommands),

    /// Manage token sources (Figma, GitHub, URL)
    #[command(subcommand)]
    Source(source::SourceCommands),

    /// Run syncs and pipelines
    #[command(subcommand)]
    Sync(sync::SyncCommands),

    /// Manage builder component bindings
    #[command(subcommand)]
    Binding(binding::BindingCommands),

    /// Manage design system components
    #[command(subcommand)]
    Component(component::ComponentCommands),

    /// Validate a builder component tree
    Validate(validate::ValidateArgs),

    /// Write tokens.css and design-system.md for the current version
    Generate(generate::GenerateArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let project_dir = match self.project {
            Some(dir) => dir,
            None => std::env::current_dir().context("Failed to resolve current directory")?,
        };

        match self.command {
            Commands::Tokens(cmd) => tokens::execute(cmd, &project_dir).await,
            Commands::Source(cmd) => source::execute(cmd, &project_dir).await,
            Commands::Sync(cmd) => sync::execute(cmd, &project_dir).await,
            Commands::Binding(cmd) => binding::execute(cmd, &project_dir).await,
            Commands::Component(cmd) => component::execute(cmd, &project_dir).await,
            Commands::Validate(args) => validate::execute(args, &project_dir).await,
            Commands::Generate(args) => generate::execute(args, &project_dir).await,
        }
    }
}

/// Read a file relative to the project directory.
pub(crate) fn read_input(project_dir: &Path, file: &Path) -> Result<String> {
    let path = project_dir.join(file);
    std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Parse a JSON file relative to the project directory.
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(project_dir: &Path, file: &Path) -> Result<T> {
    let raw = read_input(project_dir, file)?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", file.display()))
}

/// Write `content` to `out` or print it.
pub(crate) fn write_output(project_dir: &Path, out: Option<&Path>, content: &str) -> Result<Option<PathBuf>> {
    match out {
        Some(file) => {
            let path = project_dir.join(file);
            std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(Some(path))
        }
        None => {
            println!("{}", content);
            Ok(None)
        }
    }
}
