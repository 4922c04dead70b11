//! Artifact generation command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::context;

#[derive(Args)]
pub struct GenerateArgs {
    /// Output directory, relative to the project
    #[arg(long, short, default_value = ".dsync/generated")]
    pub out: PathBuf,
}

pub async fn execute(args: GenerateArgs, project_dir: &Path) -> Result<()> {
    let sync = context::open(project_dir).await?;
    let version = sync
        .tokens()
        .current()
        .await
        .ok_or_else(|| anyhow::anyhow!("No active version. Run 'dsync sync run <source>' first."))?;

    let out_dir = project_dir.join(&args.out);
    for artifact in [
        dsync_codegen::generate_stylesheet(&version),
        dsync_codegen::generate_design_system_md(&version),
    ] {
        let path = dsync_codegen::write_artifact(&artifact, &out_dir)?;
        println!("{} Generated: {}", "✓".green().bold(), path.display());
    }
    println!("\n{} Design system v{} ready.", "✓".green().bold(), version.version);
    Ok(())
}
