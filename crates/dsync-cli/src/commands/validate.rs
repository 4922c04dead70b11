//! Tree validation command.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use dsync_core::node::ComponentNode;

use super::read_json;
use crate::context;
use crate::output;

#[derive(Args)]
pub struct ValidateArgs {
    /// Builder component tree (JSON)
    pub tree: PathBuf,

    /// Apply auto-fixes (re-apply tokens to stale nodes)
    #[arg(long)]
    pub fix: bool,

    /// Where to write the fixed tree (defaults to overwriting the input)
    #[arg(long, short, requires = "fix")]
    pub out: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ValidateArgs, project_dir: &Path) -> Result<()> {
    let sync = context::open(project_dir).await?;
    let mut tree: ComponentNode = read_json(project_dir, &args.tree)?;

    if args.fix {
        let fixed = sync.auto_fix(&mut tree).await;
        let out = project_dir.join(args.out.as_deref().unwrap_or(&args.tree));
        let json = serde_json::to_string_pretty(&tree)?;
        std::fs::write(&out, json).with_context(|| format!("Failed to write {}", out.display()))?;
        if !args.json {
            println!("{} Fixed {} node(s), wrote {}\n", "✓".green().bold(), fixed, out.display());
        }
    }

    let report = sync.validate_tree(&tree).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_validation(&report);
    }

    if !report.valid {
        bail!("Validation failed");
    }
    Ok(())
}
