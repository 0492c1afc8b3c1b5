use crate::session::{print_json, read_json, Session};
use anyhow::Result;
use branchdoc_store::AssemblyRequest;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct AssembleArgs {
    /// JSON file holding the collection and its child actions
    pub request: PathBuf,

    /// Branch the collection is created on
    #[arg(short, long)]
    pub branch: Option<String>,
}

pub async fn assemble(args: AssembleArgs, session: &Session) -> Result<()> {
    let mut request: AssemblyRequest = read_json(&args.request)?;
    if args.branch.is_some() {
        request.branch_name = args.branch;
    }

    let assembled = session.service.assemble(request).await?;
    session.persist().await?;

    eprintln!(
        "{} Created collection {} with {} action(s)",
        "✓".green(),
        assembled.view.id.as_deref().unwrap_or_default().bright_white(),
        assembled.view.actions.len()
    );
    for failure in &assembled.failures {
        eprintln!("  {} {}", "✗".red(), failure.message);
    }

    print_json(&assembled)
}
