use crate::session::{print_json, Session};
use anyhow::Result;
use branchdoc_store::DeleteOutcome;
use clap::Args;
use colored::Colorize;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Collection id (logical when --branch is given)
    pub id: String,

    #[arg(short, long)]
    pub branch: Option<String>,
}

pub async fn delete(args: DeleteArgs, session: &Session) -> Result<()> {
    let deleted = session
        .service
        .delete_unpublished(&args.id, args.branch.as_deref())
        .await?;
    session.persist().await?;

    let outcome = match deleted.outcome {
        DeleteOutcome::SoftDeleted => "Deleted draft of",
        DeleteOutcome::Archived => "Archived",
    };
    eprintln!(
        "{} {} {}",
        "✓".green(),
        outcome,
        deleted.collection.id_str().bright_white()
    );
    for failure in &deleted.report.failures {
        eprintln!("  {} {}", "✗".red(), failure.message);
    }

    print_json(&deleted.report)
}
