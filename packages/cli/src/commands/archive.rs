use crate::session::{print_json, Session};
use anyhow::{bail, Result};
use branchdoc_store::ArchivedCollection;
use clap::Args;
use colored::Colorize;

#[derive(Debug, Args)]
pub struct ArchiveArgs {
    /// Physical collection id
    pub id: Option<String>,

    /// Archive every collection of this application instead
    #[arg(short, long, conflicts_with = "id")]
    pub application: Option<String>,
}

pub async fn archive(args: ArchiveArgs, session: &Session) -> Result<()> {
    let archived = match (args.id, args.application) {
        (Some(id), None) => vec![session.service.archive(&id).await?],
        (None, Some(application)) => {
            session
                .service
                .cascade()
                .archive_by_application(&application)
                .await?
        }
        _ => bail!("Pass a collection id or --application"),
    };
    session.persist().await?;

    for ArchivedCollection { collection, report } in &archived {
        eprintln!(
            "{} Archived {} ({} action(s))",
            "✓".green(),
            collection.id_str().bright_white(),
            report.archived.len()
        );
        for failure in &report.failures {
            eprintln!("  {} {}", "✗".red(), failure.message);
        }
    }

    let reports: Vec<_> = archived.iter().map(|a| &a.report).collect();
    print_json(&reports)
}
