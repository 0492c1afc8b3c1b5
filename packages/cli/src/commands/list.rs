use crate::session::{print_json, Session};
use anyhow::{bail, Result};
use branchdoc_store::ViewMode;
use clap::Args;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Logical application id
    #[arg(short, long)]
    pub application: Option<String>,

    /// List collections on this page instead
    #[arg(long, conflicts_with = "application")]
    pub page: Option<String>,

    #[arg(short, long)]
    pub branch: Option<String>,

    #[arg(short, long)]
    pub published: bool,

    /// Show the read-only projection served to viewers of the deployed application
    #[arg(long, requires = "application")]
    pub viewer: bool,
}

pub async fn list(args: ListArgs, session: &Session) -> Result<()> {
    let store = session.service.store();
    let mode = ViewMode::from(args.published);

    match (args.application, args.page) {
        (Some(application), None) if args.viewer => {
            let views = store
                .views_for_application(&application, args.branch.as_deref())
                .await?;
            print_json(&views)
        }
        (Some(application), None) => {
            let states = store
                .list_by_application(&application, args.branch.as_deref(), mode)
                .await?;
            print_json(&states)
        }
        (None, Some(page)) => {
            let states = store.list_by_page(&page, mode).await?;
            print_json(&states)
        }
        _ => bail!("Pass --application or --page"),
    }
}
