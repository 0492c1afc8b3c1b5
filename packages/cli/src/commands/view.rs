use crate::session::{print_json, Session};
use anyhow::Result;
use branchdoc_store::ViewMode;
use clap::Args;

#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Collection id (logical when --branch is given)
    pub id: String,

    /// Show the published snapshot instead of the draft
    #[arg(short, long)]
    pub published: bool,

    #[arg(short, long)]
    pub branch: Option<String>,
}

pub async fn view(args: ViewArgs, session: &Session) -> Result<()> {
    let mode = ViewMode::from(args.published);
    let state = session
        .service
        .store()
        .find_by_id_and_branch(&args.id, args.branch.as_deref(), mode)
        .await?;
    print_json(&state)
}
