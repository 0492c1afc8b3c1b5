use crate::session::{print_json, read_json, Session};
use anyhow::{bail, Result};
use branchdoc_store::CollectionPatch;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Physical collection id
    pub id: String,

    /// JSON file with the fields to change
    #[arg(long)]
    pub patch: Option<PathBuf>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub body: Option<String>,

    #[arg(long)]
    pub page: Option<String>,
}

impl UpdateArgs {
    fn into_patch(self) -> Result<CollectionPatch> {
        let mut patch = match &self.patch {
            Some(path) => read_json(path)?,
            None => CollectionPatch::default(),
        };
        if self.name.is_some() {
            patch.name = self.name;
        }
        if self.body.is_some() {
            patch.body = self.body;
        }
        if self.page.is_some() {
            patch.page_id = self.page;
        }
        Ok(patch)
    }
}

pub async fn update(args: UpdateArgs, session: &Session) -> Result<()> {
    let id = args.id.clone();
    let patch = args.into_patch()?;
    if patch.is_empty() {
        bail!("Nothing to update: pass --patch or at least one field");
    }

    let view = session.service.update(&id, &patch).await?;
    session.persist().await?;

    eprintln!("{} Updated {}", "✓".green(), id.bright_white());
    print_json(&view)
}
