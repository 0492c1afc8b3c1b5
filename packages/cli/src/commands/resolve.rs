use super::CapabilityArg;
use crate::session::Session;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Logical collection id (physical when no branch is given)
    pub id: String,

    #[arg(short, long)]
    pub branch: Option<String>,

    /// Capability the caller needs on the collection
    #[arg(short, long, value_enum, default_value = "read")]
    pub capability: CapabilityArg,
}

pub async fn resolve(args: ResolveArgs, session: &Session) -> Result<()> {
    let collection = session
        .service
        .resolve(args.branch.as_deref(), &args.id, args.capability.into())
        .await?;
    println!("{}", collection.id_str());
    Ok(())
}
