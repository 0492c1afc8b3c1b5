pub mod archive;
pub mod assemble;
pub mod delete;
pub mod list;
pub mod resolve;
pub mod update;
pub mod view;

pub use archive::{archive, ArchiveArgs};
pub use assemble::{assemble, AssembleArgs};
pub use delete::{delete, DeleteArgs};
pub use list::{list, ListArgs};
pub use resolve::{resolve, ResolveArgs};
pub use update::{update, UpdateArgs};
pub use view::{view, ViewArgs};

use branchdoc_store::Capability;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CapabilityArg {
    Read,
    Edit,
    Delete,
    Execute,
}

impl From<CapabilityArg> for Capability {
    fn from(arg: CapabilityArg) -> Self {
        match arg {
            CapabilityArg::Read => Capability::Read,
            CapabilityArg::Edit => Capability::Edit,
            CapabilityArg::Delete => Capability::Delete,
            CapabilityArg::Execute => Capability::Execute,
        }
    }
}
