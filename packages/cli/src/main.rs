mod commands;
mod config;
mod session;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    archive, assemble, delete, list, resolve, update, view, ArchiveArgs, AssembleArgs,
    DeleteArgs, ListArgs, ResolveArgs, UpdateArgs, ViewArgs,
};
use config::Config;
use session::Session;
use tracing_subscriber::EnvFilter;

/// Branchdoc CLI - dual-state, branch-aware action collections
#[derive(Parser, Debug)]
#[command(name = "branchdoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a collection and its child actions
    Assemble(AssembleArgs),

    /// Show the draft or published view of a collection
    View(ViewArgs),

    /// Patch the draft of a collection
    Update(UpdateArgs),

    /// Delete the draft of a collection (archives never-published ones)
    Delete(DeleteArgs),

    /// Archive a collection and its actions
    Archive(ArchiveArgs),

    /// Resolve a logical id on a branch to a physical id
    Resolve(ResolveArgs),

    /// List collections of an application or page
    List(ListArgs),
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();
    let config = Config::load(&cwd)?;
    init_tracing(&config);

    let session = Session::open(&config, &cwd)?;

    match cli.command {
        Command::Assemble(args) => assemble(args, &session).await,
        Command::View(args) => view(args, &session).await,
        Command::Update(args) => update(args, &session).await,
        Command::Delete(args) => delete(args, &session).await,
        Command::Archive(args) => archive(args, &session).await,
        Command::Resolve(args) => resolve(args, &session).await,
        Command::List(args) => list(args, &session).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
