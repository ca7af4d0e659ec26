mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{board::BoardSubcommand, config::ConfigSubcommand, moves::MoveArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "laneboard",
    about = "Kanban lanes with optimistic drag-and-drop ordering",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .laneboard/)
    #[arg(long, global = true, env = "LANEBOARD_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize laneboard in the current project
    Init {
        /// Don't create the demo board
        #[arg(long)]
        no_seed: bool,
    },

    /// Serve the board API
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Inspect boards
    Board {
        #[command(subcommand)]
        subcommand: BoardSubcommand,
    },

    /// Move an item the way a drag-and-drop would
    Move(MoveArgs),

    /// Validate or show the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. }
        | Commands::Board {
            subcommand: BoardSubcommand::Watch { .. },
        } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { no_seed } => cmd::init::run(&root, !no_seed, cli.json),
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::Board { subcommand } => cmd::board::run(&root, subcommand, cli.json),
        Commands::Move(args) => cmd::moves::run(args, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
