mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    discover::DiscoverSubcommand, guidance::GuidanceSubcommand, issue::ListFormat,
    spec::SpecSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "agile",
    about = "Folder-based issue workflow: gated stage moves, specs, technical guidance and feature discovery",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: nearest ancestor containing agile/)
    #[arg(long, global = true, env = "AGILE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create agile/ with the five stage directories
    Init,

    /// Create an issue in 1-backlog
    Create {
        /// feature, bug or task
        issue_type: String,
        /// Issue slug (lowercase, hyphens)
        name: String,
        /// Human-readable title (defaults to the slug)
        #[arg(long)]
        title: Option<String>,
        /// Owner to record in the document
        #[arg(long)]
        owner: Option<String>,
    },

    /// Move an issue to an adjacent stage, running the gate for forward moves
    Move {
        name: String,
        /// Stage directory name, bare label or number (e.g. 2-todo, todo, 2)
        stage: String,
    },

    /// List issues
    List {
        /// Only issues in this stage
        #[arg(long)]
        stage: Option<String>,
        #[arg(long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },

    /// Show an issue with its specs, guidance and next-stage readiness
    Show { name: String },

    /// Record an owner on an issue
    Assign { name: String, owner: String },

    /// Move an issue to agile/archive/<name>-<date>/
    Archive { name: String },

    /// Delete an issue folder
    Delete { name: String },

    /// Manage an issue's specs
    Spec {
        #[command(subcommand)]
        subcommand: SpecSubcommand,
    },

    /// Manage an issue's technical guidance document
    Guidance {
        #[command(subcommand)]
        subcommand: GuidanceSubcommand,
    },

    /// Drive a feature through discovery
    Discover {
        name: String,
        #[command(subcommand)]
        subcommand: DiscoverSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Create {
            issue_type,
            name,
            title,
            owner,
        } => cmd::issue::create(
            &root,
            &issue_type,
            &name,
            title.as_deref(),
            owner.as_deref(),
            cli.json,
        ),
        Commands::Move { name, stage } => cmd::issue::move_to(&root, &name, &stage, cli.json),
        Commands::List { stage, format } => {
            cmd::issue::list(&root, stage.as_deref(), format, cli.json)
        }
        Commands::Show { name } => cmd::issue::show(&root, &name, cli.json),
        Commands::Assign { name, owner } => cmd::issue::assign(&root, &name, &owner, cli.json),
        Commands::Archive { name } => cmd::issue::archive(&root, &name, cli.json),
        Commands::Delete { name } => cmd::issue::delete(&root, &name, cli.json),
        Commands::Spec { subcommand } => cmd::spec::run(&root, subcommand, cli.json),
        Commands::Guidance { subcommand } => cmd::guidance::run(&root, subcommand, cli.json),
        Commands::Discover { name, subcommand } => {
            cmd::discover::run(&root, &name, subcommand, cli.json)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
