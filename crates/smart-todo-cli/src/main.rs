use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;

use commands::Globals;

#[derive(Parser)]
#[command(name = "smart-todo", version, about = "Context-aware task suggestions")]
pub struct Cli {
    /// Config file to use instead of ~/.config/smart-todo/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reference time (RFC 3339) instead of the current time
    #[arg(long, global = true)]
    now: Option<chrono::DateTime<chrono::Utc>>,

    /// Never call the generative model
    #[arg(long, global = true)]
    local: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze context text: keywords, urgency, mentions, potential tasks
    Analyze(commands::analyze::AnalyzeArgs),
    /// Full suggestion for one task
    Suggest(commands::suggest::SuggestArgs),
    /// Run a JSON API request from a file or stdin
    Request(commands::request::RequestArgs),
    /// Prioritize a JSON list of tasks and lay out a schedule
    Plan(commands::plan::PlanArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    // Logs go to stderr so JSON on stdout stays parseable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging disabled: {e}");
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let globals = Globals {
        config_path: cli.config,
        now: cli.now,
        local: cli.local,
    };

    let result = match cli.command {
        Commands::Analyze(args) => commands::analyze::run(&globals, args),
        Commands::Suggest(args) => commands::suggest::run(&globals, args),
        Commands::Request(args) => commands::request::run(&globals, args),
        Commands::Plan(args) => commands::plan::run(&globals, args),
        Commands::Config { action } => commands::config::run(&globals, action),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
