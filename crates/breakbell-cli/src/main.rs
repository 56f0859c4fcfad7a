use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "breakbell", version, about = "Breakbell break reminders")]
struct Cli {
    /// Config file to use instead of ~/.config/breakbell/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reminder engine in the foreground
    Run(commands::run::RunArgs),
    /// Print the current reminder status as JSON
    Status,
    /// Custom reminder management
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Calendar gate inspection
    Calendar {
        #[command(subcommand)]
        action: commands::calendar::CalendarAction,
    },
}

/// Logs go to stderr; stdout carries JSON only.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("BREAKBELL_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let store = commands::ConfigStore::new(cli.config);
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args, &store),
        Commands::Status => commands::status::run(&store),
        Commands::Reminder { action } => commands::reminder::run(action, &store),
        Commands::Config { action } => commands::config::run(action, &store),
        Commands::Calendar { action } => commands::calendar::run(action, &store),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
