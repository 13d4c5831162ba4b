mod config_commands;
mod events;
mod publish_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    herald_publish::{ErrorLogBuffer, ErrorLogLayer},
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "herald", about = "Herald: publish events as posts", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./herald.toml, then the user config dir).
    #[arg(long, global = true, env = "HERALD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a batch of events read from a JSON array or JSON Lines file.
    Run {
        /// Events file.
        #[arg(long)]
        events: PathBuf,
        /// Render and report without posting or recording outcomes.
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate the configuration file and report errors/warnings.
    Validate,
    /// Report whether the publisher is working as expected.
    Health,
    /// Show the most recently recorded outcome events.
    Outcomes {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

/// Initialise tracing and attach an [`ErrorLogLayer`] that records ERROR
/// events from herald crates for the health check.
fn init_telemetry(cli: &Cli, error_log: ErrorLogBuffer) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLogLayer::new(error_log, "herald"));

    // Logs go to stderr; stdout carries command output.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let error_log = ErrorLogBuffer::default();
    init_telemetry(&cli, error_log.clone());

    debug!(version = env!("CARGO_PKG_VERSION"), "herald starting");

    match cli.command {
        Commands::Validate => config_commands::handle_validate(cli.config.as_deref()),
        Commands::Run { events, dry_run } => {
            let loaded = config_commands::load(cli.config.as_deref())?;
            info!(
                agent_id = loaded.config.agent_id,
                events = %events.display(),
                dry_run,
                "publishing batch"
            );
            publish_commands::handle_run(&loaded.config, events, dry_run, error_log).await
        },
        Commands::Health => {
            let loaded = config_commands::load(cli.config.as_deref())?;
            publish_commands::handle_health(&loaded.config, error_log).await
        },
        Commands::Outcomes { limit } => {
            let loaded = config_commands::load(cli.config.as_deref())?;
            publish_commands::handle_outcomes(&loaded.config, limit).await
        },
    }
}
