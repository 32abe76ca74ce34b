use anyhow::Context;
use clap::Parser;
use hardcourt::adapters::SofascoreClient;
use hardcourt::aggregator::Aggregator;
use hardcourt::cli::{Cli, Commands};
use hardcourt::config::{AppConfig, LoggingConfig};
use hardcourt::coordination::{install_signal_handlers, Shutdown};
use hardcourt::service;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    init_logging(&config.logging);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!(port = config.server.port, simulator = config.live.enable_simulator, "Starting hardcourt");
            let shutdown = Arc::new(Shutdown::new());
            install_signal_handlers(shutdown.clone());
            service::serve(config, shutdown).await?;
        }
        Commands::Fetch { json } => run_fetch(config, json).await?,
    }

    Ok(())
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(url) = &cli.database_url {
        config.database.url = Some(url.clone());
    }
    if let Some(enabled) = cli.enable_simulator {
        config.live.enable_simulator = enabled;
    }
    if cli.json_logs {
        config.logging.json = true;
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},hardcourt=debug,sqlx=warn", logging.level))
    });

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// One-shot fetch through the full fallback chain
async fn run_fetch(config: AppConfig, json: bool) -> anyhow::Result<()> {
    let store = service::open_store(&config.database).await?;
    let provider = Arc::new(SofascoreClient::new(&config.provider)?);
    let aggregator = Aggregator::new(provider, store, config.live.rate_limit_interval());

    let shutdown = Shutdown::new();
    let matches = aggregator.fetch_live_matches(&shutdown.token()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No live matches");
    }
    for m in &matches {
        let name = |p: &Option<hardcourt::domain::Player>, id: &str| {
            p.as_ref().map(|p| p.name.clone()).unwrap_or_else(|| id.to_string())
        };
        println!(
            "{:<16} {} vs {}  sets {}-{}  games {}-{}",
            m.id,
            name(&m.player1, &m.player1_id),
            name(&m.player2, &m.player2_id),
            m.score.sets_p1,
            m.score.sets_p2,
            m.score.games_p1,
            m.score.games_p2,
        );
    }
    Ok(())
}
