use clap::Parser;
use odds_watch::cli::{Cli, Commands};
use odds_watch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    odds_watch::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting watch mode");
            args.execute(config).await?;
        }
        Commands::Trending(args) => {
            args.execute(config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Polymarket: {} (top {})", config.polymarket.base_url, config.polymarket.trending_limit);
            println!(
                "  Kalshi: {} (top {} of {})",
                config.kalshi.base_url, config.kalshi.trending_limit, config.kalshi.fetch_limit
            );
            println!(
                "  Intervals: trending={}ms tracked={}ms sweep={}ms",
                config.scheduler.trending_interval_ms,
                config.scheduler.tracked_interval_ms,
                config.scheduler.sweep_interval_ms
            );
            println!(
                "  Alerts: threshold={}%, ttl={}ms",
                config.alerts.threshold * rust_decimal_macros::dec!(100),
                config.alerts.ttl_ms
            );
            println!("  Notifier: {:?}", config.notifier.kind);
            println!("  Watchlist: polymarket={:?}", config.watchlist.polymarket);
            println!("             kalshi={:?}", config.watchlist.kalshi);
            match config.telemetry.metrics_port {
                Some(port) => println!("  Metrics: :{}", port),
                None => println!("  Metrics: disabled"),
            }
        }
    }

    Ok(())
}
