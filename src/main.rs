use clap::Parser;
use smart_loss::cli::{show_config, Cli, Commands};
use smart_loss::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    smart_loss::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(
                symbols = ?config.market.symbols,
                interval_secs = config.scheduler.cycle_interval_secs,
                "Starting evaluation cycles"
            );
            args.execute(&config).await?;
        }
        Commands::Evaluate(args) => args.execute(&config).await?,
        Commands::Size(args) => args.execute(&config)?,
        Commands::Config => show_config(&config),
    }

    Ok(())
}
