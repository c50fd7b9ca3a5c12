//! Evaluate command implementation

use super::build_engine;
use crate::config::Config;
use crate::risk::Position;
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// JSON file holding the position
    #[arg(long)]
    pub position: PathBuf,

    /// Current price
    #[arg(long)]
    pub price: Decimal,

    /// Candle directory, overriding market.data_dir
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Output format: json or table
    #[arg(long, default_value = "table")]
    pub format: String,
}

impl EvaluateArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let content = tokio::fs::read_to_string(&self.position).await?;
        let position: Position = serde_json::from_str(&content)?;
        if self.price <= Decimal::ZERO {
            anyhow::bail!("Price must be positive, got {}", self.price);
        }

        let engine = build_engine(config, self.data_dir.as_deref());
        let recommendation = engine
            .evaluate(&position.symbol, &position, self.price)
            .await;

        if self.format == "json" {
            println!("{}", serde_json::to_string_pretty(&recommendation)?);
            return Ok(());
        }

        println!("{} @ {}", position.symbol, self.price);
        println!("  Action: {:?}", recommendation.action());
        println!("  Reason: {}", recommendation.decision);
        println!("  Confidence: {:.2}", recommendation.confidence);
        println!("  Urgency: {:?}", recommendation.urgency());
        for detail in &recommendation.details {
            println!("  - {}", detail);
        }
        Ok(())
    }
}
