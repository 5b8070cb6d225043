//! Trending command implementation

use super::format::{format_entity, top_by_volume};
use crate::config::Config;
use crate::engine::Engine;
use crate::market::Provider;
use clap::Args;

const DEFAULT_LIMIT: usize = 10;

#[derive(Args, Debug)]
pub struct TrendingArgs {
    /// Only fetch this provider (polymarket or kalshi)
    #[arg(short, long)]
    pub provider: Option<Provider>,

    /// Entities to print per provider
    #[arg(short, long)]
    pub limit: Option<usize>,
}

impl TrendingArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        let providers = match self.provider {
            Some(provider) => vec![provider],
            None => Provider::ALL.to_vec(),
        };

        let engine = Engine::new(config)?;
        for provider in providers {
            engine.refresh_trending(provider).await;
            let top = top_by_volume(engine.trending_snapshot(provider).await, limit);

            println!("== {} trending ==", provider);
            if top.is_empty() {
                println!("    (none)");
            }
            for entity in &top {
                println!("{}", format_entity(entity));
            }
        }

        Ok(())
    }
}
