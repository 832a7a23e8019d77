use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use hotel_qa::{build_parser, DatasetHandle, HotelQaPipeline, QaConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout carries only answers
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = QaConfig::from_env().context("Invalid configuration")?;

    let dataset = Arc::new(DatasetHandle::new(config.dataset.clone()));
    let loaded = dataset.load().context("Failed to load hotel dataset")?;
    tracing::info!(
        rows = loaded.len(),
        source = ?loaded.source(),
        "Hotel dataset ready"
    );

    let parser = build_parser(&config.parser, Arc::clone(&dataset))
        .context("Failed to initialise query parser")?;
    let pipeline = HotelQaPipeline::new(dataset, parser);

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        println!("{}", pipeline.answer(&args.join(" ")).await);
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        println!("{}\n", pipeline.answer(query).await);
    }

    Ok(())
}
