//! Run one auction against in-memory stores seeded from a TOML fixture.
//!
//! Usage: `slotbid-adapter-local <fixture.toml> <slot_key> [viewer_id]`

mod seed;

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use slotbid_core::store::memory::{
    MemoryAuditStore, MemoryCampaignStore, MemorySlotStore, MemoryTagStore,
};
use slotbid_core::{AppConfig, AuctionEngine, Stores};

use crate::seed::Seed;

struct Args {
    fixture: PathBuf,
    slot_key: String,
    viewer_id: Option<u64>,
}

fn parse_args() -> Result<Args> {
    let mut it = std::env::args().skip(1);
    let usage = "usage: slotbid-adapter-local <fixture.toml> <slot_key> [viewer_id]";
    let fixture: PathBuf = it.next().ok_or_else(|| anyhow!(usage))?.into();
    let slot_key = it.next().ok_or_else(|| anyhow!(usage))?;
    let viewer_id = it
        .next()
        .map(|v| v.parse::<u64>().context("viewer_id must be an integer"))
        .transpose()?;
    Ok(Args {
        fixture,
        slot_key,
        viewer_id,
    })
}

async fn run() -> Result<()> {
    let args = parse_args()?;
    let (text, seed) = Seed::load(&args.fixture)?;
    let config = AppConfig::from_toml_str(&text)?;

    simple_logger::SimpleLogger::new()
        .with_level(config.logging.level)
        .init()?;

    let slots = Arc::new(MemorySlotStore::new());
    let campaigns = Arc::new(MemoryCampaignStore::new());
    let tags = Arc::new(MemoryTagStore::new());
    let audit = MemoryAuditStore::new();
    seed.populate(&slots, &campaigns, &tags).await?;

    let engine = AuctionEngine::new(
        Stores {
            slots,
            campaigns,
            tags,
            audit: Arc::new(audit.clone()),
        },
        &config,
    );

    let winners = engine
        .select_winners(&args.slot_key, args.viewer_id, None)
        .await?;
    println!("{}", serde_json::to_string_pretty(&winners)?);

    engine.shutdown().await;
    for row in audit.rows().await {
        log::info!("bid log: {}", serde_json::to_string(&row)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("slotbid-adapter-local failed: {err:#}");
        std::process::exit(1);
    }
}
