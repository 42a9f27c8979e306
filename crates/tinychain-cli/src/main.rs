use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use clap::Parser;
use rand::Rng;
use serde::Serialize;
use tinychain_core::chain::Chain;
use tinychain_core::Block;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "tinychain-cli")]
#[command(about = "Demo driver for the tinychain proof-of-work ledger")]
struct Cli {
    /// Leading zero hex characters required of each mined block hash
    #[arg(long, default_value_t = 2)]
    difficulty: u32,

    /// Number of sample transfer blocks to mine and append
    #[arg(long, default_value_t = 3)]
    transfers: u64,

    /// Spread each nonce search across rayon workers
    #[arg(long)]
    parallel: bool,
}

#[derive(Serialize)]
struct Transfer {
    sender: String,
    recipient: String,
    quantity: u64,
}

const PARTIES: [&str; 4] = ["alice", "bob", "carol", "dave"];

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut rng = rand::thread_rng();
    let mut chain = Chain::with_difficulty(cli.difficulty);
    info!(
        "appending {} transfer blocks at difficulty {}",
        cli.transfers, cli.difficulty
    );

    for i in 0..cli.transfers {
        let transfer = Transfer {
            sender: PARTIES[i as usize % PARTIES.len()].to_string(),
            recipient: PARTIES[(i as usize + 1) % PARTIES.len()].to_string(),
            quantity: rng.gen_range(1..100),
        };
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)?
            .as_secs()
            .to_string();
        let block = Block::new(i + 1, timestamp, &transfer, "")?;
        if cli.parallel {
            chain.append_block_parallel(block)?;
        } else {
            chain.append_block(block)?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&chain)?);
    println!("chain valid: {}", chain.is_valid());
    Ok(())
}
