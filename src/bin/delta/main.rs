//! Command line client for an EtherDelta-style order book exchange.
//!
//! Reads balances, moves funds, shows the order book kept in a local order
//! store file, matches new orders against it and computes the trading
//! rewards leaderboard.

mod client;
mod config;
mod error;

use std::process::exit;

use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use tracing::error;
use url::Url;

use client::Client;
use config::{CliConfig, Command, EnvConfig, parse_decimal};

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse CLI arguments
    let cli_config = CliConfig::parse();

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Leaderboard is computed offline
    if let Command::Rewards { stats, pool } = &cli_config.command {
        let result = parse_decimal("pool", pool)
            .map_err(error::Error::from)
            .and_then(|pool| client::rewards(stats, pool));
        if let Err(e) = result {
            error!(%e, "Failed to compute rewards");
            exit(1);
        }
        return;
    }

    let client = match connect() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to set up client: {}", e);
            exit(1);
        }
    };

    if let Err(e) = run(&client, cli_config.command).await {
        error!(%e, "Command failed");
        exit(1);
    }
}

/// Builds the client from environment configuration.
fn connect() -> error::Result<Client> {
    let env_config = EnvConfig::from_env()?;
    let chain = env_config.chain()?;
    let signer: PrivateKeySigner = env_config.private_key.parse()?;
    let node_url = Url::parse(&env_config.node_rpc_url)?;
    Ok(Client::new(node_url, signer, chain, env_config.timeout()))
}

async fn run(client: &Client, command: Command) -> error::Result<()> {
    match command {
        Command::Balance { token, user } => client.balance(token.token, user).await,
        Command::Deposit { token, amount } => {
            client
                .deposit(token.token, parse_decimal("amount", &amount)?)
                .await
        }
        Command::Withdraw { token, amount } => {
            client
                .withdraw(token.token, parse_decimal("amount", &amount)?)
                .await
        }
        Command::Book { market, store } => client.book(&market, &store).await,
        Command::Trade(args) => client.trade(&args).await,
        Command::Cancel { order, store } => client.cancel(order, &store).await,
        Command::Rewards { stats, pool } => client::rewards(&stats, parse_decimal("pool", &pool)?),
    }
}
