//! Example: Print trades of a token against ETH on the mainnet exchange.
//!
//! Run with: NODE_RPC_URL=... cargo run --example print_trades -- <token address>

use std::time::Duration;

use alloy::{
    primitives::Address,
    providers::{Provider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::RetryBackoffLayer,
};
use delta_sdk::{
    Chain, funds, trades,
    types::{Market, StateInstant},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let token: Address = std::env::args()
        .nth(1)
        .ok_or("usage: print_trades <token address>")?
        .parse()?;
    let node_url = std::env::var("NODE_RPC_URL")
        .unwrap_or_else(|_| "https://ethereum-rpc.publicnode.com".to_string());

    let client = RpcClient::builder()
        .layer(RetryBackoffLayer::new(10, 100, 200))
        .connect(&node_url)
        .await?;
    client.set_poll_interval(Duration::from_millis(2000));
    let provider = ProviderBuilder::new().connect_client(client);

    let chain = Chain::mainnet();
    let market = Market::native(funds::token(&provider, token).await?);

    // Start from the current block
    let block_num = provider.get_block_number().await?;
    println!("Starting from block {}", block_num);

    let (mut rx, _handle) = trades::start(
        &chain,
        market.clone(),
        provider,
        StateInstant::new(block_num, 0),
        tokio::time::sleep,
    );

    println!(
        "Listening for {}/{} trades...\n",
        market.base().symbol(),
        market.quote().symbol()
    );

    let base = market.base().converter();
    while let Some(block_trades) = rx.recv().await {
        if !block_trades.is_empty() {
            println!(
                "Block {} - {} trade(s):",
                block_trades.instant.block_number(),
                block_trades.len()
            );
            for trade in &block_trades.trades {
                println!(
                    "  Taker {} {:?} {} @ {} <- Maker {} (tx {})",
                    trade.taker,
                    trade.side,
                    base.from_unsigned(trade.base_amount),
                    trade.price,
                    trade.maker,
                    trade.tx_hash,
                );
            }
        }
    }

    Ok(())
}
