//! Command execution against the exchange.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
    time::Duration,
};

use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::RpcClient,
    signers::local::PrivateKeySigner,
};
use delta_sdk::{
    Chain,
    book::Book,
    error::DexError,
    funds,
    matching::{MatchOutcome, Taker},
    rewards::{self, TierTable, TraderStats},
    store::{MemoryStore, OrderStore},
    types::{Market, Token},
    venue::ContractVenue,
};
use fastnum::UD128;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::{MarketArgs, TradeArgs},
    error::{Error, Result},
};

/// Connected client acting on behalf of one wallet.
#[derive(Debug)]
pub struct Client {
    provider: DynProvider,
    signer: PrivateKeySigner,
    chain: Chain,
    timeout: Duration,
}

impl Client {
    pub fn new(node_url: Url, signer: PrivateKeySigner, chain: Chain, timeout: Duration) -> Self {
        info!(
            wallet_address = %signer.address(),
            exchange = %chain.exchange(),
            chain_id = chain.chain_id(),
            "Initializing client"
        );

        let rpc_client = RpcClient::new_http(node_url);
        let provider = DynProvider::new(
            ProviderBuilder::new()
                .wallet(EthereumWallet::new(signer.clone()))
                .connect_client(rpc_client),
        );

        Self {
            provider,
            signer,
            chain,
            timeout,
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Run `fut`, failing after the configured timeout.
    async fn timed<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| Error::Timeout(self.timeout.as_secs()))?
    }

    async fn market(&self, args: &MarketArgs) -> Result<Market> {
        let (base, quote) = futures::try_join!(
            funds::token(&self.provider, args.base),
            funds::token(&self.provider, args.quote)
        )?;
        Ok(Market::new(base, quote))
    }

    async fn token(&self, address: Address) -> Result<Token> {
        Ok(funds::token(&self.provider, address).await?)
    }

    pub async fn balance(&self, token: Address, user: Option<Address>) -> Result<()> {
        self.timed(async {
            let token = self.token(token).await?;
            let user = user.unwrap_or_else(|| self.address());
            let balance = funds::balance(&self.chain, &self.provider, &token, user).await?;
            println!(
                "{} {}: wallet {} exchange {}",
                user,
                token.symbol(),
                balance.wallet_decimal(),
                balance.exchange_decimal()
            );
            Ok(())
        })
        .await
    }

    pub async fn deposit(&self, token: Address, amount: UD128) -> Result<()> {
        self.timed(async {
            let token = self.token(token).await?;
            let raw = token.converter().to_unsigned(amount);
            let tx_hash =
                funds::deposit(&self.chain, &self.provider, &token, self.address(), raw).await?;
            println!("deposited {amount} {} in {tx_hash}", token.symbol());
            Ok(())
        })
        .await
    }

    pub async fn withdraw(&self, token: Address, amount: UD128) -> Result<()> {
        self.timed(async {
            let token = self.token(token).await?;
            let raw = token.converter().to_unsigned(amount);
            let tx_hash = funds::withdraw(&self.chain, &self.provider, &token, raw).await?;
            println!("withdrawn {amount} {} in {tx_hash}", token.symbol());
            Ok(())
        })
        .await
    }

    pub async fn book(&self, args: &MarketArgs, store_path: &Path) -> Result<()> {
        self.timed(async {
            let market = self.market(args).await?;
            let store = load_store(store_path)?;
            let records = match store.active_orders(&market).await {
                Ok(records) => records,
                Err(e) => {
                    warn!(%e, "Failed to load orders, showing an empty book");
                    vec![]
                }
            };
            let block = self
                .provider
                .get_block_number()
                .await
                .map_err(DexError::from)?;
            let book = Book::from_records(&market, self.chain.exchange(), &records, block);

            let base = market.base().converter();
            println!("{}/{} at block {block}", market.base().symbol(), market.quote().symbol());
            for level in book.asks().collect::<Vec<_>>().into_iter().rev() {
                println!(
                    "  ask {:>24} {:>24} ({})",
                    level.price(),
                    base.from_unsigned(level.base_amount()),
                    level.num_orders()
                );
            }
            if let Some(spread) = book.spread() {
                println!("  spread {spread}");
            }
            for level in book.bids() {
                println!(
                    "  bid {:>24} {:>24} ({})",
                    level.price(),
                    base.from_unsigned(level.base_amount()),
                    level.num_orders()
                );
            }
            Ok(())
        })
        .await
    }

    pub async fn trade(&self, args: &TradeArgs) -> Result<()> {
        let market = self.timed(self.market(&args.market)).await?;
        let request = args.to_request(&market)?;
        let store = load_store(&args.store)?;
        let venue = ContractVenue::new(&self.chain, self.provider.clone());
        let taker = Taker::new(&self.chain, market.clone(), &venue, &store, &self.signer)
            .with_config(args.to_taker_config());

        // The store is saved even when the walk fails midway, it may
        // already hold executed trades.
        let result = self.timed(async { Ok(taker.execute(&request).await?) }).await;
        save_store(&store, &args.store)?;
        let outcome = result?;
        report(&market, &outcome);
        Ok(())
    }

    pub async fn cancel(&self, order_hash: B256, store_path: &Path) -> Result<()> {
        let store = load_store(store_path)?;
        let record = store
            .get(&order_hash)
            .ok_or(Error::OrderNotFound(order_hash))?;
        let tx_hash = self
            .timed(async { Ok(funds::cancel(&self.chain, &self.provider, &record.order).await?) })
            .await?;
        if let Err(e) = store.mark_cancelled(order_hash).await {
            warn!(%e, %order_hash, "Failed to mark order cancelled");
        }
        save_store(&store, store_path)?;
        println!("cancelled {order_hash} in {tx_hash}");
        Ok(())
    }
}

/// Print the reward leaderboard from a JSON array of trader stats.
pub fn rewards(stats_path: &Path, pool: UD128) -> Result<()> {
    let stats: Vec<TraderStats> = serde_json::from_reader(BufReader::new(File::open(stats_path)?))?;
    let shares = rewards::compute_shares(&stats, &TierTable::default(), pool);
    debug!(traders = shares.len(), %pool, "Computed reward shares");
    for (rank, share) in shares.iter().enumerate() {
        println!(
            "{:>4} {} fees {} x{} = {} share {}",
            rank + 1,
            share.user,
            share.fees_paid,
            share.multiplier,
            share.weighted_fees,
            share.share
        );
    }
    Ok(())
}

fn report(market: &Market, outcome: &MatchOutcome) {
    let base = market.base().converter();
    for fill in &outcome.fills {
        println!(
            "filled {} @ {} against {} in {}",
            base.from_unsigned(fill.base_amount),
            fill.price,
            fill.order_hash,
            fill.tx_hash
        );
    }
    for skipped in &outcome.skipped {
        println!("skipped {}: {}", skipped.order_hash, skipped.reason);
    }
    if let Some(order) = &outcome.resting {
        println!("posted resting order {} expiring at block {}", order.hash(), order.expires());
    }
    if let Some(reason) = &outcome.stopped {
        println!("stopped: {reason}");
    }
}

fn load_store(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        info!(path = %path.display(), "Order store not found, starting empty");
        return Ok(MemoryStore::new());
    }
    Ok(MemoryStore::load_json(BufReader::new(File::open(path)?))?)
}

fn save_store(store: &MemoryStore, path: &Path) -> Result<()> {
    Ok(store.save_json(BufWriter::new(File::create(path)?))?)
}
