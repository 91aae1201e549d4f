//! Configuration for the `delta` command line client.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): connection details, keys
//! - CLI arguments: the command to run and its parameters

use std::{path::PathBuf, time::Duration};

use alloy::primitives::{Address, B256};
use clap::{Args, Parser, Subcommand, ValueEnum};
use delta_sdk::{
    Chain, MAINNET_EXCHANGE,
    matching::{DEFAULT_EXPIRY_BLOCKS, MatchRequest, TakerConfig},
    types::{Market, Side},
};
use fastnum::{UD128, decimal::Context};

/// Environment configuration (connection details, credentials).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// Chain ID (1 for Ethereum mainnet)
    pub chain_id: u64,

    /// Exchange contract address, defaults to the mainnet deployment
    pub exchange_address: Option<String>,

    /// Private key for signing orders and transactions
    pub private_key: String,

    /// Block number when the exchange was deployed
    pub deployed_at_block: Option<u64>,

    /// RPC URL for the node
    pub node_rpc_url: String,

    /// Optional timeout for a single command (default: 120s)
    pub timeout_seconds: Option<u64>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Parse the exchange address.
    pub fn exchange_address(&self) -> Result<Address, alloy::primitives::hex::FromHexError> {
        match &self.exchange_address {
            Some(address) => address.parse(),
            None => Ok(MAINNET_EXCHANGE),
        }
    }

    pub fn chain(&self) -> Result<Chain, alloy::primitives::hex::FromHexError> {
        Ok(Chain::new(
            self.chain_id,
            self.exchange_address()?,
            self.deployed_at_block.unwrap_or_default(),
        ))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(120))
    }
}

/// Command line client for an EtherDelta-style exchange.
#[derive(Debug, Parser)]
#[command(name = "delta")]
#[command(about = "Trade against an EtherDelta-style order book exchange")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show wallet and exchange balances of a token
    Balance {
        #[command(flatten)]
        token: TokenArgs,

        /// Account to query, defaults to the configured wallet
        #[arg(long)]
        user: Option<Address>,
    },

    /// Deposit funds to the exchange
    Deposit {
        #[command(flatten)]
        token: TokenArgs,

        /// Amount in token units (e.g., 1.5)
        #[arg(long)]
        amount: String,
    },

    /// Withdraw funds from the exchange
    Withdraw {
        #[command(flatten)]
        token: TokenArgs,

        /// Amount in token units (e.g., 1.5)
        #[arg(long)]
        amount: String,
    },

    /// Show the aggregated order book of a market
    Book {
        #[command(flatten)]
        market: MarketArgs,

        /// Order store file
        #[arg(long)]
        store: PathBuf,
    },

    /// Match a new order against the book and post the remainder
    Trade(TradeArgs),

    /// Cancel a stored order on-chain
    Cancel {
        /// Order hash
        #[arg(long)]
        order: B256,

        /// Order store file
        #[arg(long)]
        store: PathBuf,
    },

    /// Split a reward pool between traders by weighted fees
    Rewards {
        /// JSON file with the traders' fees paid and staked balances
        #[arg(long)]
        stats: PathBuf,

        /// Reward pool of the period
        #[arg(long)]
        pool: String,
    },
}

#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Token address, the zero address for the native currency
    #[arg(long, default_value_t = Address::ZERO)]
    pub token: Address,
}

#[derive(Debug, Args)]
pub struct MarketArgs {
    /// Base token address
    #[arg(long)]
    pub base: Address,

    /// Quote token address, the native currency by default
    #[arg(long, default_value_t = Address::ZERO)]
    pub quote: Address,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliSide {
    Buy,
    Sell,
}

impl From<CliSide> for Side {
    fn from(value: CliSide) -> Self {
        match value {
            CliSide::Buy => Side::Buy,
            CliSide::Sell => Side::Sell,
        }
    }
}

#[derive(Debug, Args)]
pub struct TradeArgs {
    #[command(flatten)]
    pub market: MarketArgs,

    /// Order store file, created when missing
    #[arg(long)]
    pub store: PathBuf,

    #[arg(long, value_enum)]
    pub side: CliSide,

    /// Limit price in quote tokens per base token (e.g., 0.0011)
    #[arg(long)]
    pub price: String,

    /// Base amount in token units (e.g., 10)
    #[arg(long)]
    pub amount: String,

    /// Lifetime of the posted remainder, in blocks
    #[arg(long, default_value_t = DEFAULT_EXPIRY_BLOCKS)]
    pub expiry_blocks: u64,

    /// Do not post the unmatched remainder as a resting order
    #[arg(long)]
    pub no_remainder: bool,
}

impl TradeArgs {
    /// Convert CLI arguments to a match request within `market`.
    pub fn to_request(&self, market: &Market) -> Result<MatchRequest, ConfigError> {
        let price = parse_decimal("price", &self.price)?;
        let amount = parse_decimal("amount", &self.amount)?;
        Ok(MatchRequest::from_decimal(
            market,
            self.side.into(),
            price,
            amount,
        ))
    }

    pub fn to_taker_config(&self) -> TakerConfig {
        TakerConfig {
            expiry_blocks: self.expiry_blocks,
            post_remainder: !self.no_remainder,
        }
    }
}

pub fn parse_decimal(field: &str, value: &str) -> Result<UD128, ConfigError> {
    UD128::from_str(value, Context::default())
        .map_err(|_| ConfigError::InvalidDecimal(field.to_string(), value.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid decimal value for {0}: {1}")]
    InvalidDecimal(String, String),
}

#[cfg(test)]
mod tests {
    use delta_sdk::testing::{test_market, wei};
    use fastnum::udec128;

    use super::*;

    fn trade_args(price: &str, amount: &str) -> TradeArgs {
        TradeArgs {
            market: MarketArgs {
                base: delta_sdk::testing::TEST_TOKEN,
                quote: Address::ZERO,
            },
            store: PathBuf::from("orders.json"),
            side: CliSide::Buy,
            price: price.to_string(),
            amount: amount.to_string(),
            expiry_blocks: DEFAULT_EXPIRY_BLOCKS,
            no_remainder: false,
        }
    }

    #[test]
    fn test_trade_args_to_request() {
        let request = trade_args("0.0011", "2.5")
            .to_request(&test_market())
            .unwrap();
        assert_eq!(request.side, Side::Buy);
        assert_eq!(request.price, udec128!(0.0011));
        assert_eq!(request.amount, wei("2.5"));
    }

    #[test]
    fn test_invalid_price() {
        assert!(matches!(
            trade_args("abc", "1").to_request(&test_market()),
            Err(ConfigError::InvalidDecimal(field, _)) if field == "price"
        ));
    }

    #[test]
    fn test_no_remainder_flag() {
        let mut args = trade_args("1", "1");
        args.no_remainder = true;
        args.expiry_blocks = 50;
        let config = args.to_taker_config();
        assert!(!config.post_remainder);
        assert_eq!(config.expiry_blocks, 50);
    }

    #[test]
    fn test_cli_parses_trade() {
        let cli = CliConfig::try_parse_from([
            "delta",
            "trade",
            "--base",
            "0x1111111111111111111111111111111111111111",
            "--store",
            "orders.json",
            "--side",
            "sell",
            "--price",
            "0.001",
            "--amount",
            "10",
        ])
        .unwrap();
        let Command::Trade(args) = cli.command else {
            panic!("expected trade command");
        };
        assert_eq!(args.side, CliSide::Sell);
        assert_eq!(args.market.quote, Address::ZERO);
        assert_eq!(args.expiry_blocks, DEFAULT_EXPIRY_BLOCKS);
        assert!(!args.no_remainder);
    }

    #[test]
    fn test_env_config_defaults_to_mainnet_exchange() {
        let env = EnvConfig {
            chain_id: 1,
            exchange_address: None,
            private_key: String::new(),
            deployed_at_block: None,
            node_rpc_url: "http://localhost:8545".to_string(),
            timeout_seconds: None,
        };
        assert_eq!(env.exchange_address().unwrap(), MAINNET_EXCHANGE);
        assert_eq!(env.chain().unwrap().deployed_at_block(), 0);
        assert_eq!(env.timeout(), Duration::from_secs(120));
    }
}
