use std::time::Duration;

use alloy::{providers::Provider, rpc::types::Filter, sol_types::SolEventInterface};
use futures::{Stream, stream};

use crate::{Chain, abi::exchange::Exchange::ExchangeEvents, error::DexError, types};

pub type RawEvent = types::EventContext<ExchangeEvents>;
pub type RawBlockEvents = types::BlockEvents<RawEvent>;

/// Returns stream of raw events emitted by the exchange contract,
/// batched per block, starting from the specified block.
///
/// Polls logs via the given [`Provider`] to produce strictly continuous
/// event sequence, with [`Provider`]-configured interval.
///
/// It is recommended to setup provider with
/// [`alloy::transports::layers::FallbackLayer`]
/// and/or [`alloy::transports::layers::RetryBackoffLayer`].
///
/// See [`ExchangeEvents`] for the list of possible events.
/// Blocks without exchange activity are yielded as empty batches.
pub fn raw<P, S, SFut>(
    chain: &Chain,
    provider: P,
    from: types::StateInstant,
    sleep: S,
) -> impl Stream<Item = Result<RawBlockEvents, DexError>>
where
    P: Provider,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    stream::unfold(
        (provider, from.block_number()),
        move |(provider, mut block_num)| async move {
            let filter = Filter::new()
                .address(chain.exchange())
                .from_block(block_num)
                .to_block(block_num);
            loop {
                // Some RPC providers produce an empty response instead of an
                // error for a block that does not exist yet, so the filter
                // result is checked against the tip of the chain
                let result =
                    futures::try_join!(provider.get_block_number(), provider.get_logs(&filter))
                        .map_err(DexError::from)
                        .and_then(|(head_block_num, logs)| {
                            if head_block_num < block_num {
                                return Err(DexError::InvalidRequest(
                                    "block is not available yet".to_string(),
                                ));
                            }
                            let mut events = Vec::with_capacity(logs.len());
                            let block_ts = logs.first().and_then(|l| l.block_timestamp);
                            for log in &logs {
                                events.push(RawEvent::new(
                                    log.transaction_hash.unwrap_or_default(),
                                    log.transaction_index.unwrap_or_default(),
                                    log.log_index.unwrap_or_default(),
                                    ExchangeEvents::decode_log(&log.inner)
                                        .map_err(DexError::from)?
                                        .data,
                                ));
                            }
                            Ok(RawBlockEvents::new(
                                types::StateInstant::new(block_num, block_ts.unwrap_or_default()),
                                events,
                            ))
                        });
                if result.is_ok() {
                    block_num += 1;
                    return Some((result, (provider, block_num)));
                }
                if matches!(result, Err(DexError::InvalidRequest(_))) {
                    // Block is not available yet
                    sleep(provider.client().poll_interval()).await;
                    continue;
                }
                return Some((result, (provider, block_num)));
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use alloy::{
        providers::ProviderBuilder, rpc::client::RpcClient, transports::layers::RetryBackoffLayer,
    };
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    #[ignore = "requires a mainnet RPC endpoint"]
    async fn test_stream_is_continuous() {
        let client = RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect("https://ethereum-rpc.publicnode.com")
            .await
            .unwrap();
        client.set_poll_interval(Duration::from_millis(500));
        let provider = ProviderBuilder::new().connect_client(client);

        let mainnet = Chain::mainnet();
        let from_block = 4_500_000;
        let stream = raw(
            &mainnet,
            provider,
            types::StateInstant::new(from_block, 0),
            tokio::time::sleep,
        );
        let block_results = stream.take(20).collect::<Vec<_>>().await;

        let mut block_num = from_block;
        for b in &block_results {
            let block = b.as_ref().unwrap();
            assert_eq!(block.instant().block_number(), block_num);
            for event in block.events() {
                assert!(matches!(
                    event.event(),
                    ExchangeEvents::Order(_)
                        | ExchangeEvents::Cancel(_)
                        | ExchangeEvents::Trade(_)
                        | ExchangeEvents::Deposit(_)
                        | ExchangeEvents::Withdraw(_)
                ));
            }
            block_num += 1;
        }
    }
}
