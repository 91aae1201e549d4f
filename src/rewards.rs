//! Trading rewards leaderboard.
//!
//! Fees each trader paid in a period are weighted by a multiplier derived
//! from their staked balance, and the period's reward pool is split in
//! proportion to the weighted fees.

use alloy::primitives::Address;
use fastnum::{UD128, udec128};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Reward multiplier applied from a minimum staked balance.
#[derive(Clone, Copy, derive_more::Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    #[debug("{min_stake}")]
    pub min_stake: UD128,
    #[debug("{multiplier}")]
    pub multiplier: UD128,
}

impl Tier {
    pub fn new(min_stake: UD128, multiplier: UD128) -> Self {
        Self {
            min_stake,
            multiplier,
        }
    }
}

/// Staking tiers ordered by threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    pub fn new(tiers: impl IntoIterator<Item = Tier>) -> Self {
        Self {
            tiers: tiers
                .into_iter()
                .sorted_by(|a, b| a.min_stake.cmp(&b.min_stake))
                .collect(),
        }
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Multiplier of the highest tier reached by `stake`, 1 if none is.
    pub fn multiplier(&self, stake: UD128) -> UD128 {
        self.tiers
            .iter()
            .rev()
            .find(|t| t.min_stake <= stake)
            .map(|t| t.multiplier)
            .unwrap_or(UD128::ONE)
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::new([
            Tier::new(udec128!(0), udec128!(1.0)),
            Tier::new(udec128!(1000), udec128!(1.1)),
            Tier::new(udec128!(10000), udec128!(1.25)),
            Tier::new(udec128!(100000), udec128!(1.5)),
            Tier::new(udec128!(1000000), udec128!(2.0)),
        ])
    }
}

/// Per-trader input for a reward period.
#[derive(Clone, derive_more::Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderStats {
    pub user: Address,
    #[debug("{fees_paid}")]
    pub fees_paid: UD128,
    #[debug("{staked}")]
    #[serde(default)]
    pub staked: UD128,
}

/// Estimated reward of one trader.
#[derive(Clone, derive_more::Debug, PartialEq, Eq, Serialize)]
pub struct RewardShare {
    pub user: Address,
    #[debug("{fees_paid}")]
    pub fees_paid: UD128,
    #[debug("{multiplier}")]
    pub multiplier: UD128,
    #[debug("{weighted_fees}")]
    pub weighted_fees: UD128,
    #[debug("{share}")]
    pub share: UD128,
}

/// Splits `pool` between traders proportionally to their weighted fees.
///
/// Result is ordered by weighted fees, largest first, ties broken by
/// address. When nobody paid any fees every share is zero.
pub fn compute_shares(stats: &[TraderStats], tiers: &TierTable, pool: UD128) -> Vec<RewardShare> {
    let weighted = stats
        .iter()
        .map(|s| {
            let multiplier = tiers.multiplier(s.staked);
            (s, multiplier, s.fees_paid * multiplier)
        })
        .collect::<Vec<_>>();
    let total = weighted
        .iter()
        .fold(UD128::ZERO, |acc, (_, _, w)| acc + *w);

    weighted
        .into_iter()
        .map(|(s, multiplier, weighted_fees)| RewardShare {
            user: s.user,
            fees_paid: s.fees_paid,
            multiplier,
            weighted_fees,
            share: if total.is_zero() {
                UD128::ZERO
            } else {
                weighted_fees * pool / total
            },
        })
        .sorted_by(|a, b| {
            b.weighted_fees
                .cmp(&a.weighted_fees)
                .then_with(|| a.user.cmp(&b.user))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    const ALICE: Address = address!("0x00000000000000000000000000000000000000a1");
    const BOB: Address = address!("0x00000000000000000000000000000000000000b0");
    const CAROL: Address = address!("0x00000000000000000000000000000000000000c4");

    fn stats(user: Address, fees_paid: UD128, staked: UD128) -> TraderStats {
        TraderStats {
            user,
            fees_paid,
            staked,
        }
    }

    #[test]
    fn test_multiplier_lookup() {
        let tiers = TierTable::default();
        assert_eq!(tiers.multiplier(udec128!(0)), udec128!(1));
        assert_eq!(tiers.multiplier(udec128!(999.99)), udec128!(1));
        assert_eq!(tiers.multiplier(udec128!(1000)), udec128!(1.1));
        assert_eq!(tiers.multiplier(udec128!(50000)), udec128!(1.25));
        assert_eq!(tiers.multiplier(udec128!(5000000)), udec128!(2));
    }

    #[test]
    fn test_multiplier_below_every_threshold_is_one() {
        let tiers = TierTable::new([Tier::new(udec128!(100), udec128!(3))]);
        assert_eq!(tiers.multiplier(udec128!(99)), UD128::ONE);
        assert_eq!(tiers.multiplier(udec128!(100)), udec128!(3));
    }

    #[test]
    fn test_tiers_sorted_on_construction() {
        let tiers = TierTable::new([
            Tier::new(udec128!(10), udec128!(2)),
            Tier::new(udec128!(1), udec128!(1.5)),
        ]);
        assert_eq!(tiers.tiers()[0].min_stake, udec128!(1));
        assert_eq!(tiers.multiplier(udec128!(5)), udec128!(1.5));
        assert_eq!(tiers.multiplier(udec128!(10)), udec128!(2));
    }

    #[test]
    fn test_shares_are_proportional_to_weighted_fees() {
        let shares = compute_shares(
            &[
                stats(ALICE, udec128!(10), udec128!(0)),
                stats(BOB, udec128!(10), udec128!(1000000)),
            ],
            &TierTable::default(),
            udec128!(300),
        );

        assert_eq!(shares[0].user, BOB);
        assert_eq!(shares[0].weighted_fees, udec128!(20));
        assert_eq!(shares[0].share, udec128!(200));
        assert_eq!(shares[1].user, ALICE);
        assert_eq!(shares[1].share, udec128!(100));
    }

    #[test]
    fn test_shares_sum_to_pool() {
        let pool = udec128!(1000);
        let shares = compute_shares(
            &[
                stats(ALICE, udec128!(1), udec128!(0)),
                stats(BOB, udec128!(1), udec128!(0)),
                stats(CAROL, udec128!(1), udec128!(0)),
            ],
            &TierTable::default(),
            pool,
        );
        let total = shares.iter().fold(UD128::ZERO, |acc, s| acc + s.share);
        let diff = if total > pool {
            total - pool
        } else {
            pool - total
        };
        assert!(diff < udec128!(0.000000001), "total {total}");
    }

    #[test]
    fn test_zero_fees_yield_zero_shares() {
        let shares = compute_shares(
            &[
                stats(ALICE, udec128!(0), udec128!(5000)),
                stats(BOB, udec128!(0), udec128!(0)),
            ],
            &TierTable::default(),
            udec128!(100),
        );
        assert_eq!(shares.len(), 2);
        assert!(shares.iter().all(|s| s.share.is_zero()));
        // tie on weighted fees is broken by address
        assert_eq!(shares[0].user, ALICE);
    }

    #[test]
    fn test_no_traders() {
        assert!(compute_shares(&[], &TierTable::default(), udec128!(100)).is_empty());
    }
}
