//! Voting-power concentration metrics.
//!
//! Two views over the active validator set sorted by descending power: the
//! combined power of the top 20%-by-count versus the remaining 80%, and the
//! minimal prefix whose cumulative share of total power reaches 34% (the
//! threshold at which a coalition can halt consensus).

use serde::{Deserialize, Serialize};

/// Voting-power concentration over an active validator set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerDistribution {
    /// Number of validators considered.
    pub num_validators: u32,
    /// Total voting power of the reference set (denominator for shares).
    pub total_power: i64,
    /// ceil(20%) of the validator count.
    pub num_top_twenty: u32,
    /// Combined power of the top 20% by count.
    pub top_twenty_power: i64,
    /// Validator count outside the top 20%.
    pub num_bottom_eighty: u32,
    /// Combined power outside the top 20%.
    pub bottom_eighty_power: i64,
    /// Size of the minimal descending prefix reaching a 34% power share.
    pub num_top_thirty_four: u32,
    /// Cumulative power share of that prefix.
    pub top_thirty_four_share: f64,
    /// Validator count outside that prefix.
    pub num_bottom_sixty_six: u32,
    /// Power share outside that prefix.
    pub bottom_sixty_six_share: f64,
}

impl PowerDistribution {
    /// Compute concentration metrics.
    ///
    /// `powers` holds the active validators' voting powers in any order; the
    /// sort here is stable, so ties keep the caller's iteration order.
    /// `total_power` is the denominator for percentage shares and may exceed
    /// the sum of `powers` when inactive validators hold power.
    pub fn compute(powers: &[i64], total_power: i64) -> Self {
        let mut sorted = powers.to_vec();
        sorted.sort_by(|a, b| b.cmp(a));

        let n = sorted.len();
        let num_top_twenty = (n as f64 * 0.2).ceil() as u32;

        let mut top_twenty_power = 0i64;
        let mut bottom_eighty_power = 0i64;
        let mut num_top_thirty_four = 0u32;
        let mut top_thirty_four_share = 0f64;

        for (i, power) in sorted.iter().enumerate() {
            if (i as u32) < num_top_twenty {
                top_twenty_power += power;
            } else {
                bottom_eighty_power += power;
            }

            if top_thirty_four_share < 0.34 && total_power > 0 {
                top_thirty_four_share += *power as f64 / total_power as f64;
                num_top_thirty_four += 1;
            }
        }

        Self {
            num_validators: n as u32,
            total_power,
            num_top_twenty,
            top_twenty_power,
            num_bottom_eighty: n as u32 - num_top_twenty,
            bottom_eighty_power,
            num_top_thirty_four,
            top_thirty_four_share,
            num_bottom_sixty_six: n as u32 - num_top_thirty_four,
            bottom_sixty_six_share: if total_power > 0 { 1.0 - top_thirty_four_share } else { 0.0 },
        }
    }
}
