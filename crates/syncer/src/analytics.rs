//! Per-height analytics: running average block time and periodic
//! voting-power concentration samples.

use primitives::{PowerDistribution, running_average};
use storage::PowerDistributionRow;

use crate::{directory::Directory, state::RunState};

/// Heights between voting-power distribution samples.
pub(crate) const DISTRIBUTION_WINDOW: u64 = 60;

/// Bond status code for an active validator.
const BONDED: u8 = 3;

/// Whether `height` is a distribution sample height.
pub(crate) const fn is_sample_height(height: u64) -> bool {
    height % DISTRIBUTION_WINDOW == 1
}

/// Fold one block's timestamp into the running average.
///
/// Returns the updated average and the gap to the previously synced block.
/// The first block ever synced has no predecessor, so it contributes the
/// configured default block time and a zero gap.
pub(crate) fn observe_block_time(
    state: &mut RunState,
    height: u64,
    block_ts: u64,
    default_block_time_ms: u64,
) -> (f64, u64) {
    let (avg, diff) = match state.last_synced_ts {
        Some(prev) => {
            let diff = block_ts.abs_diff(prev);
            (running_average(state.avg_block_time_ms, height, diff as f64), diff)
        }
        None => (default_block_time_ms as f64, 0),
    };
    state.avg_block_time_ms = avg;
    state.last_synced_ts = Some(block_ts);
    (avg, diff)
}

/// Build a voting-power concentration sample over the active set.
///
/// Only bonded, non-jailed candidates count; their powers come from the
/// current height's snapshot held in the run state.
pub(crate) fn distribution_row(
    height: u64,
    block_ts: u64,
    directory: &Directory,
    state: &RunState,
    total_power: i64,
) -> PowerDistributionRow {
    let powers: Vec<i64> = directory
        .iter()
        .filter(|(_, v)| v.status == BONDED && !v.jailed)
        .map(|(address, _)| state.current.get(address).map_or(0, |&(power, _)| power))
        .collect();
    let distribution = PowerDistribution::compute(&powers, total_power);

    PowerDistributionRow {
        height,
        num_validators: distribution.num_validators,
        total_power: distribution.total_power,
        num_top_twenty: distribution.num_top_twenty,
        top_twenty_power: distribution.top_twenty_power,
        num_bottom_eighty: distribution.num_bottom_eighty,
        bottom_eighty_power: distribution.bottom_eighty_power,
        num_top_thirty_four: distribution.num_top_thirty_four,
        top_thirty_four_share: distribution.top_thirty_four_share,
        num_bottom_sixty_six: distribution.num_bottom_sixty_six,
        bottom_sixty_six_share: distribution.bottom_sixty_six_share,
        block_ts,
    }
}
