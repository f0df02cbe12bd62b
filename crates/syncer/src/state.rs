//! In-memory state carried across the heights of one sync run.

use std::collections::{HashMap, HashSet};

use eyre::Result;
use storage::ClickhouseReader;

/// Per-validator enrichment collected from best-effort collaborators.
///
/// Flows into full validator rows at upsert heights; absent values keep their
/// zero defaults.
#[derive(Debug, Clone, Default)]
pub(crate) struct Enrichment {
    pub uptime: f64,
    pub tombstoned: bool,
    pub jailed_until: String,
    pub index_offset: i64,
    pub start_height: i64,
    pub self_delegation: f64,
    pub profile_url: Option<String>,
    pub last_seen: Option<u64>,
}

/// Mutable state of one sync run.
///
/// The history pointers (`latest_powers`, `known`) only advance after a
/// height's batch has been written, so an aborted height replays with the
/// same inputs.
#[derive(Debug, Default)]
pub(crate) struct RunState {
    /// Last written voting power per address, from the power-events history.
    pub latest_powers: HashMap<String, i64>,
    /// Addresses that already have a validator row.
    pub known: HashSet<String>,
    /// Voting power and proposer priority at the height being processed.
    pub current: HashMap<String, (i64, i64)>,
    /// Running average block time, ms.
    pub avg_block_time_ms: f64,
    /// Timestamp of the previously synced block, unix ms.
    pub last_synced_ts: Option<u64>,
    /// Signed-blocks window from the last slashing-params fetch.
    pub signed_blocks_window: i64,
    /// Best-effort per-validator enrichment.
    pub enrichment: HashMap<String, Enrichment>,
}

impl RunState {
    /// Seed the run state from the store.
    pub async fn load(
        reader: &ClickhouseReader,
        chain_id: &str,
        default_block_time_ms: u64,
    ) -> Result<Self> {
        let latest_powers = reader.latest_powers().await?;
        let known = reader.known_validators().await?;
        let status = reader.chain_status(chain_id).await?;

        let mut state = Self {
            latest_powers,
            known,
            avg_block_time_ms: default_block_time_ms as f64,
            ..Self::default()
        };
        if let Some(status) = status {
            state.avg_block_time_ms = status.avg_block_time_ms;
            state.last_synced_ts =
                (status.last_synced_ts > 0).then_some(status.last_synced_ts);
            state.signed_blocks_window = status.signed_blocks_window;
        }
        Ok(state)
    }

    /// Enrichment for `address`, or defaults when none was collected.
    pub fn enrichment(&self, address: &str) -> Enrichment {
        self.enrichment.get(address).cloned().unwrap_or_default()
    }
}
