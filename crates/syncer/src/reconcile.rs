//! Voting-power reconciliation between the directory, the height's
//! validator-set snapshot and the stored power history.
//!
//! Power changes are detected by comparing each candidate's snapshot power
//! against the last written power, so the event history stays compact: one
//! event per actual change, nothing on quiet heights.

use std::collections::HashMap;

use node::SetEntry;
use storage::{HeightBatch, PowerChange, PowerEventRow, ValidatorRecordRow, ValidatorRow};
use tracing::debug;

use crate::{
    directory::{Directory, DirectoryValidator},
    ingest::BlockSummary,
    state::RunState,
};

/// Height bounds of the current run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunRange {
    /// First height processed this run.
    pub first: u64,
    /// Target tip of this run.
    pub last: u64,
}

impl RunRange {
    /// Whether `height` is a full validator-row upsert height.
    pub fn is_upsert_height(self, height: u64, window: u64) -> bool {
        height == self.first || height == self.last || (window > 0 && height % window == 0)
    }
}

/// What reconciliation decided for one height.
///
/// The power updates and new addresses are deferred: the caller folds them
/// into the run state only after the height's batch has been written.
#[derive(Debug, Default)]
pub(crate) struct ReconcileOutcome {
    /// Sum of snapshot voting power across directory members.
    pub total_power: i64,
    /// (address, new power) pairs behind the staged events.
    pub power_updates: Vec<(String, i64)>,
    /// Addresses seen for the first time this height.
    pub new_addresses: Vec<String>,
}

/// Reconcile one height: stage power events, per-signer records and (on
/// cadence heights) full validator rows.
pub(crate) fn reconcile(
    range: RunRange,
    update_window: u64,
    directory: &Directory,
    snapshot: &[SetEntry],
    block: &BlockSummary,
    state: &mut RunState,
    batch: &mut HeightBatch,
) -> ReconcileOutcome {
    let height = block.height;
    let by_address: HashMap<&str, &SetEntry> =
        snapshot.iter().map(|e| (e.address.as_str(), e)).collect();

    let mut outcome = ReconcileOutcome::default();
    let upsert = range.is_upsert_height(height, update_window);

    for (address, validator) in directory.iter() {
        let entry = by_address.get(address.as_str());
        let power = entry.map_or(0, |e| e.voting_power);
        let priority = entry.map_or(0, |e| e.proposer_priority);
        state.current.insert(address.clone(), (power, priority));
        outcome.total_power += power;

        let is_new =
            !state.known.contains(address) && !state.latest_powers.contains_key(address);
        let change = if is_new {
            outcome.new_addresses.push(address.clone());
            Some((PowerChange::Add, 0))
        } else if entry.is_some() {
            match state.latest_powers.get(address) {
                Some(&prev) if prev > power => Some((PowerChange::Down, prev)),
                Some(&prev) if prev < power => Some((PowerChange::Up, prev)),
                // unchanged, or a known validator with no event history yet
                _ => None,
            }
        } else {
            match state.latest_powers.get(address) {
                Some(&prev) if prev > 0 => Some((PowerChange::Remove, prev)),
                _ => None,
            }
        };

        if let Some((kind, prev)) = change {
            debug!(address = %address, ?kind, prev, power, height, "power change");
            batch.power_events.push(PowerEventRow {
                address: address.clone(),
                height,
                prev_voting_power: prev,
                voting_power: power,
                change: kind.as_str().to_owned(),
                block_ts: block.time_ms,
            });
            outcome.power_updates.push((address.clone(), power));
        }

        if upsert {
            batch.validators.push(validator_row(validator, power, priority, height, state));
        }
    }

    // last_commit precommits finalize the previous block; height 1 has none
    if height > 1 {
        for signer in &block.signers {
            let power = by_address.get(signer.as_str()).map_or(0, |e| e.voting_power);
            batch.validator_records.push(ValidatorRecordRow {
                height,
                address: signer.clone(),
                signed: true,
                voting_power: power,
            });
            state.enrichment.entry(signer.clone()).or_default().last_seen =
                Some(block.time_ms);
        }
    }

    outcome
}

/// Build a full validator row from the directory entry, the height's power
/// figures and the collected enrichment.
pub(crate) fn validator_row(
    validator: &DirectoryValidator,
    voting_power: i64,
    proposer_priority: i64,
    height: u64,
    state: &RunState,
) -> ValidatorRow {
    let enrichment = state.enrichment(&validator.address);
    ValidatorRow {
        address: validator.address.clone(),
        operator_address: validator.operator_address.clone(),
        delegator_address: validator.delegator_address.clone(),
        consensus_pubkey: validator.consensus_pubkey.clone(),
        valcons_address: validator.valcons_address.clone(),
        account_pubkey: validator.account_pubkey.clone(),
        operator_pubkey: validator.operator_pubkey.clone(),
        moniker: validator.moniker.clone(),
        identity: validator.identity.clone(),
        website: validator.website.clone(),
        details: validator.details.clone(),
        status: validator.status,
        jailed: validator.jailed,
        tombstoned: enrichment.tombstoned,
        voting_power,
        proposer_priority,
        uptime: enrichment.uptime,
        index_offset: enrichment.index_offset,
        start_height: enrichment.start_height,
        jailed_until: enrichment.jailed_until,
        self_delegation: enrichment.self_delegation,
        profile_url: enrichment.profile_url.unwrap_or_default(),
        last_seen: enrichment.last_seen.unwrap_or_default(),
        height,
    }
}
