//! Row models for the cosmoscope tables.
//!
//! Hashes and consensus addresses are stored as uppercase hex strings;
//! bech32-encoded keys as-is. Timestamps are unix milliseconds.

use clickhouse::Row;
use serde::{Deserialize, Serialize};

/// Direction of a voting-power change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerChange {
    /// First appearance of a validator.
    Add,
    /// Voting power increased.
    Up,
    /// Voting power decreased.
    Down,
    /// Validator left the active set.
    Remove,
}

impl PowerChange {
    /// Stored string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Up => "up",
            Self::Down => "down",
            Self::Remove => "remove",
        }
    }
}

/// One block summary; written exactly once per height.
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockRow {
    /// Height (unique key).
    pub height: u64,
    /// Block hash.
    pub block_hash: String,
    /// Hash of the previous block.
    pub parent_hash: String,
    /// Hex consensus address of the proposer.
    pub proposer_address: String,
    /// Ordered precommit signer addresses (nulls skipped).
    pub signers: Vec<String>,
    /// Number of non-null precommits.
    pub precommit_count: u32,
    /// Validator-participation count.
    pub validators_count: u32,
    /// Number of transactions in the block.
    pub tx_count: u32,
    /// Block timestamp, unix ms.
    pub block_ts: u64,
}

/// Transaction stub; decoding is a downstream collaborator's job.
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionRow {
    /// sha256 of the raw transaction bytes, lowercase hex.
    pub tx_hash: String,
    /// Height the transaction appeared at.
    pub height: u64,
    /// Whether a downstream decoder has processed it; always false here.
    pub processed: bool,
}

/// Double-sign evidence attached to a block.
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceRow {
    /// Height of the block carrying the evidence.
    pub height: u64,
    /// Raw evidence payload as JSON.
    pub evidence: String,
}

/// Full validator record, upserted by consensus address.
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq)]
pub struct ValidatorRow {
    /// Derived hex consensus address (stable key).
    pub address: String,
    /// Bech32 operator (`valoper`) address.
    pub operator_address: String,
    /// Bech32 self-delegation account address.
    pub delegator_address: String,
    /// Base64 consensus public key.
    pub consensus_pubkey: String,
    /// Bech32 `valcons` address.
    pub valcons_address: String,
    /// Bech32-encoded account public key.
    pub account_pubkey: String,
    /// Bech32-encoded operator public key.
    pub operator_pubkey: String,
    /// Display name.
    pub moniker: String,
    /// Identity reference (Keybase key suffix).
    pub identity: String,
    /// Website.
    pub website: String,
    /// Free-form details.
    pub details: String,
    /// Bond status: 1 unbonded, 2 unbonding, 3 bonded.
    pub status: u8,
    /// Jailed flag.
    pub jailed: bool,
    /// Tombstoned for double signing.
    pub tombstoned: bool,
    /// Voting power at `height`.
    pub voting_power: i64,
    /// Proposer priority at `height`.
    pub proposer_priority: i64,
    /// Uptime percentage over the signed-blocks window.
    pub uptime: f64,
    /// Index offset from signing info.
    pub index_offset: i64,
    /// Start height from signing info.
    pub start_height: i64,
    /// RFC3339 jailed-until timestamp.
    pub jailed_until: String,
    /// Self-delegation ratio (own shares / total shares).
    pub self_delegation: f64,
    /// Avatar URL resolved from the identity reference.
    pub profile_url: String,
    /// Last precommit timestamp, unix ms.
    pub last_seen: u64,
    /// Height this row was written at (replacing-merge version).
    pub height: u64,
}

/// Validator set observed at a height, write-once.
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidatorSetRow {
    /// Height.
    pub height: u64,
    /// Hex consensus addresses in node order.
    pub addresses: Vec<String>,
    /// Voting powers, parallel to `addresses`.
    pub voting_powers: Vec<i64>,
    /// Proposer priorities, parallel to `addresses`.
    pub proposer_priorities: Vec<i64>,
}

/// Per-(height, signer) precommit presence, for uptime windows.
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidatorRecordRow {
    /// Height.
    pub height: u64,
    /// Hex consensus address of the signer.
    pub address: String,
    /// Whether the validator signed this block.
    pub signed: bool,
    /// Voting power at this height (0 when absent from the snapshot).
    pub voting_power: i64,
}

/// Append-only voting-power change event; emitted only on value change.
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq, Eq)]
pub struct PowerEventRow {
    /// Hex consensus address.
    pub address: String,
    /// Height of the change.
    pub height: u64,
    /// Voting power before the change.
    pub prev_voting_power: i64,
    /// Voting power after the change.
    pub voting_power: i64,
    /// Change kind: add, up, down or remove.
    pub change: String,
    /// Block timestamp, unix ms.
    pub block_ts: u64,
}

/// Per-height running statistics.
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsRow {
    /// Height.
    pub height: u64,
    /// Total active voting power across the directory.
    pub voting_power: i64,
    /// Running average block time, ms.
    pub avg_block_time_ms: f64,
    /// Gap to the previously synced block, ms.
    pub time_diff_ms: u64,
    /// Raw precommit entry count (including absent votes).
    pub precommit_count: u32,
    /// Block timestamp, unix ms.
    pub block_ts: u64,
}

/// Voting-power concentration sample.
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq)]
pub struct PowerDistributionRow {
    /// Height of the sample.
    pub height: u64,
    /// Number of active validators considered.
    pub num_validators: u32,
    /// Total voting power (denominator for shares).
    pub total_power: i64,
    /// ceil(20%) of the validator count.
    pub num_top_twenty: u32,
    /// Combined power of the top 20% by count.
    pub top_twenty_power: i64,
    /// Validator count outside the top 20%.
    pub num_bottom_eighty: u32,
    /// Combined power outside the top 20%.
    pub bottom_eighty_power: i64,
    /// Size of the minimal prefix reaching a 34% share.
    pub num_top_thirty_four: u32,
    /// Cumulative share of that prefix.
    pub top_thirty_four_share: f64,
    /// Validator count outside that prefix.
    pub num_bottom_sixty_six: u32,
    /// Power share outside that prefix.
    pub bottom_sixty_six_share: f64,
    /// Block timestamp, unix ms.
    pub block_ts: u64,
}

/// Chain status singleton, keyed by chain ID.
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq)]
pub struct ChainStatusRow {
    /// Chain ID.
    pub chain_id: String,
    /// Timestamp of the last synced block, unix ms.
    pub last_synced_ts: u64,
    /// Running average block time, ms.
    pub avg_block_time_ms: f64,
    /// Total candidate validators known to the last run.
    pub total_validators: u32,
    /// Signed-blocks window from the slashing params.
    pub signed_blocks_window: i64,
    /// Wall-clock write time, unix ms (replacing-merge version).
    pub updated_ts: u64,
}
