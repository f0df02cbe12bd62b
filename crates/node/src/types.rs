//! Wire types for the Tendermint RPC and Cosmos LCD surfaces.
//!
//! Cosmos endpoints return most numerics as JSON strings; the raw DTOs keep
//! them as `String` and the client parses at the edge.

use chrono::{DateTime, Utc};
use serde::Deserialize;

// ----- Tendermint RPC: /status -----

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub result: StatusResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResult {
    pub sync_info: SyncInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SyncInfo {
    pub latest_block_height: String,
}

// ----- Tendermint RPC: /block -----

#[derive(Debug, Deserialize)]
pub(crate) struct BlockResponse {
    pub result: BlockResult,
}

/// A block as returned by the node, with its canonical hash.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockResult {
    /// Canonical block ID (hash of this block).
    pub block_id: BlockId,
    /// Block contents.
    pub block: Block,
}

/// Block ID wrapper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockId {
    /// Uppercase hex block hash.
    #[serde(default)]
    pub hash: String,
}

/// Block body: header, transactions, evidence and the previous block's
/// commit.
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    /// Block header.
    pub header: BlockHeader,
    /// Raw transaction payloads.
    #[serde(default)]
    pub data: BlockData,
    /// Double-sign evidence, if any.
    #[serde(default)]
    pub evidence: EvidenceData,
    /// Precommit signatures finalizing the previous block.
    #[serde(default)]
    pub last_commit: LastCommit,
}

/// Block header fields consumed by the sync engine.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    /// Chain ID.
    pub chain_id: String,
    /// Height as a decimal string.
    pub height: String,
    /// Block timestamp.
    pub time: DateTime<Utc>,
    /// ID of the previous block.
    #[serde(default)]
    pub last_block_id: BlockId,
    /// Hex consensus address of the proposer.
    #[serde(default)]
    pub proposer_address: String,
}

/// Raw base64 transaction payloads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockData {
    /// Base64-encoded transactions.
    #[serde(default)]
    pub txs: Option<Vec<String>>,
}

/// Evidence container; the payload is kept opaque.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvidenceData {
    /// Raw evidence list.
    #[serde(default)]
    pub evidence: Option<serde_json::Value>,
}

/// The signature set over the previous block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastCommit {
    /// Signature entries; absent votes appear as nulls or empty addresses.
    #[serde(default)]
    pub signatures: Option<Vec<Option<CommitSig>>>,
}

/// One precommit signature entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitSig {
    /// Hex consensus address of the signer; empty when the vote is absent.
    #[serde(default)]
    pub validator_address: String,
}

// ----- Tendermint RPC: /validators -----

#[derive(Debug, Deserialize)]
pub(crate) struct ValidatorSetResponse {
    pub result: ValidatorSetResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidatorSetResult {
    pub validators: Vec<RawSetEntry>,
    pub total: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSetEntry {
    pub address: String,
    pub voting_power: String,
    #[serde(default)]
    pub proposer_priority: String,
}

/// One member of the validator set at a given height, numerics parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetEntry {
    /// Hex consensus address.
    pub address: String,
    /// Voting power.
    pub voting_power: i64,
    /// Proposer priority.
    pub proposer_priority: i64,
}

// ----- Cosmos LCD: staking validators -----

#[derive(Debug, Deserialize)]
pub(crate) struct StakingValidatorsResponse {
    #[serde(default)]
    pub validators: Vec<StakingValidator>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Pagination {
    #[serde(default)]
    pub next_key: Option<String>,
}

/// A validator candidate from the staking module listing.
#[derive(Debug, Clone, Deserialize)]
pub struct StakingValidator {
    /// Bech32 operator (`valoper`) address.
    pub operator_address: String,
    /// Consensus public key.
    pub consensus_pubkey: ConsensusPubkey,
    /// Whether the validator is currently jailed.
    #[serde(default)]
    pub jailed: bool,
    /// Total delegator shares as a decimal string.
    #[serde(default)]
    pub delegator_shares: String,
    /// Self-declared description.
    #[serde(default)]
    pub description: ValidatorDescription,
}

/// Consensus public key material.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusPubkey {
    /// Base64-encoded key bytes.
    pub key: String,
}

/// Validator description fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidatorDescription {
    /// Display name.
    #[serde(default)]
    pub moniker: String,
    /// Keybase identity (16 hex chars) or other identity reference.
    #[serde(default)]
    pub identity: String,
    /// Website URL.
    #[serde(default)]
    pub website: String,
    /// Free-form details.
    #[serde(default)]
    pub details: String,
}

/// Bond status of a staking validator listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondStatus {
    /// Not participating, fully unbonded.
    Unbonded,
    /// Leaving the active set.
    Unbonding,
    /// Active.
    Bonded,
}

impl BondStatus {
    /// Query parameter value for the staking listing.
    pub const fn query_value(self) -> &'static str {
        match self {
            Self::Unbonded => "BOND_STATUS_UNBONDED",
            Self::Unbonding => "BOND_STATUS_UNBONDING",
            Self::Bonded => "BOND_STATUS_BONDED",
        }
    }

    /// Numeric code stored on validator rows (matches the staking module).
    pub const fn code(self) -> u8 {
        match self {
            Self::Unbonded => 1,
            Self::Unbonding => 2,
            Self::Bonded => 3,
        }
    }
}

// ----- Cosmos LCD: slashing -----

#[derive(Debug, Deserialize)]
pub(crate) struct SlashingParamsResponse {
    pub params: RawSlashingParams,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSlashingParams {
    pub signed_blocks_window: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SigningInfoResponse {
    #[serde(default)]
    pub val_signing_info: Option<RawSigningInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSigningInfo {
    #[serde(default)]
    pub start_height: String,
    #[serde(default)]
    pub index_offset: String,
    #[serde(default)]
    pub jailed_until: String,
    #[serde(default)]
    pub tombstoned: bool,
    #[serde(default)]
    pub missed_blocks_counter: String,
}

/// Per-validator signing info from the slashing module, numerics parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningInfo {
    /// Height the validator started signing at.
    pub start_height: i64,
    /// Index offset into the signed-blocks window.
    pub index_offset: i64,
    /// RFC3339 timestamp until which the validator is jailed.
    pub jailed_until: String,
    /// Whether the validator was tombstoned for double signing.
    pub tombstoned: bool,
    /// Missed blocks within the current window.
    pub missed_blocks_counter: i64,
}

// ----- Cosmos LCD: delegations -----

#[derive(Debug, Deserialize)]
pub(crate) struct DelegationsResponse {
    #[serde(default)]
    pub delegation_responses: Vec<DelegationResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DelegationResponse {
    pub delegation: Delegation,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Delegation {
    #[serde(default)]
    pub shares: String,
}
