//! Per-height staged write set.

use crate::models::{
    AnalyticsRow, BlockRow, ChainStatusRow, EvidenceRow, PowerDistributionRow, PowerEventRow,
    TransactionRow, ValidatorRecordRow, ValidatorRow, ValidatorSetRow,
};

/// All rows produced while processing one height.
///
/// The per-height pipeline stages into this and nothing reaches the store
/// until the batch is written as a whole, so a failure mid-height leaves no
/// partial state behind.
#[derive(Debug, Default)]
pub struct HeightBatch {
    /// Block summary (exactly one per height on success).
    pub blocks: Vec<BlockRow>,
    /// Transaction stubs.
    pub transactions: Vec<TransactionRow>,
    /// Evidence rows.
    pub evidence: Vec<EvidenceRow>,
    /// Validator-set snapshot.
    pub validator_sets: Vec<ValidatorSetRow>,
    /// Per-signer precommit records (heights > 1).
    pub validator_records: Vec<ValidatorRecordRow>,
    /// Full validator upserts (cadence heights only).
    pub validators: Vec<ValidatorRow>,
    /// Voting-power change events.
    pub power_events: Vec<PowerEventRow>,
    /// Analytics point.
    pub analytics: Vec<AnalyticsRow>,
    /// Voting-power distribution sample (every 60 heights).
    pub distributions: Vec<PowerDistributionRow>,
    /// Chain-status upsert.
    pub chain_status: Option<ChainStatusRow>,
}

impl HeightBatch {
    /// Total number of staged rows, for logging.
    pub fn row_count(&self) -> usize {
        self.blocks.len()
            + self.transactions.len()
            + self.evidence.len()
            + self.validator_sets.len()
            + self.validator_records.len()
            + self.validators.len()
            + self.power_events.len()
            + self.analytics.len()
            + self.distributions.len()
            + usize::from(self.chain_status.is_some())
    }
}
