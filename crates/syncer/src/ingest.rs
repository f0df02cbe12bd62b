//! Block ingestion: turn one fetched block into staged rows.

use eyre::{Context, Result};
use node::BlockResult;
use primitives::tx_hash;
use storage::{BlockRow, EvidenceRow, HeightBatch, TransactionRow};

/// The parts of an ingested block the rest of the height pipeline needs.
#[derive(Debug, Clone)]
pub(crate) struct BlockSummary {
    /// Height the block was fetched at.
    pub height: u64,
    /// Chain ID from the header.
    pub chain_id: String,
    /// Block timestamp, unix ms.
    pub time_ms: u64,
    /// Precommit signer addresses, nulls and absent votes dropped.
    pub signers: Vec<String>,
    /// Raw precommit entry count, including absent votes.
    pub precommit_total: u32,
}

/// Stage the block, transaction and evidence rows for one height.
///
/// The precommits in `last_commit` finalize the previous block; they are
/// recorded against this height anyway, matching how uptime is read back.
pub(crate) fn stage_block(
    height: u64,
    fetched: &BlockResult,
    batch: &mut HeightBatch,
) -> Result<BlockSummary> {
    let header = &fetched.block.header;
    let time_ms = u64::try_from(header.time.timestamp_millis()).unwrap_or_default();

    if let Some(txs) = &fetched.block.data.txs {
        for raw in txs {
            let hash = tx_hash(raw).wrap_err("undecodable transaction payload")?;
            batch.transactions.push(TransactionRow { tx_hash: hash, height, processed: false });
        }
    }

    if let Some(evidence) = &fetched.block.evidence.evidence {
        let empty = evidence.as_array().is_some_and(Vec::is_empty);
        if !evidence.is_null() && !empty {
            batch.evidence.push(EvidenceRow {
                height,
                evidence: serde_json::to_string(evidence).wrap_err("unserializable evidence")?,
            });
        }
    }

    let raw_signatures = fetched.block.last_commit.signatures.as_deref().unwrap_or_default();
    let signers: Vec<String> = raw_signatures
        .iter()
        .flatten()
        .filter(|sig| !sig.validator_address.is_empty())
        .map(|sig| sig.validator_address.clone())
        .collect();

    batch.blocks.push(BlockRow {
        height,
        block_hash: fetched.block_id.hash.clone(),
        parent_hash: header.last_block_id.hash.clone(),
        proposer_address: header.proposer_address.clone(),
        signers: signers.clone(),
        precommit_count: signers.len() as u32,
        validators_count: signers.len() as u32,
        tx_count: batch.transactions.len() as u32,
        block_ts: time_ms,
    });

    Ok(BlockSummary {
        height,
        chain_id: header.chain_id.clone(),
        time_ms,
        signers,
        precommit_total: raw_signatures.len() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use node::{Block, BlockHeader, CommitSig};
    use node::types::{BlockData, BlockId, EvidenceData, LastCommit};
    use serde_json::json;

    fn block(txs: Option<Vec<String>>, evidence: Option<serde_json::Value>) -> BlockResult {
        BlockResult {
            block_id: BlockId { hash: "AABB".into() },
            block: Block {
                header: BlockHeader {
                    chain_id: "test-1".into(),
                    height: "9".into(),
                    time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 5).unwrap(),
                    last_block_id: BlockId { hash: "CCDD".into() },
                    proposer_address: "AAAA".into(),
                },
                data: BlockData { txs },
                evidence: EvidenceData { evidence },
                last_commit: LastCommit {
                    signatures: Some(vec![
                        Some(CommitSig { validator_address: "AAAA".into() }),
                        None,
                        Some(CommitSig { validator_address: String::new() }),
                        Some(CommitSig { validator_address: "BBBB".into() }),
                    ]),
                },
            },
        }
    }

    #[test]
    fn stages_block_row_and_filters_absent_signers() {
        let mut batch = HeightBatch::default();
        let summary = stage_block(9, &block(None, None), &mut batch).unwrap();

        assert_eq!(summary.signers, vec!["AAAA", "BBBB"]);
        assert_eq!(summary.precommit_total, 4);
        assert_eq!(summary.chain_id, "test-1");
        assert_eq!(summary.time_ms, 1_704_067_205_000);

        assert_eq!(batch.blocks.len(), 1);
        let row = &batch.blocks[0];
        assert_eq!(row.height, 9);
        assert_eq!(row.block_hash, "AABB");
        assert_eq!(row.parent_hash, "CCDD");
        assert_eq!(row.precommit_count, 2);
        assert_eq!(row.tx_count, 0);
    }

    #[test]
    fn stages_transaction_stubs_with_sha256_hashes() {
        let mut batch = HeightBatch::default();
        stage_block(9, &block(Some(vec!["YWJj".into()]), None), &mut batch).unwrap();

        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(
            batch.transactions[0].tx_hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(!batch.transactions[0].processed);
        assert_eq!(batch.blocks[0].tx_count, 1);
    }

    #[test]
    fn undecodable_transaction_fails_the_height() {
        let mut batch = HeightBatch::default();
        assert!(stage_block(9, &block(Some(vec!["!!".into()]), None), &mut batch).is_err());
    }

    #[test]
    fn empty_evidence_list_is_not_staged() {
        let mut batch = HeightBatch::default();
        stage_block(9, &block(None, Some(json!([]))), &mut batch).unwrap();
        assert!(batch.evidence.is_empty());
    }

    #[test]
    fn evidence_payload_is_stored_as_json() {
        let mut batch = HeightBatch::default();
        let payload = json!([{"type": "duplicate_vote"}]);
        stage_block(9, &block(None, Some(payload.clone())), &mut batch).unwrap();

        assert_eq!(batch.evidence.len(), 1);
        assert_eq!(batch.evidence[0].height, 9);
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&batch.evidence[0].evidence).unwrap(),
            payload
        );
    }
}
