//! Schema definitions for the cosmoscope tables.
//!
//! Tables that must stay idempotent under height re-runs use
//! `ReplacingMergeTree`: re-inserting a row with the same ORDER BY key
//! converges to a single row at merge time, so an aborted height can be
//! replayed without duplicating state.

/// Table schema definition
pub struct TableSchema {
    pub name: &'static str,
    pub engine: &'static str,
    pub columns: &'static str,
    pub order_by: &'static str,
}

/// Names of all tables
pub const TABLES: &[&str] = &[
    "blocks",
    "transactions",
    "evidence",
    "validators",
    "validator_sets",
    "validator_records",
    "power_events",
    "analytics",
    "power_distribution",
    "chain_status",
];

/// Schema definitions for tables
pub const TABLE_SCHEMAS: &[TableSchema] = &[
    TableSchema {
        name: "blocks",
        engine: "ReplacingMergeTree()",
        columns: "height UInt64,
                 block_hash String,
                 parent_hash String,
                 proposer_address String,
                 signers Array(String),
                 precommit_count UInt32,
                 validators_count UInt32,
                 tx_count UInt32,
                 block_ts UInt64,
                 inserted_at DateTime64(3) DEFAULT now64()",
        order_by: "height",
    },
    TableSchema {
        name: "transactions",
        engine: "ReplacingMergeTree()",
        columns: "tx_hash String,
                 height UInt64,
                 processed Bool,
                 inserted_at DateTime64(3) DEFAULT now64()",
        order_by: "tx_hash",
    },
    TableSchema {
        name: "evidence",
        engine: "ReplacingMergeTree()",
        columns: "height UInt64,
                 evidence String,
                 inserted_at DateTime64(3) DEFAULT now64()",
        order_by: "height",
    },
    TableSchema {
        name: "validators",
        engine: "ReplacingMergeTree(height)",
        columns: "address String,
                 operator_address String,
                 delegator_address String,
                 consensus_pubkey String,
                 valcons_address String,
                 account_pubkey String,
                 operator_pubkey String,
                 moniker String,
                 identity String,
                 website String,
                 details String,
                 status UInt8,
                 jailed Bool,
                 tombstoned Bool,
                 voting_power Int64,
                 proposer_priority Int64,
                 uptime Float64,
                 index_offset Int64,
                 start_height Int64,
                 jailed_until String,
                 self_delegation Float64,
                 profile_url String,
                 last_seen UInt64,
                 height UInt64",
        order_by: "address",
    },
    TableSchema {
        name: "validator_sets",
        engine: "ReplacingMergeTree()",
        columns: "height UInt64,
                 addresses Array(String),
                 voting_powers Array(Int64),
                 proposer_priorities Array(Int64)",
        order_by: "height",
    },
    TableSchema {
        name: "validator_records",
        engine: "ReplacingMergeTree()",
        columns: "height UInt64,
                 address String,
                 signed Bool,
                 voting_power Int64",
        order_by: "height, address",
    },
    TableSchema {
        name: "power_events",
        engine: "ReplacingMergeTree()",
        columns: "address String,
                 height UInt64,
                 prev_voting_power Int64,
                 voting_power Int64,
                 change String,
                 block_ts UInt64",
        order_by: "address, height",
    },
    TableSchema {
        name: "analytics",
        engine: "ReplacingMergeTree()",
        columns: "height UInt64,
                 voting_power Int64,
                 avg_block_time_ms Float64,
                 time_diff_ms UInt64,
                 precommit_count UInt32,
                 block_ts UInt64",
        order_by: "height",
    },
    TableSchema {
        name: "power_distribution",
        engine: "ReplacingMergeTree()",
        columns: "height UInt64,
                 num_validators UInt32,
                 total_power Int64,
                 num_top_twenty UInt32,
                 top_twenty_power Int64,
                 num_bottom_eighty UInt32,
                 bottom_eighty_power Int64,
                 num_top_thirty_four UInt32,
                 top_thirty_four_share Float64,
                 num_bottom_sixty_six UInt32,
                 bottom_sixty_six_share Float64,
                 block_ts UInt64",
        order_by: "height",
    },
    TableSchema {
        name: "chain_status",
        engine: "ReplacingMergeTree(updated_ts)",
        columns: "chain_id String,
                 last_synced_ts UInt64,
                 avg_block_time_ms Float64,
                 total_validators UInt32,
                 signed_blocks_window Int64,
                 updated_ts UInt64",
        order_by: "chain_id",
    },
];
