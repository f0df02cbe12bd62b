//! `ClickHouse` reader: the handful of queries the sync engine needs to
//! resume from the store.

use std::collections::{HashMap, HashSet};

use clickhouse::{Client, Row, sql::Identifier};
use derive_more::Debug;
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::models::ChainStatusRow;

#[derive(Row, Serialize, Deserialize)]
struct MaxHeight {
    height: u64,
}

#[derive(Row, Serialize, Deserialize)]
struct LatestPower {
    address: String,
    voting_power: i64,
}

#[derive(Row, Serialize, Deserialize)]
struct AddressRow {
    address: String,
}

/// `ClickHouse` reader client for cosmoscope (read-only operations)
#[derive(Clone, Debug)]
pub struct ClickhouseReader {
    /// Base client
    #[debug(skip)]
    base: Client,
    /// Database name
    db_name: String,
}

impl ClickhouseReader {
    /// Create a new `ClickHouse` reader client
    pub fn new(url: Url, db_name: String, username: String, password: String) -> Result<Self> {
        let client = Client::default().with_url(url).with_user(username).with_password(password);
        Ok(Self { base: client, db_name })
    }

    /// Highest stored block height, or `None` when the store is empty.
    pub async fn last_block_height(&self) -> Result<Option<u64>> {
        let sql = "SELECT max(height) AS height FROM ?.blocks";
        let rows = self
            .base
            .query(sql)
            .bind(Identifier(&self.db_name))
            .fetch_all::<MaxHeight>()
            .await?;
        debug!(rows = rows.len(), "fetched max block height");

        match rows.into_iter().next() {
            // max() over an empty table yields 0, which is never a real height
            Some(row) if row.height > 0 => Ok(Some(row.height)),
            _ => Ok(None),
        }
    }

    /// Most recent voting power per address, from the power-events history.
    ///
    /// Seeds the reconciler's in-memory "latest power" pointers once per run;
    /// the run keeps them current itself.
    pub async fn latest_powers(&self) -> Result<HashMap<String, i64>> {
        let sql = "SELECT address, argMax(voting_power, height) AS voting_power \
                   FROM ?.power_events GROUP BY address";
        let rows = self
            .base
            .query(sql)
            .bind(Identifier(&self.db_name))
            .fetch_all::<LatestPower>()
            .await?;
        debug!(rows = rows.len(), "fetched latest powers");

        Ok(rows.into_iter().map(|r| (r.address, r.voting_power)).collect())
    }

    /// Addresses that already have a validator row.
    pub async fn known_validators(&self) -> Result<HashSet<String>> {
        let sql = "SELECT DISTINCT address FROM ?.validators";
        let rows = self
            .base
            .query(sql)
            .bind(Identifier(&self.db_name))
            .fetch_all::<AddressRow>()
            .await?;
        debug!(rows = rows.len(), "fetched known validator addresses");

        Ok(rows.into_iter().map(|r| r.address).collect())
    }

    /// Latest chain-status row for `chain_id`, if one exists.
    pub async fn chain_status(&self, chain_id: &str) -> Result<Option<ChainStatusRow>> {
        let sql = "SELECT chain_id, last_synced_ts, avg_block_time_ms, total_validators, \
                   signed_blocks_window, updated_ts \
                   FROM ?.chain_status WHERE chain_id = ? ORDER BY updated_ts DESC LIMIT 1";
        let rows = self
            .base
            .query(sql)
            .bind(Identifier(&self.db_name))
            .bind(chain_id)
            .fetch_all::<ChainStatusRow>()
            .await?;

        Ok(rows.into_iter().next())
    }
}
