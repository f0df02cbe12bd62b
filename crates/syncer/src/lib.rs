//! Catch-up sync engine.
//!
//! One sync run walks every height between the store's high-water mark and
//! the chain tip. Each height is fetched, reconciled against the validator
//! roster and written as a single batch; runs are single-flight and a fetch
//! failure stops the walk at the last fully written height.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use config::{ChainOpts, Opts, SyncOpts};
use eyre::Result;
use identity::ProfileClient;
use node::NodeClient;
use storage::{
    AnalyticsRow, ChainStatusRow, ClickhouseReader, ClickhouseWriter, HeightBatch,
    ValidatorSetRow,
};
use tracing::{debug, error, info, warn};

mod analytics;
mod directory;
mod enrich;
mod ingest;
mod reconcile;
mod state;
mod uptime;

use directory::Directory;
use reconcile::RunRange;
use state::RunState;

/// Terminal status of one sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another run already holds the sync flag; nothing was done.
    AlreadySyncing,
    /// The store is already at the chain tip; nothing was done.
    UpToDate,
    /// A height failed; everything up to `last_height` is fully written.
    Stopped {
        /// Last fully written height.
        last_height: u64,
    },
    /// The run reached the chain tip it targeted.
    SyncedTo(u64),
}

/// Releases the single-flight sync flag on drop.
struct SyncGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        // lazy: constructing (and dropping) a guard on a failed exchange
        // would release a flag some other run holds
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
            .then(|| Self { flag })
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// The catch-up sync engine.
#[derive(Debug)]
pub struct Syncer {
    node: NodeClient,
    identity: ProfileClient,
    writer: ClickhouseWriter,
    reader: ClickhouseReader,
    chain: ChainOpts,
    sync: SyncOpts,
    syncing: AtomicBool,
}

impl Syncer {
    /// Build a syncer from CLI options, initializing the database schema.
    pub async fn new(opts: Opts) -> Result<Self> {
        let writer = ClickhouseWriter::new(
            opts.clickhouse.url.clone(),
            opts.clickhouse.db.clone(),
            opts.clickhouse.username.clone(),
            opts.clickhouse.password.clone(),
        )?;
        writer.init_db(opts.reset_db).await?;
        let reader = ClickhouseReader::new(
            opts.clickhouse.url,
            opts.clickhouse.db,
            opts.clickhouse.username,
            opts.clickhouse.password,
        )?;

        Ok(Self::with_components(
            NodeClient::new(opts.node.rpc_url, opts.node.lcd_url),
            ProfileClient::new(opts.identity.keybase_url),
            writer,
            reader,
            opts.chain,
            opts.sync,
        ))
    }

    /// Assemble a syncer from already-built collaborators.
    pub fn with_components(
        node: NodeClient,
        identity: ProfileClient,
        writer: ClickhouseWriter,
        reader: ClickhouseReader,
        chain: ChainOpts,
        sync: SyncOpts,
    ) -> Self {
        Self { node, identity, writer, reader, chain, sync, syncing: AtomicBool::new(false) }
    }

    /// The height the next run resumes from: the store's high-water mark, or
    /// the configured start floor when the store is empty or behind it.
    pub async fn current_height(&self) -> Result<u64> {
        let stored = self.reader.last_block_height().await?.unwrap_or_default();
        Ok(stored.max(self.sync.start_height))
    }

    /// The latest height known to the node.
    pub async fn latest_height(&self) -> Result<u64> {
        self.node.latest_height().await
    }

    /// Run one catch-up sync to the current chain tip.
    ///
    /// Single-flight: a second call while a run is in progress returns
    /// [`SyncOutcome::AlreadySyncing`] immediately. Any failure while
    /// processing a height, fetch or insert alike, stops the walk and
    /// reports the last fully written height; store failures outside the
    /// walk (resume height, run state, the end-of-run status upsert) are
    /// errors.
    pub async fn run_sync(&self) -> Result<SyncOutcome> {
        let Some(_guard) = SyncGuard::acquire(&self.syncing) else {
            return Ok(SyncOutcome::AlreadySyncing);
        };

        let current = self.current_height().await?;
        let tip = match self.node.latest_height().await {
            Ok(tip) => tip,
            Err(err) => {
                error!(err = %err, "chain tip unavailable");
                return Ok(SyncOutcome::Stopped { last_height: current });
            }
        };
        if tip <= current {
            return Ok(SyncOutcome::UpToDate);
        }

        info!(current, tip, "starting catch-up sync");
        let directory = match Directory::build(&self.node, &self.chain.bech32_prefix).await {
            Ok(directory) => directory,
            Err(err) => {
                error!(err = %err, "validator directory unavailable");
                return Ok(SyncOutcome::Stopped { last_height: current });
            }
        };
        if directory.is_empty() {
            warn!("staking listings returned no usable validators");
        }
        info!(candidates = directory.len(), "validator directory built");

        let mut state =
            RunState::load(&self.reader, &self.chain.chain_id, self.sync.default_block_time_ms)
                .await?;
        let range = RunRange { first: current + 1, last: tip };

        for height in range.first..=range.last {
            if let Err(err) = self.process_height(height, range, &directory, &mut state).await {
                error!(height, err = %err, "stopping sync run");
                return Ok(SyncOutcome::Stopped { last_height: height - 1 });
            }
        }

        self.writer
            .upsert_chain_status(&self.chain_status(&self.chain.chain_id, &state, &directory))
            .await?;
        info!(tip, "sync run complete");
        Ok(SyncOutcome::SyncedTo(tip))
    }

    /// Process one height: fetch, stage every row it produces and write the
    /// batch. The run-state history pointers advance only after the write.
    async fn process_height(
        &self,
        height: u64,
        range: RunRange,
        directory: &Directory,
        state: &mut RunState,
    ) -> Result<()> {
        let fetched = self.node.block(height).await?;
        let snapshot = self.node.validator_set(height).await?;

        let mut batch = HeightBatch::default();
        let block = ingest::stage_block(height, &fetched, &mut batch)?;

        batch.validator_sets.push(ValidatorSetRow {
            height,
            addresses: snapshot.iter().map(|e| e.address.clone()).collect(),
            voting_powers: snapshot.iter().map(|e| e.voting_power).collect(),
            proposer_priorities: snapshot.iter().map(|e| e.proposer_priority).collect(),
        });

        let first_seen: Vec<String> = directory
            .iter()
            .map(|(address, _)| address)
            .filter(|a| !state.known.contains(*a) && !state.latest_powers.contains_key(*a))
            .cloned()
            .collect();
        enrich::profile_new_validators(&self.identity, directory, &first_seen, state).await;
        if height == range.first
            || (self.sync.enrichment_window > 0 && height % self.sync.enrichment_window == 0)
        {
            enrich::refresh_all(&self.node, &self.identity, directory, state).await;
        }

        let outcome = reconcile::reconcile(
            range,
            self.sync.validator_update_window,
            directory,
            &snapshot,
            &block,
            state,
            &mut batch,
        );

        if range.is_upsert_height(height, self.sync.validator_update_window) {
            if let Err(err) = uptime::refresh(&self.node, directory, state).await {
                error!(height, err = %err, "uptime refresh failed");
            }
            uptime::apply(state, &mut batch.validators);
        }

        let (avg, diff) = analytics::observe_block_time(
            state,
            height,
            block.time_ms,
            self.sync.default_block_time_ms,
        );
        batch.analytics.push(AnalyticsRow {
            height,
            voting_power: outcome.total_power,
            avg_block_time_ms: avg,
            time_diff_ms: diff,
            precommit_count: block.precommit_total,
            block_ts: block.time_ms,
        });

        if analytics::is_sample_height(height) {
            batch.distributions.push(analytics::distribution_row(
                height,
                block.time_ms,
                directory,
                state,
                outcome.total_power,
            ));
        }

        batch.chain_status = Some(self.chain_status(&block.chain_id, state, directory));

        debug!(height, rows = batch.row_count(), "writing height batch");
        self.writer.insert_height_batch(&batch).await?;

        for (address, power) in outcome.power_updates {
            state.latest_powers.insert(address, power);
        }
        state.known.extend(outcome.new_addresses);
        Ok(())
    }

    fn chain_status(
        &self,
        chain_id: &str,
        state: &RunState,
        directory: &Directory,
    ) -> ChainStatusRow {
        ChainStatusRow {
            chain_id: chain_id.to_owned(),
            last_synced_ts: state.last_synced_ts.unwrap_or_default(),
            avg_block_time_ms: state.avg_block_time_ms,
            total_validators: directory.len() as u32,
            signed_blocks_window: state.signed_blocks_window,
            updated_ts: u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default(),
        }
    }
}
