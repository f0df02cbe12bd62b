//! Typed accessor over a Cosmos node's Tendermint RPC and LCD REST surfaces.
//!
//! Every method is a read-only GET returning JSON. A non-success status or an
//! unparseable body is a fetch failure for that call; callers decide whether
//! that aborts a sync run or is best-effort enrichment.

use derive_more::Debug;
use eyre::{Context, Result, bail};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

pub mod types;

pub use types::{
    Block, BlockHeader, BlockResult, BondStatus, CommitSig, SetEntry, SigningInfo,
    StakingValidator,
};
use types::{
    BlockResponse, DelegationsResponse, SigningInfoResponse, SlashingParamsResponse,
    StakingValidatorsResponse, StatusResponse, ValidatorSetResponse,
};

/// Validator-set page size for `/validators` queries.
const SET_PAGE_SIZE: u64 = 100;
/// Page size for LCD staking listings.
const STAKING_PAGE_SIZE: u64 = 200;

/// Client for a chain node's RPC and LCD endpoints.
#[derive(Clone, Debug)]
pub struct NodeClient {
    #[debug(skip)]
    http: HttpClient,
    rpc_url: String,
    lcd_url: String,
}

impl NodeClient {
    /// Create a new node client for the given endpoints.
    pub fn new(rpc_url: Url, lcd_url: Url) -> Self {
        Self {
            http: HttpClient::new(),
            rpc_url: rpc_url.as_str().trim_end_matches('/').to_owned(),
            lcd_url: lcd_url.as_str().trim_end_matches('/').to_owned(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        debug!(url = %url, "node query");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .wrap_err_with(|| format!("node unreachable: {url}"))?
            .error_for_status()
            .wrap_err_with(|| format!("non-success status from {url}"))?;
        resp.json::<T>().await.wrap_err_with(|| format!("malformed response from {url}"))
    }

    /// Latest height known to the node, from `/status`.
    pub async fn latest_height(&self) -> Result<u64> {
        let status: StatusResponse = self.get_json(format!("{}/status", self.rpc_url)).await?;
        status
            .result
            .sync_info
            .latest_block_height
            .parse()
            .wrap_err("invalid latest_block_height")
    }

    /// Fetch the block at `height`.
    pub async fn block(&self, height: u64) -> Result<BlockResult> {
        let resp: BlockResponse =
            self.get_json(format!("{}/block?height={height}", self.rpc_url)).await?;
        Ok(resp.result)
    }

    /// Fetch the full validator set at `height`, following pagination until
    /// the reported total is reached.
    ///
    /// Progress is measured by entries actually received, not the page's
    /// self-reported count; a page that contributes nothing while the total
    /// is still short is a fetch failure rather than a stalled loop.
    pub async fn validator_set(&self, height: u64) -> Result<Vec<SetEntry>> {
        let mut entries = Vec::new();
        let mut page = 1u64;
        loop {
            let resp: ValidatorSetResponse = self
                .get_json(format!(
                    "{}/validators?height={height}&page={page}&per_page={SET_PAGE_SIZE}",
                    self.rpc_url
                ))
                .await?;
            let total: u64 = resp.result.total.parse().wrap_err("invalid validator total")?;
            let received = resp.result.validators.len();

            for raw in resp.result.validators {
                entries.push(SetEntry {
                    address: raw.address,
                    voting_power: raw
                        .voting_power
                        .parse()
                        .wrap_err("invalid voting_power")?,
                    proposer_priority: raw.proposer_priority.parse().unwrap_or_default(),
                });
            }

            if (entries.len() as u64) >= total {
                break;
            }
            if received == 0 {
                bail!(
                    "validator set for height {height} ended early: page {page} \
                     was empty with {} of {total} entries",
                    entries.len()
                );
            }
            page += 1;
        }
        Ok(entries)
    }

    /// List staking validators with the given bond status, following LCD
    /// key-based pagination.
    pub async fn validators_by_status(&self, status: BondStatus) -> Result<Vec<StakingValidator>> {
        let mut validators = Vec::new();
        let mut next_key: Option<String> = None;
        loop {
            let mut url = format!(
                "{}/cosmos/staking/v1beta1/validators?status={}&pagination.limit={STAKING_PAGE_SIZE}",
                self.lcd_url,
                status.query_value()
            );
            if let Some(key) = &next_key {
                url.push_str("&pagination.key=");
                url.push_str(key);
            }
            let resp: StakingValidatorsResponse = self.get_json(url).await?;
            validators.extend(resp.validators);

            next_key = resp.pagination.and_then(|p| p.next_key).filter(|k| !k.is_empty());
            if next_key.is_none() {
                break;
            }
        }
        Ok(validators)
    }

    /// Signed-blocks window from the slashing parameters.
    pub async fn signed_blocks_window(&self) -> Result<i64> {
        let resp: SlashingParamsResponse =
            self.get_json(format!("{}/cosmos/slashing/v1beta1/params", self.lcd_url)).await?;
        resp.params.signed_blocks_window.parse().wrap_err("invalid signed_blocks_window")
    }

    /// Signing info for a bech32 `valcons` address, or `None` when the node
    /// has no record for it.
    pub async fn signing_info(&self, valcons_address: &str) -> Result<Option<SigningInfo>> {
        let resp: SigningInfoResponse = self
            .get_json(format!(
                "{}/cosmos/slashing/v1beta1/signing_infos/{valcons_address}",
                self.lcd_url
            ))
            .await?;
        let Some(raw) = resp.val_signing_info else { return Ok(None) };
        Ok(Some(SigningInfo {
            start_height: raw.start_height.parse().unwrap_or_default(),
            index_offset: raw.index_offset.parse().unwrap_or_default(),
            jailed_until: raw.jailed_until,
            tombstoned: raw.tombstoned,
            missed_blocks_counter: raw
                .missed_blocks_counter
                .parse()
                .wrap_err("invalid missed_blocks_counter")?,
        }))
    }

    /// Shares of the first delegation held by `delegator_address`, used for
    /// the self-delegation ratio. `None` when there are no delegations.
    pub async fn self_delegation(&self, delegator_address: &str) -> Result<Option<f64>> {
        let resp: DelegationsResponse = self
            .get_json(format!(
                "{}/cosmos/staking/v1beta1/delegations/{delegator_address}",
                self.lcd_url
            ))
            .await?;
        let Some(first) = resp.delegation_responses.into_iter().next() else {
            return Ok(None);
        };
        Ok(Some(first.delegation.shares.parse().unwrap_or_default()))
    }
}
