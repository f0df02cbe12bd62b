//! Uptime refresh from the slashing module.
//!
//! Runs on the validator-upsert cadence, after rows for the height have been
//! staged: the freshly fetched signing info is patched onto the staged rows
//! so the upsert carries current uptime figures.

use eyre::Result;
use futures::{StreamExt, stream};
use node::NodeClient;
use storage::ValidatorRow;
use tracing::{debug, warn};

use crate::{directory::Directory, state::RunState};

/// Concurrent in-flight signing-info lookups.
const LOOKUP_CONCURRENCY: usize = 16;

/// Refresh the signed-blocks window and per-validator signing info.
///
/// A failed slashing-params fetch fails the refresh (the caller logs and
/// moves on); per-validator failures only skip that validator.
pub(crate) async fn refresh(
    node: &NodeClient,
    directory: &Directory,
    state: &mut RunState,
) -> Result<()> {
    let window = node.signed_blocks_window().await?;
    state.signed_blocks_window = window;

    let lookups = directory.iter().map(|(address, validator)| async move {
        (address, node.signing_info(&validator.valcons_address).await)
    });
    let results: Vec<_> =
        stream::iter(lookups).buffer_unordered(LOOKUP_CONCURRENCY).collect().await;

    let mut refreshed = 0usize;
    for (address, result) in results {
        let info = match result {
            Ok(Some(info)) => info,
            Ok(None) => continue,
            Err(err) => {
                warn!(address = %address, err = %err, "signing info fetch failed");
                continue;
            }
        };
        let entry = state.enrichment.entry(address.clone()).or_default();
        if window > 0 {
            entry.uptime = (window - info.missed_blocks_counter) as f64 / window as f64 * 100.0;
        }
        entry.tombstoned = info.tombstoned;
        entry.jailed_until = info.jailed_until;
        entry.index_offset = info.index_offset;
        entry.start_height = info.start_height;
        refreshed += 1;
    }
    debug!(window, refreshed, "uptime refresh");
    Ok(())
}

/// Patch refreshed enrichment onto already-staged validator rows.
pub(crate) fn apply(state: &RunState, rows: &mut [ValidatorRow]) {
    for row in rows {
        let Some(enrichment) = state.enrichment.get(&row.address) else { continue };
        row.uptime = enrichment.uptime;
        row.tombstoned = enrichment.tombstoned;
        row.jailed_until.clone_from(&enrichment.jailed_until);
        row.index_offset = enrichment.index_offset;
        row.start_height = enrichment.start_height;
        row.self_delegation = enrichment.self_delegation;
        if let Some(url) = &enrichment.profile_url {
            row.profile_url.clone_from(url);
        }
        if let Some(last_seen) = enrichment.last_seen {
            row.last_seen = last_seen;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryValidator;
    use mockito::Server;
    use serde_json::json;
    use url::Url;

    fn candidate(address: &str) -> DirectoryValidator {
        DirectoryValidator {
            address: address.to_owned(),
            operator_address: String::new(),
            delegator_address: String::new(),
            consensus_pubkey: String::new(),
            valcons_address: format!("cosmosvalcons1{}", address.to_lowercase()),
            account_pubkey: String::new(),
            operator_pubkey: String::new(),
            moniker: address.to_owned(),
            identity: String::new(),
            website: String::new(),
            details: String::new(),
            status: 3,
            jailed: false,
            delegator_shares: 0.0,
        }
    }

    #[tokio::test]
    async fn refresh_computes_uptime_from_missed_blocks() {
        let mut server = Server::new_async().await;
        let _params = server
            .mock("GET", "/cosmos/slashing/v1beta1/params")
            .with_status(200)
            .with_body(r#"{"params":{"signed_blocks_window":"200"}}"#)
            .create_async()
            .await;
        let _info = server
            .mock("GET", "/cosmos/slashing/v1beta1/signing_infos/cosmosvalcons1aaaa")
            .with_status(200)
            .with_body(
                json!({"val_signing_info": {
                    "start_height": "5",
                    "index_offset": "120",
                    "jailed_until": "1970-01-01T00:00:00Z",
                    "tombstoned": false,
                    "missed_blocks_counter": "50"
                }})
                .to_string(),
            )
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let node = NodeClient::new(url.clone(), url);
        let directory = Directory::from_validators(vec![candidate("AAAA")]);
        let mut state = RunState::default();

        refresh(&node, &directory, &mut state).await.unwrap();

        assert_eq!(state.signed_blocks_window, 200);
        let enrichment = state.enrichment("AAAA");
        assert!((enrichment.uptime - 75.0).abs() < f64::EPSILON);
        assert_eq!(enrichment.start_height, 5);
        assert_eq!(enrichment.index_offset, 120);
    }

    #[tokio::test]
    async fn missing_params_fail_the_refresh() {
        let mut server = Server::new_async().await;
        let _params = server
            .mock("GET", "/cosmos/slashing/v1beta1/params")
            .with_status(500)
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let node = NodeClient::new(url.clone(), url);
        let directory = Directory::from_validators(vec![candidate("AAAA")]);
        let mut state = RunState::default();

        assert!(refresh(&node, &directory, &mut state).await.is_err());
    }

    #[tokio::test]
    async fn per_validator_failure_skips_only_that_validator() {
        let mut server = Server::new_async().await;
        let _params = server
            .mock("GET", "/cosmos/slashing/v1beta1/params")
            .with_status(200)
            .with_body(r#"{"params":{"signed_blocks_window":"100"}}"#)
            .create_async()
            .await;
        let _bad = server
            .mock("GET", "/cosmos/slashing/v1beta1/signing_infos/cosmosvalcons1aaaa")
            .with_status(500)
            .create_async()
            .await;
        let _good = server
            .mock("GET", "/cosmos/slashing/v1beta1/signing_infos/cosmosvalcons1bbbb")
            .with_status(200)
            .with_body(
                json!({"val_signing_info": {
                    "start_height": "0",
                    "index_offset": "0",
                    "jailed_until": "1970-01-01T00:00:00Z",
                    "tombstoned": false,
                    "missed_blocks_counter": "0"
                }})
                .to_string(),
            )
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let node = NodeClient::new(url.clone(), url);
        let directory =
            Directory::from_validators(vec![candidate("AAAA"), candidate("BBBB")]);
        let mut state = RunState::default();

        refresh(&node, &directory, &mut state).await.unwrap();

        assert!((state.enrichment("AAAA").uptime - 0.0).abs() < f64::EPSILON);
        assert!((state.enrichment("BBBB").uptime - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn apply_patches_staged_rows() {
        let mut state = RunState::default();
        let entry = state.enrichment.entry("AAAA".into()).or_default();
        entry.uptime = 99.5;
        entry.tombstoned = true;
        entry.profile_url = Some("https://img.example/a.png".into());
        entry.last_seen = Some(1_700_000_000_000);

        let mut rows = vec![crate::reconcile::validator_row(
            &candidate("AAAA"),
            50,
            0,
            10,
            &RunState::default(),
        )];
        rows[0].uptime = 0.0;

        apply(&state, &mut rows);

        assert!((rows[0].uptime - 99.5).abs() < f64::EPSILON);
        assert!(rows[0].tombstoned);
        assert_eq!(rows[0].profile_url, "https://img.example/a.png");
        assert_eq!(rows[0].last_seen, 1_700_000_000_000);
    }
}
