//! Best-effort validator enrichment: self-delegation ratios and Keybase
//! avatar URLs.
//!
//! Nothing here can fail a sync run. Failed lookups are logged and skipped;
//! the affected validators keep their previous enrichment.

use futures::{StreamExt, stream};
use identity::ProfileClient;
use node::NodeClient;
use tracing::warn;

use crate::{directory::Directory, state::RunState};

/// Concurrent in-flight lookups per enrichment pass.
const LOOKUP_CONCURRENCY: usize = 16;

/// Resolve avatar URLs for validators appearing for the first time, so their
/// initial row is already enriched.
pub(crate) async fn profile_new_validators(
    identity: &ProfileClient,
    directory: &Directory,
    addresses: &[String],
    state: &mut RunState,
) {
    let lookups = addresses.iter().filter_map(|address| {
        let validator = directory.get(address)?;
        if validator.identity.is_empty() {
            return None;
        }
        Some(async move { (address, identity.avatar_url(&validator.identity).await) })
    });

    let results: Vec<_> =
        stream::iter(lookups).buffer_unordered(LOOKUP_CONCURRENCY).collect().await;
    for (address, result) in results {
        match result {
            Ok(Some(url)) => {
                state.enrichment.entry(address.clone()).or_default().profile_url = Some(url);
            }
            Ok(None) => {}
            Err(err) => warn!(address = %address, err = %err, "profile lookup failed"),
        }
    }
}

/// Refresh self-delegation ratios and avatar URLs for the whole directory.
///
/// Runs at the first height of a run and then every enrichment window.
pub(crate) async fn refresh_all(
    node: &NodeClient,
    identity: &ProfileClient,
    directory: &Directory,
    state: &mut RunState,
) {
    let delegations = directory.iter().map(|(address, validator)| async move {
        (address, validator, node.self_delegation(&validator.delegator_address).await)
    });
    let results: Vec<_> =
        stream::iter(delegations).buffer_unordered(LOOKUP_CONCURRENCY).collect().await;
    for (address, validator, result) in results {
        match result {
            Ok(Some(own_shares)) if validator.delegator_shares > 0.0 => {
                state.enrichment.entry(address.clone()).or_default().self_delegation =
                    own_shares / validator.delegator_shares;
            }
            Ok(_) => {}
            Err(err) => warn!(address = %address, err = %err, "self-delegation fetch failed"),
        }
    }

    let identified: Vec<String> = directory
        .iter()
        .filter(|(_, v)| !v.identity.is_empty())
        .map(|(address, _)| address.clone())
        .collect();
    profile_new_validators(identity, directory, &identified, state).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryValidator;
    use mockito::{Matcher, Server};
    use url::Url;

    fn candidate(address: &str, identity: &str, shares: f64) -> DirectoryValidator {
        DirectoryValidator {
            address: address.to_owned(),
            operator_address: String::new(),
            delegator_address: format!("cosmos1{}", address.to_lowercase()),
            consensus_pubkey: String::new(),
            valcons_address: String::new(),
            account_pubkey: String::new(),
            operator_pubkey: String::new(),
            moniker: address.to_owned(),
            identity: identity.to_owned(),
            website: String::new(),
            details: String::new(),
            status: 3,
            jailed: false,
            delegator_shares: shares,
        }
    }

    #[tokio::test]
    async fn new_validator_profiles_are_resolved() {
        let mut server = Server::new_async().await;
        let _lookup = server
            .mock("GET", "/_/api/1.0/user/lookup.json")
            .match_query(Matcher::UrlEncoded("key_suffix".into(), "1234567890ABCDEF".into()))
            .with_status(200)
            .with_body(
                r#"{"them":[{"pictures":{"primary":{"url":"https://img.example/a.png"}}}]}"#,
            )
            .create_async()
            .await;

        let identity = ProfileClient::new(Url::parse(&server.url()).unwrap());
        let directory = Directory::from_validators(vec![
            candidate("AAAA", "1234567890ABCDEF", 100.0),
            candidate("BBBB", "", 100.0),
        ]);
        let mut state = RunState::default();

        profile_new_validators(
            &identity,
            &directory,
            &["AAAA".to_owned(), "BBBB".to_owned()],
            &mut state,
        )
        .await;

        assert_eq!(
            state.enrichment("AAAA").profile_url.as_deref(),
            Some("https://img.example/a.png")
        );
        assert_eq!(state.enrichment("BBBB").profile_url, None);
    }

    #[tokio::test]
    async fn refresh_all_computes_self_delegation_ratio() {
        let mut server = Server::new_async().await;
        let _delegations = server
            .mock("GET", "/cosmos/staking/v1beta1/delegations/cosmos1aaaa")
            .with_status(200)
            .with_body(r#"{"delegation_responses":[{"delegation":{"shares":"25.0"}}]}"#)
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let node = NodeClient::new(url.clone(), url.clone());
        let identity = ProfileClient::new(url);
        let directory = Directory::from_validators(vec![candidate("AAAA", "", 100.0)]);
        let mut state = RunState::default();

        refresh_all(&node, &identity, &directory, &mut state).await;

        assert!((state.enrichment("AAAA").self_delegation - 0.25).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn failed_lookups_leave_enrichment_untouched() {
        let mut server = Server::new_async().await;
        let _delegations = server
            .mock("GET", "/cosmos/staking/v1beta1/delegations/cosmos1aaaa")
            .with_status(500)
            .create_async()
            .await;

        let url = Url::parse(&server.url()).unwrap();
        let node = NodeClient::new(url.clone(), url.clone());
        let identity = ProfileClient::new(url);
        let directory = Directory::from_validators(vec![candidate("AAAA", "", 100.0)]);
        let mut state = RunState::default();
        state.enrichment.entry("AAAA".into()).or_default().self_delegation = 0.5;

        refresh_all(&node, &identity, &directory, &mut state).await;

        assert!((state.enrichment("AAAA").self_delegation - 0.5).abs() < f64::EPSILON);
    }
}
