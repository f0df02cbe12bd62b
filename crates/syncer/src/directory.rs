//! Validator directory: the per-run candidate roster.
//!
//! Built once at the start of a sync run from the staking module's three bond
//! status listings and keyed by the derived hex consensus address, the same
//! key block precommits and validator-set snapshots use.

use std::collections::BTreeMap;

use eyre::Result;
use node::{BondStatus, NodeClient, StakingValidator};
use primitives::{consensus_address, delegator_address, pubkey_to_bech32, valcons_address};
use tracing::{debug, warn};

/// One candidate validator with all derived key material.
#[derive(Debug, Clone)]
pub(crate) struct DirectoryValidator {
    /// Derived hex consensus address.
    pub address: String,
    /// Bech32 operator (`valoper`) address.
    pub operator_address: String,
    /// Bech32 account address with the operator's payload.
    pub delegator_address: String,
    /// Base64 consensus public key.
    pub consensus_pubkey: String,
    /// Bech32 `valcons` address.
    pub valcons_address: String,
    /// Consensus pubkey under the account-pubkey prefix.
    pub account_pubkey: String,
    /// Consensus pubkey under the operator-pubkey prefix.
    pub operator_pubkey: String,
    /// Display name.
    pub moniker: String,
    /// Identity reference (Keybase key suffix).
    pub identity: String,
    /// Website.
    pub website: String,
    /// Free-form details.
    pub details: String,
    /// Bond status code: 1 unbonded, 2 unbonding, 3 bonded.
    pub status: u8,
    /// Jailed flag.
    pub jailed: bool,
    /// Total delegator shares.
    pub delegator_shares: f64,
}

impl DirectoryValidator {
    fn derive(raw: StakingValidator, status: BondStatus, prefix: &str) -> Result<Self> {
        let address = consensus_address(&raw.consensus_pubkey.key)?;
        Ok(Self {
            valcons_address: valcons_address(prefix, &address)?,
            account_pubkey: pubkey_to_bech32(
                &format!("{prefix}pub"),
                &raw.consensus_pubkey.key,
            )?,
            operator_pubkey: pubkey_to_bech32(
                &format!("{prefix}valoperpub"),
                &raw.consensus_pubkey.key,
            )?,
            delegator_address: delegator_address(&raw.operator_address, prefix)?,
            address,
            operator_address: raw.operator_address,
            consensus_pubkey: raw.consensus_pubkey.key,
            moniker: raw.description.moniker,
            identity: raw.description.identity,
            website: raw.description.website,
            details: raw.description.details,
            status: status.code(),
            jailed: raw.jailed,
            delegator_shares: raw.delegator_shares.parse().unwrap_or_default(),
        })
    }
}

/// Candidate roster for one sync run, keyed by hex consensus address.
#[derive(Debug, Default)]
pub(crate) struct Directory {
    validators: BTreeMap<String, DirectoryValidator>,
}

impl Directory {
    /// Build the roster from the node's staking listings.
    ///
    /// Listings are fetched bonded first; a validator appearing under more
    /// than one status keeps the entry from the last listing fetched. A
    /// failed listing fails the build, a validator whose key material cannot
    /// be derived is skipped.
    pub(crate) async fn build(node: &NodeClient, bech32_prefix: &str) -> Result<Self> {
        let mut directory = Self::default();
        for status in [BondStatus::Bonded, BondStatus::Unbonding, BondStatus::Unbonded] {
            let listed = node.validators_by_status(status).await?;
            debug!(status = status.query_value(), count = listed.len(), "staking listing");
            for raw in listed {
                let operator = raw.operator_address.clone();
                match DirectoryValidator::derive(raw, status, bech32_prefix) {
                    Ok(validator) => {
                        directory.validators.insert(validator.address.clone(), validator);
                    }
                    Err(err) => {
                        warn!(operator, err = %err, "skipping underivable validator");
                    }
                }
            }
        }
        Ok(directory)
    }

    /// Number of candidates.
    pub(crate) fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether the roster is empty.
    pub(crate) fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Look up a candidate by hex consensus address.
    pub(crate) fn get(&self, address: &str) -> Option<&DirectoryValidator> {
        self.validators.get(address)
    }

    /// Iterate candidates in address order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &DirectoryValidator)> {
        self.validators.iter()
    }

    #[cfg(test)]
    pub(crate) fn from_validators(validators: Vec<DirectoryValidator>) -> Self {
        Self {
            validators: validators.into_iter().map(|v| (v.address.clone(), v)).collect(),
        }
    }
}
