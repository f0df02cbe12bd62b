//! Key and address derivation for Tendermint/Cosmos validators.
//!
//! The consensus address derived here is the stable join key used across all
//! stored records: blocks reference it via their precommit signer list, and
//! validator rows, per-height records and power-change events are keyed by it.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bech32::{Bech32, Hrp};
use eyre::{Context, Result};
use sha2::{Digest, Sha256};

/// Number of hex characters in a derived consensus address (20 bytes).
pub const CONSENSUS_ADDRESS_LEN: usize = 40;

/// Derive the uppercase hex consensus address from a base64-encoded consensus
/// public key: the first 20 bytes of the key's sha256 digest.
pub fn consensus_address(consensus_pubkey_b64: &str) -> Result<String> {
    let key = BASE64
        .decode(consensus_pubkey_b64)
        .wrap_err("invalid base64 consensus pubkey")?;
    let digest = Sha256::digest(&key);
    let mut addr = hex::encode(digest);
    addr.truncate(CONSENSUS_ADDRESS_LEN);
    Ok(addr.to_uppercase())
}

/// Compute the sha256 transaction hash of a base64-encoded raw transaction.
pub fn tx_hash(raw_tx_b64: &str) -> Result<String> {
    let raw = BASE64.decode(raw_tx_b64).wrap_err("invalid base64 transaction")?;
    Ok(hex::encode(Sha256::digest(&raw)))
}

/// Encode a hex consensus address as a bech32 `<prefix>valcons` address.
pub fn valcons_address(bech32_prefix: &str, consensus_address_hex: &str) -> Result<String> {
    let bytes = hex::decode(consensus_address_hex).wrap_err("invalid hex consensus address")?;
    encode(&format!("{bech32_prefix}valcons"), &bytes)
}

/// Encode a base64 public key under an arbitrary bech32 human-readable part,
/// e.g. `<prefix>pub` for account pubkeys or `<prefix>valoperpub` for operator
/// pubkeys.
pub fn pubkey_to_bech32(hrp: &str, pubkey_b64: &str) -> Result<String> {
    let key = BASE64.decode(pubkey_b64).wrap_err("invalid base64 pubkey")?;
    encode(hrp, &key)
}

/// Re-encode a bech32 operator (`valoper`) address as the matching account
/// address: same payload, account human-readable part.
pub fn delegator_address(operator_address: &str, account_prefix: &str) -> Result<String> {
    let (_, data) = bech32::decode(operator_address)
        .wrap_err_with(|| format!("invalid bech32 operator address: {operator_address}"))?;
    encode(account_prefix, &data)
}

fn encode(hrp: &str, data: &[u8]) -> Result<String> {
    let hrp = Hrp::parse(hrp).wrap_err_with(|| format!("invalid bech32 prefix: {hrp}"))?;
    bech32::encode::<Bech32>(hrp, data).wrap_err("bech32 encoding failed")
}
