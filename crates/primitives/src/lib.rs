//! Shared primitives for cosmoscope: address derivation, voting-power
//! distribution math and block-time statistics.

pub mod address;
pub mod distribution;
pub mod stats;

pub use address::{
    consensus_address, delegator_address, pubkey_to_bech32, tx_hash, valcons_address,
};
pub use distribution::PowerDistribution;
pub use stats::running_average;
