//! Build, fund and spend Bitcoin Cash stochastic-payment (SPAY) covenants.
//!
//! A sender locks funds to a script-hash output parameterized by the
//! recipient's pubkey-hash, a commitment to the recipient's secret, a salt, an
//! expiration and a probability threshold. Before expiration the recipient can
//! claim the funds by revealing a secret that clears the threshold (see
//! [`is_winning_secret`]); afterwards the sender can take them back.
//!
//! See the [`Covenant`] type for the redeem script and the `make_*_tx`
//! functions for the transactions.
mod common;
mod error;

pub mod address;
pub mod covenant;
pub mod params;
#[cfg(feature = "receiving")]
pub mod receiving;
#[cfg(feature = "sending")]
pub mod sending;
pub mod tx;
pub mod utils;

pub use bitcoin;
pub use bitcoin::{Transaction, Txid};
pub use bitcoin_hashes;
pub use secp256k1;

pub use crate::address::{Address, AddressKind};
pub use crate::common::Network;
pub use crate::covenant::{secret_hash, Covenant, UnlockingScript};
pub use crate::error::Error;
pub use crate::params::CovenantParams;
pub use crate::tx::{PrevOutput, TxBuilder, DUST_THRESHOLD};
pub use crate::utils::probability::{
    is_winning_secret, probability_from_ratio, probability_ratio, ProbabilityThreshold,
};

pub type Result<T> = std::result::Result<T, Error>;

/// The pubkey-hash identifying the holder of `pubkey` in a covenant.
pub fn pubkey_hash(pubkey: &secp256k1::PublicKey) -> [u8; 20] {
    utils::hash::pubkey_hash(pubkey)
}
