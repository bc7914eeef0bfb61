use bitcoin_hashes::{hash160, sha256, sha256d, Hash};
use secp256k1::PublicKey;

/// RIPEMD160(SHA256(data)), the digest behind pubkey-hashes and script-hashes.
pub(crate) fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    sha256::Hash::hash(data).to_byte_array()
}

pub(crate) fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256d::Hash::hash(data).to_byte_array()
}

/// The pubkey-hash of the compressed serialization of `pubkey`.
pub(crate) fn pubkey_hash(pubkey: &PublicKey) -> [u8; 20] {
    hash160(&pubkey.serialize())
}
