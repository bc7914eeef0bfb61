//! Utility functions shared by the covenant and the transaction builder.
//!
//! `probability` is the off-chain mirror of the covenant's probability check,
//! `script` contains the canonical script builder and the standard
//! pay-to-pubkey-hash / pay-to-script-hash templates.
pub(crate) mod hash;
pub mod probability;
pub mod script;

// Define OP_CODES used in script building and template matching for readability
pub(crate) const OP_0: u8 = 0x00;
pub(crate) const OP_PUSHBYTES_20: u8 = 0x14;
pub(crate) const OP_PUSHBYTES_75: u8 = 0x4b;
pub(crate) const OP_PUSHDATA1: u8 = 0x4c;
pub(crate) const OP_PUSHDATA2: u8 = 0x4d;
pub(crate) const OP_PUSHDATA4: u8 = 0x4e;
pub(crate) const OP_1NEGATE: u8 = 0x4f;
pub(crate) const OP_1: u8 = 0x51;
pub(crate) const OP_HASH160: u8 = 0xA9;
pub(crate) const OP_EQUAL: u8 = 0x87;
pub(crate) const OP_DUP: u8 = 0x76;
pub(crate) const OP_EQUALVERIFY: u8 = 0x88;
pub(crate) const OP_CHECKSIG: u8 = 0xAC;

/// Largest data element the script interpreter accepts in a single push.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Largest script the script interpreter accepts.
pub const MAX_SCRIPT_SIZE: usize = 10_000;
