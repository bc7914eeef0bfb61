//! Transaction assembly for spending and funding covenant outputs.
//!
//! Transactions are plain [`bitcoin::Transaction`]s; the legacy wire format is
//! shared with Bitcoin Cash. The builder threads its state by value through
//! each step, so a chain such as
//!
//! ```text
//! TxBuilder::new()
//!     .add_input(outpoint)
//!     .add_output(&destination, amount)
//!     .add_change_if_above_dust(&change, change_amount)
//!     .sign_input(0, input_amount, &prev_script, &key, sig_script_fn)?
//!     .finalize()
//! ```
//!
//! stops at the first failing step and never exposes a partially signed
//! transaction.
use std::str::FromStr;

use bitcoin::{
    absolute::LockTime,
    sighash::{EcdsaSighashType, SighashCache},
    transaction::Version,
    Amount, OutPoint, Script, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use log::{debug, trace};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

use crate::{address::Address, utils::hash::sha256d, Error, Result};

/// Outputs at or below this many satoshis are not created as change.
pub const DUST_THRESHOLD: u64 = 546;

pub const SIGHASH_ALL: u32 = 0x01;
pub const SIGHASH_FORKID: u32 = 0x40;

/// The only signature hash type produced by this crate.
pub const SIGHASH_ALL_FORKID: u32 = SIGHASH_ALL | SIGHASH_FORKID;

/// The output being spent: where it is and how much it holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrevOutput {
    pub outpoint: OutPoint,
    pub amount: u64,
}

impl PrevOutput {
    pub fn new(txid: Txid, vout: u32, amount: u64) -> Self {
        PrevOutput {
            outpoint: OutPoint { txid, vout },
            amount,
        }
    }

    /// Builds a `PrevOutput` from a txid in its displayed, byte-reversed hex
    /// form, as explorers and node RPCs show it.
    pub fn from_hex(txid: &str, vout: u32, amount: u64) -> Result<Self> {
        let txid = Txid::from_str(txid).map_err(|e| {
            Error::Validation(format!("Invalid txid hex representation {}: {}", txid, e))
        })?;
        Ok(PrevOutput::new(txid, vout, amount))
    }
}

/// The replay-protected (fork-id) digest signed for input `input_index`.
///
/// This is the BIP143 layout over `script_code` and the spent `amount`, with
/// `hash_type` as the trailing 4 bytes. Only `SIGHASH_ALL | SIGHASH_FORKID`
/// is supported.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    amount: u64,
    hash_type: u32,
) -> Result<[u8; 32]> {
    if hash_type != SIGHASH_ALL_FORKID {
        return Err(Error::Validation(format!(
            "Unsupported signature hash type {:#04x}",
            hash_type
        )));
    }
    if input_index >= tx.input.len() {
        return Err(Error::Validation(format!(
            "Input index {} out of range for {} inputs",
            input_index,
            tx.input.len()
        )));
    }

    let mut preimage = Vec::new();
    SighashCache::new(tx)
        .segwit_encode_signing_data_to(
            &mut preimage,
            input_index,
            Script::from_bytes(script_code),
            Amount::from_sat(amount),
            EcdsaSighashType::All,
        )
        .map_err(|e| Error::Validation(e.to_string()))?;

    // The encoding ends with the plain hash type, fork-id replaces it
    let len = preimage.len();
    preimage[len - 4..].copy_from_slice(&hash_type.to_le_bytes());
    Ok(sha256d(&preimage))
}

/// Accumulates inputs and outputs and signs exactly one input.
#[derive(Debug)]
pub struct TxBuilder {
    tx: Transaction,
    signed_input: Option<usize>,
}

impl Default for TxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TxBuilder {
    /// Starts an empty version 2 transaction, so relative lock times apply
    /// to its inputs.
    pub fn new() -> Self {
        TxBuilder {
            tx: Transaction {
                version: Version::TWO,
                lock_time: LockTime::ZERO,
                input: vec![],
                output: vec![],
            },
            signed_input: None,
        }
    }

    /// Adds an unsigned input spending `outpoint` with a final sequence.
    pub fn add_input(self, outpoint: OutPoint) -> Self {
        self.add_input_with_sequence(outpoint, Sequence::MAX)
    }

    /// Adds an unsigned input spending `outpoint` with the given sequence,
    /// used to satisfy a relative lock time.
    pub fn add_input_with_sequence(mut self, outpoint: OutPoint, sequence: Sequence) -> Self {
        self.tx.input.push(TxIn {
            previous_output: outpoint,
            script_sig: ScriptBuf::new(),
            sequence,
            witness: Witness::new(),
        });
        self
    }

    pub fn add_output(mut self, destination: &Address, amount: u64) -> Self {
        self.tx.output.push(TxOut {
            value: Amount::from_sat(amount),
            script_pubkey: ScriptBuf::from_bytes(destination.script_pubkey()),
        });
        self
    }

    /// Adds a change output only when `amount` is above [`DUST_THRESHOLD`].
    /// Dust change is left to the miner.
    pub fn add_change_if_above_dust(self, destination: &Address, amount: u64) -> Self {
        if amount > DUST_THRESHOLD {
            return self.add_output(destination, amount);
        }
        trace!("dropping dust change of {} satoshis", amount);
        self
    }

    /// Signs input `input_index` with `signing_key` and stores the script
    /// returned by `sig_script_fn` as its unlocking script.
    ///
    /// The signature commits to all inputs and outputs of the transaction as
    /// assembled so far (`SIGHASH_ALL | SIGHASH_FORKID`), to
    /// `prev_locking_script` as the script code and to `input_amount`. It is
    /// passed to `sig_script_fn` DER-encoded with the hash type byte appended.
    ///
    /// # Errors
    ///
    /// * The input index is out of range, or an input was already signed.
    /// * The signing digest cannot be turned into a message.
    /// * `sig_script_fn` fails.
    pub fn sign_input<F>(
        mut self,
        input_index: usize,
        input_amount: u64,
        prev_locking_script: &[u8],
        signing_key: &SecretKey,
        sig_script_fn: F,
    ) -> Result<Self>
    where
        F: FnOnce(Vec<u8>) -> Result<Vec<u8>>,
    {
        if let Some(signed) = self.signed_input {
            return Err(Error::Validation(format!(
                "Input {} is already signed, only one signed input is supported",
                signed
            )));
        }

        let sighash = signature_hash(
            &self.tx,
            input_index,
            prev_locking_script,
            input_amount,
            SIGHASH_ALL_FORKID,
        )?;

        let secp = Secp256k1::signing_only();
        let msg = Message::from_digest_slice(&sighash)?;
        let signature = secp.sign_ecdsa(&msg, signing_key);

        let mut sig = signature.serialize_der().to_vec();
        sig.push(SIGHASH_ALL_FORKID as u8);

        let script_sig = sig_script_fn(sig)?;
        trace!(
            "signed input {} with key {}",
            input_index,
            PublicKey::from_secret_key(&secp, signing_key)
        );

        // signature_hash already checked the index
        if let Some(input) = self.tx.input.get_mut(input_index) {
            input.script_sig = ScriptBuf::from_bytes(script_sig);
        }
        self.signed_input = Some(input_index);
        Ok(self)
    }

    /// Returns the assembled transaction.
    ///
    /// # Errors
    ///
    /// Fails if the transaction has no inputs or no outputs.
    pub fn finalize(self) -> Result<Transaction> {
        if self.tx.input.is_empty() {
            return Err(Error::Validation("Transaction has no inputs".to_owned()));
        }
        if self.tx.output.is_empty() {
            return Err(Error::Validation("Transaction has no outputs".to_owned()));
        }
        debug!(
            "built transaction {} with {} inputs and {} outputs",
            self.tx.txid(),
            self.tx.input.len(),
            self.tx.output.len()
        );
        Ok(self.tx)
    }
}
