//! Spending a covenant output.
//!
//! The recipient claims the funds with [`Covenant::make_receive_tx`] by
//! revealing a winning secret; after expiration the sender takes them back with
//! [`Covenant::make_refund_tx`]. Both produce a transaction with the covenant
//! output as its single input and one output to the given destination.
use bitcoin::{Sequence, Transaction};
use log::debug;
use secp256k1::{PublicKey, Secp256k1, SecretKey};

use crate::{
    address::Address,
    covenant::{secret_hash, Covenant, UnlockingScript},
    tx::{PrevOutput, TxBuilder},
    utils::hash::pubkey_hash,
    Error, Result,
};

/// Which covenant branch a spend takes.
#[derive(Clone, Copy)]
enum SpendPath {
    Receive([u8; 32]),
    Refund,
}

impl Covenant {
    /// Builds the transaction by which the recipient claims the covenant output.
    ///
    /// # Arguments
    ///
    /// * `prev_output` - The covenant output being spent.
    /// * `destination` - Where the claimed funds go.
    /// * `miner_fee` - Subtracted from the spent amount.
    /// * `secret` - The recipient's secret, committed to by the covenant's hash.
    /// * `key` - The recipient's private key.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    ///
    /// * The key's pubkey-hash is not the covenant's recipient pubkey-hash.
    /// * The secret is not exactly 32 bytes, or does not match the covenant's hash.
    /// * The miner fee exceeds the spent amount.
    /// * Script construction or signing fails.
    pub fn make_receive_tx(
        &self,
        prev_output: &PrevOutput,
        destination: &Address,
        miner_fee: u64,
        secret: &[u8],
        key: &SecretKey,
    ) -> Result<Transaction> {
        let secret: [u8; 32] = secret.try_into().map_err(|_| {
            Error::Validation(format!("secret is not 32 bytes, got {}", secret.len()))
        })?;
        if secret_hash(&secret) != self.get_hash() {
            return Err(Error::Validation(
                "secret does not match the covenant hash".to_owned(),
            ));
        }

        self.make_covenant_spend(
            prev_output,
            destination,
            miner_fee,
            key,
            SpendPath::Receive(secret),
        )
    }

    /// Builds the transaction by which the sender reclaims the covenant output.
    ///
    /// The input's sequence is set to the covenant expiration, which the refund
    /// branch checks as a relative lock time.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    ///
    /// * The key's pubkey-hash is not the covenant's sender pubkey-hash.
    /// * The expiration does not fit an input sequence number.
    /// * The miner fee exceeds the spent amount.
    /// * Script construction or signing fails.
    pub fn make_refund_tx(
        &self,
        prev_output: &PrevOutput,
        destination: &Address,
        miner_fee: u64,
        key: &SecretKey,
    ) -> Result<Transaction> {
        self.make_covenant_spend(prev_output, destination, miner_fee, key, SpendPath::Refund)
    }

    fn make_covenant_spend(
        &self,
        prev_output: &PrevOutput,
        destination: &Address,
        miner_fee: u64,
        key: &SecretKey,
        path: SpendPath,
    ) -> Result<Transaction> {
        let secp = Secp256k1::signing_only();
        let public_key = PublicKey::from_secret_key(&secp, key);
        let pubkey = public_key.serialize();
        let pkh = pubkey_hash(&public_key);

        let (expected_pkh, role) = match path {
            SpendPath::Receive(_) => (self.get_recipient_pkh(), "recipient"),
            SpendPath::Refund => (self.get_sender_pkh(), "sender"),
        };
        if pkh != expected_pkh {
            return Err(Error::Validation(format!(
                "key does not match the {} pubkey hash",
                role
            )));
        }

        let out_amount = prev_output
            .amount
            .checked_sub(miner_fee)
            .ok_or(Error::InsufficientFunds {
                needed: miner_fee,
                available: prev_output.amount,
            })?;

        let sequence = match path {
            SpendPath::Receive(_) => None,
            SpendPath::Refund => {
                let expiration = u32::try_from(self.get_expiration()).map_err(|_| {
                    Error::Validation(format!(
                        "expiration {} does not fit an input sequence",
                        self.get_expiration()
                    ))
                })?;
                Some(Sequence::from_consensus(expiration))
            }
        };

        let redeem_script = self.redeem_script()?;
        let sig_script_fn = |sig: Vec<u8>| {
            let unlocking = match path {
                SpendPath::Receive(secret) => UnlockingScript::Receive {
                    secret,
                    pubkey: pubkey.to_vec(),
                    signature: sig,
                },
                SpendPath::Refund => UnlockingScript::refund(&pubkey, &sig),
            };
            unlocking.to_script(&redeem_script)
        };

        debug!(
            "spending covenant output {} as {} to {}",
            prev_output.outpoint, role, destination
        );

        let builder = match sequence {
            Some(sequence) => {
                TxBuilder::new().add_input_with_sequence(prev_output.outpoint, sequence)
            }
            None => TxBuilder::new().add_input(prev_output.outpoint),
        };

        builder
            .add_output(destination, out_amount)
            .sign_input(0, prev_output.amount, &redeem_script, key, sig_script_fn)?
            .finalize()
    }
}
