//! Funding a covenant.
//!
//! [`Covenant::make_spay_tx`] moves funds from an ordinary pay-to-pubkey-hash
//! output into a fresh covenant output, returning change to the funder.
use bitcoin::Transaction;
use log::debug;
use secp256k1::{PublicKey, Secp256k1, SecretKey};

use crate::{
    address::Address,
    covenant::Covenant,
    tx::{PrevOutput, TxBuilder},
    utils::{
        hash::pubkey_hash,
        script::{p2pkh_script, p2pkh_sig_script},
    },
    Error, Result,
};

impl Covenant {
    /// Creates the transaction locking `out_amount` into this covenant.
    ///
    /// # Arguments
    ///
    /// * `from_key` - The key owning `prev_output`, a pay-to-pubkey-hash output.
    /// * `prev_output` - The output funding the covenant.
    /// * `out_amount` - The amount locked into the covenant output.
    /// * `miner_fee` - The fee left to the miner.
    ///
    /// # Returns
    ///
    /// A transaction with the covenant output first, followed by a change output
    /// to `from_key`'s pubkey-hash address when the change is above the dust
    /// threshold. Dust change is left to the miner.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    ///
    /// * The spent amount is below `out_amount + miner_fee`.
    /// * Script construction or signing fails.
    pub fn make_spay_tx(
        &self,
        from_key: &SecretKey,
        prev_output: &PrevOutput,
        out_amount: u64,
        miner_fee: u64,
    ) -> Result<Transaction> {
        let needed = out_amount
            .checked_add(miner_fee)
            .ok_or_else(|| Error::Validation("output amount overflows".to_owned()))?;
        let change_amount =
            prev_output
                .amount
                .checked_sub(needed)
                .ok_or(Error::InsufficientFunds {
                    needed,
                    available: prev_output.amount,
                })?;

        let secp = Secp256k1::signing_only();
        let from_pubkey = PublicKey::from_secret_key(&secp, from_key);
        let from_pk = from_pubkey.serialize();
        let from_pkh = pubkey_hash(&from_pubkey);

        let to_addr = self.p2sh_address()?;
        let change_addr = Address::p2pkh(from_pkh, self.get_network());
        let prev_pk_script = p2pkh_script(&from_pkh);

        debug!(
            "locking {} satoshis from {} into {}",
            out_amount, prev_output.outpoint, to_addr
        );

        TxBuilder::new()
            .add_input(prev_output.outpoint)
            .add_output(&to_addr, out_amount)
            .add_change_if_above_dust(&change_addr, change_amount)
            .sign_input(0, prev_output.amount, &prev_pk_script, from_key, |sig| {
                p2pkh_sig_script(&sig, &from_pk)
            })?
            .finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::Network, covenant::secret_hash, utils::script::is_p2sh};

    fn covenant() -> Covenant {
        Covenant::new(
            [0x01; 20],
            [0x02; 20],
            secret_hash(&[0x33; 32]),
            [0xde, 0xad, 0xbe, 0xef],
            1000,
            1 << 62,
            Network::Mainnet,
        )
    }

    fn prev_output(amount: u64) -> PrevOutput {
        PrevOutput::from_hex(
            "a9b9e18ab45fd7b9a6243a72972ced5af6aef816016c30576e525beda66bb498",
            1,
            amount,
        )
        .unwrap()
    }

    #[test]
    fn dust_change_is_omitted() {
        let key = SecretKey::from_slice(&[0x11; 32]).unwrap();
        let tx = covenant()
            .make_spay_tx(&key, &prev_output(1000), 900, 50)
            .unwrap();

        assert_eq!(tx.output.len(), 1);
        assert_eq!(tx.output[0].value.to_sat(), 900);
        assert!(is_p2sh(tx.output[0].script_pubkey.as_bytes()));
    }

    #[test]
    fn change_above_dust_returns_to_funder() {
        let secp = Secp256k1::new();
        let key = SecretKey::from_slice(&[0x11; 32]).unwrap();
        let tx = covenant()
            .make_spay_tx(&key, &prev_output(100_000), 90_000, 500)
            .unwrap();

        assert_eq!(tx.output.len(), 2);
        assert_eq!(tx.output[1].value.to_sat(), 9_500);
        assert_eq!(
            tx.output[1].script_pubkey.as_bytes(),
            &p2pkh_script(&pubkey_hash(&key.public_key(&secp)))[..]
        );
    }

    #[test]
    fn insufficient_input_is_rejected() {
        let key = SecretKey::from_slice(&[0x11; 32]).unwrap();
        let res = covenant().make_spay_tx(&key, &prev_output(1000), 960, 50);
        assert!(matches!(
            res,
            Err(Error::InsufficientFunds {
                needed: 1010,
                available: 1000
            })
        ));

        let res = covenant().make_spay_tx(&key, &prev_output(1000), u64::MAX, 1);
        assert!(res.is_err());
    }
}
