//! The SPAY covenant: its redeem script, script-hash address and the two
//! signature scripts that satisfy it.
//!
//! The redeem script pushes the six covenant parameters, in the order
//! probability, expiration, salt, hash, recipient pubkey-hash and sender
//! pubkey-hash, ahead of [`REDEEM_SCRIPT_TEMPLATE_V1`]. Spending it takes one
//! of two branches, chosen by a selector pushed right before the redeem script:
//!
//! * `0` (receive): the recipient reveals a secret matching `hash` whose
//!   salted hash clears the probability threshold, and signs.
//! * `1` (refund): the sender signs once the expiration has passed.
use core::fmt;

use log::debug;

use crate::{
    address::Address,
    common::Network,
    utils::{
        hash::{hash160, sha256},
        probability::ProbabilityThreshold,
        script::ScriptBuilder,
    },
    Error, Result,
};

/// The opcode template following the pushed covenant parameters.
///
/// These bytes decide whether the network accepts a spend and are reproduced
/// verbatim; never edit them. A changed template is a new version with a new
/// constant.
pub const REDEEM_SCRIPT_TEMPLATE_V1: [u8; 80] = [
    0x55, 0x79, 0x00, 0x9c, 0x63, 0x57, 0x79, 0xa9, 0x7b, 0x88, 0x55, 0x7a, 0x56, 0x7a, 0xad, 0x55,
    0x7a, 0xa8, 0x7b, 0x88, 0x6d, 0x6d, 0x51, 0x67, 0x55, 0x7a, 0x51, 0x9d, 0x56, 0x79, 0xa9, 0x88,
    0x71, 0x7c, 0xad, 0x7b, 0xb2, 0x75, 0x52, 0x79, 0x00, 0xa0, 0x63, 0x00, 0xc6, 0x53, 0x79, 0x95,
    0x02, 0x10, 0x27, 0x96, 0xc3, 0x51, 0x9d, 0x00, 0xcc, 0x78, 0xa2, 0x69, 0x00, 0xcd, 0x03, 0x76,
    0xa9, 0x14, 0x53, 0x79, 0x7e, 0x02, 0x88, 0xac, 0x7e, 0x88, 0x75, 0x68, 0x6d, 0x75, 0x51, 0x68,
];

/// Selector pushed by a receive signature script.
pub const RECEIVE_SELECTOR: i64 = 0;
/// Selector pushed by a refund signature script.
pub const REFUND_SELECTOR: i64 = 1;

/// The SHA256 commitment to `secret` that a recipient hands to the sender.
pub fn secret_hash(secret: &[u8; 32]) -> [u8; 32] {
    sha256(secret)
}

/// The witness data of one covenant branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnlockingScript {
    Receive {
        secret: [u8; 32],
        pubkey: Vec<u8>,
        signature: Vec<u8>,
    },
    Refund {
        pubkey: Vec<u8>,
        signature: Vec<u8>,
    },
}

impl UnlockingScript {
    /// Receive witness data, checking that the secret is exactly 32 bytes.
    pub fn receive(secret: &[u8], pubkey: &[u8], signature: &[u8]) -> Result<Self> {
        let secret: [u8; 32] = secret.try_into().map_err(|_| {
            Error::Validation(format!("secret is not 32 bytes, got {}", secret.len()))
        })?;
        Ok(UnlockingScript::Receive {
            secret,
            pubkey: pubkey.to_vec(),
            signature: signature.to_vec(),
        })
    }

    pub fn refund(pubkey: &[u8], signature: &[u8]) -> Self {
        UnlockingScript::Refund {
            pubkey: pubkey.to_vec(),
            signature: signature.to_vec(),
        }
    }

    /// The branch selector this witness pushes.
    pub fn selector(&self) -> i64 {
        match self {
            UnlockingScript::Receive { .. } => RECEIVE_SELECTOR,
            UnlockingScript::Refund { .. } => REFUND_SELECTOR,
        }
    }

    /// Serializes the witness followed by the selector and `redeem_script`.
    ///
    /// Receive pushes `<secret> <pubkey> <sig> 0 <redeem script>`, refund pushes
    /// `<pubkey> <sig> 1 <redeem script>`; the interpreter pops the redeem
    /// script first, then the selector.
    pub fn to_script(&self, redeem_script: &[u8]) -> Result<Vec<u8>> {
        let mut builder = ScriptBuilder::new();
        match self {
            UnlockingScript::Receive {
                secret,
                pubkey,
                signature,
            } => {
                builder
                    .add_data(secret)?
                    .add_data(pubkey)?
                    .add_data(signature)?;
            }
            UnlockingScript::Refund { pubkey, signature } => {
                builder.add_data(pubkey)?.add_data(signature)?;
            }
        }
        Ok(builder
            .add_i64(self.selector())?
            .add_data(redeem_script)?
            .drain())
    }
}

/// A stochastic-payment covenant between a sender and a recipient.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Covenant {
    sender_pkh: [u8; 20],
    recipient_pkh: [u8; 20],
    hash: [u8; 32],
    salt: [u8; 4],
    expiration: i64,
    probability: ProbabilityThreshold,
    network: Network,
}

impl Covenant {
    /// Creates a covenant.
    ///
    /// # Arguments
    ///
    /// * `sender_pkh` - pubkey-hash of the sender, who may refund after expiration.
    /// * `recipient_pkh` - pubkey-hash of the recipient, who may claim with a winning secret.
    /// * `hash` - SHA256 commitment to the recipient's secret, see [`secret_hash`].
    /// * `salt` - sender-chosen salt mixed into the probability check.
    /// * `expiration` - relative lock time checked by the refund branch.
    /// * `probability` - threshold of the probability check, see [`crate::utils::probability`].
    /// * `network` - selects the address prefix.
    pub fn new(
        sender_pkh: [u8; 20],
        recipient_pkh: [u8; 20],
        hash: [u8; 32],
        salt: [u8; 4],
        expiration: i64,
        probability: ProbabilityThreshold,
        network: Network,
    ) -> Self {
        let covenant = Covenant {
            sender_pkh,
            recipient_pkh,
            hash,
            salt,
            expiration,
            probability,
            network,
        };
        debug!("new covenant:{}", covenant);
        covenant
    }

    pub fn new_mainnet(
        sender_pkh: [u8; 20],
        recipient_pkh: [u8; 20],
        hash: [u8; 32],
        salt: [u8; 4],
        expiration: i64,
        probability: ProbabilityThreshold,
    ) -> Self {
        Covenant::new(
            sender_pkh,
            recipient_pkh,
            hash,
            salt,
            expiration,
            probability,
            Network::Mainnet,
        )
    }

    pub fn get_sender_pkh(&self) -> [u8; 20] {
        self.sender_pkh
    }

    pub fn get_recipient_pkh(&self) -> [u8; 20] {
        self.recipient_pkh
    }

    pub fn get_hash(&self) -> [u8; 32] {
        self.hash
    }

    pub fn get_salt(&self) -> [u8; 4] {
        self.salt
    }

    pub fn get_expiration(&self) -> i64 {
        self.expiration
    }

    pub fn get_probability(&self) -> ProbabilityThreshold {
        self.probability
    }

    pub fn get_network(&self) -> Network {
        self.network
    }

    /// Builds the full redeem script. The result is a pure function of the
    /// covenant; callers spending repeatedly may keep it around.
    ///
    /// # Errors
    ///
    /// Only if a push is rejected by the script builder, which the fixed
    /// parameter widths rule out.
    pub fn redeem_script(&self) -> Result<Vec<u8>> {
        Ok(ScriptBuilder::new()
            .add_i64(self.probability)?
            .add_i64(self.expiration)?
            .add_data(&self.salt)?
            .add_data(&self.hash)?
            .add_data(&self.recipient_pkh)?
            .add_data(&self.sender_pkh)?
            .add_ops(&REDEEM_SCRIPT_TEMPLATE_V1)?
            .drain())
    }

    /// HASH160 of the redeem script.
    pub fn redeem_script_hash(&self) -> Result<[u8; 20]> {
        Ok(hash160(&self.redeem_script()?))
    }

    /// The pay-to-script-hash address funds are locked to.
    pub fn p2sh_address(&self) -> Result<Address> {
        Ok(Address::p2sh(self.redeem_script_hash()?, self.network))
    }

    /// The pay-to-script-hash address as `<prefix>:<payload>`.
    pub fn p2sh_address_string(&self) -> Result<String> {
        self.p2sh_address()?.encode()
    }

    /// Receive signature script: `<secret> <pubkey> <sig> 0 <redeem script>`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`] if `secret` is not exactly 32 bytes.
    pub fn build_receive_sig_script(
        &self,
        recipient_sig: &[u8],
        recipient_pk: &[u8],
        secret: &[u8],
    ) -> Result<Vec<u8>> {
        UnlockingScript::receive(secret, recipient_pk, recipient_sig)?
            .to_script(&self.redeem_script()?)
    }

    /// Refund signature script: `<pubkey> <sig> 1 <redeem script>`.
    pub fn build_refund_sig_script(&self, sender_sig: &[u8], sender_pk: &[u8]) -> Result<Vec<u8>> {
        UnlockingScript::refund(sender_pk, sender_sig).to_script(&self.redeem_script()?)
    }
}

impl fmt::Display for Covenant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "SpayCovenant:")?;
        writeln!(f, "\tsenderPkh:{}", hex::encode(self.sender_pkh))?;
        writeln!(f, "\trecipientPkh:{}", hex::encode(self.recipient_pkh))?;
        writeln!(f, "\thash:{}", hex::encode(self.hash))?;
        writeln!(f, "\tsalt:{}", hex::encode(self.salt))?;
        writeln!(f, "\texpiration:{}", self.expiration)?;
        writeln!(f, "\tprobability:{}", self.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::script::is_p2sh;

    fn covenant(probability: i64, expiration: i64) -> Covenant {
        Covenant::new(
            [0x01; 20],
            [0x02; 20],
            secret_hash(&[0x33; 32]),
            [0xde, 0xad, 0xbe, 0xef],
            expiration,
            probability,
            Network::Testnet,
        )
    }

    #[test]
    fn redeem_script_is_deterministic() {
        let c = covenant(1 << 62, 1000);
        assert_eq!(c.redeem_script().unwrap(), c.redeem_script().unwrap());
        assert_ne!(
            c.redeem_script().unwrap(),
            covenant(1 << 62, 1001).redeem_script().unwrap()
        );
    }

    #[test]
    fn redeem_script_layout() {
        let c = covenant(1 << 62, 1000);
        let script = c.redeem_script().unwrap();

        // 9 + 3 + 5 + 33 + 21 + 21 pushed bytes, then the template
        assert_eq!(script.len(), 92 + REDEEM_SCRIPT_TEMPLATE_V1.len());
        assert_eq!(&script[..9], &[0x08, 0, 0, 0, 0, 0, 0, 0, 0x40]);
        assert_eq!(&script[9..12], &[0x02, 0xe8, 0x03]);
        assert_eq!(&script[12..17], &[0x04, 0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(script[17], 0x20);
        assert_eq!(&script[18..50], &c.get_hash());
        assert_eq!(script[50], 0x14);
        assert_eq!(&script[51..71], &[0x02; 20]);
        assert_eq!(script[71], 0x14);
        assert_eq!(&script[72..92], &[0x01; 20]);
        assert_eq!(&script[92..], &REDEEM_SCRIPT_TEMPLATE_V1);
    }

    #[test]
    fn small_parameters_use_small_integer_opcodes() {
        let script = covenant(0, 16).redeem_script().unwrap();
        assert_eq!(&script[..2], &[0x00, 0x60]);
        assert_eq!(script.len(), 2 + 5 + 33 + 21 + 21 + REDEEM_SCRIPT_TEMPLATE_V1.len());
    }

    #[test]
    fn p2sh_address_commits_to_the_redeem_script() {
        let c = covenant(1 << 62, 1000);
        let addr = c.p2sh_address().unwrap();
        assert_eq!(addr.get_hash(), hash160(&c.redeem_script().unwrap()));
        assert!(is_p2sh(&addr.script_pubkey()));
        assert!(c.p2sh_address_string().unwrap().starts_with("bchtest:p"));
    }

    #[test]
    fn receive_sig_script_layout() {
        let c = covenant(1 << 62, 1000);
        let redeem = c.redeem_script().unwrap();
        let pubkey = [0x02; 33];
        let sig = [0x30; 71];
        let script = c
            .build_receive_sig_script(&sig, &pubkey, &[0x33; 32])
            .unwrap();

        assert_eq!(script[0], 0x20);
        assert_eq!(&script[1..33], &[0x33; 32]);
        assert_eq!(script[33], 33);
        assert_eq!(&script[34..67], &pubkey);
        assert_eq!(script[67], 71);
        assert_eq!(&script[68..139], &sig);
        assert_eq!(script[139], 0x00);
        assert_eq!(&script[140..142], &[0x4c, redeem.len() as u8]);
        assert_eq!(&script[142..], &redeem[..]);
    }

    #[test]
    fn refund_sig_script_layout() {
        let c = covenant(1 << 62, 1000);
        let redeem = c.redeem_script().unwrap();
        let pubkey = [0x03; 33];
        let sig = [0x30; 72];
        let script = c.build_refund_sig_script(&sig, &pubkey).unwrap();

        assert_eq!(script[0], 33);
        assert_eq!(&script[1..34], &pubkey);
        assert_eq!(script[34], 72);
        assert_eq!(&script[35..107], &sig);
        assert_eq!(script[107], 0x51);
        assert_eq!(&script[108..110], &[0x4c, redeem.len() as u8]);
        assert_eq!(&script[110..], &redeem[..]);
    }

    #[test]
    fn receive_requires_a_32_byte_secret() {
        let c = covenant(1 << 62, 1000);
        for len in [0, 31, 33] {
            let res = c.build_receive_sig_script(&[0x30; 71], &[0x02; 33], &vec![0x33; len]);
            assert!(matches!(res, Err(Error::Validation(_))));
        }
    }

    #[test]
    fn selectors() {
        let receive = UnlockingScript::receive(&[0; 32], &[], &[]).unwrap();
        assert_eq!(receive.selector(), 0);
        assert_eq!(UnlockingScript::refund(&[], &[]).selector(), 1);
    }

    #[test]
    fn display_lists_parameters() {
        let shown = covenant(1 << 62, 1000).to_string();
        assert!(shown.contains("salt:deadbeef"));
        assert!(shown.contains("expiration:1000"));
        assert!(shown.contains(&format!("probability:{}", 1i64 << 62)));
    }
}
