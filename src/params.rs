//! Serializable covenant parameters.
//!
//! Covenant parameters travel between sender and recipient as JSON with
//! hex-encoded byte fields:
//!
//! ```json
//! {
//!   "sender_pkh": "fc7250a211deddc70ee5a2738de5f07817351cef",
//!   "recipient_pkh": "531260aa2a199e228c537dfa42c82bea2c7c1f4d",
//!   "hash": "deb0e38ced1e41de6f92e70e80c418d2d356afaaa99e26f5939dbc7d3ef4772a",
//!   "salt": "deadbeef",
//!   "expiration": 1000,
//!   "probability": 4611686018427387904,
//!   "network": "mainnet"
//! }
//! ```
use serde::{Deserialize, Serialize};

use crate::{common::Network, covenant::Covenant, Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CovenantParams {
    pub sender_pkh: String,
    pub recipient_pkh: String,
    pub hash: String,
    pub salt: String,
    pub expiration: i64,
    pub probability: i64,
    #[serde(default = "default_network")]
    pub network: Network,
}

fn default_network() -> Network {
    Network::Mainnet
}

impl CovenantParams {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decodes and width-checks the parameters into a [`Covenant`].
    pub fn to_covenant(&self) -> Result<Covenant> {
        Ok(Covenant::new(
            decode_fixed("sender_pkh", &self.sender_pkh)?,
            decode_fixed("recipient_pkh", &self.recipient_pkh)?,
            decode_fixed("hash", &self.hash)?,
            decode_fixed("salt", &self.salt)?,
            self.expiration,
            self.probability,
            self.network,
        ))
    }
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> Result<[u8; N]> {
    let bytes =
        hex::decode(value).map_err(|e| Error::Config(format!("{}: {}", field, e)))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        Error::Config(format!(
            "{} must be {} bytes, got {}",
            field,
            N,
            bytes.len()
        ))
    })
}

impl TryFrom<&CovenantParams> for Covenant {
    type Error = Error;

    fn try_from(params: &CovenantParams) -> Result<Self> {
        params.to_covenant()
    }
}

impl From<&Covenant> for CovenantParams {
    fn from(covenant: &Covenant) -> Self {
        CovenantParams {
            sender_pkh: hex::encode(covenant.get_sender_pkh()),
            recipient_pkh: hex::encode(covenant.get_recipient_pkh()),
            hash: hex::encode(covenant.get_hash()),
            salt: hex::encode(covenant.get_salt()),
            expiration: covenant.get_expiration(),
            probability: covenant.get_probability(),
            network: covenant.get_network(),
        }
    }
}

impl Covenant {
    /// The covenant's parameters in their serializable form.
    pub fn params(&self) -> CovenantParams {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "sender_pkh": "fc7250a211deddc70ee5a2738de5f07817351cef",
        "recipient_pkh": "531260aa2a199e228c537dfa42c82bea2c7c1f4d",
        "hash": "deb0e38ced1e41de6f92e70e80c418d2d356afaaa99e26f5939dbc7d3ef4772a",
        "salt": "deadbeef",
        "expiration": 1000,
        "probability": 4611686018427387904,
        "network": "bchtest"
    }"#;

    #[test]
    fn parses_parameters() {
        let covenant = CovenantParams::from_json(JSON)
            .unwrap()
            .to_covenant()
            .unwrap();
        assert_eq!(covenant.get_salt(), [0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(covenant.get_expiration(), 1000);
        assert_eq!(covenant.get_probability(), 1 << 62);
        assert_eq!(covenant.get_network(), Network::Testnet);

        let params = covenant.params();
        assert_eq!(params.network, Network::Testnet);
        let again = CovenantParams::from_json(&params.to_json().unwrap()).unwrap();
        assert_eq!(again, params);
    }

    #[test]
    fn network_defaults_to_mainnet() {
        let json = JSON.replace(",\n        \"network\": \"bchtest\"", "");
        let params = CovenantParams::from_json(&json).unwrap();
        assert_eq!(params.network, Network::Mainnet);
    }

    #[test]
    fn rejects_wrong_widths_and_bad_hex() {
        let mut params = CovenantParams::from_json(JSON).unwrap();
        params.salt = "deadbe".to_owned();
        assert!(matches!(
            Covenant::try_from(&params),
            Err(Error::Config(msg)) if msg.contains("salt must be 4 bytes")
        ));

        let mut params = CovenantParams::from_json(JSON).unwrap();
        params.hash = "zz".to_owned();
        assert!(matches!(params.to_covenant(), Err(Error::Config(_))));

        assert!(matches!(
            CovenantParams::from_json(&JSON.replace("bchtest", "litecoin")),
            Err(Error::Config(_))
        ));
    }
}
