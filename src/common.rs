use crate::Error;
use serde::{Deserialize, Serialize};

/// The network a covenant lives on.
///
/// The network only selects the CashAddr prefix used when rendering addresses:
/// `bitcoincash` for Mainnet, `bchtest` for Testnet, and `bchreg` for Regtest.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    /// The CashAddr human-readable prefix for this network.
    pub fn cash_address_prefix(&self) -> &'static str {
        match self {
            Network::Mainnet => "bitcoincash",
            Network::Testnet => "bchtest",
            Network::Regtest => "bchreg",
        }
    }

    pub(crate) fn from_cash_address_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "bitcoincash" => Some(Network::Mainnet),
            "bchtest" => Some(Network::Testnet),
            "bchreg" => Some(Network::Regtest),
            _ => None,
        }
    }
}

impl From<Network> for &'static str {
    fn from(value: Network) -> Self {
        match value {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        }
    }
}

impl TryFrom<&str> for Network {
    type Error = crate::Error;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        let res = match value {
            "mainnet" | "main" | "bitcoincash" => Self::Mainnet,
            "testnet" | "test" | "bchtest" => Self::Testnet,
            "regtest" | "bchreg" => Self::Regtest,
            _ => return Err(Error::InvalidNetwork(value.to_string())),
        };
        Ok(res)
    }
}

impl TryFrom<String> for Network {
    type Error = crate::Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.as_str().try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_names_round_trip() {
        for network in [Network::Mainnet, Network::Testnet, Network::Regtest] {
            let name: &str = network.into();
            assert_eq!(Network::try_from(name).unwrap(), network);
            assert_eq!(
                Network::try_from(network.cash_address_prefix()).unwrap(),
                network
            );
        }
    }

    #[test]
    fn unknown_network_is_rejected() {
        assert!(matches!(
            Network::try_from("signet"),
            Err(Error::InvalidNetwork(name)) if name == "signet"
        ));
    }
}
