//! CashAddr addresses for pay-to-pubkey-hash and pay-to-script-hash outputs.
use core::fmt;

use bech32::{u5, FromBase32, ToBase32};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    common::Network,
    utils::script::{p2pkh_script, p2sh_script},
    Error, Result,
};

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

// Version byte: type bits (0 = P2PKH, 1 = P2SH) << 3, size bits 0 = 160-bit hash
const VERSION_P2PKH: u8 = 0x00;
const VERSION_P2SH: u8 = 0x08;

const CHECKSUM_LENGTH: usize = 8;

// version byte + 20 byte hash, 168 bits in 34 groups of 5
const PAYLOAD_LENGTH: usize = 34;

/// What an address pays to.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum AddressKind {
    PubKeyHash,
    ScriptHash,
}

/// A CashAddr address, rendered as `<network prefix>:<base32 payload>`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Address {
    kind: AddressKind,
    hash: [u8; 20],
    network: Network,
}

impl Address {
    pub fn p2pkh(pubkey_hash: [u8; 20], network: Network) -> Self {
        Address {
            kind: AddressKind::PubKeyHash,
            hash: pubkey_hash,
            network,
        }
    }

    pub fn p2sh(script_hash: [u8; 20], network: Network) -> Self {
        Address {
            kind: AddressKind::ScriptHash,
            hash: script_hash,
            network,
        }
    }

    pub fn get_kind(&self) -> AddressKind {
        self.kind
    }

    pub fn get_hash(&self) -> [u8; 20] {
        self.hash
    }

    pub fn get_network(&self) -> Network {
        self.network
    }

    /// The locking script an output paying to this address carries.
    pub fn script_pubkey(&self) -> Vec<u8> {
        match self.kind {
            AddressKind::PubKeyHash => p2pkh_script(&self.hash),
            AddressKind::ScriptHash => p2sh_script(&self.hash),
        }
    }

    /// Encodes the address, failing only if the payload cannot be mapped to
    /// base32, which cannot happen for a 20-byte hash.
    pub fn encode(&self) -> Result<String> {
        let prefix = self.network.cash_address_prefix();
        let version = match self.kind {
            AddressKind::PubKeyHash => VERSION_P2PKH,
            AddressKind::ScriptHash => VERSION_P2SH,
        };

        let mut data = Vec::with_capacity(21);
        data.push(version);
        data.extend_from_slice(&self.hash);
        let payload: Vec<u5> = data.to_base32();

        let checksum = create_checksum(prefix, &payload);

        let mut encoded = String::with_capacity(prefix.len() + 1 + payload.len() + CHECKSUM_LENGTH);
        encoded.push_str(prefix);
        encoded.push(':');
        for value in payload.iter().map(|v| v.to_u8()).chain(checksum) {
            let c = CHARSET.get(value as usize).ok_or_else(|| {
                Error::AddressEncoding(format!("invalid base32 value {}", value))
            })?;
            encoded.push(*c as char);
        }
        Ok(encoded)
    }
}

fn polymod(values: impl IntoIterator<Item = u8>) -> u64 {
    const GENERATORS: [u64; 5] = [
        0x98f2bc8e61,
        0x79b76d99e2,
        0xf33e5fb3c4,
        0xae2eabe2a8,
        0x1e4f43e470,
    ];

    let mut c: u64 = 1;
    for d in values {
        let c0 = (c >> 35) as u8;
        c = ((c & 0x07ffffffff) << 5) ^ u64::from(d);
        for (i, generator) in GENERATORS.iter().enumerate() {
            if (c0 >> i) & 1 == 1 {
                c ^= generator;
            }
        }
    }
    c ^ 1
}

fn prefix_values(prefix: &str) -> impl Iterator<Item = u8> + '_ {
    prefix.bytes().map(|b| b & 0x1f).chain(std::iter::once(0))
}

fn create_checksum(prefix: &str, payload: &[u5]) -> [u8; CHECKSUM_LENGTH] {
    let values = prefix_values(prefix)
        .chain(payload.iter().map(|v| v.to_u8()))
        .chain([0u8; CHECKSUM_LENGTH]);
    let modulus = polymod(values);

    let mut checksum = [0u8; CHECKSUM_LENGTH];
    for (i, c) in checksum.iter_mut().enumerate() {
        *c = ((modulus >> (5 * (CHECKSUM_LENGTH - 1 - i))) & 0x1f) as u8;
    }
    checksum
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let encoded = self.encode().map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl TryFrom<&str> for Address {
    type Error = Error;

    fn try_from(addr: &str) -> Result<Self> {
        let has_lower = addr.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = addr.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper {
            return Err(Error::AddressEncoding(
                "Address mixes upper and lower case".to_owned(),
            ));
        }
        let addr = addr.to_ascii_lowercase();

        let (prefix, payload) = addr.split_once(':').ok_or_else(|| {
            Error::AddressEncoding(format!("Missing network prefix in \"{}\"", addr))
        })?;

        let network = Network::from_cash_address_prefix(prefix).ok_or_else(|| {
            Error::AddressEncoding(format!(
                "Wrong prefix, expected \"bitcoincash\", \"bchtest\", or \"bchreg\", got \"{}\"",
                prefix
            ))
        })?;

        if payload.len() != PAYLOAD_LENGTH + CHECKSUM_LENGTH {
            return Err(Error::AddressEncoding("Address length is wrong".to_owned()));
        }

        let mut values = Vec::with_capacity(payload.len());
        for c in payload.bytes() {
            let value = CHARSET.iter().position(|&x| x == c).ok_or_else(|| {
                Error::AddressEncoding(format!("Invalid character '{}' in address", c as char))
            })?;
            values.push(value as u8);
        }

        if polymod(prefix_values(prefix).chain(values.iter().copied())) != 0 {
            return Err(Error::AddressEncoding("Invalid address checksum".to_owned()));
        }

        let data = values[..PAYLOAD_LENGTH]
            .iter()
            .map(|&v| u5::try_from_u8(v))
            .collect::<std::result::Result<Vec<u5>, bech32::Error>>()?;
        let data = Vec::<u8>::from_base32(&data)?;

        let (version, hash) = data
            .split_first()
            .ok_or_else(|| Error::AddressEncoding("Empty address payload".to_owned()))?;
        let hash: [u8; 20] = hash
            .try_into()
            .map_err(|_| Error::AddressEncoding("Address hash must be 20 bytes".to_owned()))?;

        match *version {
            VERSION_P2PKH => Ok(Address::p2pkh(hash, network)),
            VERSION_P2SH => Ok(Address::p2sh(hash, network)),
            other => Err(Error::AddressEncoding(format!(
                "Unsupported address version byte {:#04x}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(addr: String) -> Result<Self> {
        addr.as_str().try_into()
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = self.encode().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let addr_str: String = Deserialize::deserialize(deserializer)?;

        Address::try_from(addr_str.as_str()).map_err(serde::de::Error::custom)
    }
}
