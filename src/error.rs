use std::fmt;

#[derive(Debug)]
pub enum Error {
    Validation(String),
    Construction(String),
    InsufficientFunds { needed: u64, available: u64 },
    Signing(secp256k1::Error),
    AddressEncoding(String),
    InvalidNetwork(String),
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "{}", msg),
            Error::Construction(msg) => write!(f, "script construction failed: {}", msg),
            Error::InsufficientFunds { needed, available } => write!(
                f,
                "insufficient input value: {} < {}",
                available, needed
            ),
            Error::Signing(e) => write!(f, "signing failed: {}", e),
            Error::AddressEncoding(msg) => write!(f, "{}", msg),
            Error::InvalidNetwork(msg) => write!(f, "Invalid network: {}", msg),
            Error::Config(msg) => write!(f, "invalid covenant parameters: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::Validation(e.to_string())
    }
}

impl From<bech32::Error> for Error {
    fn from(e: bech32::Error) -> Self {
        Error::AddressEncoding(e.to_string())
    }
}

impl From<secp256k1::Error> for Error {
    fn from(e: secp256k1::Error) -> Self {
        Error::Signing(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
