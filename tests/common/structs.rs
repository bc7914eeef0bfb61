use serde::Deserialize;
use spay::CovenantParams;

#[derive(Debug, Deserialize)]
pub struct TestData {
    pub comment: String,
    pub given: Given,
    pub expected: Expected,
}

#[derive(Debug, Deserialize)]
pub struct Given {
    pub sender_priv_key: String,
    pub recipient_priv_key: String,
    pub secret: String,
    pub covenant: CovenantParams,
    pub probability_ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Expected {
    pub redeem_script: String,
    pub redeem_script_hash: String,
    pub p2sh_address: String,
    pub sender_address: String,
    pub recipient_address: String,
    pub secret_value: i64,
    pub is_winning: bool,
}
