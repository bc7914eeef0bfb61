use std::{fs::File, io::Read};

use bitcoin::consensus::encode::serialize;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1};
use serde_json::from_str;
use spay::bitcoin_hashes::{sha256d, Hash};

use super::structs::TestData;

const SIGHASH_ALL_FORKID: u32 = 0x41;

pub fn read_file() -> Vec<TestData> {
    let mut file = File::open("tests/resources/covenant_vectors.json").unwrap();
    let mut contents = String::new();
    file.read_to_string(&mut contents).unwrap();
    from_str(&contents).unwrap()
}

/// One element a script pushes onto the stack.
#[derive(Debug, PartialEq, Eq)]
pub enum Push {
    Data(Vec<u8>),
    Number(i64),
}

impl Push {
    pub fn data(&self) -> &[u8] {
        match self {
            Push::Data(data) => data,
            Push::Number(n) => panic!("expected a data push, got number {}", n),
        }
    }
}

/// Splits a push-only script into its pushes.
pub fn parse_pushes(script: &[u8]) -> Vec<Push> {
    let mut pushes = vec![];
    let mut i = 0;
    while i < script.len() {
        let op = script[i];
        i += 1;
        let len = match op {
            0x00 => {
                pushes.push(Push::Number(0));
                continue;
            }
            0x51..=0x60 => {
                pushes.push(Push::Number((op - 0x50) as i64));
                continue;
            }
            0x01..=0x4b => op as usize,
            0x4c => {
                i += 1;
                script[i - 1] as usize
            }
            0x4d => {
                i += 2;
                u16::from_le_bytes([script[i - 2], script[i - 1]]) as usize
            }
            other => panic!("unexpected opcode {:#04x} in push-only script", other),
        };
        pushes.push(Push::Data(script[i..i + len].to_vec()));
        i += len;
    }
    pushes
}

/// The replay-protected signature digest, computed from the parsed
/// transaction rather than through the crate.
pub fn forkid_sighash(
    raw_tx: &[u8],
    tx: &bitcoin::Transaction,
    input_index: usize,
    script_code: &[u8],
    amount: u64,
) -> [u8; 32] {
    let mut prevouts = vec![];
    let mut sequences = vec![];
    for txin in &tx.input {
        prevouts.extend(serialize(&txin.previous_output));
        sequences.extend(serialize(&txin.sequence));
    }
    let mut outputs = vec![];
    for txout in &tx.output {
        outputs.extend(serialize(txout));
    }

    let txin = &tx.input[input_index];
    let mut preimage = vec![];
    preimage.extend_from_slice(&raw_tx[..4]);
    preimage.extend(sha256d::Hash::hash(&prevouts).to_byte_array());
    preimage.extend(sha256d::Hash::hash(&sequences).to_byte_array());
    preimage.extend(serialize(&txin.previous_output));
    preimage.extend(serialize(&script_code.to_vec()));
    preimage.extend(amount.to_le_bytes());
    preimage.extend(serialize(&txin.sequence));
    preimage.extend(sha256d::Hash::hash(&outputs).to_byte_array());
    preimage.extend_from_slice(&raw_tx[raw_tx.len() - 4..]);
    preimage.extend(SIGHASH_ALL_FORKID.to_le_bytes());

    sha256d::Hash::hash(&preimage).to_byte_array()
}

/// Checks a signature pushed by a signature script: DER, low-S, fork-id hash
/// type, valid for `pubkey` over `sighash`.
pub fn verify_pushed_signature(pushed: &[u8], pubkey: &PublicKey, sighash: [u8; 32]) {
    let (hash_type, der) = pushed.split_last().unwrap();
    assert_eq!(*hash_type as u32, SIGHASH_ALL_FORKID);

    let mut sig = Signature::from_der(der).unwrap();
    let original = sig;
    sig.normalize_s();
    assert_eq!(sig, original, "signature is not low-S");

    let secp = Secp256k1::verification_only();
    let msg = Message::from_digest_slice(&sighash).unwrap();
    secp.verify_ecdsa(&msg, &sig, pubkey).unwrap();
}
