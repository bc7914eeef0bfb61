use std::{env, error::Error};

use secp256k1::{Secp256k1, SecretKey};
use spay::bitcoin::consensus::encode::serialize_hex;

use spay::{
    is_winning_secret, probability_from_ratio, pubkey_hash, secret_hash, Address, Covenant,
    CovenantParams, Network, PrevOutput,
};

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();

    // optional winning probability, e.g. 0.25
    let ratio: f64 = match args.get(1) {
        Some(ratio) => ratio.parse()?,
        None => 0.5,
    };
    // the output funding the covenant, as "<txid> <vout> <amount>"
    let funding = match (args.get(2), args.get(3), args.get(4)) {
        (Some(txid), Some(vout), Some(amount)) => {
            PrevOutput::from_hex(txid, vout.parse()?, amount.parse()?)?
        }
        _ => PrevOutput::from_hex(
            "a9b9e18ab45fd7b9a6243a72972ced5af6aef816016c30576e525beda66bb498",
            0,
            100_000,
        )?,
    };

    let secp = Secp256k1::new();
    let sender_key = SecretKey::from_slice(&[0x11; 32])?;
    let recipient_key = SecretKey::from_slice(&[0x22; 32])?;
    let secret = [0x33; 32];
    let salt = [0xde, 0xad, 0xbe, 0xef];

    let covenant = Covenant::new(
        pubkey_hash(&sender_key.public_key(&secp)),
        pubkey_hash(&recipient_key.public_key(&secp)),
        secret_hash(&secret),
        salt,
        144,
        probability_from_ratio(ratio),
        Network::Testnet,
    );

    println!("{}", covenant);
    println!("Covenant address: {}", covenant.p2sh_address_string()?);
    println!(
        "Parameters for the recipient:\n{}",
        CovenantParams::from(&covenant).to_json()?
    );

    let out_amount = funding.amount.saturating_sub(1_000);
    let spay_tx = covenant.make_spay_tx(&sender_key, &funding, out_amount, 500)?;
    println!("Funding tx {}: {}", spay_tx.txid(), serialize_hex(&spay_tx));

    let covenant_output = PrevOutput::new(spay_tx.txid(), 0, spay_tx.output[0].value.to_sat());

    if is_winning_secret(&secret, &salt, covenant.get_probability()) {
        let destination = Address::p2pkh(covenant.get_recipient_pkh(), Network::Testnet);
        let receive_tx = covenant.make_receive_tx(
            &covenant_output,
            &destination,
            500,
            &secret,
            &recipient_key,
        )?;
        println!(
            "Secret wins, receive tx {}: {}",
            receive_tx.txid(),
            serialize_hex(&receive_tx)
        );
    } else {
        println!(
            "Secret loses, the sender can refund after {} blocks",
            covenant.get_expiration()
        );
    }

    let destination = Address::p2pkh(covenant.get_sender_pkh(), Network::Testnet);
    let refund_tx = covenant.make_refund_tx(&covenant_output, &destination, 500, &sender_key)?;
    println!("Refund tx {}: {}", refund_tx.txid(), serialize_hex(&refund_tx));

    Ok(())
}
