//! Canonical script construction.
use std::iter::once;

use crate::{
    utils::{
        OP_0, OP_1, OP_1NEGATE, OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160,
        OP_PUSHBYTES_20, OP_PUSHBYTES_75, OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4,
        MAX_SCRIPT_ELEMENT_SIZE, MAX_SCRIPT_SIZE,
    },
    Error, Result,
};

/// Default capacity of the script buffer, enough for the covenant's
/// signature scripts without regrowing.
const DEFAULT_SCRIPT_ALLOC: usize = 512;

/// ScriptBuilder pushes opcodes, integers and data while respecting the
/// canonical (minimal) push encoding expected by the script interpreter.
///
/// Every step returns a `Result`, so a chain of pushes stops at the first
/// rejected push and the partially built script is never handed out:
///
/// ```
/// use spay::utils::script::ScriptBuilder;
///
/// fn build(pkh: &[u8; 20]) -> spay::Result<Vec<u8>> {
///     Ok(ScriptBuilder::new()
///         .add_i64(1000)?
///         .add_data(pkh)?
///         .add_ops(&[0x75, 0x51])?
///         .drain())
/// }
/// assert_eq!(build(&[0u8; 20]).unwrap().len(), 3 + 21 + 2);
/// ```
pub struct ScriptBuilder {
    script: Vec<u8>,
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self {
            script: Vec::with_capacity(DEFAULT_SCRIPT_ALLOC),
        }
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }

    /// Takes the built script out of the builder. The builder is not meant to
    /// be reused afterwards.
    pub fn drain(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.script)
    }

    /// Appends raw opcode bytes verbatim.
    pub fn add_ops(&mut self, opcodes: &[u8]) -> Result<&mut Self> {
        if self.script.len() + opcodes.len() > MAX_SCRIPT_SIZE {
            return Err(Error::Construction(format!(
                "adding {} opcodes would exceed the maximum allowed script length of {}",
                opcodes.len(),
                MAX_SCRIPT_SIZE
            )));
        }

        self.script.extend_from_slice(opcodes);
        Ok(self)
    }

    /// Returns the number of bytes the canonical push of `data` takes.
    pub fn canonical_data_size(data: &[u8]) -> usize {
        let data_len = data.len();

        // Single small numbers are pushed with one of the small integer opcodes
        if data_len == 0 || (data_len == 1 && (data[0] <= 16 || data[0] == 0x81)) {
            return 1;
        }

        data_len
            + if data_len <= OP_PUSHBYTES_75 as usize {
                1
            } else if data_len <= u8::MAX as usize {
                2
            } else if data_len <= u16::MAX as usize {
                3
            } else {
                5
            }
    }

    fn add_raw_data(&mut self, data: &[u8]) -> &mut Self {
        let data_len = data.len();

        if data_len == 0 || (data_len == 1 && data[0] == 0) {
            self.script.push(OP_0);
            return self;
        } else if data_len == 1 && data[0] <= 16 {
            self.script.push((OP_1 - 1) + data[0]);
            return self;
        } else if data_len == 1 && data[0] == 0x81 {
            self.script.push(OP_1NEGATE);
            return self;
        }

        if data_len <= OP_PUSHBYTES_75 as usize {
            self.script.push(data_len as u8);
        } else if data_len <= u8::MAX as usize {
            self.script
                .extend(once(OP_PUSHDATA1).chain(once(data_len as u8)));
        } else if data_len <= u16::MAX as usize {
            self.script
                .extend(once(OP_PUSHDATA2).chain((data_len as u16).to_le_bytes()));
        } else {
            self.script
                .extend(once(OP_PUSHDATA4).chain((data_len as u32).to_le_bytes()));
        }

        self.script.extend_from_slice(data);
        self
    }

    /// Pushes `data` with the smallest canonical push opcode.
    ///
    /// Data larger than [`MAX_SCRIPT_ELEMENT_SIZE`], or a push that would grow
    /// the script past [`MAX_SCRIPT_SIZE`], is rejected and leaves the script
    /// untouched.
    pub fn add_data(&mut self, data: &[u8]) -> Result<&mut Self> {
        let data_size = Self::canonical_data_size(data);
        if self.script.len() + data_size > MAX_SCRIPT_SIZE {
            return Err(Error::Construction(format!(
                "adding {} bytes of data would exceed the maximum allowed script length of {}",
                data_size, MAX_SCRIPT_SIZE
            )));
        }

        let data_len = data.len();
        if data_len > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(Error::Construction(format!(
                "adding a data element of {} bytes would exceed the maximum allowed script element size of {}",
                data_len, MAX_SCRIPT_ELEMENT_SIZE
            )));
        }

        Ok(self.add_raw_data(data))
    }

    /// Pushes `val` as a script number: small integer opcodes for -1 and 0..=16,
    /// otherwise the minimal sign-magnitude little-endian encoding.
    pub fn add_i64(&mut self, val: i64) -> Result<&mut Self> {
        if self.script.len() + 1 > MAX_SCRIPT_SIZE {
            return Err(Error::Construction(format!(
                "adding integer {} would exceed the maximum allowed script length of {}",
                val, MAX_SCRIPT_SIZE
            )));
        }

        if val == 0 {
            self.script.push(OP_0);
            return Ok(self);
        }
        if val == -1 || (1..=16).contains(&val) {
            self.script.push(((OP_1 as i64 - 1) + val) as u8);
            return Ok(self);
        }

        self.add_data(&serialize_script_num(val))
    }
}

/// Minimal sign-magnitude little-endian encoding of a script number.
pub fn serialize_script_num(val: i64) -> Vec<u8> {
    if val == 0 {
        return vec![];
    }

    let negative = val < 0;
    let mut abs = val.unsigned_abs();
    let mut result = Vec::with_capacity(9);
    while abs > 0 {
        result.push((abs & 0xff) as u8);
        abs >>= 8;
    }

    // The most significant byte carries the sign bit, so an extra byte is
    // needed when the magnitude already uses it.
    if let Some(last) = result.last_mut() {
        if *last & 0x80 != 0 {
            result.push(if negative { 0x80 } else { 0x00 });
        } else if negative {
            *last |= 0x80;
        }
    }
    result
}

/// `OP_DUP OP_HASH160 <pkh> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.extend_from_slice(&[OP_DUP, OP_HASH160, OP_PUSHBYTES_20]);
    script.extend_from_slice(pubkey_hash);
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}

/// `OP_HASH160 <script hash> OP_EQUAL`
pub fn p2sh_script(script_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(23);
    script.extend_from_slice(&[OP_HASH160, OP_PUSHBYTES_20]);
    script.extend_from_slice(script_hash);
    script.push(OP_EQUAL);
    script
}

/// `<sig> <pubkey>`, the unlocking script of a pay-to-pubkey-hash output.
pub fn p2pkh_sig_script(signature: &[u8], pubkey: &[u8]) -> Result<Vec<u8>> {
    Ok(ScriptBuilder::new()
        .add_data(signature)?
        .add_data(pubkey)?
        .drain())
}

pub fn is_p2sh(spk: &[u8]) -> bool {
    matches!(spk, [OP_HASH160, OP_PUSHBYTES_20, .., OP_EQUAL] if spk.len() == 23)
}

pub fn is_p2pkh(spk: &[u8]) -> bool {
    matches!(
        spk,
        [OP_DUP, OP_HASH160, OP_PUSHBYTES_20, .., OP_EQUALVERIFY, OP_CHECKSIG] if spk.len() == 25
    )
}
