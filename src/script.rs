//! Script assembly for Bitcoin Cash contracts
//!
//! Compiled contracts ship their bytecode as ASM (`OP_SWAP OP_DUP 14ab..`),
//! where every token is either an opcode name or a hex data push. Bitcoin
//! Cash re-enabled several opcodes under their original names (`OP_CAT`,
//! `OP_SPLIT`, ...) so the table here is the BCH one rather than
//! rust-bitcoin's.

use crate::error::ScriptError;
use bitcoin::opcodes::{all, Opcode};
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::ScriptBuf;

const OPCODES: &[(&str, u8)] = &[
    ("OP_0", 0x00),
    ("OP_FALSE", 0x00),
    ("OP_PUSHDATA1", 0x4c),
    ("OP_PUSHDATA2", 0x4d),
    ("OP_PUSHDATA4", 0x4e),
    ("OP_1NEGATE", 0x4f),
    ("OP_1", 0x51),
    ("OP_TRUE", 0x51),
    ("OP_2", 0x52),
    ("OP_3", 0x53),
    ("OP_4", 0x54),
    ("OP_5", 0x55),
    ("OP_6", 0x56),
    ("OP_7", 0x57),
    ("OP_8", 0x58),
    ("OP_9", 0x59),
    ("OP_10", 0x5a),
    ("OP_11", 0x5b),
    ("OP_12", 0x5c),
    ("OP_13", 0x5d),
    ("OP_14", 0x5e),
    ("OP_15", 0x5f),
    ("OP_16", 0x60),
    ("OP_NOP", 0x61),
    ("OP_IF", 0x63),
    ("OP_NOTIF", 0x64),
    ("OP_ELSE", 0x67),
    ("OP_ENDIF", 0x68),
    ("OP_VERIFY", 0x69),
    ("OP_RETURN", 0x6a),
    ("OP_TOALTSTACK", 0x6b),
    ("OP_FROMALTSTACK", 0x6c),
    ("OP_2DROP", 0x6d),
    ("OP_2DUP", 0x6e),
    ("OP_3DUP", 0x6f),
    ("OP_2OVER", 0x70),
    ("OP_2ROT", 0x71),
    ("OP_2SWAP", 0x72),
    ("OP_IFDUP", 0x73),
    ("OP_DEPTH", 0x74),
    ("OP_DROP", 0x75),
    ("OP_DUP", 0x76),
    ("OP_NIP", 0x77),
    ("OP_OVER", 0x78),
    ("OP_PICK", 0x79),
    ("OP_ROLL", 0x7a),
    ("OP_ROT", 0x7b),
    ("OP_SWAP", 0x7c),
    ("OP_TUCK", 0x7d),
    ("OP_CAT", 0x7e),
    ("OP_SPLIT", 0x7f),
    ("OP_NUM2BIN", 0x80),
    ("OP_BIN2NUM", 0x81),
    ("OP_SIZE", 0x82),
    ("OP_AND", 0x84),
    ("OP_OR", 0x85),
    ("OP_XOR", 0x86),
    ("OP_EQUAL", 0x87),
    ("OP_EQUALVERIFY", 0x88),
    ("OP_1ADD", 0x8b),
    ("OP_1SUB", 0x8c),
    ("OP_NEGATE", 0x8f),
    ("OP_ABS", 0x90),
    ("OP_NOT", 0x91),
    ("OP_0NOTEQUAL", 0x92),
    ("OP_ADD", 0x93),
    ("OP_SUB", 0x94),
    ("OP_DIV", 0x96),
    ("OP_MOD", 0x97),
    ("OP_BOOLAND", 0x9a),
    ("OP_BOOLOR", 0x9b),
    ("OP_NUMEQUAL", 0x9c),
    ("OP_NUMEQUALVERIFY", 0x9d),
    ("OP_NUMNOTEQUAL", 0x9e),
    ("OP_LESSTHAN", 0x9f),
    ("OP_GREATERTHAN", 0xa0),
    ("OP_LESSTHANOREQUAL", 0xa1),
    ("OP_GREATERTHANOREQUAL", 0xa2),
    ("OP_MIN", 0xa3),
    ("OP_MAX", 0xa4),
    ("OP_WITHIN", 0xa5),
    ("OP_RIPEMD160", 0xa6),
    ("OP_SHA1", 0xa7),
    ("OP_SHA256", 0xa8),
    ("OP_HASH160", 0xa9),
    ("OP_HASH256", 0xaa),
    ("OP_CODESEPARATOR", 0xab),
    ("OP_CHECKSIG", 0xac),
    ("OP_CHECKSIGVERIFY", 0xad),
    ("OP_CHECKMULTISIG", 0xae),
    ("OP_CHECKMULTISIGVERIFY", 0xaf),
    ("OP_NOP1", 0xb0),
    ("OP_CHECKLOCKTIMEVERIFY", 0xb1),
    ("OP_CHECKSEQUENCEVERIFY", 0xb2),
    ("OP_NOP4", 0xb3),
    ("OP_NOP5", 0xb4),
    ("OP_NOP6", 0xb5),
    ("OP_NOP7", 0xb6),
    ("OP_NOP8", 0xb7),
    ("OP_NOP9", 0xb8),
    ("OP_NOP10", 0xb9),
    ("OP_CHECKDATASIG", 0xba),
    ("OP_CHECKDATASIGVERIFY", 0xbb),
];

/// Look up a BCH opcode by its ASM name
#[must_use]
pub fn opcode_by_name(name: &str) -> Option<Opcode> {
    OPCODES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, byte)| Opcode::from(byte))
}

/// Assemble an ASM string into a script
///
/// # Examples
///
/// ```
/// use memo_retval::script::asm_to_script;
///
/// let script = asm_to_script("OP_DUP OP_HASH160 OP_EQUALVERIFY").unwrap();
/// assert_eq!(script.as_bytes(), &[0x76, 0xa9, 0x88]);
/// ```
///
/// # Errors
///
/// Returns an error for unknown opcodes or tokens that are not valid hex.
pub fn asm_to_script(asm: &str) -> Result<ScriptBuf, ScriptError> {
    let mut builder = Builder::new();
    for token in asm.split_whitespace() {
        if token.starts_with("OP_") {
            let opcode =
                opcode_by_name(token).ok_or_else(|| ScriptError::UnknownOpcode(token.into()))?;
            builder = builder.push_opcode(opcode);
        } else {
            let data = hex::decode(token).map_err(|_| ScriptError::InvalidPush(token.into()))?;
            builder = push_data(builder, &data)?;
        }
    }
    Ok(builder.into_script())
}

/// Push `data` using the smallest encoding a standard node accepts
///
/// # Errors
///
/// Returns an error if `data` exceeds the maximum push size.
pub fn push_data(builder: Builder, data: &[u8]) -> Result<Builder, ScriptError> {
    match data {
        [] => Ok(builder.push_opcode(all::OP_PUSHBYTES_0)),
        [n @ 1..=16] => Ok(builder.push_int(i64::from(*n))),
        [0x81] => Ok(builder.push_opcode(all::OP_PUSHNUM_NEG1)),
        _ => {
            let bytes = PushBytesBuf::try_from(data.to_vec())
                .map_err(|_| ScriptError::PushTooLarge(data.len()))?;
            Ok(builder.push_slice(bytes))
        }
    }
}

/// Encode an integer as a minimal script number (little-endian sign-magnitude)
///
/// # Examples
///
/// ```
/// use memo_retval::script::encode_script_num;
///
/// assert!(encode_script_num(0).is_empty());
/// assert_eq!(encode_script_num(-1), vec![0x81]);
/// assert_eq!(encode_script_num(128), vec![0x80, 0x00]);
/// ```
#[must_use]
pub fn encode_script_num(value: i64) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }

    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    let mut out = Vec::with_capacity(9);
    while magnitude > 0 {
        out.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }

    // Sign lives in the top bit of the last byte; add a byte if it is taken
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }
    out
}

/// Render script bytes back to ASM (BCH names, hex for pushes)
#[must_use]
pub fn script_to_asm(script: &ScriptBuf) -> String {
    let bytes = script.as_bytes();
    let mut parts = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let op = bytes[i];
        i += 1;
        let push_len = match op {
            0x01..=0x4b => Some(op as usize),
            0x4c if i < bytes.len() => {
                i += 1;
                Some(bytes[i - 1] as usize)
            }
            0x4d if i + 1 < bytes.len() => {
                i += 2;
                Some(u16::from_le_bytes([bytes[i - 2], bytes[i - 1]]) as usize)
            }
            _ => None,
        };
        match push_len {
            Some(len) => {
                let end = (i + len).min(bytes.len());
                parts.push(hex::encode(&bytes[i..end]));
                i = end;
            }
            None => {
                let name = OPCODES
                    .iter()
                    .find(|&&(_, b)| b == op)
                    .map_or_else(|| format!("0x{op:02x}"), |(n, _)| (*n).to_string());
                parts.push(name);
            }
        }
    }
    parts.join(" ")
}
