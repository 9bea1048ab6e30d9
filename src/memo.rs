//! Decoding of memo-style `OP_RETURN` payloads
//!
//! A posted memo arrives as the indexer renders it:
//! `OP_RETURN <prefix> <script-hex>`, where `<prefix>` is the two-byte
//! protocol prefix read as a little-endian integer and `<script-hex>` is the
//! full output script. Everything after the prefix push is message text.
//! Push-length bytes are not stripped, so a 64-byte payload (push length
//! `0x40`) surfaces with a leading `@`.

use crate::error::MemoError;

const OP_RETURN: u8 = 0x6a;

/// Protocol family a memo prefix belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoProtocol {
    /// memo.cash, prefixes `0x6dXX`
    Memo,
    /// Blockpress, prefixes `0x8dXX`
    Blockpress,
    Unknown(u8),
}

/// What the memo does on its protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoAction {
    SetName,
    Post,
    Reply,
    Like,
    SetProfileText,
    Follow,
    Unfollow,
    Other(u8),
}

impl MemoAction {
    const fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::SetName,
            0x02 => Self::Post,
            0x03 => Self::Reply,
            0x04 => Self::Like,
            0x05 => Self::SetProfileText,
            0x06 => Self::Follow,
            0x07 => Self::Unfollow,
            other => Self::Other(other),
        }
    }
}

/// A decoded memo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memo {
    pub prefix: [u8; 2],
    pub protocol: MemoProtocol,
    pub action: MemoAction,
    pub message: String,
}

/// Decode an `OP_RETURN <prefix> <script-hex>` string
///
/// # Examples
///
/// ```
/// use memo_retval::memo::{decode, MemoProtocol, MemoAction};
///
/// let memo = decode("OP_RETURN 621 6a026d0268656c6c6f").unwrap();
/// assert_eq!(memo.protocol, MemoProtocol::Memo);
/// assert_eq!(memo.action, MemoAction::Post);
/// assert_eq!(memo.message, "hello");
/// ```
///
/// # Errors
///
/// Returns an error if the string is not in the expected form, the script is
/// not an `OP_RETURN` with a two-byte prefix push, or the declared prefix does
/// not match the script.
pub fn decode(encoded: &str) -> Result<Memo, MemoError> {
    let parts: Vec<&str> = encoded.split_whitespace().collect();
    let [op, declared, script_hex] = parts.as_slice() else {
        return Err(MemoError::Malformed(format!(
            "expected 3 fields, found {}",
            parts.len()
        )));
    };
    if *op != "OP_RETURN" {
        return Err(MemoError::Malformed(format!("unexpected leading token {op}")));
    }

    let declared: u16 = declared
        .parse()
        .map_err(|_| MemoError::InvalidPrefix((*declared).to_string()))?;
    let script = hex::decode(script_hex)?;

    match script.as_slice() {
        [] => Err(MemoError::NotOpReturn),
        [first, ..] if *first != OP_RETURN => Err(MemoError::NotOpReturn),
        [_, 0x02, family, code, rest @ ..] => {
            let actual = u16::from_le_bytes([*family, *code]);
            if actual != declared {
                return Err(MemoError::PrefixMismatch { declared, actual });
            }

            let protocol = match family {
                0x6d => MemoProtocol::Memo,
                0x8d => MemoProtocol::Blockpress,
                other => MemoProtocol::Unknown(*other),
            };

            Ok(Memo {
                prefix: [*family, *code],
                protocol,
                action: MemoAction::from_code(*code),
                message: String::from_utf8_lossy(rest).into_owned(),
            })
        }
        _ => Err(MemoError::MissingPrefix),
    }
}

/// The part of `message` after the last `@`, or all of it when there is none
///
/// # Examples
///
/// ```
/// use memo_retval::memo::extract_token_id;
///
/// assert_eq!(extract_token_id("token@abc"), "abc");
/// assert_eq!(extract_token_id("a@b@c"), "c");
/// assert_eq!(extract_token_id("no delimiter"), "no delimiter");
/// ```
#[must_use]
pub fn extract_token_id(message: &str) -> &str {
    message
        .rfind('@')
        .map_or(message, |pos| &message[pos + 1..])
}
