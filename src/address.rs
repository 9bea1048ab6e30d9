//! Address generation for contracts and keys
//!
//! Contracts are paid through P2SH outputs. Addresses are rendered in the
//! CashAddr format the indexer expects; the legacy base58 form is available
//! through rust-bitcoin for display.

use crate::config::Network;
use bitcoin::hashes::{hash160, Hash};
use bitcoin::ScriptBuf;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// What a hash160 address pays to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    P2pkh,
    P2sh,
}

impl AddressKind {
    const fn version_byte(self) -> u8 {
        // Type in bits 3..7, size code 0 (160 bits) in bits 0..3
        match self {
            Self::P2pkh => 0x00,
            Self::P2sh => 0x08,
        }
    }
}

/// A hash160 address on a Bitcoin Cash network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CashAddress {
    network: Network,
    kind: AddressKind,
    hash: hash160::Hash,
}

impl CashAddress {
    /// Address paying to the hash of a public key
    #[must_use]
    pub const fn p2pkh(hash: hash160::Hash, network: Network) -> Self {
        Self {
            network,
            kind: AddressKind::P2pkh,
            hash,
        }
    }

    /// Address paying to a redeem script
    #[must_use]
    pub fn p2sh(redeem_script: &ScriptBuf, network: Network) -> Self {
        Self {
            network,
            kind: AddressKind::P2sh,
            hash: hash160::Hash::hash(redeem_script.as_bytes()),
        }
    }

    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    #[must_use]
    pub const fn kind(&self) -> AddressKind {
        self.kind
    }

    #[must_use]
    pub const fn hash(&self) -> hash160::Hash {
        self.hash
    }

    /// Locking script for outputs paying to this address
    #[must_use]
    pub fn script_pubkey(&self) -> ScriptBuf {
        let hash = self.hash.to_byte_array();
        let mut bytes = Vec::with_capacity(25);
        match self.kind {
            AddressKind::P2pkh => {
                // OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG
                bytes.extend_from_slice(&[0x76, 0xa9, 0x14]);
                bytes.extend_from_slice(&hash);
                bytes.extend_from_slice(&[0x88, 0xac]);
            }
            AddressKind::P2sh => {
                // OP_HASH160 <20> OP_EQUAL
                bytes.extend_from_slice(&[0xa9, 0x14]);
                bytes.extend_from_slice(&hash);
                bytes.push(0x87);
            }
        }
        ScriptBuf::from_bytes(bytes)
    }

    /// CashAddr rendering, e.g. `bchtest:pp...`
    #[must_use]
    pub fn encode(&self) -> String {
        encode_cashaddr(
            self.network.cashaddr_prefix(),
            self.kind.version_byte(),
            &self.hash.to_byte_array(),
        )
    }

    /// Legacy base58 rendering
    #[must_use]
    pub fn legacy(&self) -> String {
        let network = self.network.bitcoin_network();
        let address = match self.kind {
            AddressKind::P2pkh => bitcoin::Address::p2pkh(
                bitcoin::PubkeyHash::from_raw_hash(self.hash),
                network,
            ),
            AddressKind::P2sh => bitcoin::Address::p2sh_from_hash(
                bitcoin::ScriptHash::from_raw_hash(self.hash),
                network,
            ),
        };
        address.to_string()
    }
}

impl std::fmt::Display for CashAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Encode a CashAddr string from prefix, version byte and payload
///
/// # Examples
///
/// ```
/// use memo_retval::address::encode_cashaddr;
///
/// let hash = [0x76, 0xa0, 0x40, 0x53, 0xbd, 0xa0, 0xa8, 0x8b, 0xda, 0x51,
///             0x77, 0xb8, 0x6a, 0x15, 0xc3, 0xb2, 0x9f, 0x55, 0x98, 0x73];
/// assert_eq!(
///     encode_cashaddr("bitcoincash", 0x00, &hash),
///     "bitcoincash:qpm2qsznhks23z7629mms6s4cwef74vcwvy22gdx6a"
/// );
/// ```
#[must_use]
pub fn encode_cashaddr(prefix: &str, version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + 1);
    data.push(version);
    data.extend_from_slice(payload);
    let words = convert_bits(&data, 8, 5);

    let mut checksum_input: Vec<u8> = prefix.bytes().map(|b| b & 0x1f).collect();
    checksum_input.push(0);
    checksum_input.extend_from_slice(&words);
    checksum_input.extend_from_slice(&[0u8; 8]);
    let poly = polymod(&checksum_input);

    let mut out = String::with_capacity(prefix.len() + 1 + words.len() + 8);
    out.push_str(prefix);
    out.push(':');
    for &w in &words {
        out.push(CHARSET[w as usize] as char);
    }
    for i in 0..8 {
        let w = ((poly >> (5 * (7 - i))) & 0x1f) as usize;
        out.push(CHARSET[w] as char);
    }
    out
}

fn polymod(values: &[u8]) -> u64 {
    const GENERATORS: [u64; 5] = [
        0x98_f2bc_8e61,
        0x79_b76d_99e2,
        0xf3_3e5f_b3c4,
        0xae_2eab_e2a8,
        0x1e_4f43_e470,
    ];

    let mut c: u64 = 1;
    for &d in values {
        let c0 = c >> 35;
        c = ((c & 0x07_ffff_ffff) << 5) ^ u64::from(d);
        for (i, g) in GENERATORS.iter().enumerate() {
            if (c0 >> i) & 1 == 1 {
                c ^= g;
            }
        }
    }
    c ^ 1
}

/// Regroup bits, padding the final group with zeros
fn convert_bits(data: &[u8], from: u32, to: u32) -> Vec<u8> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let max = (1u32 << to) - 1;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);
    for &value in data {
        acc = (acc << from) | u32::from(value);
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max) as u8);
        }
    }
    if bits > 0 {
        out.push(((acc << (to - bits)) & max) as u8);
    }
    out
}
