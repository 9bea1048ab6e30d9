//! Test fixtures and constants for memo-retval tests

#![allow(dead_code)] // Test fixtures may not all be used in every test

use crate::client::Utxo;
use crate::contract::{AbiFunction, AbiInput, Artifact};

/// Bytecode of the MemoRetval contract
pub const MEMO_RETVAL_BYTECODE: &str = "OP_SWAP OP_DUP OP_0 OP_NUMEQUAL OP_IF OP_DROP OP_OVER \
     OP_HASH160 OP_EQUALVERIFY OP_CHECKSIG OP_ELSE OP_1 OP_NUMEQUALVERIFY OP_DROP OP_EQUAL OP_ENDIF";

/// Public key hash of the key derived from the demo seed phrase at m/0
pub const ALICE_PKH: &str = "611f464b004a739cc95f9ae5193a94418e8c6828";

/// Testnet address of MemoRetval instantiated with [`ALICE_PKH`]
pub const MEMO_RETVAL_ADDRESS: &str = "bchtest:ppcqqu066dua9rnvhp9et73fkl6llccc3q9x29etaq";

/// Path of the contract artifact shipped with the crate
pub const MEMO_RETVAL_ARTIFACT_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/contracts/memo_retval.json");

fn input(name: &str, ty: &str) -> AbiInput {
    AbiInput {
        name: name.to_string(),
        ty: ty.to_string(),
    }
}

/// The MemoRetval artifact, built in code
#[must_use]
pub fn memo_retval_artifact() -> Artifact {
    Artifact {
        contract_name: "MemoRetval".to_string(),
        constructor_inputs: vec![input("pkh", "bytes20")],
        abi: vec![
            AbiFunction {
                name: "spend".to_string(),
                covenant: false,
                inputs: vec![input("pk", "pubkey"), input("s", "sig")],
            },
            AbiFunction {
                name: "validateTokenId".to_string(),
                covenant: false,
                inputs: vec![
                    input("localTokenId", "string"),
                    input("onchainTokenId", "string"),
                ],
            },
        ],
        bytecode: MEMO_RETVAL_BYTECODE.to_string(),
        source: String::new(),
        compiler: None,
        updated_at: None,
    }
}

/// Helper to create a UTXO worth `satoshis`; the txid is derived from the value
#[must_use]
pub fn test_utxo(satoshis: u64) -> Utxo {
    use bitcoin::hashes::{sha256d, Hash};

    Utxo {
        txid: bitcoin::Txid::from_raw_hash(sha256d::Hash::hash(&satoshis.to_le_bytes())),
        vout: 0,
        satoshis,
    }
}
