//! Error types for memo-retval operations

use thiserror::Error;

/// Errors that can occur while deriving keys from a seed phrase
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid child index {0} (non-hardened indices must be below 2^31)")]
    InvalidChildIndex(u32),

    #[error("Key derivation failed: {0}")]
    Derivation(#[from] bitcoin::bip32::Error),
}

/// Errors that can occur while assembling scripts
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Unknown opcode in bytecode: {0}")]
    UnknownOpcode(String),

    #[error("Invalid data push in bytecode: {0}")]
    InvalidPush(String),

    #[error("Push of {0} bytes exceeds the maximum push size")]
    PushTooLarge(usize),
}

/// Errors that can occur during contract compilation, instantiation and calls
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse contract artifact: {0}")]
    ArtifactError(#[from] serde_json::Error),

    #[error("Contract compiler failed: {0}")]
    CompileError(String),

    #[error("Unsupported contract file: {0} (expected .cash or .json)")]
    UnsupportedFile(String),

    #[error("Contract {0} exposes no functions")]
    EmptyAbi(String),

    #[error("Unknown parameter type: {0}")]
    UnknownType(String),

    #[error("Invalid bytecode: {0}")]
    BytecodeError(#[from] ScriptError),

    #[error("Function {0} not found in contract ABI")]
    UnknownFunction(String),

    #[error("{context} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Argument {name} expects type {expected}, got {actual}")]
    ArgumentType {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Argument {0} requires a signature, which cannot be produced here")]
    UnsignableArgument(String),
}

/// Errors that can occur while decoding an on-chain memo
#[derive(Debug, Error)]
pub enum MemoError {
    #[error("Malformed memo string: {0}")]
    Malformed(String),

    #[error("Invalid memo prefix: {0}")]
    InvalidPrefix(String),

    #[error("Invalid memo hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Memo script does not start with OP_RETURN")]
    NotOpReturn,

    #[error("Memo script is missing the protocol prefix push")]
    MissingPrefix,

    #[error("Memo prefix mismatch: declared {declared}, script carries {actual}")]
    PrefixMismatch { declared: u16, actual: u16 },
}

/// Errors reported by a network client
#[derive(Debug, Error)]
pub enum ClientError {
    #[cfg(feature = "rest")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors that end a run before the contract call is made
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Failed to derive signing key: {0}")]
    Derive(#[from] WalletError),

    #[error("Failed to compile contract: {0}")]
    Compile(#[source] ContractError),

    #[error("Failed to instantiate contract: {0}")]
    Instantiate(#[source] ContractError),

    #[error("Failed to query contract balance: {0}")]
    Balance(#[from] ClientError),

    #[error("Failed to decode on-chain memo: {0}")]
    Memo(#[from] MemoError),
}
