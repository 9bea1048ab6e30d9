//! memo-retval - validate an on-chain token id through a Bitcoin Cash contract
//!
//! A token id is posted on chain inside a memo (`OP_RETURN`) output. This
//! crate reads that memo, extracts the token id and asks a CashScript contract
//! to compare it with a locally held id. The comparison runs as the contract's
//! `require`: a matching pair lets the spend through, anything else makes the
//! node reject it, and the rejection reason tells the caller which check failed.
//!
//! # Example
//!
//! ```ignore
//! use memo_retval::{runner, RestClient, RunConfig};
//!
//! let config = RunConfig::from_file("memo-retval.toml")?;
//! let client = RestClient::from_config(&config)?;
//! let report = runner::run(&config, &client).await?;
//! println!("{}", report.outcome.message());
//! ```
//!
//! # Working with contracts directly
//!
//! ```ignore
//! use memo_retval::{wallet, Contract, Network};
//!
//! let key = wallet::derive_from_phrase("Gym Friend", Network::Testnet, 0)?;
//! let contract = Contract::compile("contracts/memo_retval.json", Network::Testnet)?;
//! let instance = contract.instantiate(&[key.public_key_hash().into()])?;
//!
//! let balance = instance.balance(&client).await?;
//! let receipt = instance
//!     .function("validateTokenId", &["local".into(), "onchain".into()])?
//!     .send(&client, instance.address(), 10)
//!     .await?;
//! ```

pub mod address;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod memo;
pub mod outcome;
#[cfg(feature = "rest")]
pub mod rest_client;
pub mod runner;
pub mod script;
pub mod spend;
pub mod wallet;

#[cfg(test)]
mod mock_client;
#[cfg(test)]
mod test_fixtures;

// Re-export core types
pub use address::CashAddress;
pub use client::{NetworkClient, Utxo};
pub use config::{ConfigError, Network, RunConfig};
pub use contract::{Argument, Artifact, Contract, ContractInstance};
pub use error::{ClientError, ContractError, MemoError, RunError, WalletError};
pub use outcome::{CallOutcome, SendFailure, SendReceipt};
pub use runner::{run, RunReport};
pub use spend::ContractCall;

#[cfg(feature = "rest")]
pub use rest_client::RestClient;

// Re-export commonly used external types
pub use bitcoin;
pub use bitcoin::{ScriptBuf, Transaction, Txid};
