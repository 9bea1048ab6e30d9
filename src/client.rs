//! Abstract interface for talking to a Bitcoin Cash indexer

use crate::address::CashAddress;
use crate::error::ClientError;
use bitcoin::Txid;
use std::future::Future;

/// Result type for network client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Unspent output held by an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    pub satoshis: u64,
}

/// Abstract interface for interacting with the network
///
/// Contract instances only need to list their coins and broadcast spends;
/// everything else (fee estimation, signing, script evaluation) happens
/// locally or on chain.
pub trait NetworkClient {
    /// Unspent outputs locked to `address`
    fn utxos(&self, address: &CashAddress) -> impl Future<Output = ClientResult<Vec<Utxo>>> + Send;

    /// Broadcast a serialized transaction, returning its txid
    ///
    /// A transaction the node refuses must come back as
    /// [`ClientError::Rejected`] carrying the node's reason text.
    fn broadcast(&self, raw_tx_hex: &str) -> impl Future<Output = ClientResult<Txid>> + Send;
}
