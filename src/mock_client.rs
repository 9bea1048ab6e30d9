//! Mock NetworkClient implementation for testing

#![cfg(test)]

use crate::address::CashAddress;
use crate::client::{ClientResult, NetworkClient, Utxo};
use crate::error::ClientError;
use bitcoin::{Transaction, Txid};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// How the mock answers a broadcast
#[derive(Debug, Clone)]
enum BroadcastMode {
    Accept,
    Reject(String),
    Unreachable(String),
}

/// Mock client for testing without a live indexer
#[derive(Clone)]
pub struct MockClient {
    inner: Arc<Mutex<MockClientInner>>,
}

struct MockClientInner {
    utxos: HashMap<CashAddress, Vec<Utxo>>,
    utxo_error: Option<String>,
    broadcast_mode: BroadcastMode,
    broadcasts: Vec<String>,
}

impl MockClient {
    /// Create a new mock client that accepts every broadcast
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockClientInner {
                utxos: HashMap::new(),
                utxo_error: None,
                broadcast_mode: BroadcastMode::Accept,
                broadcasts: Vec::new(),
            })),
        }
    }

    /// Add a UTXO for an address
    pub fn add_utxo(&self, address: &CashAddress, utxo: Utxo) {
        let mut inner = self.inner.lock().unwrap();
        inner.utxos.entry(*address).or_default().push(utxo);
    }

    /// Reject every broadcast with the node reason `reason`
    pub fn reject_broadcasts(&self, reason: &str) {
        self.inner.lock().unwrap().broadcast_mode = BroadcastMode::Reject(reason.to_string());
    }

    /// Fail every broadcast as if the indexer could not be reached
    pub fn disconnect_broadcasts(&self, message: &str) {
        self.inner.lock().unwrap().broadcast_mode =
            BroadcastMode::Unreachable(message.to_string());
    }

    /// Fail every UTXO lookup with `err`
    pub fn fail_utxo_lookups(&self, err: ClientError) {
        self.inner.lock().unwrap().utxo_error = Some(err.to_string());
    }

    /// Raw transactions passed to `broadcast`, accepted or not
    #[must_use]
    pub fn broadcasts(&self) -> Vec<String> {
        self.inner.lock().unwrap().broadcasts.clone()
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkClient for MockClient {
    async fn utxos(&self, address: &CashAddress) -> ClientResult<Vec<Utxo>> {
        let inner = self.inner.lock().unwrap();
        if let Some(message) = &inner.utxo_error {
            return Err(ClientError::Transport(message.clone()));
        }
        Ok(inner.utxos.get(address).cloned().unwrap_or_default())
    }

    async fn broadcast(&self, raw_tx_hex: &str) -> ClientResult<Txid> {
        let mut inner = self.inner.lock().unwrap();
        inner.broadcasts.push(raw_tx_hex.to_string());

        match &inner.broadcast_mode {
            BroadcastMode::Accept => {
                let bytes = hex::decode(raw_tx_hex)
                    .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
                let tx: Transaction = bitcoin::consensus::deserialize(&bytes)
                    .map_err(|e| ClientError::Rejected(format!("TX decode failed: {e}")))?;
                Ok(tx.compute_txid())
            }
            BroadcastMode::Reject(reason) => Err(ClientError::Rejected(reason.clone())),
            BroadcastMode::Unreachable(message) => Err(ClientError::Transport(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;
    use crate::test_fixtures::test_utxo;
    use bitcoin::hashes::{hash160, Hash};

    fn address() -> CashAddress {
        CashAddress::p2pkh(hash160::Hash::hash(b"mock"), Network::Testnet)
    }

    #[tokio::test]
    async fn test_mock_utxos() {
        let client = MockClient::new();
        let addr = address();

        assert!(client.utxos(&addr).await.unwrap().is_empty());

        client.add_utxo(&addr, test_utxo(1_000));
        client.add_utxo(&addr, test_utxo(2_000));
        let utxos = client.utxos(&addr).await.unwrap();
        assert_eq!(utxos.len(), 2);
        assert_eq!(utxos[1].satoshis, 2_000);
    }

    #[tokio::test]
    async fn test_mock_utxo_failure() {
        let client = MockClient::new();
        client.fail_utxo_lookups(ClientError::Transport("down".into()));
        assert!(client.utxos(&address()).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_broadcast_modes() {
        let client = MockClient::new();
        assert!(matches!(
            client.broadcast("00").await.unwrap_err(),
            ClientError::Rejected(_)
        ));

        client.reject_broadcasts("64: dust");
        assert!(matches!(
            client.broadcast("00").await.unwrap_err(),
            ClientError::Rejected(ref r) if r == "64: dust"
        ));

        client.disconnect_broadcasts("timed out");
        assert!(matches!(
            client.broadcast("00").await.unwrap_err(),
            ClientError::Transport(_)
        ));
        assert_eq!(client.broadcasts().len(), 3);
    }
}
