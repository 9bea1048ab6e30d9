//! REST-based NetworkClient implementation for the bitcoin.com indexer
//!
//! Two endpoints are used:
//!
//! - `GET  {base}address/utxo/{cashaddr}` lists the coins held by an address
//! - `POST {base}rawtransactions/sendRawTransaction` broadcasts a transaction
//!
//! A broadcast the node refuses comes back as an HTTP error whose JSON body
//! carries the node's reason in `error`; it is surfaced as
//! [`ClientError::Rejected`] so callers can classify it.
//!
//! # Example
//!
//! ```ignore
//! use memo_retval::{RestClient, RunConfig};
//!
//! let client = RestClient::from_config(&RunConfig::default())?;
//! let utxos = client.utxos(instance.address()).await?;
//! ```

use crate::address::CashAddress;
use crate::client::{ClientResult, NetworkClient, Utxo};
use crate::config::RunConfig;
use crate::error::ClientError;
use bitcoin::Txid;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Deserialize)]
struct UtxoResponse {
    utxos: Vec<UtxoEntry>,
}

#[derive(Debug, Deserialize)]
struct UtxoEntry {
    txid: String,
    vout: u32,
    satoshis: u64,
}

#[derive(Debug, Serialize)]
struct SendRawRequest<'a> {
    hexes: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: serde_json::Value,
}

/// REST client for a bitcoin.com style indexer
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    /// Create a client for the indexer at `base_url`
    ///
    /// Requests wait for the indexer for as long as it takes.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let http = reqwest::Client::builder().build()?;

        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        Ok(Self { http, base_url })
    }

    /// Create a client for the indexer named in `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &RunConfig) -> ClientResult<Self> {
        Self::new(&config.rest_base())
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Pull the node's reason out of an error response body
fn rejection_reason(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: serde_json::Value::String(reason),
        }) => reason,
        Ok(ErrorBody { error }) => error.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

impl NetworkClient for RestClient {
    async fn utxos(&self, address: &CashAddress) -> ClientResult<Vec<Utxo>> {
        let url = self.url(&format!("address/utxo/{address}"));
        tracing::debug!(%url, "fetching utxos");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ClientError::InvalidResponse(format!(
                "{status}: {}",
                rejection_reason(&body)
            )));
        }

        let body: UtxoResponse = response.json().await?;
        body.utxos
            .into_iter()
            .map(|entry| {
                let txid = Txid::from_str(&entry.txid).map_err(|e| {
                    ClientError::InvalidResponse(format!("Invalid txid {}: {e}", entry.txid))
                })?;
                Ok(Utxo {
                    txid,
                    vout: entry.vout,
                    satoshis: entry.satoshis,
                })
            })
            .collect()
    }

    async fn broadcast(&self, raw_tx_hex: &str) -> ClientResult<Txid> {
        let url = self.url("rawtransactions/sendRawTransaction");
        tracing::debug!(%url, bytes = raw_tx_hex.len() / 2, "broadcasting transaction");

        let response = self
            .http
            .post(&url)
            .json(&SendRawRequest { hexes: [raw_tx_hex] })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let reason = rejection_reason(&body);
            tracing::debug!(%status, %reason, "broadcast rejected");
            return Err(ClientError::Rejected(reason));
        }

        let txids: Vec<String> = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(format!("{e}: {body}")))?;
        let txid = txids
            .first()
            .ok_or_else(|| ClientError::InvalidResponse("empty broadcast response".into()))?;
        Txid::from_str(txid)
            .map_err(|e| ClientError::InvalidResponse(format!("Invalid txid {txid}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_stalled_broadcast_keeps_waiting() {
        // Accepts connections, never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = RestClient::new(&format!("http://{addr}/v2/")).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(600), client.broadcast("0200")).await;
        assert!(result.is_err(), "broadcast gave up early: {result:?}");
        drop(listener);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = RestClient::new("https://trest.bitcoin.com/v2").unwrap();
        assert_eq!(client.base_url(), "https://trest.bitcoin.com/v2/");
        assert_eq!(
            client.url("address/utxo/x"),
            "https://trest.bitcoin.com/v2/address/utxo/x"
        );
    }

    #[test]
    fn test_from_config() {
        let client = RestClient::from_config(&RunConfig::default()).unwrap();
        assert_eq!(client.base_url(), "https://trest.bitcoin.com/v2/");
    }

    #[test]
    fn test_rejection_reason() {
        let body = r#"{"error":"64: dust"}"#;
        assert_eq!(rejection_reason(body), "64: dust");

        let nested = r#"{"error":{"code":-26}}"#;
        assert_eq!(rejection_reason(nested), r#"{"code":-26}"#);

        assert_eq!(rejection_reason("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_parse_utxo_response() {
        let body = r#"{
            "utxos": [{
                "txid": "9d1a7a0b3c1dc1a3e1b16b1d2c1f5c9d9d4de5d1c9b2a6e0f6a63b7e0f1d2c3b",
                "vout": 1,
                "amount": 0.0001,
                "satoshis": 10000,
                "height": 1340000,
                "confirmations": 12
            }],
            "legacyAddress": "2N3TSChocfo5rYnzQYehLgpeJwEEeCGkxKz",
            "cashAddress": "bchtest:ppcqqu066dua9rnvhp9et73fkl6llccc3q9x29etaq"
        }"#;
        let parsed: UtxoResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.utxos.len(), 1);
        assert_eq!(parsed.utxos[0].vout, 1);
        assert_eq!(parsed.utxos[0].satoshis, 10_000);
    }

    #[test]
    fn test_send_raw_body() {
        let body = serde_json::to_string(&SendRawRequest { hexes: ["0200"] }).unwrap();
        assert_eq!(body, r#"{"hexes":["0200"]}"#);
    }
}
