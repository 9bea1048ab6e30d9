//! Configuration for a token validation run
//!
//! Every value the run needs (seed phrase, token id, encoded memo, REST
//! endpoint) lives in [`RunConfig`]. The defaults reproduce the published
//! testnet walkthrough; a TOML file can override any of them.
//!
//! # Example Configuration File (memo-retval.toml)
//!
//! ```toml
//! network = "testnet"
//! rest_url = "https://trest.bitcoin.com/v2/"
//! seed_phrase = "Gym Friend"
//! derivation_index = 0
//! contract_path = "contracts/memo_retval.json"
//! local_token_id = "ec10a63a4067dff85a8ba9256dd0c9a86f25f9a4191b7411a54f5c2fdfd19221"
//! encoded_memo = "OP_RETURN 653 6a028d0240..."
//! send_amount = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Token id the caller expects to find on chain
pub const DEFAULT_LOCAL_TOKEN_ID: &str =
    "ec10a63a4067dff85a8ba9256dd0c9a86f25f9a4191b7411a54f5c2fdfd19221";

/// Memo posted on testnet carrying `@` followed by the token id
pub const DEFAULT_ENCODED_MEMO: &str = "OP_RETURN 653 6a028d024065633130613633613430363764666638356138626139323536646430633961383666323566396134313931623734313161353466356332666466643139323231";

/// Seed phrase of the demo key
pub const DEFAULT_SEED_PHRASE: &str = "Gym Friend";

/// Bitcoin Cash network selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Regtest,
}

impl Network {
    /// Human-readable part of CashAddr addresses on this network
    #[must_use]
    pub const fn cashaddr_prefix(self) -> &'static str {
        match self {
            Self::Mainnet => "bitcoincash",
            Self::Testnet => "bchtest",
            Self::Regtest => "bchreg",
        }
    }

    /// Matching rust-bitcoin network, used for key and legacy address encoding
    #[must_use]
    pub const fn bitcoin_network(self) -> bitcoin::Network {
        match self {
            Self::Mainnet => bitcoin::Network::Bitcoin,
            Self::Testnet => bitcoin::Network::Testnet,
            Self::Regtest => bitcoin::Network::Regtest,
        }
    }

    /// Default REST indexer for this network
    #[must_use]
    pub fn default_rest_url(self) -> String {
        match self {
            Self::Mainnet => "https://rest.bitcoin.com/v2/".to_string(),
            Self::Testnet => "https://trest.bitcoin.com/v2/".to_string(),
            Self::Regtest => "http://127.0.0.1:3000/v2/".to_string(),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
            Self::Regtest => write!(f, "regtest"),
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Network the contract lives on
    pub network: Network,
    /// Base URL of the REST indexer (must end in `/` or it will be added)
    pub rest_url: String,
    /// Phrase the keypair is derived from
    pub seed_phrase: String,
    /// Non-hardened child index of the master key
    pub derivation_index: u32,
    /// Contract artifact (`.json`) or source (`.cash`)
    pub contract_path: PathBuf,
    /// Token id known to the caller
    pub local_token_id: String,
    /// Memo in `OP_RETURN <prefix> <hex>` form
    pub encoded_memo: String,
    /// Satoshis sent back to the contract when the ids match
    pub send_amount: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::for_network(Network::Testnet)
    }
}

impl RunConfig {
    /// Default configuration on the given network
    #[must_use]
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            rest_url: network.default_rest_url(),
            seed_phrase: DEFAULT_SEED_PHRASE.to_string(),
            derivation_index: 0,
            contract_path: PathBuf::from("contracts/memo_retval.json"),
            local_token_id: DEFAULT_LOCAL_TOKEN_ID.to_string(),
            encoded_memo: DEFAULT_ENCODED_MEMO.to_string(),
            send_amount: 10,
        }
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to a TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check the values a run cannot proceed without
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seed_phrase.trim().is_empty() {
            return Err(ConfigError::Invalid("seed_phrase must not be empty".into()));
        }
        if self.send_amount == 0 {
            return Err(ConfigError::Invalid("send_amount must be positive".into()));
        }
        if !(self.rest_url.starts_with("http://") || self.rest_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "rest_url must be an http(s) URL, got {}",
                self.rest_url
            )));
        }
        Ok(())
    }

    /// REST base URL with a guaranteed trailing slash
    #[must_use]
    pub fn rest_base(&self) -> String {
        if self.rest_url.ends_with('/') {
            self.rest_url.clone()
        } else {
            format!("{}/", self.rest_url)
        }
    }

    /// Set the network, resetting the REST URL to that network's default
    #[must_use]
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self.rest_url = network.default_rest_url();
        self
    }

    /// Set the contract path
    #[must_use]
    pub fn with_contract_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.contract_path = path.into();
        self
    }

    /// Set the encoded memo
    #[must_use]
    pub fn with_encoded_memo(mut self, memo: &str) -> Self {
        self.encoded_memo = memo.to_string();
        self
    }

    /// Set the local token id
    #[must_use]
    pub fn with_local_token_id(mut self, token_id: &str) -> Self {
        self.local_token_id = token_id.to_string();
        self
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
