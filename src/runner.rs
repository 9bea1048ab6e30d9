//! The end-to-end validation run
//!
//! A run derives the demo key, instantiates the contract with its public key
//! hash, reads the token id out of the posted memo and asks the contract to
//! compare it with the local one. The comparison itself happens on chain: the
//! run only observes whether the spend was accepted, and why not.

use crate::address::CashAddress;
use crate::client::NetworkClient;
use crate::config::RunConfig;
use crate::contract::{Argument, Contract};
use crate::error::RunError;
use crate::memo;
use crate::outcome::{CallOutcome, SendFailure};
use crate::wallet;

/// Function of the contract that compares the two token ids
pub const VALIDATE_FUNCTION: &str = "validateTokenId";

/// What a completed run observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub address: CashAddress,
    pub balance: u64,
    pub onchain_token_id: String,
    pub outcome: CallOutcome,
}

/// Execute one validation run
///
/// Failures of the contract call are classified into the report's
/// [`CallOutcome`]; everything before the call is fatal.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the key cannot be
/// derived, the contract cannot be compiled or instantiated, the balance
/// cannot be read, or the memo cannot be decoded.
pub async fn run<C: NetworkClient>(config: &RunConfig, client: &C) -> Result<RunReport, RunError> {
    config.validate()?;

    let key = wallet::derive_from_phrase(&config.seed_phrase, config.network, config.derivation_index)?;
    let pkh = key.public_key_hash();
    tracing::debug!(index = key.index(), %pkh, "derived key");

    let contract =
        Contract::compile(&config.contract_path, config.network).map_err(RunError::Compile)?;
    let instance = contract
        .instantiate(&[pkh.into()])
        .map_err(RunError::Instantiate)?;
    let address = *instance.address();
    tracing::info!(%address, legacy = %address.legacy(), "contract address");

    let balance = instance.balance(client).await?;
    tracing::info!(%address, balance, "contract balance");

    let decoded = memo::decode(&config.encoded_memo)?;
    let onchain_token_id = memo::extract_token_id(&decoded.message).to_string();
    tracing::info!(token_id = %onchain_token_id, "token id stored on-chain");

    let args = [
        Argument::from(config.local_token_id.as_str()),
        Argument::from(onchain_token_id.as_str()),
    ];
    let result = match instance.function(VALIDATE_FUNCTION, &args) {
        Ok(call) => call.send(client, &address, config.send_amount).await,
        Err(e) => Err(SendFailure::Other(e.to_string())),
    };

    let outcome = CallOutcome::from(result);
    match &outcome {
        CallOutcome::Matched { txid } => tracing::info!(%txid, "{}", outcome.message()),
        CallOutcome::Mismatch { reason }
        | CallOutcome::SendFailed { reason }
        | CallOutcome::SignatureFailed { reason }
        | CallOutcome::Unknown { reason } => tracing::warn!(%reason, "{}", outcome.message()),
    }

    Ok(RunReport {
        address,
        balance,
        onchain_token_id,
        outcome,
    })
}
