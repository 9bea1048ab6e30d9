//! Outcomes of a contract call
//!
//! A send either produces a [`SendReceipt`] or one of the [`SendFailure`]
//! tags. Node rejections are classified from the script error text the node
//! returns, following the reason strings of the reference node
//! implementation.

use crate::error::ClientError;
use bitcoin::Txid;
use thiserror::Error;

/// Reasons that mean a `require` inside the contract evaluated false
const REQUIRE_REASONS: &[&str] = &[
    "Script evaluated without error but finished with a false/empty top stack element",
    "Script failed an OP_VERIFY operation",
    "Script failed an OP_EQUALVERIFY operation",
    "Script failed an OP_CHECKMULTISIGVERIFY operation",
    "Script failed an OP_CHECKSIGVERIFY operation",
    "Script failed an OP_CHECKDATASIGVERIFY operation",
    "Script failed an OP_NUMEQUALVERIFY operation",
];

/// Reasons raised by a lock time check; these count as failed transactions
const TIME_CHECK_REASONS: &[&str] = &["Negative locktime", "Locktime requirement not satisfied"];

/// Reasons raised while checking signatures
const SIG_CHECK_REASONS: &[&str] = &[
    "Signature must be zero for failed CHECK(MULTI)SIG operation",
    "Non-canonical DER signature",
    "Signature hash type missing or not understood",
    "Non-canonical signature: S value is unnecessarily high",
    "Signature must use SIGHASH_FORKID",
    "Illegal use of SIGHASH_FORKID",
    "Signature count negative or greater than pubkey count",
    "Pubkey count negative or limit exceeded",
];

/// A broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub txid: Txid,
    pub fee: u64,
    pub raw_hex: String,
}

/// Why a contract call did not go through
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendFailure {
    /// A `require` in the contract evaluated false
    #[error("Contract requirement failed: {0}")]
    Require(String),

    /// The transaction could not be broadcast
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// A signature check in the contract failed
    #[error("Signature check failed: {0}")]
    SigCheck(String),

    /// Anything else; the set of failure kinds is not assumed closed
    #[error("Contract call failed: {0}")]
    Other(String),
}

impl SendFailure {
    /// Classify a node rejection reason
    ///
    /// # Examples
    ///
    /// ```
    /// use memo_retval::outcome::SendFailure;
    ///
    /// let reason = "mandatory-script-verify-flag-failed (Script failed an OP_EQUALVERIFY operation)";
    /// assert!(matches!(SendFailure::from_rejection(reason), SendFailure::Require(_)));
    ///
    /// assert!(matches!(SendFailure::from_rejection("64: dust"), SendFailure::Transaction(_)));
    /// ```
    #[must_use]
    pub fn from_rejection(reason: &str) -> Self {
        let matches_any = |reasons: &[&str]| reasons.iter().any(|r| reason.contains(r));

        if matches_any(TIME_CHECK_REASONS) {
            Self::Transaction(reason.to_string())
        } else if matches_any(REQUIRE_REASONS) {
            Self::Require(reason.to_string())
        } else if matches_any(SIG_CHECK_REASONS) {
            Self::SigCheck(reason.to_string())
        } else {
            Self::Transaction(reason.to_string())
        }
    }

    /// Classify an error returned by the broadcast step
    #[must_use]
    pub fn from_broadcast_error(err: ClientError) -> Self {
        match err {
            ClientError::Rejected(reason) => Self::from_rejection(&reason),
            other => Self::Transaction(other.to_string()),
        }
    }
}

/// What a run observed for the validation call; one variant per log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Matched { txid: Txid },
    Mismatch { reason: String },
    SendFailed { reason: String },
    SignatureFailed { reason: String },
    Unknown { reason: String },
}

impl CallOutcome {
    /// The line logged for this outcome
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Matched { .. } => {
                "Local token ID successfully matched the token ID stored on-chain"
            }
            Self::Mismatch { .. } => "Local token ID did not match the token ID stored on-chain",
            Self::SendFailed { .. } => "The send transaction failed",
            Self::SignatureFailed { .. } => "The sender's signature failed validation",
            Self::Unknown { .. } => "Contract call failed for an unrecognised reason",
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

impl From<Result<SendReceipt, SendFailure>> for CallOutcome {
    fn from(result: Result<SendReceipt, SendFailure>) -> Self {
        match result {
            Ok(receipt) => Self::Matched { txid: receipt.txid },
            Err(SendFailure::Require(reason)) => Self::Mismatch { reason },
            Err(SendFailure::Transaction(reason)) => Self::SendFailed { reason },
            Err(SendFailure::SigCheck(reason)) => Self::SignatureFailed { reason },
            Err(SendFailure::Other(reason)) => Self::Unknown { reason },
        }
    }
}
