//! Error types for TVM transaction tracing
//!
//! This module defines the error handling system covering:
//! - Transport failures (unreachable endpoint, unknown records)
//! - ABI artifact problems
//! - Terminal reporting of non-ignored on-chain errors
//!
//! Decode failures and unknown contracts are deliberately *not* errors: they
//! are recovered locally during tracing (`decoded = None`, placeholder
//! contract) and never surface here.

use crate::types::{Address, ErrorPhase, MsgId};
use serde::Serialize;
use thiserror::Error;

/// Top-level error type for the tracing engine
///
/// Encompasses every way a trace request can fail as a whole, providing a
/// unified error handling interface for users.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The data source is unreachable or returned an unusable record.
    /// Fatal to the trace request; never retried silently.
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// A contract artifact could not be loaded or parsed
    #[error("ABI error: {0}")]
    Abi(String),

    /// A non-ignored on-chain error was found and `raise` was requested
    #[error("Transaction reverted:\n{0}")]
    Reverted(RevertReport),
}

/// Transport-specific errors
///
/// These occur at the I/O boundary while fetching message and transaction
/// records. Any of them aborts the whole trace request: there is no
/// partial-tree degraded mode.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Invalid or malformed endpoint URL
    #[error("Invalid endpoint: {0}")]
    Endpoint(String),

    /// Request-level failure (connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Http(String),

    /// The data source does not know the requested message id
    #[error("Message not found: {0}")]
    MessageNotFound(MsgId),

    /// The data source does not hold data for the requested account
    #[error("Account not found: {0}")]
    AccountNotFound(Address),

    /// The response could not be decoded into a record
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Rendered diagnostic for the first (traversal-order) reverted branch
///
/// Carries everything the user needs to see: the offending contract, method
/// and parameters, the failing phase and code, and the fee breakdown up to
/// that point in the tree.
#[derive(Debug, Clone, Serialize)]
pub struct RevertReport {
    /// Name of the offending contract
    pub contract: String,
    /// Address the contract was resolved against, if known
    pub address: Option<Address>,
    /// Decoded method or event name, if decoding succeeded
    pub method: Option<String>,
    /// Decoded parameters, if decoding succeeded
    pub params: Option<serde_json::Value>,
    /// Phase that failed
    pub phase: ErrorPhase,
    /// Exit or result code
    pub code: i32,
    /// Fees accumulated over the whole tree up to reporting time
    pub total_fees: u128,
    /// Full rendered path from the root to the failure
    pub rendered: String,
}

impl std::fmt::Display for RevertReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} failed in {} phase with code {}",
            self.contract, self.phase, self.code
        )?;
        if let Some(method) = &self.method {
            writeln!(f, "  method: {}", method)?;
        }
        if let Some(params) = &self.params {
            writeln!(f, "  params: {}", params)?;
        }
        if let Some(address) = &self.address {
            writeln!(f, "  address: {}", address)?;
        }
        writeln!(f, "  total fees so far: {}", self.total_fees)?;
        f.write_str(&self.rendered)
    }
}
