//! Transport boundary for fetching message and transaction records
//!
//! Pure I/O seam of the tracing engine. Implementations:
//! - [`GqlTransport`]: GraphQL-style indexer endpoint
//! - [`JrpcTransport`]: JSON-RPC node endpoint
//! - [`ProxyTransport`]: in-process store of fabricated records, used for
//!   local/simulated execution and tests; no network at all
//!
//! Any fetch failure is fatal to the whole trace request; the engine never
//! retries silently and never consumes a partially built tree.

use crate::errors::TransportError;
use crate::types::{Address, CodeHash, MessageRecord, MsgId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "transport-http")]
mod gql;
#[cfg(feature = "transport-http")]
mod jrpc;
mod proxy;
#[cfg(feature = "transport-http")]
mod wire;

#[cfg(feature = "transport-http")]
pub use gql::GqlTransport;
#[cfg(feature = "transport-http")]
pub use jrpc::JrpcTransport;
pub use proxy::ProxyTransport;

/// Account state summary returned by the data source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountData {
    pub address: Address,
    /// Hash of the account's deployed code; `None` for uninitialized accounts
    pub code_hash: Option<CodeHash>,
}

/// Data-source contract consumed by the tree builder and the tracer
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches one message record, including its destination transaction
    /// when the message has been processed
    async fn fetch_message(&self, id: &MsgId) -> Result<MessageRecord, TransportError>;

    /// Fetches code hashes for a set of account addresses.
    ///
    /// Accounts unknown to the data source are simply omitted from the
    /// result; only transport-level failures are errors.
    async fn fetch_accounts_data(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<AccountData>, TransportError>;
}

/// Parses a ledger amount that may arrive as decimal or 0x-prefixed hex
#[cfg(feature = "transport-http")]
pub(crate) fn parse_amount(raw: Option<&str>) -> Result<u128, TransportError> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => u128::from_str_radix(hex, 16),
        None => raw.parse::<u128>(),
    };
    parsed.map_err(|_| TransportError::InvalidResponse(format!("bad amount: {raw}")))
}
