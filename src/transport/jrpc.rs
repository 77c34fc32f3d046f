//! JSON-RPC node transport
//!
//! Talks to a node exposing `getMessage` / `getAccountsData` methods over
//! JSON-RPC 2.0. Record payloads share the wire shape of the GraphQL
//! transport.

use super::wire::{WireAccount, WireMessage};
use super::{AccountData, Transport};
use crate::errors::TransportError;
use crate::types::{Address, MessageRecord, MsgId};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct JrpcResponse<T> {
    result: Option<T>,
    error: Option<JrpcError>,
}

#[derive(Debug, Deserialize)]
struct JrpcError {
    code: i64,
    message: String,
}

/// Transport over a JSON-RPC 2.0 node endpoint
pub struct JrpcTransport {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    next_id: AtomicU64,
}

impl JrpcTransport {
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        let endpoint = endpoint
            .parse()
            .map_err(|_| TransportError::Endpoint(endpoint.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>, TransportError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let envelope: JrpcResponse<T> = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        if let Some(error) = envelope.error {
            return Err(TransportError::InvalidResponse(format!(
                "{} (code {})",
                error.message, error.code
            )));
        }
        Ok(envelope.result)
    }
}

#[async_trait]
impl Transport for JrpcTransport {
    async fn fetch_message(&self, id: &MsgId) -> Result<MessageRecord, TransportError> {
        debug!(id = %id, "fetching message over jsonrpc");
        let wire: Option<WireMessage> = self.call("getMessage", json!({ "id": id.0 })).await?;
        wire.ok_or_else(|| TransportError::MessageNotFound(id.clone()))?
            .into_record()
    }

    async fn fetch_accounts_data(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<AccountData>, TransportError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<&str> = addresses.iter().map(|a| a.0.as_str()).collect();
        let accounts: Option<Vec<WireAccount>> = self
            .call("getAccountsData", json!({ "addresses": ids }))
            .await?;
        Ok(accounts
            .unwrap_or_default()
            .into_iter()
            .map(WireAccount::into_account_data)
            .collect())
    }
}
