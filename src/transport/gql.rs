//! GraphQL-style indexer transport
//!
//! Queries a blockchain indexer exposing `messages` and `accounts`
//! collections. Amount fields are requested in decimal form; bodies arrive
//! hex-encoded and are mapped by the shared wire layer.

use super::wire::{WireAccount, WireMessage};
use super::{AccountData, Transport};
use crate::errors::TransportError;
use crate::types::{Address, MessageRecord, MsgId};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const MESSAGE_QUERY: &str = r#"
query($id: String!) {
  messages(filter: { id: { eq: $id } }) {
    id msg_type src dst value(format: DEC) body bounce bounced
    code_hash src_code_hash dst_code_hash
    dst_transaction {
      id aborted total_fees(format: DEC)
      storage { storage_fees_collected(format: DEC) }
      compute { success exit_code compute_type gas_fees(format: DEC) }
      action { success result_code total_action_fees(format: DEC) total_fwd_fees(format: DEC) }
      out_messages { id }
    }
  }
}"#;

const ACCOUNTS_QUERY: &str = r#"
query($addresses: [String!]!) {
  accounts(filter: { id: { in: $addresses } }) {
    id code_hash
  }
}"#;

#[derive(Debug, Deserialize)]
struct GqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GqlError>,
}

#[derive(Debug, Deserialize)]
struct GqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MessagesData {
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct AccountsData {
    accounts: Vec<WireAccount>,
}

/// Transport over a GraphQL-style indexer endpoint
pub struct GqlTransport {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl GqlTransport {
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        let endpoint = endpoint
            .parse()
            .map_err(|_| TransportError::Endpoint(endpoint.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    async fn query<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let envelope: GqlResponse<T> = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        if let Some(error) = envelope.errors.first() {
            return Err(TransportError::InvalidResponse(error.message.clone()));
        }
        envelope
            .data
            .ok_or_else(|| TransportError::InvalidResponse("missing data".into()))
    }
}

#[async_trait]
impl Transport for GqlTransport {
    async fn fetch_message(&self, id: &MsgId) -> Result<MessageRecord, TransportError> {
        debug!(id = %id, "fetching message over graphql");
        let data: MessagesData = self
            .query(MESSAGE_QUERY, json!({ "id": id.0 }))
            .await?;
        let wire = data
            .messages
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::MessageNotFound(id.clone()))?;
        wire.into_record()
    }

    async fn fetch_accounts_data(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<AccountData>, TransportError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<&str> = addresses.iter().map(|a| a.0.as_str()).collect();
        let data: AccountsData = self
            .query(ACCOUNTS_QUERY, json!({ "addresses": ids }))
            .await?;
        Ok(data
            .accounts
            .into_iter()
            .map(WireAccount::into_account_data)
            .collect())
    }
}
