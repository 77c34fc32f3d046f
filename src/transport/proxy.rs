//! In-process transport over fabricated records
//!
//! Serves message and account records from memory without any network call.
//! Used by local/simulated execution (an executor fabricates the records a
//! real ledger would have produced) and by the integration tests.

use super::{AccountData, Transport};
use crate::errors::TransportError;
use crate::types::{Address, CodeHash, MessageRecord, MsgId};
use async_trait::async_trait;
use std::collections::HashMap;

/// Transport serving pre-registered records from memory
#[derive(Debug, Default)]
pub struct ProxyTransport {
    messages: HashMap<MsgId, MessageRecord>,
    accounts: HashMap<Address, Option<CodeHash>>,
}

impl ProxyTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fabricated message record under its id
    pub fn insert_message(&mut self, record: MessageRecord) -> &mut Self {
        self.messages.insert(record.id.clone(), record);
        self
    }

    /// Registers a fabricated account state
    pub fn insert_account(&mut self, address: Address, code_hash: Option<CodeHash>) -> &mut Self {
        self.accounts.insert(address, code_hash);
        self
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

#[async_trait]
impl Transport for ProxyTransport {
    async fn fetch_message(&self, id: &MsgId) -> Result<MessageRecord, TransportError> {
        self.messages
            .get(id)
            .cloned()
            .ok_or_else(|| TransportError::MessageNotFound(id.clone()))
    }

    async fn fetch_accounts_data(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<AccountData>, TransportError> {
        Ok(addresses
            .iter()
            .filter_map(|address| {
                self.accounts.get(address).map(|code_hash| AccountData {
                    address: address.clone(),
                    code_hash: code_hash.clone(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageDirection;

    fn record(id: &str) -> MessageRecord {
        MessageRecord {
            id: MsgId::from(id),
            direction: MessageDirection::Internal,
            src: Some(Address::from("0:aa")),
            dst: Some(Address::from("0:bb")),
            value: 1,
            body: None,
            bounce: false,
            bounced: false,
            code_hash: None,
            src_code_hash: None,
            dst_code_hash: None,
            transaction: None,
        }
    }

    #[tokio::test]
    async fn serves_registered_messages() {
        let mut proxy = ProxyTransport::new();
        proxy.insert_message(record("m1"));
        assert!(proxy.fetch_message(&MsgId::from("m1")).await.is_ok());
        assert!(matches!(
            proxy.fetch_message(&MsgId::from("m2")).await,
            Err(TransportError::MessageNotFound(_))
        ));
    }

    #[tokio::test]
    async fn omits_unknown_accounts() {
        let mut proxy = ProxyTransport::new();
        proxy.insert_account(Address::from("0:aa"), Some(CodeHash::from("h1")));
        let data = proxy
            .fetch_accounts_data(&[Address::from("0:aa"), Address::from("0:zz")])
            .await
            .unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].code_hash, Some(CodeHash::from("h1")));
    }
}
