//! Message-tree builder
//!
//! Given a root message id, reconstructs the full causal tree: fetch the
//! root record, then recursively fetch every outbound message of its
//! destination transaction. Sibling subtrees are fetched concurrently, but
//! children are reassembled in the transaction's emission order (join by
//! index, never by completion order) because action-index reporting and
//! first-reverted-branch determinism depend on it.
//!
//! The builder assembles facts only: no decoding, no error analysis. The one
//! side effect is printing console-contract messages the moment they are
//! seen.

use crate::errors::TraceError;
use crate::transport::Transport;
use crate::types::{MessageNode, MessageRecord, MsgId};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use tracing::debug;

/// Builds the causal message tree rooted at `root`.
///
/// A message with no destination transaction, or whose transaction produced
/// zero outbound messages, is a leaf. Any fetch failure aborts the whole
/// build; partially built trees are never returned.
pub async fn build_message_tree(
    transport: &dyn Transport,
    root: &MsgId,
) -> Result<MessageNode, TraceError> {
    fetch_subtree(transport, root.clone()).await
}

/// Builds one tree per root id, in caller order.
///
/// Used for multi-transaction flows where one logical call produced several
/// inbound messages.
pub async fn build_message_trees(
    transport: &dyn Transport,
    roots: &[MsgId],
) -> Result<Vec<MessageNode>, TraceError> {
    try_join_all(roots.iter().map(|id| fetch_subtree(transport, id.clone()))).await
}

fn fetch_subtree(transport: &dyn Transport, id: MsgId) -> BoxFuture<'_, Result<MessageNode, TraceError>> {
    async move {
        let record = transport.fetch_message(&id).await?;
        if record.is_console() {
            print_console_message(&record);
        }
        let child_ids = record
            .transaction
            .as_ref()
            .map(|tx| tx.out_msgs.clone())
            .unwrap_or_default();
        debug!(id = %record.id, children = child_ids.len(), "fetched message");
        let children =
            try_join_all(child_ids.into_iter().map(|child| fetch_subtree(transport, child)))
                .await?;
        Ok(MessageNode { record, children })
    }
    .boxed()
}

/// Prints a console-contract message body.
///
/// The console payload is the standard `4-byte id + JSON params` body; the
/// logged text lives under the `message` key. Anything else is printed as
/// best-effort UTF-8 so malformed debug output still shows up.
fn print_console_message(record: &MessageRecord) {
    let Some(body) = &record.body else {
        return;
    };
    let text = match body.get(4..) {
        Some(payload) if !payload.is_empty() => {
            serde_json::from_slice::<serde_json::Value>(payload)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| String::from_utf8_lossy(payload).into_owned())
        }
        _ => String::new(),
    };
    println!("[console] {text}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use crate::transport::ProxyTransport;
    use crate::types::{Address, MessageDirection, TransactionRecord};

    fn message(id: &str, out_msgs: Vec<&str>) -> MessageRecord {
        let transaction = (!out_msgs.is_empty()).then(|| TransactionRecord {
            id: format!("tx-{id}"),
            aborted: false,
            storage_fee: 0,
            compute: None,
            action: None,
            total_fees: 0,
            out_msgs: out_msgs.into_iter().map(MsgId::from).collect(),
        });
        MessageRecord {
            id: MsgId::from(id),
            direction: MessageDirection::Internal,
            src: Some(Address::from("0:aa")),
            dst: Some(Address::from("0:bb")),
            value: 0,
            body: None,
            bounce: false,
            bounced: false,
            code_hash: None,
            src_code_hash: None,
            dst_code_hash: None,
            transaction,
        }
    }

    #[tokio::test]
    async fn preserves_emission_order() {
        let mut proxy = ProxyTransport::new();
        proxy
            .insert_message(message("root", vec!["c", "a", "b"]))
            .insert_message(message("a", vec![]))
            .insert_message(message("b", vec![]))
            .insert_message(message("c", vec!["leaf"]))
            .insert_message(message("leaf", vec![]));

        let tree = build_message_tree(&proxy, &MsgId::from("root")).await.unwrap();
        let order: Vec<&str> = tree.children.iter().map(|c| c.record.id.0.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(tree.children[0].children.len(), 1);
    }

    #[tokio::test]
    async fn missing_child_fails_whole_build() {
        let mut proxy = ProxyTransport::new();
        proxy.insert_message(message("root", vec!["gone"]));
        let err = build_message_tree(&proxy, &MsgId::from("root"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TraceError::Transport(TransportError::MessageNotFound(_))
        ));
    }

    #[tokio::test]
    async fn message_without_transaction_is_leaf() {
        let mut proxy = ProxyTransport::new();
        proxy.insert_message(message("root", vec![]));
        let tree = build_message_tree(&proxy, &MsgId::from("root")).await.unwrap();
        assert!(tree.children.is_empty());
    }
}
