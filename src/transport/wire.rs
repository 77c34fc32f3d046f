//! Wire representation shared by the HTTP transports
//!
//! Both the GraphQL indexer and the JSON-RPC endpoint deliver the same
//! record shape: loosely typed strings for amounts (decimal or hex), hex
//! bodies, and an embedded destination transaction with per-phase results.

use super::parse_amount;
use crate::errors::TransportError;
use crate::types::{
    ActionPhase, Address, CodeHash, ComputePhase, MessageDirection, MessageRecord, MsgId,
    TransactionRecord,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct WireMessage {
    pub id: String,
    pub msg_type: u8,
    pub src: Option<String>,
    pub dst: Option<String>,
    pub value: Option<String>,
    /// Hex-encoded payload
    pub body: Option<String>,
    #[serde(default)]
    pub bounce: bool,
    #[serde(default)]
    pub bounced: bool,
    pub code_hash: Option<String>,
    pub src_code_hash: Option<String>,
    pub dst_code_hash: Option<String>,
    pub dst_transaction: Option<WireTransaction>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireTransaction {
    pub id: String,
    #[serde(default)]
    pub aborted: bool,
    pub storage: Option<WireStorage>,
    pub compute: Option<WireCompute>,
    pub action: Option<WireAction>,
    pub total_fees: Option<String>,
    #[serde(default)]
    pub out_messages: Vec<WireOutMsg>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireStorage {
    pub storage_fees_collected: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireCompute {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub exit_code: i32,
    #[serde(default)]
    pub compute_type: u8,
    pub gas_fees: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireAction {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result_code: i32,
    pub total_action_fees: Option<String>,
    pub total_fwd_fees: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireOutMsg {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireAccount {
    #[serde(alias = "id")]
    pub address: String,
    pub code_hash: Option<String>,
}

impl WireAccount {
    pub fn into_account_data(self) -> super::AccountData {
        super::AccountData {
            address: Address(self.address),
            code_hash: self.code_hash.map(CodeHash),
        }
    }
}

impl WireMessage {
    pub fn into_record(self) -> Result<MessageRecord, TransportError> {
        let direction = match self.msg_type {
            0 => MessageDirection::Internal,
            1 => MessageDirection::ExtIn,
            2 => MessageDirection::ExtOut,
            other => {
                return Err(TransportError::InvalidResponse(format!(
                    "unknown msg_type: {other}"
                )))
            }
        };
        let body = match self.body {
            Some(hex_body) => Some(hex::decode(&hex_body).map_err(|_| {
                TransportError::InvalidResponse(format!("bad body hex on message {}", self.id))
            })?),
            None => None,
        };
        let transaction = self.dst_transaction.map(WireTransaction::into_record).transpose()?;
        Ok(MessageRecord {
            id: MsgId(self.id),
            direction,
            src: self.src.filter(|s| !s.is_empty()).map(Address),
            dst: self.dst.filter(|s| !s.is_empty()).map(Address),
            value: parse_amount(self.value.as_deref())?,
            body,
            bounce: self.bounce,
            bounced: self.bounced,
            code_hash: self.code_hash.map(CodeHash),
            src_code_hash: self.src_code_hash.map(CodeHash),
            dst_code_hash: self.dst_code_hash.map(CodeHash),
            transaction,
        })
    }
}

impl WireTransaction {
    fn into_record(self) -> Result<TransactionRecord, TransportError> {
        let compute = self
            .compute
            .map(|c| {
                Ok::<_, TransportError>(ComputePhase {
                    success: c.success,
                    exit_code: c.exit_code,
                    compute_type: c.compute_type,
                    gas_fees: parse_amount(c.gas_fees.as_deref())?,
                })
            })
            .transpose()?;
        let action = self
            .action
            .map(|a| {
                Ok::<_, TransportError>(ActionPhase {
                    success: a.success,
                    result_code: a.result_code,
                    total_action_fees: parse_amount(a.total_action_fees.as_deref())?,
                    total_fwd_fees: parse_amount(a.total_fwd_fees.as_deref())?,
                })
            })
            .transpose()?;
        Ok(TransactionRecord {
            id: self.id,
            aborted: self.aborted,
            storage_fee: parse_amount(
                self.storage
                    .as_ref()
                    .and_then(|s| s.storage_fees_collected.as_deref()),
            )?,
            compute,
            action,
            total_fees: parse_amount(self.total_fees.as_deref())?,
            out_msgs: self.out_messages.into_iter().map(|m| MsgId(m.id)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_wire_message_to_record() {
        let wire: WireMessage = serde_json::from_value(json!({
            "id": "msg-1",
            "msg_type": 0,
            "src": "0:aa",
            "dst": "0:bb",
            "value": "0x64",
            "body": "deadbeef",
            "bounce": true,
            "dst_transaction": {
                "id": "tx-1",
                "aborted": false,
                "storage": { "storage_fees_collected": "5" },
                "compute": { "success": true, "exit_code": 0, "compute_type": 1, "gas_fees": "7" },
                "action": { "success": true, "result_code": 0, "total_action_fees": "1", "total_fwd_fees": "2" },
                "total_fees": "10",
                "out_messages": [{ "id": "msg-2" }, { "id": "msg-3" }]
            }
        }))
        .unwrap();

        let record = wire.into_record().unwrap();
        assert_eq!(record.value, 100);
        assert_eq!(record.body.as_deref(), Some(&[0xde, 0xad, 0xbe, 0xef][..]));
        assert_eq!(record.direction, MessageDirection::Internal);
        let tx = record.transaction.unwrap();
        assert_eq!(tx.storage_fee, 5);
        assert_eq!(tx.out_msgs, vec![MsgId::from("msg-2"), MsgId::from("msg-3")]);
    }

    #[test]
    fn rejects_unknown_msg_type() {
        let wire: WireMessage =
            serde_json::from_value(json!({ "id": "m", "msg_type": 9 })).unwrap();
        assert!(matches!(
            wire.into_record(),
            Err(TransportError::InvalidResponse(_))
        ));
    }

    #[test]
    fn empty_src_means_external_origin() {
        let wire: WireMessage =
            serde_json::from_value(json!({ "id": "m", "msg_type": 1, "src": "", "dst": "0:bb" }))
                .unwrap();
        let record = wire.into_record().unwrap();
        assert!(record.src.is_none());
        assert_eq!(record.dst, Some(Address::from("0:bb")));
    }
}
