//! Core types for TVM transaction tracing
//!
//! This module defines the core data structures used throughout the tracing system:
//! - Message and transaction records fetched from a data source
//! - The classified trace tree and decoded payloads
//! - Execution errors and their phase/severity
//! - Fee and value-flow projections

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Address of the system console contract.
///
/// Messages sent to this address carry debug output. They are printed as soon
/// as the tree builder sees them and are excluded from error analysis and
/// payload decoding.
pub const CONSOLE_ADDRESS: &str =
    "0:7777777777777777777777777777777777777777777777777777777777777777";

/// Compute-phase exit code reported when the inbound message carries a
/// function id the contract does not export. ABI decoding of such a message
/// is meaningless and is skipped.
pub const EXIT_CODE_WRONG_FUNCTION_ID: i32 = 60;

/// Message identifier (hash) as reported by the data source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MsgId(pub String);

/// Account address in `workchain:hex` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

/// Content hash of a deployed contract's code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeHash(pub String);

impl fmt::Display for MsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MsgId {
    fn from(s: &str) -> Self {
        MsgId(s.to_string())
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address(s.to_string())
    }
}

impl From<&str> for CodeHash {
    fn from(s: &str) -> Self {
        CodeHash(s.to_string())
    }
}

impl Address {
    /// Returns true if this is the system console contract
    pub fn is_console(&self) -> bool {
        self.0 == CONSOLE_ADDRESS
    }

    /// Short display form for diagnostics (first and last hex bytes)
    pub fn short(&self) -> String {
        if self.0.len() > 12 {
            format!("{}..{}", &self.0[..8], &self.0[self.0.len() - 4..])
        } else {
            self.0.clone()
        }
    }
}

/// Direction of a message relative to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    /// Contract-to-contract message
    Internal,
    /// Inbound message from outside the ledger (signed call or deploy)
    ExtIn,
    /// Outbound message to outside the ledger (event or function return)
    ExtOut,
}

/// Compute-phase outcome of a destination transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputePhase {
    /// Whether contract code executed to completion
    pub success: bool,
    /// TVM exit code (0 on success)
    pub exit_code: i32,
    /// 0 when the phase was skipped, 1 when the VM actually ran
    pub compute_type: u8,
    /// Gas fees charged during this phase
    pub gas_fees: u128,
}

/// Action-phase outcome of a destination transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPhase {
    /// Whether all output actions were committed
    pub success: bool,
    /// Action-phase result code (0 on success)
    pub result_code: i32,
    /// Fees charged for processing the action list
    pub total_action_fees: u128,
    /// Forward fees attached to outbound messages
    pub total_fwd_fees: u128,
}

/// Destination transaction of an internal/external-in message
///
/// These are facts received from the data source; the tracer never executes
/// anything itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction id (hash)
    pub id: String,
    /// Whether the transaction as a whole was aborted
    pub aborted: bool,
    /// Storage fee collected before execution
    pub storage_fee: u128,
    /// Compute-phase result, if the phase was reached
    pub compute: Option<ComputePhase>,
    /// Action-phase result, if the phase was reached
    pub action: Option<ActionPhase>,
    /// Total fees charged to the account by this transaction
    pub total_fees: u128,
    /// Ids of outbound messages, in action-phase emission order.
    ///
    /// This ordering is load-bearing: it determines action-index reporting
    /// and which failing branch is reported first.
    pub out_msgs: Vec<MsgId>,
}

/// Immutable message fact fetched from the data source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Message id (hash)
    pub id: MsgId,
    /// Direction relative to the ledger
    pub direction: MessageDirection,
    /// Source address (absent for external-in messages)
    pub src: Option<Address>,
    /// Destination address (absent for external-out messages)
    pub dst: Option<Address>,
    /// Attached value in nanotokens
    pub value: u128,
    /// Raw payload bytes, if the message has a body
    pub body: Option<Vec<u8>>,
    /// Whether the message requests a bounce on failure
    pub bounce: bool,
    /// Whether this message is itself a bounce reply
    pub bounced: bool,
    /// Code hash carried by the message itself; present only on deploys
    pub code_hash: Option<CodeHash>,
    /// Code hash of the source account
    pub src_code_hash: Option<CodeHash>,
    /// Code hash of the destination account
    pub dst_code_hash: Option<CodeHash>,
    /// Destination transaction, present for internal/external-in messages
    /// that were processed
    pub transaction: Option<TransactionRecord>,
}

impl MessageRecord {
    /// Returns true if the destination is the system console contract
    pub fn is_console(&self) -> bool {
        self.dst.as_ref().is_some_and(Address::is_console)
    }
}

/// One node of the raw causal message tree
///
/// Ownership is strictly tree-shaped: the underlying ledger is causal, so no
/// cycles can occur. Children are the destination transaction's outbound
/// messages in emission order.
#[derive(Debug, Clone, Serialize)]
pub struct MessageNode {
    /// The fetched message fact
    pub record: MessageRecord,
    /// Subtrees of the destination transaction's outbound messages
    pub children: Vec<MessageNode>,
}

/// Semantic role of a traced message
///
/// Closed set by design: a new message shape must force a compile-time
/// decision, so there is no catch-all variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceType {
    /// Message deploying contract code to its destination
    Deploy,
    /// Inbound call of a contract function
    FunctionCall,
    /// External-out message confirmed to be a function's return value
    FunctionReturn,
    /// External-out message confirmed to be an emitted event
    Event,
    /// External-out reply to an external-in call; ambiguous until a decode
    /// attempt settles it as a return value or an event
    EventOrFunctionReturn,
    /// Message returned to sender because the destination rejected it
    Bounce,
    /// Plain value transfer with no payload
    Transfer,
}

impl fmt::Display for TraceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TraceType::Deploy => "deploy",
            TraceType::FunctionCall => "call",
            TraceType::FunctionReturn => "return",
            TraceType::Event => "event",
            TraceType::EventOrFunctionReturn => "event-or-return",
            TraceType::Bounce => "bounce",
            TraceType::Transfer => "transfer",
        };
        f.write_str(s)
    }
}

/// Successfully decoded message payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedMessage {
    /// Function or event name from the ABI
    pub method: String,
    /// Named parameters as decoded JSON values
    pub params: Value,
}

/// Transaction phase in which an execution error was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPhase {
    Compute,
    Action,
}

impl fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPhase::Compute => f.write_str("compute"),
            ErrorPhase::Action => f.write_str("action"),
        }
    }
}

/// On-chain execution error detected on a trace node
///
/// Detection is unconditional; `ignored` only records whether the caller's
/// allowed-code policy downgrades it from a reportable failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionError {
    /// Phase that failed
    pub phase: ErrorPhase,
    /// Exit code (compute) or result code (action)
    pub code: i32,
    /// Whether the allowed-code policy permits this code here
    pub ignored: bool,
}

/// Per-node value flow and fee projection, filled in by the aggregator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeeView {
    /// Value carried by the inbound message
    pub value_received: u128,
    /// Sum of values carried by the outbound messages
    pub value_sent_to_children: u128,
    /// Fees charged by this node's own transaction:
    /// `total_fees + total_fwd_fees - total_action_fees`
    pub total_fees: u128,
    /// `value_received - value_sent_to_children - total_fees`
    pub balance_change: i128,
}

/// Fully classified and decoded annotation of one message
///
/// Built once per [`MessageRecord`] and immutable afterwards, except for the
/// [`FeeView`] the aggregator fills in.
#[derive(Debug, Clone, Serialize)]
pub struct TraceNode {
    /// The underlying message fact
    pub record: MessageRecord,
    /// Classified semantic role
    pub trace_type: TraceType,
    /// Resolved contract name on the relevant side of the message
    pub contract_name: String,
    /// Whether the contract was found among compiled artifacts
    pub contract_known: bool,
    /// Decoded payload, if any decode attempt succeeded
    pub decoded: Option<DecodedMessage>,
    /// Detected execution error of the destination transaction
    pub error: Option<ExecutionError>,
    /// True if this node or any descendant carries a non-ignored error
    pub has_error_in_subtree: bool,
    /// Value/fee projection; `None` until the aggregator runs
    pub fees: Option<FeeView>,
    /// Outbound subtrees in emission order
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    /// Returns true if this node carries an error not excused by policy
    pub fn has_unignored_error(&self) -> bool {
        self.error.as_ref().is_some_and(|e| !e.ignored)
    }

    /// Address this node was resolved against (destination for calls,
    /// deploys, bounces and transfers; source for events and returns)
    pub fn resolved_address(&self) -> Option<&Address> {
        match self.trace_type {
            TraceType::Deploy
            | TraceType::Bounce
            | TraceType::Transfer
            | TraceType::FunctionCall => self.record.dst.as_ref(),
            TraceType::Event
            | TraceType::EventOrFunctionReturn
            | TraceType::FunctionReturn => self.record.src.as_ref(),
        }
    }
}

/// One step of a root-to-failure path
#[derive(Debug, Clone, Serialize)]
pub struct BranchStep {
    /// How many siblings the node has at its level (including itself)
    pub total_siblings: usize,
    /// Position of the node among those siblings
    pub index: usize,
    /// The node itself, with children cleared to keep diagnostics small
    pub node: TraceNode,
}
