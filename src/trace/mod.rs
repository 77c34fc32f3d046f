//! Trace building: classification, resolution, decoding and error analysis
//!
//! Walks a raw message tree depth-first and annotates every node:
//! 1. classify its semantic type (pure function of the record + parent
//!    direction)
//! 2. resolve the contract on the side the type dictates
//! 3. evaluate the destination transaction's error state against the
//!    allowed-code policy
//! 4. attempt payload decode against the resolved ABI
//! 5. recurse into children with this node's decoded value, then fold the
//!    `has_error_in_subtree` flag bottom-up
//!
//! Each node's annotation depends only on itself and its parent's decoded
//! result, so the single pass is safe without any shared mutable state.

pub mod classify;
pub mod fees;
pub mod revert;

pub use classify::classify;
pub use fees::{aggregate_fees, node_total_fees, total_fees};
pub use revert::find_reverted_branch;

use crate::abi::{decode_event, decode_input, decode_output};
use crate::policy::AllowedCodes;
use crate::resolver::{ContractRegistry, ResolvedContract};
use crate::types::{
    Address, CodeHash, DecodedMessage, ErrorPhase, ExecutionError, MessageDirection, MessageNode,
    MessageRecord, TraceNode, TraceType, EXIT_CODE_WRONG_FUNCTION_ID,
};
use std::collections::HashMap;
use tracing::debug;

/// Value passed down from parent to child during the walk.
///
/// Carries the parent's decoded result instead of a back-reference to the
/// parent node, so the tree stays free of cycles.
#[derive(Clone, Copy)]
struct ParentContext<'p> {
    direction: MessageDirection,
    decoded: Option<&'p DecodedMessage>,
}

/// Builds annotated trace trees from raw message trees
pub struct TraceBuilder<'a> {
    registry: &'a ContractRegistry,
    policy: &'a AllowedCodes,
    /// Fallback code hashes by address, fetched once per trace request for
    /// accounts whose records do not carry them
    accounts: HashMap<Address, CodeHash>,
}

impl<'a> TraceBuilder<'a> {
    pub fn new(registry: &'a ContractRegistry, policy: &'a AllowedCodes) -> Self {
        Self {
            registry,
            policy,
            accounts: HashMap::new(),
        }
    }

    /// Supplies account code hashes fetched from the data source
    pub fn with_accounts(mut self, accounts: HashMap<Address, CodeHash>) -> Self {
        self.accounts = accounts;
        self
    }

    /// Builds the annotated trace tree for one message tree
    pub fn build(&self, tree: &MessageNode) -> TraceNode {
        self.build_node(tree, None)
    }

    fn build_node(&self, node: &MessageNode, parent: Option<ParentContext<'_>>) -> TraceNode {
        let record = &node.record;
        let mut trace_type = classify(record, parent.map(|p| p.direction));
        let contract = self.resolve_contract(record, trace_type);
        let error = self.classify_error(record);
        let decoded = self.decode_payload(record, &mut trace_type, &contract, error.as_ref(), parent);

        let children: Vec<TraceNode> = node
            .children
            .iter()
            .map(|child| {
                self.build_node(
                    child,
                    Some(ParentContext {
                        direction: record.direction,
                        decoded: decoded.as_ref(),
                    }),
                )
            })
            .collect();

        let has_error_in_subtree = error.as_ref().is_some_and(|e| !e.ignored)
            || children.iter().any(|c| c.has_error_in_subtree);

        TraceNode {
            record: record.clone(),
            trace_type,
            contract_name: contract.name,
            contract_known: contract.known,
            decoded,
            error,
            has_error_in_subtree,
            fees: None,
            children,
        }
    }

    /// Resolves the contract on the side the trace type dictates.
    ///
    /// Deploys resolve against the code hash the message itself carries;
    /// calls, bounces and transfers against the destination account; events
    /// and returns against the source account.
    fn resolve_contract(&self, record: &MessageRecord, trace_type: TraceType) -> ResolvedContract {
        let (code_hash, address) = match trace_type {
            TraceType::Deploy => (
                record.code_hash.as_ref().or(record.dst_code_hash.as_ref()),
                record.dst.as_ref(),
            ),
            TraceType::FunctionCall | TraceType::Bounce | TraceType::Transfer => {
                (record.dst_code_hash.as_ref(), record.dst.as_ref())
            }
            TraceType::Event | TraceType::EventOrFunctionReturn | TraceType::FunctionReturn => {
                (record.src_code_hash.as_ref(), record.src.as_ref())
            }
        };
        let code_hash = code_hash.or_else(|| address.and_then(|a| self.accounts.get(a)));
        self.registry.resolve(code_hash, address)
    }

    /// Detects an execution error on the destination transaction.
    ///
    /// Compute-phase errors take precedence over action-phase errors. A
    /// compute phase that succeeded, or that never ran (`compute_type == 0`),
    /// never produces a compute error even when the transaction was aborted.
    /// Console messages are exempt from error analysis entirely.
    fn classify_error(&self, record: &MessageRecord) -> Option<ExecutionError> {
        if record.is_console() {
            return None;
        }
        let tx = record.transaction.as_ref()?;

        if let Some(compute) = &tx.compute {
            let skip = compute.success || compute.compute_type == 0;
            if !skip && (tx.aborted || compute.exit_code != 0) {
                return Some(self.make_error(ErrorPhase::Compute, compute.exit_code, record));
            }
        }
        if let Some(action) = &tx.action {
            if !action.success {
                return Some(self.make_error(ErrorPhase::Action, action.result_code, record));
            }
        }
        None
    }

    fn make_error(&self, phase: ErrorPhase, code: i32, record: &MessageRecord) -> ExecutionError {
        let ignored = self.policy.is_allowed(phase, code, record.dst.as_ref());
        if !ignored {
            debug!(id = %record.id, %phase, code, "detected execution error");
        }
        ExecutionError {
            phase,
            code,
            ignored,
        }
    }

    /// Decode dispatch. Short-circuits on the first success; failure of all
    /// applicable attempts yields `None` without raising.
    fn decode_payload(
        &self,
        record: &MessageRecord,
        trace_type: &mut TraceType,
        contract: &ResolvedContract,
        error: Option<&ExecutionError>,
        parent: Option<ParentContext<'_>>,
    ) -> Option<DecodedMessage> {
        // Bounces and transfers carry no decodable payload; console output
        // was already printed by the tree builder.
        if matches!(*trace_type, TraceType::Bounce | TraceType::Transfer) || record.is_console() {
            return None;
        }
        // A wrong-function-id failure means the body matches no ABI entry.
        if error.is_some_and(|e| {
            e.phase == ErrorPhase::Compute && e.code == EXIT_CODE_WRONG_FUNCTION_ID
        }) {
            return None;
        }
        // Responsibility-callback replies with answer id zero are
        // acknowledged but intentionally left undecoded.
        if record.direction == MessageDirection::Internal && is_zero_answer_reply(parent) {
            return None;
        }
        let body = record.body.as_deref()?;

        match record.direction {
            MessageDirection::Internal => decode_input(&contract.abi, body, true),
            MessageDirection::ExtIn => decode_input(&contract.abi, body, false),
            MessageDirection::ExtOut => match *trace_type {
                TraceType::EventOrFunctionReturn => {
                    if let Some(decoded) = decode_output(&contract.abi, body) {
                        *trace_type = TraceType::FunctionReturn;
                        Some(decoded)
                    } else if let Some(decoded) = decode_event(&contract.abi, body) {
                        *trace_type = TraceType::Event;
                        Some(decoded)
                    } else {
                        None
                    }
                }
                _ => decode_event(&contract.abi, body),
            },
        }
    }
}

/// Whether the parent's decoded params mark this as a callback reply with
/// `answerId == 0`
fn is_zero_answer_reply(parent: Option<ParentContext<'_>>) -> bool {
    parent
        .and_then(|p| p.decoded)
        .and_then(|d| d.params.get("answerId"))
        .is_some_and(|answer_id| {
            answer_id.as_u64() == Some(0) || answer_id.as_str() == Some("0")
        })
}
