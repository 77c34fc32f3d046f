//! Caller-facing tracing surface
//!
//! Ties a transport, the contract registry and a base allowed-code policy
//! into one entry point. The engine is stateless per call: every `trace`
//! builds its trees, annotations and fee views from scratch and returns a
//! read-only [`ViewTracingTree`].

use crate::errors::{RevertReport, TraceError};
use crate::policy::AllowedCodes;
use crate::resolver::ContractRegistry;
use crate::trace::TraceBuilder;
use crate::transport::Transport;
use crate::tree::build_message_trees;
use crate::types::{Address, BranchStep, CodeHash, ErrorPhase, MessageNode, MsgId};
use crate::view::ViewTracingTree;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

/// Parameters of one trace request
#[derive(Debug, Clone)]
pub struct TraceParams {
    /// Inbound message that finalized the transaction under inspection
    pub in_msg_id: MsgId,
    /// Additional root messages for multi-transaction flows, in call order
    pub related_msg_ids: Vec<MsgId>,
    /// Extra allowed codes merged over the tracer's base policy
    pub allowed_codes: Option<AllowedCodes>,
    /// Whether a non-ignored error turns into [`TraceError::Reverted`]
    pub raise: bool,
}

impl TraceParams {
    pub fn new(in_msg_id: MsgId) -> Self {
        Self {
            in_msg_id,
            related_msg_ids: Vec::new(),
            allowed_codes: None,
            raise: true,
        }
    }

    pub fn with_related(mut self, ids: Vec<MsgId>) -> Self {
        self.related_msg_ids = ids;
        self
    }

    pub fn with_allowed_codes(mut self, policy: AllowedCodes) -> Self {
        self.allowed_codes = Some(policy);
        self
    }

    /// Return the tree for inspection instead of raising on errors
    pub fn no_raise(mut self) -> Self {
        self.raise = false;
        self
    }
}

/// Transaction tracing engine over one transport
pub struct Tracer<T: Transport> {
    transport: T,
    registry: Arc<ContractRegistry>,
    allowed_codes: AllowedCodes,
}

impl<T: Transport> Tracer<T> {
    pub fn new(transport: T, registry: Arc<ContractRegistry>) -> Self {
        Self {
            transport,
            registry,
            allowed_codes: AllowedCodes::new(),
        }
    }

    /// Adds globally allowed codes to the base policy
    pub fn set_allowed_codes(&mut self, phase: ErrorPhase, codes: &[i32]) -> &mut Self {
        self.allowed_codes.set_allowed_codes(phase, codes);
        self
    }

    /// Adds address-specific allowed codes to the base policy
    pub fn set_allowed_codes_for_address(
        &mut self,
        address: &Address,
        phase: ErrorPhase,
        codes: &[i32],
    ) -> &mut Self {
        self.allowed_codes
            .set_allowed_codes_for_address(address, phase, codes);
        self
    }

    /// Removes globally allowed codes from the base policy
    pub fn remove_allowed_codes(&mut self, phase: ErrorPhase, codes: &[i32]) -> &mut Self {
        self.allowed_codes.remove_allowed_codes(phase, codes);
        self
    }

    /// Removes address-specific allowed codes from the base policy
    pub fn remove_allowed_codes_for_address(
        &mut self,
        address: &Address,
        phase: ErrorPhase,
        codes: &[i32],
    ) -> &mut Self {
        self.allowed_codes
            .remove_allowed_codes_for_address(address, phase, codes);
        self
    }

    /// Traces the causal tree of one inbound message.
    ///
    /// Builds the message tree, annotates it, aggregates fees and returns
    /// the query view. When `raise` is set and a non-ignored error exists,
    /// the rendered diagnostic for the first reverted branch is printed and
    /// returned as [`TraceError::Reverted`] instead.
    pub async fn trace(&self, params: TraceParams) -> Result<ViewTracingTree, TraceError> {
        let policy = match &params.allowed_codes {
            Some(extra) => self.allowed_codes.merged(extra),
            None => self.allowed_codes.clone(),
        };

        let mut root_ids = vec![params.in_msg_id.clone()];
        root_ids.extend(params.related_msg_ids.iter().cloned());
        let trees = build_message_trees(&self.transport, &root_ids).await?;

        let accounts = self.fetch_missing_code_hashes(&trees).await?;
        let builder = TraceBuilder::new(&self.registry, &policy).with_accounts(accounts);
        let roots = trees.iter().map(|tree| builder.build(tree)).collect();
        let view = ViewTracingTree::new(roots);

        if params.raise {
            if let Some(report) = view
                .find_reverted_branch()
                .and_then(|path| build_revert_report(&path, view.total_fees()))
            {
                println!("{report}");
                return Err(TraceError::Reverted(report));
            }
        }
        Ok(view)
    }

    /// Backfills code hashes for accounts whose records do not carry them.
    ///
    /// One batched lookup per trace request; accounts unknown to the data
    /// source simply stay unresolved and fall back to the placeholder.
    async fn fetch_missing_code_hashes(
        &self,
        trees: &[MessageNode],
    ) -> Result<HashMap<Address, CodeHash>, TraceError> {
        let mut missing = HashSet::new();
        for tree in trees {
            collect_unhashed_addresses(tree, &mut missing);
        }
        if missing.is_empty() {
            return Ok(HashMap::new());
        }
        let addresses: Vec<Address> = missing.into_iter().collect();
        debug!(count = addresses.len(), "fetching account code hashes");
        let data = self.transport.fetch_accounts_data(&addresses).await?;
        Ok(data
            .into_iter()
            .filter_map(|account| Some((account.address, account.code_hash?)))
            .collect())
    }
}

fn collect_unhashed_addresses(node: &MessageNode, out: &mut HashSet<Address>) {
    let record = &node.record;
    if record.dst_code_hash.is_none() {
        if let Some(dst) = &record.dst {
            if !dst.is_console() {
                out.insert(dst.clone());
            }
        }
    }
    if record.src_code_hash.is_none() {
        if let Some(src) = &record.src {
            out.insert(src.clone());
        }
    }
    for child in &node.children {
        collect_unhashed_addresses(child, out);
    }
}

/// Renders the diagnostic for the first reverted branch.
///
/// The last path step is the offending node; earlier steps show how the
/// failure was reached, each with its action index among its siblings.
fn build_revert_report(path: &[BranchStep], total_fees: u128) -> Option<RevertReport> {
    let offending = &path.last()?.node;
    let error = offending.error.as_ref()?;

    let mut rendered = String::new();
    for (depth, step) in path.iter().enumerate() {
        let node = &step.node;
        let _ = write!(
            rendered,
            "{}[{}/{}] {} {}",
            "  ".repeat(depth),
            step.index + 1,
            step.total_siblings,
            node.trace_type,
            node.contract_name,
        );
        if let Some(decoded) = &node.decoded {
            let _ = write!(rendered, ".{}({})", decoded.method, decoded.params);
        }
        if let Some(error) = &node.error {
            let _ = write!(rendered, " !{} code {}", error.phase, error.code);
        }
        rendered.push('\n');
    }

    Some(RevertReport {
        contract: offending.contract_name.clone(),
        address: offending.resolved_address().cloned(),
        method: offending.decoded.as_ref().map(|d| d.method.clone()),
        params: offending.decoded.as_ref().map(|d| d.params.clone()),
        phase: error.phase,
        code: error.code,
        total_fees,
        rendered,
    })
}
