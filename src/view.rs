//! Read-only query façade over a finished, fee-annotated trace tree
//!
//! Built once per trace request after aggregation; all queries are pure
//! lookups. Per-address balance changes are precomputed at construction so
//! repeated assertions stay cheap.

use crate::trace::{aggregate_fees, find_reverted_branch, total_fees};
use crate::types::{Address, BranchStep, ExecutionError, TraceNode, TraceType};
use std::collections::HashMap;
use std::fmt;

/// Query view over one or more annotated trace roots
#[derive(Debug)]
pub struct ViewTracingTree {
    roots: Vec<TraceNode>,
    balance_by_address: HashMap<Address, i128>,
    total_fees: u128,
}

impl ViewTracingTree {
    /// Builds the view, aggregating fees if the caller has not already.
    ///
    /// Aggregation is idempotent, so re-running it here is safe.
    pub fn new(mut roots: Vec<TraceNode>) -> Self {
        for root in &mut roots {
            aggregate_fees(root);
        }
        let total_fees = roots.iter().map(total_fees).sum();
        let mut balance_by_address = HashMap::new();
        for root in &roots {
            accumulate_balances(root, &mut balance_by_address);
        }
        Self {
            roots,
            balance_by_address,
            total_fees,
        }
    }

    /// The annotated root nodes, in caller order
    pub fn roots(&self) -> &[TraceNode] {
        &self.roots
    }

    /// Every node of the given type, in depth-first order (roots included)
    pub fn find_by_type(&self, trace_type: TraceType) -> Vec<&TraceNode> {
        self.filter(|node| node.trace_type == trace_type)
    }

    /// Every decoded node of the given type and method/event name,
    /// optionally restricted to one contract name.
    ///
    /// A name that never occurred is reported as an empty result, not an
    /// error.
    pub fn find_by_type_and_name(
        &self,
        trace_type: TraceType,
        name: &str,
        contract: Option<&str>,
    ) -> Vec<&TraceNode> {
        self.filter(|node| {
            node.trace_type == trace_type
                && node.decoded.as_ref().is_some_and(|d| d.method == name)
                && contract.map_or(true, |c| node.contract_name == c)
        })
    }

    /// Net balance change of the given addresses across the whole tree:
    /// receipts minus sends minus fees, summed over every node that
    /// delivered value to (and charged fees against) those accounts
    pub fn balance_diff(&self, addresses: &[Address]) -> i128 {
        addresses
            .iter()
            .filter_map(|address| self.balance_by_address.get(address))
            .sum()
    }

    /// All detected errors in depth-first order, ignored ones included
    pub fn collect_errors(&self) -> Vec<(&TraceNode, &ExecutionError)> {
        self.filter(|node| node.error.is_some())
            .into_iter()
            .filter_map(|node| node.error.as_ref().map(|error| (node, error)))
            .collect()
    }

    /// Errors detected on transactions of one contract address
    pub fn errors_by_contract(&self, address: &Address) -> Vec<&ExecutionError> {
        self.filter(|node| node.record.dst.as_ref() == Some(address))
            .into_iter()
            .filter_map(|node| node.error.as_ref())
            .collect()
    }

    /// Whether any node carries a non-ignored error
    pub fn has_unignored_error(&self) -> bool {
        self.roots.iter().any(|r| r.has_error_in_subtree)
    }

    /// Root-to-failure path of the first non-ignored error, if any
    pub fn find_reverted_branch(&self) -> Option<Vec<BranchStep>> {
        find_reverted_branch(&self.roots)
    }

    /// Whole-tree fee total
    pub fn total_fees(&self) -> u128 {
        self.total_fees
    }

    fn filter<'v>(&'v self, predicate: impl Fn(&TraceNode) -> bool) -> Vec<&'v TraceNode> {
        fn walk<'v>(
            node: &'v TraceNode,
            predicate: &impl Fn(&TraceNode) -> bool,
            out: &mut Vec<&'v TraceNode>,
        ) {
            if predicate(node) {
                out.push(node);
            }
            for child in &node.children {
                walk(child, predicate, out);
            }
        }
        let mut out = Vec::new();
        for root in &self.roots {
            walk(root, &predicate, &mut out);
        }
        out
    }
}

fn accumulate_balances(node: &TraceNode, balances: &mut HashMap<Address, i128>) {
    if let (Some(dst), Some(fees)) = (&node.record.dst, &node.fees) {
        *balances.entry(dst.clone()).or_insert(0) += fees.balance_change;
    }
    for child in &node.children {
        accumulate_balances(child, balances);
    }
}

fn render_node(node: &TraceNode, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let indent = "  ".repeat(depth);
    write!(f, "{indent}{} {}", node.trace_type, node.contract_name)?;
    if let Some(decoded) = &node.decoded {
        write!(f, ".{}({})", decoded.method, decoded.params)?;
    }
    if let Some(fees) = &node.fees {
        write!(
            f,
            " value: {}, fees: {}, balance: {:+}",
            fees.value_received, fees.total_fees, fees.balance_change
        )?;
    }
    if let Some(error) = &node.error {
        write!(
            f,
            " !{} code {}{}",
            error.phase,
            error.code,
            if error.ignored { " (ignored)" } else { "" }
        )?;
    }
    writeln!(f)?;
    for child in &node.children {
        render_node(child, depth + 1, f)?;
    }
    Ok(())
}

impl fmt::Display for ViewTracingTree {
    /// Deterministic tree rendering with indentation proportional to depth
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for root in &self.roots {
            render_node(root, 0, f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        DecodedMessage, ErrorPhase, MessageDirection, MessageRecord, MsgId, TransactionRecord,
    };
    use serde_json::json;

    fn node(
        id: &str,
        dst: &str,
        value: u128,
        fees: u128,
        method: Option<&str>,
        children: Vec<TraceNode>,
    ) -> TraceNode {
        TraceNode {
            record: MessageRecord {
                id: MsgId::from(id),
                direction: MessageDirection::Internal,
                src: Some(Address::from("0:aa")),
                dst: Some(Address::from(dst)),
                value,
                body: None,
                bounce: false,
                bounced: false,
                code_hash: None,
                src_code_hash: None,
                dst_code_hash: None,
                transaction: (fees > 0).then(|| TransactionRecord {
                    id: format!("tx-{id}"),
                    aborted: false,
                    storage_fee: 0,
                    compute: None,
                    action: None,
                    total_fees: fees,
                    out_msgs: vec![],
                }),
            },
            trace_type: TraceType::FunctionCall,
            contract_name: "Wallet".into(),
            contract_known: true,
            decoded: method.map(|m| DecodedMessage {
                method: m.into(),
                params: json!({}),
            }),
            error: None,
            has_error_in_subtree: false,
            fees: None,
            children,
        }
    }

    #[test]
    fn finds_nodes_by_type_and_name() {
        let view = ViewTracingTree::new(vec![node(
            "root",
            "0:bb",
            10,
            0,
            Some("transfer"),
            vec![node("c", "0:cc", 4, 0, Some("accept"), vec![])],
        )]);
        assert_eq!(view.find_by_type(TraceType::FunctionCall).len(), 2);
        let hits = view.find_by_type_and_name(TraceType::FunctionCall, "accept", None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.id, MsgId::from("c"));
        assert!(view
            .find_by_type_and_name(TraceType::FunctionCall, "accept", Some("Other"))
            .is_empty());
        assert!(view
            .find_by_type_and_name(TraceType::Event, "never_happened", None)
            .is_empty());
    }

    #[test]
    fn balance_diff_accumulates_across_nodes() {
        // 0:bb receives 10, forwards 4, pays 1 => +5; 0:cc receives 4 => +4
        let view = ViewTracingTree::new(vec![node(
            "root",
            "0:bb",
            10,
            1,
            None,
            vec![node("c", "0:cc", 4, 0, None, vec![])],
        )]);
        assert_eq!(view.balance_diff(&[Address::from("0:bb")]), 5);
        assert_eq!(view.balance_diff(&[Address::from("0:cc")]), 4);
        assert_eq!(
            view.balance_diff(&[Address::from("0:bb"), Address::from("0:cc")]),
            9
        );
        assert_eq!(view.balance_diff(&[Address::from("0:zz")]), 0);
    }

    #[test]
    fn errors_by_contract_filters_on_destination() {
        let mut failing = node("root", "0:bb", 0, 0, None, vec![]);
        failing.error = Some(ExecutionError {
            phase: ErrorPhase::Compute,
            code: 51,
            ignored: true,
        });
        let view = ViewTracingTree::new(vec![failing]);
        assert_eq!(view.errors_by_contract(&Address::from("0:bb")).len(), 1);
        assert!(view.errors_by_contract(&Address::from("0:cc")).is_empty());
        assert_eq!(view.collect_errors().len(), 1);
        assert!(!view.has_unignored_error());
    }

    #[test]
    fn rendering_indents_by_depth() {
        let view = ViewTracingTree::new(vec![node(
            "root",
            "0:bb",
            10,
            0,
            Some("transfer"),
            vec![node("c", "0:cc", 4, 0, None, vec![])],
        )]);
        let rendered = view.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("call Wallet.transfer"));
        assert!(lines[1].starts_with("  call Wallet"));
        // Deterministic output
        assert_eq!(view.to_string(), rendered);
    }
}
