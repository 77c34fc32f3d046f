//! Fee and value-flow aggregation
//!
//! Single pass over a completed trace tree filling every node's [`FeeView`].
//! Children are aggregated before the parent's arithmetic, but each node's
//! figures depend only on its own record and its children's records, so
//! re-running the pass on an already aggregated tree yields identical views.

use crate::types::{FeeView, MessageRecord, TraceNode};

/// Fees charged by one node's own transaction:
/// `total_fees + total_fwd_fees - total_action_fees`
pub fn node_total_fees(record: &MessageRecord) -> u128 {
    let Some(tx) = &record.transaction else {
        return 0;
    };
    let (fwd, action) = tx
        .action
        .as_ref()
        .map(|a| (a.total_fwd_fees, a.total_action_fees))
        .unwrap_or((0, 0));
    (tx.total_fees + fwd).saturating_sub(action)
}

/// Fills in the [`FeeView`] of every node in the subtree
pub fn aggregate_fees(node: &mut TraceNode) {
    for child in &mut node.children {
        aggregate_fees(child);
    }
    let value_received = node.record.value;
    let value_sent_to_children: u128 = node.children.iter().map(|c| c.record.value).sum();
    let total_fees = node_total_fees(&node.record);
    node.fees = Some(FeeView {
        value_received,
        value_sent_to_children,
        total_fees,
        balance_change: value_received as i128
            - value_sent_to_children as i128
            - total_fees as i128,
    });
}

/// Whole-transaction fee total: recursive sum of every node's own fees
pub fn total_fees(node: &TraceNode) -> u128 {
    node_total_fees(&node.record) + node.children.iter().map(total_fees).sum::<u128>()
}
