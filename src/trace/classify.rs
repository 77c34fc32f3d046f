//! Trace-type classification
//!
//! A pure function of the message's direction and fields plus the parent
//! message's direction; no other state is consulted, so the same inputs
//! always yield the same type regardless of traversal order.
//!
//! Classification runs before contract resolution because resolution rules
//! depend on which side of the message holds the relevant code hash.

use crate::types::{MessageDirection, MessageRecord, TraceType};

/// Classifies one message into its semantic trace type.
///
/// `parent_direction` is the direction of the message whose transaction
/// emitted this one; `None` for roots.
pub fn classify(
    record: &MessageRecord,
    parent_direction: Option<MessageDirection>,
) -> TraceType {
    match record.direction {
        MessageDirection::Internal => {
            if record.code_hash.is_some() {
                TraceType::Deploy
            } else if record.bounced {
                TraceType::Bounce
            } else if record.body.is_none() {
                TraceType::Transfer
            } else {
                TraceType::FunctionCall
            }
        }
        MessageDirection::ExtIn => {
            if record.code_hash.is_some() {
                TraceType::Deploy
            } else {
                TraceType::FunctionCall
            }
        }
        MessageDirection::ExtOut => {
            // A reply to an external call stays ambiguous until a decode
            // attempt settles it as a return value or an event.
            if parent_direction == Some(MessageDirection::ExtIn) {
                TraceType::EventOrFunctionReturn
            } else {
                TraceType::Event
            }
        }
    }
}
