//! Allowed exit-code policy
//!
//! Two global sets of permitted compute/action codes plus per-address
//! additive overrides. The policy never changes whether an error is
//! *detected*, only whether it is marked `ignored`. It is a plain value:
//! callers combine policies with set algebra and thread the result into each
//! trace call; there is no global mutable state.

use crate::types::{Address, ErrorPhase};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Allowed codes for one scope (global or one address)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllowedCodeSet {
    pub compute: BTreeSet<i32>,
    pub action: BTreeSet<i32>,
}

impl AllowedCodeSet {
    fn codes(&self, phase: ErrorPhase) -> &BTreeSet<i32> {
        match phase {
            ErrorPhase::Compute => &self.compute,
            ErrorPhase::Action => &self.action,
        }
    }

    fn codes_mut(&mut self, phase: ErrorPhase) -> &mut BTreeSet<i32> {
        match phase {
            ErrorPhase::Compute => &mut self.compute,
            ErrorPhase::Action => &mut self.action,
        }
    }

    fn is_empty(&self) -> bool {
        self.compute.is_empty() && self.action.is_empty()
    }
}

/// Caller-supplied policy deciding which detected errors are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllowedCodes {
    global: AllowedCodeSet,
    by_address: HashMap<Address, AllowedCodeSet>,
}

impl AllowedCodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds globally allowed codes for a phase
    pub fn set_allowed_codes(&mut self, phase: ErrorPhase, codes: &[i32]) -> &mut Self {
        self.global.codes_mut(phase).extend(codes.iter().copied());
        self
    }

    /// Adds address-specific allowed codes; additive to the global set
    pub fn set_allowed_codes_for_address(
        &mut self,
        address: &Address,
        phase: ErrorPhase,
        codes: &[i32],
    ) -> &mut Self {
        self.by_address
            .entry(address.clone())
            .or_default()
            .codes_mut(phase)
            .extend(codes.iter().copied());
        self
    }

    /// Removes globally allowed codes for a phase
    pub fn remove_allowed_codes(&mut self, phase: ErrorPhase, codes: &[i32]) -> &mut Self {
        let set = self.global.codes_mut(phase);
        for code in codes {
            set.remove(code);
        }
        self
    }

    /// Removes address-specific allowed codes
    pub fn remove_allowed_codes_for_address(
        &mut self,
        address: &Address,
        phase: ErrorPhase,
        codes: &[i32],
    ) -> &mut Self {
        if let Some(entry) = self.by_address.get_mut(address) {
            let set = entry.codes_mut(phase);
            for code in codes {
                set.remove(code);
            }
            if entry.is_empty() {
                self.by_address.remove(address);
            }
        }
        self
    }

    /// Set union with another policy, returning a new value
    pub fn merged(&self, other: &AllowedCodes) -> AllowedCodes {
        let mut merged = self.clone();
        merged
            .global
            .compute
            .extend(other.global.compute.iter().copied());
        merged
            .global
            .action
            .extend(other.global.action.iter().copied());
        for (address, set) in &other.by_address {
            let entry = merged.by_address.entry(address.clone()).or_default();
            entry.compute.extend(set.compute.iter().copied());
            entry.action.extend(set.action.iter().copied());
        }
        merged
    }

    /// Whether `code` is permitted for `phase` at `dst`.
    ///
    /// The address override is additive: a code is allowed if it appears in
    /// the global set or in the destination's own set.
    pub fn is_allowed(&self, phase: ErrorPhase, code: i32, dst: Option<&Address>) -> bool {
        if self.global.codes(phase).contains(&code) {
            return true;
        }
        dst.and_then(|a| self.by_address.get(a))
            .is_some_and(|set| set.codes(phase).contains(&code))
    }
}
