//! Contract resolution from compiled build artifacts
//!
//! Maps a code hash to a known contract name and ABI. The registry is built
//! once from compile artifacts before tracing starts and is read-only
//! afterwards. A miss is a valid outcome: tracing must never abort merely
//! because a contract was not locally compiled, so unresolved code hashes
//! fall back to a synthetic placeholder with an empty ABI and an
//! address-derived display name.

use crate::abi::ContractAbi;
use crate::types::{Address, CodeHash};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

static EMPTY_ABI: Lazy<Arc<ContractAbi>> = Lazy::new(|| Arc::new(ContractAbi::default()));

/// Compiled contract artifact known to the enclosing build system
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub name: String,
    pub abi: Arc<ContractAbi>,
}

/// Outcome of resolving one side of a message against the registry
#[derive(Debug, Clone)]
pub struct ResolvedContract {
    /// Contract name, or an address-derived placeholder on a miss
    pub name: String,
    /// The contract's ABI; empty for unknown contracts
    pub abi: Arc<ContractAbi>,
    /// Whether the code hash matched a compiled artifact
    pub known: bool,
}

/// Lookup table of compiled artifacts keyed by code hash
///
/// Written exactly once when the enclosing tool finishes its build step, then
/// shared read-only across trace requests.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    by_code_hash: HashMap<CodeHash, ContractArtifact>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one compiled artifact under its code hash
    pub fn register(&mut self, code_hash: CodeHash, name: &str, abi: ContractAbi) {
        self.by_code_hash.insert(
            code_hash,
            ContractArtifact {
                name: name.to_string(),
                abi: Arc::new(abi),
            },
        );
    }

    /// Number of registered artifacts
    pub fn len(&self) -> usize {
        self.by_code_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code_hash.is_empty()
    }

    /// Looks up a known contract by code hash; absence is a valid outcome
    pub fn get_contract_by_code_hash(&self, code_hash: &CodeHash) -> Option<&ContractArtifact> {
        self.by_code_hash.get(code_hash)
    }

    /// Resolves a `(code_hash, address)` pair to a contract descriptor.
    ///
    /// Never fails: a missing or unknown code hash yields the unknown-contract
    /// placeholder so tracing can continue with address-only labeling.
    pub fn resolve(&self, code_hash: Option<&CodeHash>, address: Option<&Address>) -> ResolvedContract {
        if let Some(artifact) = code_hash.and_then(|h| self.by_code_hash.get(h)) {
            return ResolvedContract {
                name: artifact.name.clone(),
                abi: Arc::clone(&artifact.abi),
                known: true,
            };
        }
        warn!(
            code_hash = code_hash.map(|h| h.0.as_str()),
            address = address.map(|a| a.0.as_str()),
            "no artifact for code hash, using placeholder"
        );
        ResolvedContract {
            name: match address {
                Some(address) => format!("UnknownContract<{}>", address.short()),
                None => "UnknownContract".to_string(),
            },
            abi: Arc::clone(&EMPTY_ABI),
            known: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{AbiFunction, AbiParam};

    fn registry() -> ContractRegistry {
        let mut registry = ContractRegistry::new();
        let abi = ContractAbi {
            functions: vec![AbiFunction {
                name: "ping".into(),
                inputs: vec![AbiParam::new("x", "uint32")],
                outputs: vec![],
            }],
            events: vec![],
        };
        registry.register(CodeHash::from("hash-wallet"), "Wallet", abi);
        registry
    }

    #[test]
    fn resolves_known_code_hash() {
        let registry = registry();
        let resolved = registry.resolve(
            Some(&CodeHash::from("hash-wallet")),
            Some(&Address::from("0:aa")),
        );
        assert!(resolved.known);
        assert_eq!(resolved.name, "Wallet");
        assert_eq!(resolved.abi.functions.len(), 1);
    }

    #[test]
    fn unknown_hash_falls_back_to_placeholder() {
        let registry = registry();
        let address = Address::from("0:1234567890abcdef1234567890abcdef");
        let resolved = registry.resolve(Some(&CodeHash::from("nope")), Some(&address));
        assert!(!resolved.known);
        assert!(resolved.name.starts_with("UnknownContract<"));
        assert!(resolved.abi.is_empty());
    }

    #[test]
    fn missing_hash_and_address_still_resolve() {
        let registry = registry();
        let resolved = registry.resolve(None, None);
        assert!(!resolved.known);
        assert_eq!(resolved.name, "UnknownContract");
    }
}
