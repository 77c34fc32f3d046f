//! # TVM Transaction Tracer
//!
//! A library for reconstructing and analyzing the causal message tree of a
//! TVM-style blockchain transaction.
//!
//! ## Core Features
//!
//! - **Message-Tree Reconstruction**
//!   - Recursive fetch of every message and transaction a call produced
//!   - Concurrent sibling fetches, emission order preserved
//!   - Console-contract output printed as it is encountered
//!
//! - **Trace Analysis**
//!   - Semantic classification of every message (deploy, call, event, ...)
//!   - ABI decoding against compiled artifacts, with a safe placeholder for
//!     unknown contracts
//!   - Compute/action error detection with a caller-supplied allowed-code
//!     policy
//!
//! - **Value Flow**
//!   - Per-node received/forwarded value and fee breakdown
//!   - Per-address balance diffs across the whole tree
//!   - First-reverted-branch location for failure reporting
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tvm_trace::{
//!     ContractRegistry, ProxyTransport, TraceParams, Tracer,
//!     abi::ContractAbi,
//!     types::{CodeHash, MsgId, TraceType},
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! // Registry is built once from compiled artifacts
//! let mut registry = ContractRegistry::new();
//! let wallet_abi = std::fs::read_to_string("artifacts/Wallet.abi.json")?;
//! registry.register(
//!     CodeHash::from("4a81..."),
//!     "Wallet",
//!     ContractAbi::from_json(&wallet_abi)?,
//! );
//!
//! // Any transport works: GraphQL indexer, JSON-RPC node, or an
//! // in-process proxy fed by a local executor
//! let transport = ProxyTransport::new();
//! let tracer = Tracer::new(transport, Arc::new(registry));
//!
//! let view = tracer
//!     .trace(TraceParams::new(MsgId::from("in-msg-id")).no_raise())
//!     .await?;
//!
//! println!("{view}");
//! for call in view.find_by_type_and_name(TraceType::FunctionCall, "transfer", None) {
//!     println!("transfer params: {:?}", call.decoded);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `types`: Core records and the annotated trace tree
//! - `abi`: Contract ABI model and message-body codec
//! - `resolver`: Code-hash to contract-artifact resolution
//! - `policy`: Allowed exit-code policy
//! - `transport`: Data-source boundary (GraphQL, JSON-RPC, in-process)
//! - `tree`: Raw message-tree builder
//! - `trace`: Classification, decoding, error and fee analysis
//! - `view`: Read-only query façade and pretty-printing
//! - `tracer`: Caller-facing entry point
//! - `errors`: Error types and handling

pub mod abi;
pub mod errors;
pub mod policy;
pub mod resolver;
pub mod trace;
pub mod tracer;
pub mod transport;
pub mod tree;
pub mod types;
pub mod view;

// Re-export the essential types and entry points
pub use errors::{RevertReport, TraceError, TransportError};
pub use policy::AllowedCodes;
pub use resolver::ContractRegistry;
pub use tracer::{TraceParams, Tracer};
#[cfg(feature = "transport-http")]
pub use transport::{GqlTransport, JrpcTransport};
pub use transport::{ProxyTransport, Transport};
pub use types::{TraceNode, TraceType};
pub use view::ViewTracingTree;
