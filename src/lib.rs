//! # `ralph_gate`
//!
//! Command gating and validation enforcement for autonomous coding agents.
//!
//! Three hooks sit between the agent and its environment:
//! - **pre-tool-use** classifies shell commands as blocked, deferred,
//!   auto-approved or unknown ([`classifier`]);
//! - **post-tool-use** lints edited files and reports findings ([`lint`]);
//! - **stop** keeps the agent working until its transcript shows a complete,
//!   successful validation run ([`evidence`], [`hooks`]).

#[cfg(feature = "cli")]
pub mod cli;
pub mod classifier;
pub mod command;
pub mod config;
pub mod error;
pub mod evidence;
pub mod hook_logging;
pub mod hooks;
pub mod lint;
pub mod paths;
pub mod state;
pub mod templates;
pub mod testing;
pub mod traits;
pub mod transcript;

pub use classifier::{classify, Classification, Outcome};
pub use command::RealCommandRunner;
pub use evidence::{scan, EvidenceReport, EvidenceScanner, ValidationKind};
pub use state::GateState;
pub use traits::{CommandOutput, CommandRunner, StateStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
