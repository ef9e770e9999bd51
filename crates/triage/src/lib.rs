//! Workload fault triage for Kubernetes.
//!
//! This crate turns resource snapshots into diagnosed faults:
//!
//! - **Detection** - classify Pods, Deployments, StatefulSets, DaemonSets,
//!   ReplicaSets, Nodes, Jobs and CronJobs into typed fault records
//! - **Correlation** - group faults by resource and pick a primary fault
//! - **Diagnosis** - ask an OpenAI-compatible completion backend for a root
//!   cause and remediation, with a fingerprint cache and static fallback
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use triage::{
//!     load_snapshots, ChatCompletionClient, DiagnosisCache, Diagnoser, NoContext, TriageConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TriageConfig::load(None)?;
//!     let backend = ChatCompletionClient::from_settings(&config.completion)?;
//!     let diagnoser = Diagnoser::new(
//!         Arc::new(backend),
//!         Arc::new(NoContext),
//!         Arc::new(DiagnosisCache::new()),
//!         config,
//!     );
//!
//!     let snapshots = load_snapshots("cluster.json".as_ref())?;
//!     let report = diagnoser.scan(&snapshots).await;
//!     println!("{}", triage::report::format_report_text(&report));
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod completion;
pub mod config;
pub mod correlate;
pub mod detect;
pub mod error;
pub mod fallback;
pub mod fault;
pub mod parse;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod snapshot;
pub mod source;
pub mod taxonomy;

pub use cache::{DiagnosisCache, DiagnosisResult, DiagnosisSource, Fingerprint};
pub use completion::{ChatCompletionClient, CompletionBackend, DisabledBackend};
pub use config::TriageConfig;
pub use correlate::{correlate, CorrelationGroup, ResourceKey};
pub use detect::{detect, detect_all};
pub use error::{CompletionError, ConfigError, SnapshotError};
pub use fallback::{fallback, FallbackDiagnosis};
pub use fault::{ContextKey, FaultContext, FaultRecord, ResourceKind};
pub use parse::{parse, parse_with_fallback, ParsedResponse};
pub use pipeline::{Diagnoser, ScanReport};
pub use prompt::{EventRecord, Prompt, PromptBuilder, PromptConfig};
pub use snapshot::{load_snapshots, parse_snapshots, Snapshot};
pub use source::{ContextSource, DirectoryContextSource, NoContext};
pub use taxonomy::{FaultKind, Severity};
