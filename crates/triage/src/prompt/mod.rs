//! Prompt construction for the completion backend.
//!
//! A prompt is a system message (process header, one rule block for the
//! fault kind, format footers) plus a user message that packs the fault,
//! its context, related faults, a filtered log excerpt and de-duplicated
//! events. Building is deterministic: identical inputs give identical text.

pub mod events;
pub mod logs;
pub mod rules;
pub mod tokens;

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::debug;

use crate::fault::{ContextKey, FaultRecord};
use crate::taxonomy::Severity;

pub use events::{dedup_events, EventRecord};
pub use logs::filter_logs;
pub use tokens::estimate_tokens;

/// Sampling temperature for kinds with a well-known remediation path
pub const DETERMINISTIC_TEMPERATURE: f32 = 0.3;

/// Sampling temperature for ambiguous kinds
pub const EXPLORATORY_TEMPERATURE: f32 = 0.7;

/// Context keys forwarded to the backend, in emission order.
///
/// Owner kind and name are part of the prompt header and are not repeated.
const CONTEXT_FIELDS: &[ContextKey] = &[
    ContextKey::ClusterId,
    ContextKey::ContainerName,
    ContextKey::Image,
    ContextKey::ExitCode,
    ContextKey::TerminationReason,
    ContextKey::TerminationMessage,
    ContextKey::WaitingReason,
    ContextKey::WaitingMessage,
    ContextKey::RestartCount,
    ContextKey::PodPhase,
    ContextKey::PodReason,
    ContextKey::NodeName,
    ContextKey::ConditionType,
    ContextKey::ConditionReason,
    ContextKey::ConditionMessage,
    ContextKey::IssueCategory,
    ContextKey::PvcNames,
    ContextKey::CpuRequest,
    ContextKey::CpuLimit,
    ContextKey::MemoryRequest,
    ContextKey::MemoryLimit,
    ContextKey::DesiredReplicas,
    ContextKey::ReadyReplicas,
    ContextKey::AvailableReplicas,
    ContextKey::UpdatedReplicas,
    ContextKey::Taints,
    ContextKey::NodeSelector,
    ContextKey::BackoffLimit,
    ContextKey::FailedPods,
    ContextKey::Schedule,
    ContextKey::LastScheduleTime,
    ContextKey::LastSuccessfulTime,
];

/// Prompt builder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Master switch for backend requests
    pub enabled: bool,
    /// Least severe fault that still gets a backend request
    pub min_severity: Severity,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_severity: Severity::Medium,
        }
    }
}

/// A fully built request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    /// Advisory only, never used to truncate
    pub estimated_tokens: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    config: PromptConfig,
}

impl PromptBuilder {
    #[must_use]
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> PromptConfig {
        self.config
    }

    /// Whether this fault should be sent to the backend at all.
    #[must_use]
    pub fn should_request(&self, primary: &FaultRecord) -> bool {
        self.config.enabled && primary.severity.is_at_least(self.config.min_severity)
    }

    /// Build the system/user message pair for a diagnosis request.
    #[must_use]
    pub fn build(
        &self,
        primary: &FaultRecord,
        related: &[FaultRecord],
        logs: &str,
        events: &[EventRecord],
    ) -> Prompt {
        let system = system_prompt(primary);
        let user = user_prompt(primary, related, logs, events);
        let temperature = if primary.kind.is_exploratory() {
            EXPLORATORY_TEMPERATURE
        } else {
            DETERMINISTIC_TEMPERATURE
        };
        let estimated_tokens = estimate_tokens(&system) + estimate_tokens(&user);

        debug!(
            kind = %primary.kind,
            resource = %primary.display_name(),
            estimated_tokens,
            temperature,
            "Built diagnosis prompt"
        );

        Prompt {
            system,
            user,
            temperature,
            estimated_tokens,
        }
    }
}

fn system_prompt(primary: &FaultRecord) -> String {
    [
        rules::SYSTEM_HEADER,
        rules::rule_block(primary),
        rules::SOLUTION_FORMAT,
        rules::OUTPUT_FORMAT,
    ]
    .join("\n\n")
}

fn user_prompt(
    primary: &FaultRecord,
    related: &[FaultRecord],
    logs: &str,
    events: &[EventRecord],
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Fault: {} ({})", primary.kind.code(), primary.severity);
    let _ = writeln!(out, "Owner: {}/{}", primary.owner_kind(), primary.owner_name());
    let _ = writeln!(
        out,
        "Resource: {} {}",
        primary.resource_kind, primary.resource_name
    );
    let _ = writeln!(
        out,
        "Namespace: {}",
        primary.namespace.as_deref().unwrap_or("(cluster-scoped)")
    );
    let _ = writeln!(out, "Summary: {}", primary.summary);

    if !primary.description.is_empty() {
        let _ = writeln!(out, "\nDescription:\n{}", primary.description);
    }

    let context: Vec<String> = CONTEXT_FIELDS
        .iter()
        .filter_map(|key| {
            primary
                .context
                .get(*key)
                .map(|value| format!("{}: {value}", key.label()))
        })
        .collect();
    if !context.is_empty() {
        let _ = writeln!(out, "\nContext:\n{}", context.join("\n"));
    }

    if !primary.symptoms.is_empty() {
        out.push_str("\nSymptoms:\n");
        for symptom in &primary.symptoms {
            let _ = writeln!(out, "- {symptom}");
        }
    }

    if !related.is_empty() {
        out.push_str("\nOther faults on this resource:\n");
        for fault in related {
            let _ = writeln!(out, "- {}: {}", fault.kind.code(), fault.summary);
        }
    }

    let log_lines = filter_logs(logs);
    if log_lines.is_empty() {
        out.push_str("\nLogs: none available\n");
    } else {
        let _ = writeln!(out, "\nLogs (filtered):\n{}", log_lines.join("\n"));
    }

    let event_lines = dedup_events(events);
    if event_lines.is_empty() {
        out.push_str("\nEvents: none recorded\n");
    } else {
        let _ = writeln!(out, "\nEvents:\n{}", event_lines.join("\n"));
    }

    out
}
