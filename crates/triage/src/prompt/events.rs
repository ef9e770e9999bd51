//! Event records and their de-duplication for prompts.

use k8s_openapi::api::core::v1::Event;
use serde::{Deserialize, Serialize};

use crate::detect::render;

/// Maximum number of distinct event lines forwarded
pub const MAX_EVENT_GROUPS: usize = 5;

/// One recent event on a resource, reduced to what triage needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub type_: String,
    pub reason: String,
    pub message: String,
    /// Occurrences already folded into this event by the API server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<String>,
}

impl EventRecord {
    #[must_use]
    pub fn new(
        type_: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            reason: reason.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_count(mut self, count: i32) -> Self {
        self.count = Some(count);
        self
    }

    fn occurrences(&self) -> u64 {
        self.count
            .and_then(|c| u64::try_from(c).ok())
            .filter(|c| *c > 0)
            .unwrap_or(1)
    }
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        Self {
            type_: event.type_.clone().unwrap_or_default(),
            reason: event.reason.clone().unwrap_or_default(),
            message: event.message.clone().unwrap_or_default(),
            count: event.count,
            first_timestamp: event.first_timestamp.as_ref().and_then(render),
            last_timestamp: event
                .last_timestamp
                .as_ref()
                .and_then(render)
                .or_else(|| event.event_time.as_ref().and_then(render)),
        }
    }
}

/// Collapse identical events into one line each.
///
/// Events are grouped by exact `(type, reason, message)` in first-seen order.
/// Each group renders as `[Type] Reason: message`, with an `(xN times)` suffix
/// when it stands for more than one occurrence. At most [`MAX_EVENT_GROUPS`]
/// lines are returned.
#[must_use]
pub fn dedup_events(events: &[EventRecord]) -> Vec<String> {
    let mut groups: Vec<(&EventRecord, u64)> = Vec::new();

    for event in events {
        let existing = groups.iter().position(|(first, _)| {
            first.type_ == event.type_
                && first.reason == event.reason
                && first.message == event.message
        });
        match existing {
            Some(index) => groups[index].1 += event.occurrences(),
            None => groups.push((event, event.occurrences())),
        }
    }

    groups
        .into_iter()
        .take(MAX_EVENT_GROUPS)
        .map(|(event, total)| {
            let line = format!("[{}] {}: {}", event.type_, event.reason, event.message);
            if total > 1 {
                format!("{line} (x{total} times)")
            } else {
                line
            }
        })
        .collect()
}
