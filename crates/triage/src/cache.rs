//! Fingerprint-keyed diagnosis cache.
//!
//! Recurring failures of the same shape (same fault kind on the same kind of
//! resource under the same kind of controller, with the same issue category)
//! share a diagnosis regardless of which instance they were seen on.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use crate::fault::{ContextKey, FaultRecord};

/// Default time-to-live for cached diagnoses
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Keyword groups for issue category inference, checked in order.
const ISSUE_CATEGORIES: &[(&[&str], &str)] = &[
    (
        &[
            "pvc",
            "persistentvolumeclaim",
            "volume",
            "storageclass",
            "storage class",
            "storage-class",
        ],
        "PVC",
    ),
    (&["cpu"], "CPU"),
    (&["memory"], "MEMORY"),
    (&["insufficient", "resource"], "RESOURCE"),
    (&["taint", "toleration"], "TAINT"),
    (&["node", "affinity", "selector"], "NODE"),
];

/// Infer an issue category from free text. First matching group wins.
#[must_use]
pub fn derive_issue_category(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    ISSUE_CATEGORIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(*k)))
        .map_or("", |(_, category)| *category)
}

/// Issue category from context, or inferred from the description.
#[must_use]
pub fn issue_category(record: &FaultRecord) -> String {
    record
        .context
        .get(ContextKey::IssueCategory)
        .map_or_else(|| derive_issue_category(&record.description).to_string(), String::from)
}

/// Cache key: `kindCode:resourceKind:ownerKind:issueCategory`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a fault. Never depends on name, namespace or timestamps.
    #[must_use]
    pub fn of(record: &FaultRecord) -> Self {
        Self(format!(
            "{}:{}:{}:{}",
            record.kind.code(),
            record.resource_kind,
            record.context.get(ContextKey::OwnerKind).unwrap_or_default(),
            issue_category(record)
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a diagnosis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisSource {
    Completion,
    Cache,
    Fallback,
}

impl DiagnosisSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completion => "completion",
            Self::Cache => "cache",
            Self::Fallback => "fallback",
        }
    }
}

/// Diagnosis for one correlation group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub primary: FaultRecord,
    pub related: Vec<FaultRecord>,
    pub root_cause: String,
    pub diagnosis: String,
    pub solutions: Vec<String>,
    pub preventions: Vec<String>,
    pub fingerprint: Fingerprint,
    pub source: DiagnosisSource,
}

impl DiagnosisResult {
    /// Reuse this diagnosis for another group sharing the fingerprint.
    #[must_use]
    pub fn rebind(&self, primary: FaultRecord, related: Vec<FaultRecord>) -> Self {
        Self {
            primary,
            related,
            source: DiagnosisSource::Cache,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: DiagnosisResult,
    stored_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.stored_at < ttl
    }
}

/// In-process diagnosis store.
///
/// Entries are never evicted; a stale read is a miss and the next `put`
/// overwrites it. Concurrent misses on one fingerprint are not coordinated,
/// the last write wins.
#[derive(Debug)]
pub struct DiagnosisCache {
    entries: RwLock<HashMap<Fingerprint, CacheEntry>>,
    ttl: Duration,
}

impl Default for DiagnosisCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisCache {
    /// Create a cache with the default TTL (30 minutes).
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(DEFAULT_TTL_MINUTES))
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<DiagnosisResult> {
        self.get_at(fingerprint, Utc::now())
    }

    /// Look up a fingerprint as of `now`.
    #[must_use]
    pub fn get_at(&self, fingerprint: &Fingerprint, now: DateTime<Utc>) -> Option<DiagnosisResult> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let hit = entries
            .get(fingerprint)
            .filter(|entry| entry.is_fresh(self.ttl, now))
            .map(|entry| entry.result.clone());
        debug!(
            fingerprint = %fingerprint,
            hit = hit.is_some(),
            "Diagnosis cache lookup"
        );
        hit
    }

    pub fn put(&self, fingerprint: Fingerprint, result: DiagnosisResult) {
        self.put_at(fingerprint, result, Utc::now());
    }

    /// Store a diagnosis as of `now`, replacing any previous entry.
    pub fn put_at(&self, fingerprint: Fingerprint, result: DiagnosisResult, now: DateTime<Utc>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            fingerprint,
            CacheEntry {
                result,
                stored_at: now,
            },
        );
    }

    /// Number of stored entries, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::ResourceKind;
    use crate::taxonomy::FaultKind;

    fn pending(name: &str, namespace: &str, description: &str) -> FaultRecord {
        FaultRecord::new(
            FaultKind::PodPending,
            ResourceKind::Pod,
            Some(namespace.to_string()),
            name,
            format!("Pod {name} cannot be scheduled"),
        )
        .with_description(description)
        .with_context(ContextKey::OwnerKind, "Deployment")
    }

    fn result_for(record: &FaultRecord) -> DiagnosisResult {
        DiagnosisResult {
            primary: record.clone(),
            related: Vec::new(),
            root_cause: "Requests exceed node capacity".to_string(),
            diagnosis: "The pod requests more CPU than any node offers.".to_string(),
            solutions: vec!["Lower the CPU request".to_string()],
            preventions: vec!["Set namespace LimitRanges".to_string()],
            fingerprint: Fingerprint::of(record),
            source: DiagnosisSource::Completion,
        }
    }

    #[test]
    fn test_issue_category_keyword_order() {
        assert_eq!(derive_issue_category("pod has unbound PersistentVolumeClaims"), "PVC");
        assert_eq!(derive_issue_category("3 Insufficient cpu"), "CPU");
        assert_eq!(derive_issue_category("3 Insufficient memory"), "MEMORY");
        // cpu is checked before memory
        assert_eq!(derive_issue_category("Insufficient cpu, Insufficient memory"), "CPU");
        assert_eq!(derive_issue_category("Insufficient nvidia.com/gpu"), "RESOURCE");
        assert_eq!(
            derive_issue_category("had untolerated taint {dedicated: gpu}"),
            "TAINT"
        );
        assert_eq!(
            derive_issue_category("didn't match Pod's node affinity/selector"),
            "NODE"
        );
        assert_eq!(derive_issue_category("image not found"), "");
    }

    #[test]
    fn test_context_category_overrides_description() {
        let record = pending("api-1", "shop", "Insufficient cpu")
            .with_context(ContextKey::IssueCategory, "TAINT");
        assert_eq!(issue_category(&record), "TAINT");
    }

    #[test]
    fn test_fingerprint_ignores_identity() {
        let a = pending("api-1", "shop", "0/3 nodes: Insufficient cpu");
        let b = pending("worker-9", "batch", "0/5 nodes: Insufficient cpu");
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
        assert_eq!(
            Fingerprint::of(&a).as_str(),
            "POD_PENDING:Pod:Deployment:CPU"
        );
    }

    #[test]
    fn test_fingerprint_ignores_detection_time() {
        let earlier = pending("api-1", "shop", "Insufficient memory")
            .detected_at(Utc::now() - Duration::hours(6));
        let later = earlier.clone().detected_at(Utc::now());
        assert_ne!(earlier, later);
        assert_eq!(Fingerprint::of(&earlier), Fingerprint::of(&later));
    }

    #[test]
    fn test_fingerprint_differs_by_category_and_owner() {
        let cpu = pending("api-1", "shop", "Insufficient cpu");
        let memory = pending("api-1", "shop", "Insufficient memory");
        assert_ne!(Fingerprint::of(&cpu), Fingerprint::of(&memory));

        let sts = cpu.derive_with(ContextKey::OwnerKind, "StatefulSet");
        assert_ne!(Fingerprint::of(&cpu), Fingerprint::of(&sts));
    }

    #[test]
    fn test_round_trip_and_expiry() {
        let cache = DiagnosisCache::new();
        let record = pending("api-1", "shop", "Insufficient cpu");
        let fingerprint = Fingerprint::of(&record);
        let stored = result_for(&record);
        let t0 = Utc::now();

        cache.put_at(fingerprint.clone(), stored.clone(), t0);
        assert_eq!(cache.get_at(&fingerprint, t0), Some(stored));
        assert!(cache
            .get_at(&fingerprint, t0 + Duration::minutes(29))
            .is_some());
        assert!(cache
            .get_at(&fingerprint, t0 + Duration::minutes(30))
            .is_none());
        // stale entries stay until overwritten
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let cache = DiagnosisCache::with_ttl(Duration::minutes(5));
        let record = pending("api-1", "shop", "Insufficient cpu");
        let fingerprint = Fingerprint::of(&record);

        let first = result_for(&record);
        let mut second = result_for(&record);
        second.root_cause = "Cluster is out of CPU".to_string();

        cache.put(fingerprint.clone(), first);
        cache.put(fingerprint.clone(), second.clone());
        assert_eq!(cache.get(&fingerprint), Some(second));
    }

    #[test]
    fn test_rebind_keeps_sections() {
        let record = pending("api-1", "shop", "Insufficient cpu");
        let other = pending("api-2", "shop", "Insufficient cpu");
        let cached = result_for(&record);

        let rebound = cached.rebind(other.clone(), Vec::new());
        assert_eq!(rebound.primary, other);
        assert_eq!(rebound.root_cause, cached.root_cause);
        assert_eq!(rebound.source, DiagnosisSource::Cache);
    }
}
