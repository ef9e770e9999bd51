//! Fault correlation.
//!
//! Groups fault records by the concrete resource they were detected on and
//! picks one primary fault per group. The primary drives diagnosis; the rest
//! are passed along as related context.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::fault::{FaultRecord, ResourceKind};

/// Identity of one concrete resource. `None` namespace only equals `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceKey {
    pub namespace: Option<String>,
    pub resource_kind: ResourceKind,
    pub resource_name: String,
}

impl ResourceKey {
    #[must_use]
    pub fn of(record: &FaultRecord) -> Self {
        Self {
            namespace: record.namespace.clone(),
            resource_kind: record.resource_kind.clone(),
            resource_name: record.resource_name.clone(),
        }
    }

    fn matches(&self, record: &FaultRecord) -> bool {
        self.namespace == record.namespace
            && self.resource_kind == record.resource_kind
            && self.resource_name == record.resource_name
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{ns}/{}", self.resource_kind, self.resource_name),
            None => write!(f, "{}/{}", self.resource_kind, self.resource_name),
        }
    }
}

/// All faults on one resource, in detection order. Never empty.
#[derive(Debug, Clone)]
pub struct CorrelationGroup {
    key: ResourceKey,
    faults: Vec<FaultRecord>,
    primary: usize,
}

impl CorrelationGroup {
    fn new(first: FaultRecord) -> Self {
        Self {
            key: ResourceKey::of(&first),
            faults: vec![first],
            primary: 0,
        }
    }

    fn push(&mut self, record: FaultRecord) {
        // strict comparison keeps the earliest record on ties
        if record.severity.rank() < self.faults[self.primary].severity.rank() {
            self.primary = self.faults.len();
        }
        self.faults.push(record);
    }

    #[must_use]
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Faults in detection order.
    #[must_use]
    pub fn faults(&self) -> &[FaultRecord] {
        &self.faults
    }

    /// The most severe fault; ties go to the first detected.
    #[must_use]
    pub fn primary(&self) -> &FaultRecord {
        &self.faults[self.primary]
    }

    /// Every fault not equal to the primary, in detection order.
    #[must_use]
    pub fn related(&self) -> Vec<FaultRecord> {
        related_faults(self.primary(), &self.faults)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.faults.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Group faults by resource identity.
#[must_use]
pub fn correlate(faults: &[FaultRecord]) -> BTreeMap<ResourceKey, CorrelationGroup> {
    let mut groups: BTreeMap<ResourceKey, CorrelationGroup> = BTreeMap::new();
    for fault in faults {
        let key = ResourceKey::of(fault);
        match groups.get_mut(&key) {
            Some(group) => group.push(fault.clone()),
            None => {
                groups.insert(key, CorrelationGroup::new(fault.clone()));
            }
        }
    }
    groups
}

/// Primary fault of a group.
#[must_use]
pub fn select_primary(group: &CorrelationGroup) -> &FaultRecord {
    group.primary()
}

/// Faults in `all` on the same resource as `primary`, minus every record
/// equal to `primary`.
#[must_use]
pub fn related_faults(primary: &FaultRecord, all: &[FaultRecord]) -> Vec<FaultRecord> {
    let key = ResourceKey::of(primary);
    all.iter()
        .filter(|record| key.matches(record) && *record != primary)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{FaultKind, Severity};

    fn pod_fault(kind: FaultKind, name: &str, summary: &str) -> FaultRecord {
        FaultRecord::new(
            kind,
            ResourceKind::Pod,
            Some("shop".to_string()),
            name,
            summary,
        )
    }

    #[test]
    fn test_same_resource_lands_in_one_group() {
        let faults = vec![
            pod_fault(FaultKind::HighRestartCount, "api-1", "restarts"),
            pod_fault(FaultKind::OomKilled, "api-1", "oom"),
            pod_fault(FaultKind::ImagePullBackOff, "web-1", "pull"),
            pod_fault(FaultKind::ContainerError, "api-1", "exit 1"),
        ];

        let groups = correlate(&faults);
        assert_eq!(groups.len(), 2);

        let api = groups
            .values()
            .find(|g| g.key().resource_name == "api-1")
            .unwrap();
        assert_eq!(api.len(), 3);
        assert_eq!(select_primary(api).kind, FaultKind::OomKilled);
        assert_eq!(api.related().len(), 2);
        assert!(api.related().iter().all(|f| f.kind != FaultKind::OomKilled));
    }

    #[test]
    fn test_tie_goes_to_first_detected() {
        let pending = pod_fault(
            FaultKind::PodPending,
            "api-1",
            "Insufficient cpu on all nodes",
        );
        let error = pod_fault(FaultKind::ContainerError, "api-1", "exit 1");
        assert_eq!(pending.severity, Severity::High);
        assert_eq!(error.severity, Severity::High);

        let groups = correlate(&[pending.clone(), error.clone()]);
        let group = groups.values().next().unwrap();
        assert_eq!(group.primary().kind, FaultKind::PodPending);

        let reversed = correlate(&[error, pending]);
        let group = reversed.values().next().unwrap();
        assert_eq!(group.primary().kind, FaultKind::ContainerError);
    }

    #[test]
    fn test_absent_namespace_only_matches_absent() {
        let node = FaultRecord::new(
            FaultKind::NodeNotReady,
            ResourceKind::Node,
            None,
            "worker-1",
            "not ready",
        );
        let namespaced = FaultRecord::new(
            FaultKind::NodeDiskPressure,
            ResourceKind::Node,
            Some("default".to_string()),
            "worker-1",
            "disk",
        );

        let groups = correlate(&[node, namespaced]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_kind_is_part_of_the_key() {
        let deployment = FaultRecord::new(
            FaultKind::ReplicaMismatch,
            ResourceKind::Deployment,
            Some("shop".to_string()),
            "api",
            "1/3 ready",
        );
        let pod = pod_fault(FaultKind::OomKilled, "api", "oom");
        assert_eq!(correlate(&[deployment, pod]).len(), 2);
    }

    #[test]
    fn test_related_faults_excludes_primary() {
        let oom = pod_fault(FaultKind::OomKilled, "api-1", "oom");
        let restarts = pod_fault(FaultKind::HighRestartCount, "api-1", "restarts");
        let other = pod_fault(FaultKind::OomKilled, "web-1", "oom");
        let all = vec![restarts.clone(), oom.clone(), other];

        let related = related_faults(&oom, &all);
        assert_eq!(related, vec![restarts]);
    }

    #[test]
    fn test_duplicate_primary_is_not_related() {
        let oom = pod_fault(FaultKind::OomKilled, "api-1", "oom");
        let restarts = pod_fault(FaultKind::HighRestartCount, "api-1", "restarts");
        let all = vec![oom.clone(), restarts.clone(), oom.clone()];

        assert_eq!(related_faults(&oom, &all), vec![restarts.clone()]);

        let groups = correlate(&all);
        let group = groups.values().next().unwrap();
        assert_eq!(group.len(), 3);
        assert_eq!(group.related(), vec![restarts]);
    }
}
