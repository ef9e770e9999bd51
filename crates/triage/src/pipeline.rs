//! Scan orchestration.
//!
//! Snapshots flow through detection and correlation, then each correlation
//! group is diagnosed: a cached diagnosis is reused when its fingerprint is
//! fresh, otherwise the completion backend is asked and the answer cached.
//! Groups that are gated out or whose request fails get the static fallback.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{DiagnosisCache, DiagnosisResult, DiagnosisSource, Fingerprint};
use crate::completion::CompletionBackend;
use crate::config::TriageConfig;
use crate::correlate::{correlate, CorrelationGroup, ResourceKey};
use crate::detect::detect_all;
use crate::error::CompletionError;
use crate::fallback::{describe, fallback};
use crate::fault::FaultRecord;
use crate::parse::parse_with_fallback;
use crate::prompt::{EventRecord, PromptBuilder};
use crate::snapshot::Snapshot;
use crate::source::ContextSource;

/// Outcome of one scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Snapshots examined
    pub snapshots: usize,
    pub faults_detected: usize,
    /// One per correlation group, most severe first
    pub diagnoses: Vec<DiagnosisResult>,
    pub cache_hits: usize,
    pub completions: usize,
    pub fallbacks: usize,
}

impl ScanReport {
    /// No faults were found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnoses.is_empty()
    }
}

/// Diagnoses correlation groups against a shared cache.
pub struct Diagnoser {
    backend: Arc<dyn CompletionBackend>,
    source: Arc<dyn ContextSource>,
    cache: Arc<DiagnosisCache>,
    prompts: PromptBuilder,
    config: TriageConfig,
}

impl Diagnoser {
    #[must_use]
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        source: Arc<dyn ContextSource>,
        cache: Arc<DiagnosisCache>,
        config: TriageConfig,
    ) -> Self {
        Self {
            backend,
            source,
            cache,
            prompts: PromptBuilder::new(config.prompt_config()),
            config,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<DiagnosisCache> {
        &self.cache
    }

    /// Detect, correlate and diagnose every fault in `snapshots`.
    ///
    /// A failing group falls back on its own; the scan itself never fails.
    pub async fn scan(&self, snapshots: &[Snapshot]) -> ScanReport {
        let scan_id = Uuid::new_v4();
        let started_at = Utc::now();

        let mut faults = detect_all(snapshots);
        if let Some(cluster_id) = &self.config.scan.cluster_id {
            faults = faults.iter().map(|f| f.with_cluster_id(cluster_id)).collect();
        }
        let groups = correlate(&faults);

        info!(
            %scan_id,
            snapshots = snapshots.len(),
            faults = faults.len(),
            groups = groups.len(),
            backend = self.backend.name(),
            "Starting diagnosis"
        );

        let mut diagnoses: Vec<DiagnosisResult> = stream::iter(groups.values())
            .map(|group| self.diagnose_group(group))
            .buffer_unordered(self.config.scan.concurrency.max(1))
            .collect()
            .await;

        diagnoses.sort_by(|a, b| {
            a.primary
                .severity
                .rank()
                .cmp(&b.primary.severity.rank())
                .then_with(|| ResourceKey::of(&a.primary).cmp(&ResourceKey::of(&b.primary)))
        });

        let count = |source: DiagnosisSource| {
            diagnoses.iter().filter(|d| d.source == source).count()
        };
        let report = ScanReport {
            scan_id,
            started_at,
            finished_at: Utc::now(),
            snapshots: snapshots.len(),
            faults_detected: faults.len(),
            cache_hits: count(DiagnosisSource::Cache),
            completions: count(DiagnosisSource::Completion),
            fallbacks: count(DiagnosisSource::Fallback),
            diagnoses,
        };

        info!(
            %scan_id,
            diagnoses = report.diagnoses.len(),
            cache_hits = report.cache_hits,
            completions = report.completions,
            fallbacks = report.fallbacks,
            duration_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "Scan complete"
        );

        report
    }

    /// Diagnose one correlation group.
    pub async fn diagnose_group(&self, group: &CorrelationGroup) -> DiagnosisResult {
        let primary = group.primary();
        let related = group.related();
        let fingerprint = Fingerprint::of(primary);

        if let Some(cached) = self.cache.get(&fingerprint) {
            debug!(resource = %group.key(), %fingerprint, "Reusing cached diagnosis");
            let mut result = cached.rebind(primary.clone(), related);
            result.diagnosis = describe(primary);
            return result;
        }

        if !self.prompts.should_request(primary) {
            debug!(
                resource = %group.key(),
                kind = %primary.kind,
                severity = %primary.severity,
                "Below completion threshold, using fallback"
            );
            return fallback_result(primary, related, fingerprint);
        }

        match self.request(group.key(), primary, &related).await {
            Ok(text) => {
                let parsed = parse_with_fallback(&text, primary);
                let result = DiagnosisResult {
                    primary: primary.clone(),
                    related,
                    root_cause: parsed.root_cause,
                    diagnosis: describe(primary),
                    solutions: parsed.solutions,
                    preventions: parsed.preventions,
                    fingerprint: fingerprint.clone(),
                    source: DiagnosisSource::Completion,
                };
                self.cache.put(fingerprint, result.clone());
                result
            }
            Err(e) => {
                warn!(
                    resource = %group.key(),
                    backend = self.backend.name(),
                    error = %e,
                    "Completion failed, using fallback"
                );
                fallback_result(primary, related, fingerprint)
            }
        }
    }

    async fn request(
        &self,
        key: &ResourceKey,
        primary: &FaultRecord,
        related: &[FaultRecord],
    ) -> Result<String, CompletionError> {
        let (logs, events) = self.gather_context(key).await;
        let prompt = self.prompts.build(primary, related, &logs, &events);
        self.backend
            .complete(
                &prompt,
                &self.config.completion.model,
                self.config.completion.max_output_tokens,
            )
            .await
    }

    async fn gather_context(&self, key: &ResourceKey) -> (String, Vec<EventRecord>) {
        let (logs, events) = tokio::join!(
            self.source
                .fetch_logs(key, self.config.scan.log_tail_lines),
            self.source.fetch_events(key)
        );

        let logs = logs.unwrap_or_else(|e| {
            warn!(resource = %key, error = %e, "Failed to fetch logs");
            String::new()
        });
        let events = events.unwrap_or_else(|e| {
            warn!(resource = %key, error = %e, "Failed to fetch events");
            Vec::new()
        });
        (logs, events)
    }
}

fn fallback_result(
    primary: &FaultRecord,
    related: Vec<FaultRecord>,
    fingerprint: Fingerprint,
) -> DiagnosisResult {
    let diagnosis = fallback(primary);
    DiagnosisResult {
        primary: primary.clone(),
        related,
        root_cause: diagnosis.root_cause,
        diagnosis: diagnosis.diagnosis,
        solutions: diagnosis.solutions,
        preventions: diagnosis.preventions,
        fingerprint,
        source: DiagnosisSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::DisabledBackend;
    use crate::fault::ContextKey;
    use crate::prompt::Prompt;
    use crate::source::NoContext;
    use crate::taxonomy::FaultKind;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RESPONSE: &str = "### Root Cause\nHeap larger than the limit\n### Solution\n1. Raise the limit\n2. Cap the heap\n### Prevention\n- Alert at 80%\n";

    #[derive(Default)]
    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionBackend for CountingBackend {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn complete(&self, _: &Prompt, _: &str, _: u32) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RESPONSE.to_string())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl CompletionBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn complete(&self, _: &Prompt, _: &str, _: u32) -> Result<String, CompletionError> {
            Err(CompletionError::Status {
                status: 503,
                body: "overloaded".to_string(),
            })
        }
    }

    fn oom_pod(name: &str) -> Snapshot {
        Snapshot::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": name,
                "namespace": "shop",
                "labels": {"pod-template-hash": "7d9f8c6d5"},
                "ownerReferences": [{
                    "apiVersion": "apps/v1", "kind": "ReplicaSet",
                    "name": "api-7d9f8c6d5", "uid": "rs-1", "controller": true
                }]
            },
            "spec": {"containers": [{
                "name": "api", "image": "shop/api:1.4.2",
                "resources": {"limits": {"memory": "512Mi"}}
            }]},
            "status": {
                "phase": "Running",
                "containerStatuses": [{
                    "name": "api", "image": "shop/api:1.4.2", "imageID": "",
                    "ready": false, "restartCount": 8,
                    "state": {"waiting": {"reason": "CrashLoopBackOff"}},
                    "lastState": {"terminated": {"exitCode": 137, "reason": "OOMKilled"}}
                }]
            }
        }))
    }

    fn suspended_cronjob() -> Snapshot {
        Snapshot::from_value(json!({
            "apiVersion": "batch/v1",
            "kind": "CronJob",
            "metadata": {"name": "nightly", "namespace": "ops"},
            "spec": {
                "schedule": "0 2 * * *",
                "suspend": true,
                "jobTemplate": {"spec": {"template": {"spec": {"containers": [
                    {"name": "backup", "image": "ops/backup:1"}
                ]}}}}
            }
        }))
    }

    fn diagnoser(backend: Arc<dyn CompletionBackend>, config: TriageConfig) -> Diagnoser {
        Diagnoser::new(
            backend,
            Arc::new(NoContext),
            Arc::new(DiagnosisCache::new()),
            config,
        )
    }

    #[tokio::test]
    async fn test_backend_failure_falls_back_per_group() {
        let report = diagnoser(Arc::new(FailingBackend), TriageConfig::default())
            .scan(&[oom_pod("api-7d9f8c6d5-abc12")])
            .await;

        assert_eq!(report.diagnoses.len(), 1);
        let diagnosis = &report.diagnoses[0];
        assert_eq!(diagnosis.source, DiagnosisSource::Fallback);
        assert_eq!(diagnosis.primary.kind, FaultKind::OomKilled);
        assert_eq!(diagnosis.solutions.len(), 3);
        assert_eq!(report.fallbacks, 1);
    }

    #[tokio::test]
    async fn test_completion_is_cached_and_reused() {
        let backend = Arc::new(CountingBackend::default());
        let diagnoser = diagnoser(backend.clone(), TriageConfig::default());

        let first = diagnoser.scan(&[oom_pod("api-7d9f8c6d5-abc12")]).await;
        assert_eq!(first.completions, 1);
        assert_eq!(first.diagnoses[0].root_cause, "Heap larger than the limit");
        assert_eq!(first.diagnoses[0].solutions, vec!["Raise the limit", "Cap the heap"]);

        let second = diagnoser.scan(&[oom_pod("api-7d9f8c6d5-xyz89")]).await;
        assert_eq!(second.cache_hits, 1);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        let hit = &second.diagnoses[0];
        assert_eq!(hit.source, DiagnosisSource::Cache);
        assert_eq!(hit.primary.resource_name, "api-7d9f8c6d5-xyz89");
        assert!(hit.diagnosis.contains("api-7d9f8c6d5-xyz89"));
        assert_eq!(hit.solutions, first.diagnoses[0].solutions);
    }

    #[tokio::test]
    async fn test_sequential_groups_share_one_request() {
        let backend = Arc::new(CountingBackend::default());
        let mut config = TriageConfig::default();
        config.scan.concurrency = 1;

        let report = diagnoser(backend.clone(), config)
            .scan(&[oom_pod("api-7d9f8c6d5-aaaaa"), oom_pod("api-7d9f8c6d5-bbbbb")])
            .await;

        assert_eq!(report.diagnoses.len(), 2);
        assert_eq!(report.completions, 1);
        assert_eq!(report.cache_hits, 1);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_low_severity_never_reaches_backend() {
        let backend = Arc::new(CountingBackend::default());
        let report = diagnoser(backend.clone(), TriageConfig::default())
            .scan(&[suspended_cronjob()])
            .await;

        assert_eq!(report.diagnoses[0].primary.kind, FaultKind::CronJobSuspended);
        assert_eq!(report.diagnoses[0].source, DiagnosisSource::Fallback);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_completion_uses_fallback() {
        let mut config = TriageConfig::default();
        config.completion.enabled = false;

        let report = diagnoser(Arc::new(DisabledBackend), config)
            .scan(&[oom_pod("api-7d9f8c6d5-abc12")])
            .await;
        assert_eq!(report.fallbacks, 1);
        assert_eq!(report.completions, 0);
    }

    #[tokio::test]
    async fn test_results_sorted_by_severity_and_tagged() {
        let mut config = TriageConfig::default();
        config.scan.cluster_id = Some("prod-eu".to_string());

        let report = diagnoser(Arc::new(FailingBackend), config)
            .scan(&[suspended_cronjob(), oom_pod("api-7d9f8c6d5-abc12")])
            .await;

        let kinds: Vec<FaultKind> = report.diagnoses.iter().map(|d| d.primary.kind).collect();
        assert_eq!(kinds, vec![FaultKind::OomKilled, FaultKind::CronJobSuspended]);
        for diagnosis in &report.diagnoses {
            assert_eq!(
                diagnosis.primary.context.get(ContextKey::ClusterId),
                Some("prod-eu")
            );
        }
    }

    #[tokio::test]
    async fn test_clean_cluster() {
        let healthy: Value = json!({
            "apiVersion": "v1", "kind": "Pod",
            "metadata": {"name": "ok", "namespace": "shop"},
            "spec": {"containers": [{"name": "c", "image": "i"}]},
            "status": {"phase": "Running", "containerStatuses": [{
                "name": "c", "image": "i", "imageID": "", "ready": true, "restartCount": 0,
                "state": {"running": {}}
            }]}
        });
        let report = diagnoser(Arc::new(FailingBackend), TriageConfig::default())
            .scan(&[Snapshot::from_value(healthy)])
            .await;
        assert!(report.is_clean());
        assert_eq!(report.faults_detected, 0);
    }
}
