//! Job and CronJob detection.

use k8s_openapi::api::batch::v1::{CronJob, Job};

use super::{missing_status, object_name, render, with_owner, with_resources};
use crate::fault::{ContextKey, FaultRecord, ResourceKind};
use crate::taxonomy::FaultKind;

pub(super) fn detect_job(job: &Job) -> Vec<FaultRecord> {
    let meta = &job.metadata;
    let Some(status) = job.status.as_ref() else {
        return vec![missing_status(ResourceKind::Job, meta)];
    };
    let Some(failed) = status
        .conditions
        .iter()
        .flatten()
        .find(|c| c.type_ == "Failed" && c.status == "True")
    else {
        return Vec::new();
    };

    let kind = match failed.reason.as_deref() {
        Some("BackoffLimitExceeded") => FaultKind::JobBackoffLimitExceeded,
        Some("DeadlineExceeded") => FaultKind::JobDeadlineExceeded,
        _ => FaultKind::JobFailed,
    };
    let name = object_name(meta);
    let spec = job.spec.as_ref();
    let message = failed.message.clone().unwrap_or_default();

    let summary = match kind {
        FaultKind::JobBackoffLimitExceeded => format!("Job {name} hit its backoff limit"),
        FaultKind::JobDeadlineExceeded => format!("Job {name} ran past its active deadline"),
        _ => format!("Job {name} failed"),
    };

    let record = FaultRecord::new(
        kind,
        ResourceKind::Job,
        meta.namespace.clone(),
        name,
        summary,
    )
    .with_description(format!("{}\n{message}", kind.description()).trim_end().to_string())
    .with_symptom(message.clone())
    .with_context(ContextKey::ConditionType, "Failed")
    .with_optional_context(ContextKey::ConditionReason, failed.reason.clone())
    .with_context(ContextKey::ConditionMessage, message)
    .with_optional_context(
        ContextKey::BackoffLimit,
        spec.and_then(|s| s.backoff_limit).map(|n| n.to_string()),
    )
    .with_optional_context(ContextKey::FailedPods, status.failed.map(|n| n.to_string()));

    let record = with_owner(record, meta, &ResourceKind::Job);
    let record = match spec.and_then(|s| s.template.spec.as_ref()) {
        Some(pod_spec) => with_resources(record, &pod_spec.containers),
        None => record,
    };
    vec![record]
}

pub(super) fn detect_cron_job(cron_job: &CronJob) -> Vec<FaultRecord> {
    let meta = &cron_job.metadata;
    let name = object_name(meta);
    let spec = cron_job.spec.as_ref();
    let status = cron_job.status.clone().unwrap_or_default();

    let last_schedule = status.last_schedule_time.as_ref().and_then(render);
    let last_success = status.last_successful_time.as_ref().and_then(render);
    let active = status.active.as_ref().map_or(0, Vec::len);

    let record = |kind: FaultKind, summary: String| {
        let record = FaultRecord::new(
            kind,
            ResourceKind::CronJob,
            meta.namespace.clone(),
            name.clone(),
            summary,
        )
        .with_optional_context(ContextKey::Schedule, spec.map(|s| s.schedule.clone()))
        .with_optional_context(ContextKey::LastScheduleTime, last_schedule.clone())
        .with_optional_context(ContextKey::LastSuccessfulTime, last_success.clone());
        with_owner(record, meta, &ResourceKind::CronJob)
    };

    let mut faults = Vec::new();

    if spec.and_then(|s| s.suspend).unwrap_or(false) {
        faults.push(
            record(
                FaultKind::CronJobSuspended,
                format!("CronJob {name} is suspended"),
            )
            .with_description(FaultKind::CronJobSuspended.description())
            .with_symptom("spec.suspend=true"),
        );
    }

    // RFC 3339 UTC timestamps compare correctly as strings
    let behind = match (&last_schedule, &last_success) {
        (Some(scheduled), Some(succeeded)) => scheduled > succeeded,
        (Some(_), None) => true,
        _ => false,
    };
    if behind && active == 0 {
        let detail = match &last_success {
            Some(at) => format!("Last scheduled run did not succeed; last success at {at}"),
            None => "No scheduled run has ever succeeded".to_string(),
        };
        faults.push(
            record(
                FaultKind::CronJobLastRunFailed,
                format!("CronJob {name} last run did not succeed"),
            )
            .with_description(format!(
                "{}\n{detail}",
                FaultKind::CronJobLastRunFailed.description()
            ))
            .with_symptom(detail),
        );
    }

    faults
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job(conditions: serde_json::Value) -> Job {
        serde_json::from_value(json!({
            "apiVersion": "batch/v1",
            "kind": "Job",
            "metadata": {"name": "backup", "namespace": "ops"},
            "spec": {
                "backoffLimit": 4,
                "template": {"spec": {
                    "restartPolicy": "Never",
                    "containers": [{"name": "backup", "image": "ops/backup:2"}]
                }}
            },
            "status": {"failed": 5, "conditions": conditions}
        }))
        .unwrap()
    }

    #[test]
    fn test_job_failure_reasons() {
        let backoff = job(json!([{
            "type": "Failed", "status": "True", "reason": "BackoffLimitExceeded",
            "message": "Job has reached the specified backoff limit"
        }]));
        let faults = detect_job(&backoff);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, FaultKind::JobBackoffLimitExceeded);
        assert_eq!(faults[0].context.get(ContextKey::BackoffLimit), Some("4"));
        assert_eq!(faults[0].context.get(ContextKey::FailedPods), Some("5"));

        let deadline = job(json!([{"type": "Failed", "status": "True", "reason": "DeadlineExceeded"}]));
        assert_eq!(detect_job(&deadline)[0].kind, FaultKind::JobDeadlineExceeded);

        let other = job(json!([{"type": "Failed", "status": "True", "reason": "PodFailurePolicy"}]));
        assert_eq!(detect_job(&other)[0].kind, FaultKind::JobFailed);

        let complete = job(json!([{"type": "Complete", "status": "True"}]));
        assert!(detect_job(&complete).is_empty());
    }

    fn cron_job(suspend: bool, status: serde_json::Value) -> CronJob {
        serde_json::from_value(json!({
            "apiVersion": "batch/v1",
            "kind": "CronJob",
            "metadata": {"name": "nightly", "namespace": "ops"},
            "spec": {
                "schedule": "0 2 * * *",
                "suspend": suspend,
                "jobTemplate": {"spec": {"template": {"spec": {
                    "containers": [{"name": "report", "image": "ops/report:1"}]
                }}}}
            },
            "status": status
        }))
        .unwrap()
    }

    #[test]
    fn test_cron_job_last_run_failed() {
        let cj = cron_job(
            false,
            json!({
                "lastScheduleTime": "2026-10-15T02:00:00Z",
                "lastSuccessfulTime": "2026-10-13T02:04:11Z"
            }),
        );

        let faults = detect_cron_job(&cj);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, FaultKind::CronJobLastRunFailed);
        assert_eq!(faults[0].context.get(ContextKey::Schedule), Some("0 2 * * *"));
    }

    #[test]
    fn test_cron_job_running_or_healthy() {
        let running = cron_job(
            false,
            json!({
                "lastScheduleTime": "2026-10-15T02:00:00Z",
                "lastSuccessfulTime": "2026-10-14T02:04:11Z",
                "active": [{"kind": "Job", "name": "nightly-29123", "namespace": "ops"}]
            }),
        );
        assert!(detect_cron_job(&running).is_empty());

        let healthy = cron_job(
            false,
            json!({
                "lastScheduleTime": "2026-10-15T02:00:00Z",
                "lastSuccessfulTime": "2026-10-15T02:03:40Z"
            }),
        );
        assert!(detect_cron_job(&healthy).is_empty());
    }

    #[test]
    fn test_cron_job_suspended() {
        let cj = cron_job(true, json!({}));
        let faults = detect_cron_job(&cj);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, FaultKind::CronJobSuspended);
    }
}
