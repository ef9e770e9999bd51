//! Human-readable rendering of scan results.

use colored::{ColoredString, Colorize};
use std::fmt::Write;

use crate::cache::DiagnosisResult;
use crate::fault::FaultRecord;
use crate::pipeline::ScanReport;
use crate::taxonomy::Severity;

fn severity_label(severity: Severity) -> ColoredString {
    let label = severity.as_str().to_uppercase();
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.dimmed(),
    }
}

/// Render a scan report for a terminal.
pub fn format_report_text(report: &ScanReport) -> String {
    let mut output = String::new();

    writeln!(output, "{}", "=== Triage Report ===".bold()).unwrap();
    writeln!(output, "Scan: {}", report.scan_id).unwrap();
    writeln!(output, "Time: {}", report.started_at.to_rfc3339()).unwrap();
    writeln!(
        output,
        "Snapshots: {} | Faults: {} | Diagnoses: {}",
        report.snapshots,
        report.faults_detected,
        report.diagnoses.len()
    )
    .unwrap();
    writeln!(
        output,
        "Completions: {} | Cache hits: {} | Fallbacks: {}",
        report.completions, report.cache_hits, report.fallbacks
    )
    .unwrap();
    writeln!(output).unwrap();

    if report.is_clean() {
        writeln!(output, "{}", "✓ No faults detected".green()).unwrap();
        return output;
    }

    for (i, diagnosis) in report.diagnoses.iter().enumerate() {
        write_diagnosis(&mut output, i + 1, diagnosis);
    }

    output
}

fn write_diagnosis(output: &mut String, index: usize, diagnosis: &DiagnosisResult) {
    let primary = &diagnosis.primary;

    writeln!(
        output,
        "[{index}] {} {} {} {}",
        severity_label(primary.severity),
        primary.kind.code().bold(),
        primary.resource_kind,
        primary.display_name()
    )
    .unwrap();
    writeln!(
        output,
        "    Owner: {}/{} ({})",
        primary.owner_kind(),
        primary.owner_name(),
        diagnosis.source.as_str()
    )
    .unwrap();
    writeln!(output, "    {}", diagnosis.diagnosis).unwrap();
    writeln!(output, "    Root cause: {}", diagnosis.root_cause).unwrap();

    if !diagnosis.solutions.is_empty() {
        writeln!(output, "    Solution:").unwrap();
        for (step, solution) in diagnosis.solutions.iter().enumerate() {
            let mut lines = solution.lines();
            if let Some(first) = lines.next() {
                writeln!(output, "      {}. {first}", step + 1).unwrap();
            }
            for line in lines {
                writeln!(output, "         {line}").unwrap();
            }
        }
    }

    if !diagnosis.preventions.is_empty() {
        writeln!(output, "    Prevention:").unwrap();
        for prevention in &diagnosis.preventions {
            writeln!(output, "      - {prevention}").unwrap();
        }
    }

    if !diagnosis.related.is_empty() {
        writeln!(output, "    Related:").unwrap();
        for related in &diagnosis.related {
            writeln!(output, "      - {}: {}", related.kind.code(), related.summary).unwrap();
        }
    }
    writeln!(output).unwrap();
}

/// Render detected faults without diagnosis.
pub fn format_faults_text(faults: &[FaultRecord]) -> String {
    let mut output = String::new();

    if faults.is_empty() {
        writeln!(output, "{}", "✓ No faults detected".green()).unwrap();
        return output;
    }

    writeln!(output, "Faults ({}):", faults.len()).unwrap();
    for fault in faults {
        writeln!(
            output,
            "  - {} {} {} {}: {}",
            severity_label(fault.severity),
            fault.kind.code(),
            fault.resource_kind,
            fault.display_name(),
            fault.summary
        )
        .unwrap();
        for symptom in &fault.symptoms {
            writeln!(output, "      {}", symptom.dimmed()).unwrap();
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DiagnosisSource, Fingerprint};
    use crate::fault::ResourceKind;
    use crate::taxonomy::FaultKind;
    use chrono::Utc;
    use uuid::Uuid;

    fn report(diagnoses: Vec<DiagnosisResult>) -> ScanReport {
        ScanReport {
            scan_id: Uuid::nil(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            snapshots: 3,
            faults_detected: diagnoses.len(),
            cache_hits: 0,
            completions: 0,
            fallbacks: diagnoses.len(),
            diagnoses,
        }
    }

    fn oom() -> FaultRecord {
        FaultRecord::new(
            FaultKind::OomKilled,
            ResourceKind::Pod,
            Some("shop".to_string()),
            "api-1",
            "Container api was OOMKilled",
        )
    }

    #[test]
    fn test_clean_report() {
        colored::control::set_override(false);
        let text = format_report_text(&report(Vec::new()));
        assert!(text.contains("Snapshots: 3 | Faults: 0 | Diagnoses: 0"));
        assert!(text.contains("No faults detected"));
    }

    #[test]
    fn test_diagnosis_sections() {
        colored::control::set_override(false);
        let primary = oom();
        let diagnosis = DiagnosisResult {
            fingerprint: Fingerprint::of(&primary),
            primary,
            related: Vec::new(),
            root_cause: "Limit too low".to_string(),
            diagnosis: "Container killed".to_string(),
            solutions: vec!["Raise the limit".to_string(), "Check usage\n<code class=\"command\">kubectl top pod</code>".to_string()],
            preventions: vec!["Alert at 80%".to_string()],
            source: DiagnosisSource::Fallback,
        };
        let text = format_report_text(&report(vec![diagnosis]));

        assert!(text.contains("[1] CRITICAL OOM_KILLED Pod shop/api-1"));
        assert!(text.contains("Root cause: Limit too low"));
        assert!(text.contains("      1. Raise the limit"));
        assert!(text.contains("      2. Check usage\n         <code"));
        assert!(text.contains("      - Alert at 80%"));
        assert!(text.contains("(fallback)"));
    }

    #[test]
    fn test_fault_listing() {
        colored::control::set_override(false);
        let text = format_faults_text(&[oom().with_symptom("CrashLoopBackOff")]);
        assert!(text.contains("Faults (1):"));
        assert!(text.contains("CRITICAL OOM_KILLED Pod shop/api-1: Container api was OOMKilled"));
        assert!(text.contains("CrashLoopBackOff"));
    }
}
