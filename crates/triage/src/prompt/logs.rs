//! Log excerpt selection.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum number of log lines forwarded
pub const MAX_LOG_LINES: usize = 10;

/// Lines kept when nothing interesting matched
pub const TAIL_FALLBACK_LINES: usize = 3;

static KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)error|fail|exception|timeout|unhealthy|warning").expect("valid regex")
});

static HTTP_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[45]\d{2}\b").expect("valid regex"));

fn is_interesting(line: &str) -> bool {
    KEYWORDS.is_match(line) || HTTP_STATUS.is_match(line)
}

/// Pick the log lines worth sending.
///
/// Every matching line is kept together with the line after it (stack traces
/// and wrapped messages usually continue there), up to [`MAX_LOG_LINES`], in
/// original order. If nothing matches, the last [`TAIL_FALLBACK_LINES`] lines
/// are returned unchanged.
#[must_use]
pub fn filter_logs(logs: &str) -> Vec<&str> {
    let lines: Vec<&str> = logs.lines().collect();
    let mut kept: Vec<usize> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if kept.len() >= MAX_LOG_LINES {
            break;
        }
        if !is_interesting(line) {
            continue;
        }
        for index in [i, i + 1] {
            if index < lines.len()
                && kept.len() < MAX_LOG_LINES
                && kept.last().is_none_or(|last| *last < index)
            {
                kept.push(index);
            }
        }
    }

    if kept.is_empty() {
        let start = lines.len().saturating_sub(TAIL_FALLBACK_LINES);
        return lines[start..].to_vec();
    }

    kept.into_iter().map(|i| lines[i]).collect()
}
