//! Completion response parsing.
//!
//! Recovers root cause, remediation steps and prevention items from the
//! backend's free-form text. Parsing never fails: missing sections come back
//! empty and [`parse_with_fallback`] fills the gaps.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::fallback::fallback;
use crate::fault::FaultRecord;

/// Root cause used when the response carries none.
pub const UNPARSED_ROOT_CAUSE: &str = "Root cause could not be determined from the diagnosis response";

const ROOT_CAUSE_HEADER: &str = "### root cause";
const SOLUTION_HEADER: &str = "### solution";
const PREVENTION_HEADER: &str = "### prevention";

/// Command-line tools whose invocations are rendered as commands.
const CLI_VERBS: &[&str] = &[
    "kubectl",
    "helm",
    "docker",
    "crictl",
    "systemctl",
    "journalctl",
    "oc",
];

static STEP_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\d+[.)]\s").expect("valid regex"));

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s*").expect("valid regex"));

static HEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*#{1,6}\s+").expect("valid regex"));

static EDGE_UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[\s(\[])_+|_+($|[\s)\].,;:!?])").expect("valid regex")
});

/// Structured sections recovered from a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResponse {
    pub root_cause: String,
    pub solutions: Vec<String>,
    pub preventions: Vec<String>,
}

/// Parse a response. Missing headers yield empty sections.
#[must_use]
pub fn parse(text: &str) -> ParsedResponse {
    let sections = Sections::locate(text);

    ParsedResponse {
        root_cause: parse_root_cause(sections.root_cause),
        solutions: parse_steps(sections.solution),
        preventions: parse_preventions(sections.prevention),
    }
}

/// Parse a response, substituting defaults for anything unrecoverable.
///
/// An empty root cause becomes [`UNPARSED_ROOT_CAUSE`]; an empty step list
/// becomes the fallback remediation for the fault's kind.
#[must_use]
pub fn parse_with_fallback(text: &str, record: &FaultRecord) -> ParsedResponse {
    let mut parsed = parse(text);
    if parsed.root_cause.is_empty() {
        parsed.root_cause = UNPARSED_ROOT_CAUSE.to_string();
    }
    if parsed.solutions.is_empty() {
        parsed.solutions = fallback(record).solutions;
    }
    parsed
}

/// Section bodies, each running from the end of its header marker to the
/// next located header or the end of the text.
struct Sections<'a> {
    root_cause: &'a str,
    solution: &'a str,
    prevention: &'a str,
}

impl<'a> Sections<'a> {
    fn locate(text: &'a str) -> Self {
        // ASCII lowering keeps byte offsets aligned with `text`
        let lower = text.to_ascii_lowercase();

        let mut cursor = 0;
        let mut headers: [Option<(usize, usize)>; 3] = [None; 3];
        for (slot, marker) in [ROOT_CAUSE_HEADER, SOLUTION_HEADER, PREVENTION_HEADER]
            .into_iter()
            .enumerate()
        {
            if let Some(offset) = lower[cursor..].find(marker) {
                let start = cursor + offset;
                let body_start = header_end(&lower, start + marker.len());
                headers[slot] = Some((start, body_start));
                cursor = body_start;
            }
        }

        let body = move |slot: usize| -> &'a str {
            let Some((_, body_start)) = headers[slot] else {
                return "";
            };
            let end = headers[slot + 1..]
                .iter()
                .flatten()
                .map(|(start, _)| *start)
                .next()
                .unwrap_or(text.len());
            &text[body_start..end]
        };

        Self {
            root_cause: body(0),
            solution: body(1),
            prevention: body(2),
        }
    }
}

/// Skip a plural suffix, a colon and blanks that trail a header marker.
/// Any other text on the header line belongs to the body.
fn header_end(lower: &str, after_marker: usize) -> usize {
    let rest = &lower[after_marker..];
    let rest = rest
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .trim_start_matches([':', ' ', '\t']);
    lower.len() - rest.len()
}

fn parse_root_cause(section: &str) -> String {
    section
        .lines()
        .map(|line| strip_markdown(line).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_steps(section: &str) -> Vec<String> {
    if section.trim().is_empty() {
        return Vec::new();
    }

    // text ahead of the first numbered item is an introduction, not a step
    let mut bounds: Vec<usize> = STEP_START.find_iter(section).map(|m| m.start()).collect();
    if bounds.is_empty() {
        bounds.push(0);
    }
    bounds.push(section.len());

    bounds
        .windows(2)
        .map(|w| &section[w[0]..w[1]])
        .map(|fragment| LEADING_NUMBER.replace(fragment, ""))
        .map(|fragment| render_step(&fragment))
        .filter(|step| !step.is_empty())
        .collect()
}

fn parse_preventions(section: &str) -> Vec<String> {
    section
        .lines()
        .filter_map(bullet_item)
        .map(|item| strip_markdown(item).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Text of a `- ` or `* ` bullet. Rules such as `---` and bold runs are not bullets.
fn bullet_item(line: &str) -> Option<&str> {
    let item = line.trim().strip_prefix(['-', '*'])?;
    item.starts_with(char::is_whitespace).then_some(item)
}

enum Segment {
    Plain(String),
    Markup(String),
}

/// Convert one step to presentational text: fenced blocks become
/// `<pre class="config">`, commands become `<code class="command">`, and
/// markdown is stripped from everything else.
fn render_step(fragment: &str) -> String {
    let mut segments: Vec<Segment> = Vec::new();
    let mut fence: Option<Vec<&str>> = None;

    for line in fragment.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            match fence.take() {
                Some(body) => push_config(&mut segments, &body),
                None => fence = Some(Vec::new()),
            }
            continue;
        }
        if let Some(body) = fence.as_mut() {
            body.push(line);
            continue;
        }

        if !segments.is_empty() {
            segments.push(Segment::Plain("\n".to_string()));
        }
        if let Some(command) = command_line(trimmed) {
            segments.push(Segment::Markup(command_markup(command)));
        } else {
            split_inline_code(line, &mut segments);
        }
    }
    if let Some(body) = fence {
        push_config(&mut segments, &body);
    }

    let rendered: String = segments
        .iter()
        .map(|segment| match segment {
            Segment::Plain(text) => escape_html(&strip_markdown(text)),
            Segment::Markup(markup) => markup.clone(),
        })
        .collect();

    rendered
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn push_config(segments: &mut Vec<Segment>, body: &[&str]) {
    if !segments.is_empty() {
        segments.push(Segment::Plain("\n".to_string()));
    }
    segments.push(Segment::Markup(config_block(&body.join("\n"))));
}

/// A line that is a bare CLI invocation, with any list marker, shell prompt
/// or surrounding backticks removed.
fn command_line(line: &str) -> Option<&str> {
    let line = line
        .trim_start_matches(['-', '*'])
        .trim_start()
        .trim_start_matches("$ ")
        .trim_matches('`')
        .trim();
    let verb = line.split_whitespace().next()?;
    CLI_VERBS.contains(&verb).then_some(line)
}

fn split_inline_code(line: &str, segments: &mut Vec<Segment>) {
    let parts: Vec<&str> = line.split('`').collect();
    // An odd number of backticks leaves the tail unpaired; treat it as text
    let paired = if parts.len() % 2 == 0 {
        parts.len() - 1
    } else {
        parts.len()
    };
    for (i, part) in parts.iter().enumerate() {
        if i % 2 == 1 && i < paired {
            if !part.trim().is_empty() {
                segments.push(Segment::Markup(command_markup(part.trim())));
            }
        } else if !part.is_empty() {
            segments.push(Segment::Plain((*part).to_string()));
        }
    }
}

fn command_markup(command: &str) -> String {
    format!("<code class=\"command\">{}</code>", escape_html(command))
}

fn config_block(body: &str) -> String {
    format!("<pre class=\"config\">{}</pre>", escape_html(body.trim_end()))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Remove emphasis, code and heading markers. Underscores inside words are kept.
fn strip_markdown(text: &str) -> String {
    let text = HEADING_MARKER.replace_all(text, "");
    let text = text.replace("**", "").replace("__", "").replace(['*', '`'], "");
    EDGE_UNDERSCORES.replace_all(&text, "$1$2").into_owned()
}
