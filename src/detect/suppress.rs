//! Inline suppression of violations via comments.
//!
//! A marker in a comment on the line directly above a call silences it:
//! - `// eslint-disable-next-line no-console`
//! - `// logsweep-disable-next-line`
//! - `# logsweep: disable-next-line`
//! - `# noqa: T201`
//!
//! Which markers apply is configured per language family. Only comment
//! nodes are searched, so marker text inside a string literal does nothing.

use serde::{Deserialize, Serialize};

use crate::analysis::{CallSite, ParsedFile};

/// A marker found in a file and the line it silences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// The marker text that matched.
    pub marker: String,
    /// Line containing the marker (1-indexed).
    pub line: usize,
}

impl Suppression {
    /// Line whose calls are suppressed.
    pub fn target_line(&self) -> usize {
        self.line + 1
    }
}

/// Find every comment carrying one of `markers`, in document order.
pub fn parse_suppressions(parsed: &ParsedFile, markers: &[String]) -> Vec<Suppression> {
    let mut suppressions = Vec::new();
    if markers.is_empty() {
        return suppressions;
    }

    let mut cursor = parsed.tree.walk();
    loop {
        let node = cursor.node();
        if node.kind() == "comment" {
            let text = parsed.node_text(node);
            let found = markers
                .iter()
                .filter_map(|m| text.find(m.as_str()).map(|at| (at, m)))
                .min_by_key(|(at, _)| *at);
            if let Some((at, marker)) = found {
                // Block comments can span lines; use the line holding the marker.
                let offset = text[..at].matches('\n').count();
                suppressions.push(Suppression {
                    marker: marker.clone(),
                    line: node.start_position().row + 1 + offset,
                });
            }
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return suppressions;
            }
        }
    }
}

/// Drop call sites that a marker silences.
pub fn filter_calls(calls: Vec<CallSite>, suppressions: &[Suppression]) -> Vec<CallSite> {
    calls
        .into_iter()
        .filter(|c| {
            !suppressions
                .iter()
                .any(|s| s.target_line() == c.call.start_line)
        })
        .collect()
}
