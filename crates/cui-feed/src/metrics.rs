//! Cumulative tool activity counters for one conversation

use cui_api::StreamEvent;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};

/// How a tool invocation touched the working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Edit,
    Write,
}

/// The activity carried by one tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDelta {
    pub kind: ToolKind,
    pub lines_added: u64,
    pub lines_removed: u64,
}

impl ToolDelta {
    /// Classify a tool invocation. Tools that do not modify files yield nothing.
    pub fn from_tool_use(name: &str, input: &serde_json::Value) -> Vec<ToolDelta> {
        match name {
            "Edit" => edit_delta(input).into_iter().collect(),
            "MultiEdit" => input
                .get("edits")
                .and_then(|e| e.as_array())
                .map(|edits| edits.iter().filter_map(edit_delta).collect())
                .unwrap_or_default(),
            "Write" => {
                let content = input.get("content").and_then(|c| c.as_str()).unwrap_or("");
                vec![ToolDelta {
                    kind: ToolKind::Write,
                    lines_added: count_lines(content),
                    lines_removed: 0,
                }]
            }
            _ => vec![],
        }
    }
}

fn edit_delta(input: &serde_json::Value) -> Option<ToolDelta> {
    let old = input.get("old_string")?.as_str()?;
    let new = input.get("new_string")?.as_str()?;
    let (added, removed) = diff_lines(old, new);
    Some(ToolDelta {
        kind: ToolKind::Edit,
        lines_added: added,
        lines_removed: removed,
    })
}

fn diff_lines(old: &str, new: &str) -> (u64, u64) {
    let diff = TextDiff::from_lines(old, new);
    let mut added = 0;
    let mut removed = 0;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }
    (added, removed)
}

fn count_lines(text: &str) -> u64 {
    text.lines().count() as u64
}

/// Running totals. Counters only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMetrics {
    pub lines_added: u64,
    pub lines_removed: u64,
    pub edit_count: u64,
    pub write_count: u64,
}

impl ToolMetrics {
    pub fn record(&mut self, delta: ToolDelta) {
        self.lines_added = self.lines_added.saturating_add(delta.lines_added);
        self.lines_removed = self.lines_removed.saturating_add(delta.lines_removed);
        match delta.kind {
            ToolKind::Edit => self.edit_count = self.edit_count.saturating_add(1),
            ToolKind::Write => self.write_count = self.write_count.saturating_add(1),
        }
    }

    /// Fold every tool invocation in an event into the totals
    pub fn observe(&mut self, event: &StreamEvent) {
        if let StreamEvent::Assistant(message) = event {
            for (name, input) in message.tool_uses() {
                for delta in ToolDelta::from_tool_use(name, input) {
                    self.record(delta);
                }
            }
        }
    }

    pub fn fold<'a>(events: impl IntoIterator<Item = &'a StreamEvent>) -> Self {
        let mut metrics = Self::default();
        for event in events {
            metrics.observe(event);
        }
        metrics
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Every counter is at least as large as in `earlier`
    pub fn dominates(&self, earlier: &ToolMetrics) -> bool {
        self.lines_added >= earlier.lines_added
            && self.lines_removed >= earlier.lines_removed
            && self.edit_count >= earlier.edit_count
            && self.write_count >= earlier.write_count
    }
}
