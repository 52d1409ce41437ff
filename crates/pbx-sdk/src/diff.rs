//! Differences between two documents.
//!
//! [`diff_documents`] compares object tables by identifier and reports
//! which attributes changed. [`diff_text`] is a line diff of two encodings,
//! for showing the change the way a version-control tool would.

use std::collections::BTreeSet;

use similar::{ChangeTag, TextDiff};

use pbx_store::{Document, PbxObject};
use pbx_types::Identifier;

/// Structural difference between two documents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentDiff {
    /// Top-level keys whose values differ.
    pub header: Vec<&'static str>,
    pub changes: Vec<ObjectChange>,
}

impl DocumentDiff {
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.changes.is_empty()
    }

    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, ObjectChange::Added { .. }))
            .count()
    }

    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, ObjectChange::Removed { .. }))
            .count()
    }

    pub fn modifications(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, ObjectChange::Modified { .. }))
            .count()
    }
}

/// A change to one entry of the object table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectChange {
    Added { id: Identifier, isa: String },
    Removed { id: Identifier, isa: String },
    /// Same identifier, different body. `attributes` names the attributes
    /// that differ, `isa` included when the class changed.
    Modified {
        id: Identifier,
        isa: String,
        attributes: Vec<String>,
    },
}

impl ObjectChange {
    pub fn id(&self) -> &Identifier {
        match self {
            Self::Added { id, .. } | Self::Removed { id, .. } | Self::Modified { id, .. } => id,
        }
    }
}

/// Compare two documents object by object.
///
/// Objects are matched by identifier, so the result is only meaningful
/// between documents whose identifiers are stable, e.g. two revisions of the
/// same file. Changes come out in identifier order.
pub fn diff_documents(old: &Document, new: &Document) -> DocumentDiff {
    let mut header = Vec::new();
    if old.archive_version() != new.archive_version() {
        header.push("archiveVersion");
    }
    if old.classes() != new.classes() {
        header.push("classes");
    }
    if old.object_version() != new.object_version() {
        header.push("objectVersion");
    }
    if old.root() != new.root() {
        header.push("rootObject");
    }

    let ids: BTreeSet<Identifier> = old
        .objects()
        .identifiers()
        .into_iter()
        .chain(new.objects().identifiers())
        .collect();
    let mut changes = Vec::new();
    for id in ids {
        match (old.get(&id), new.get(&id)) {
            (Some(before), Some(after)) => {
                if before.body() != after.body() {
                    changes.push(ObjectChange::Modified {
                        attributes: changed_attributes(&before, &after),
                        isa: after.isa().to_string(),
                        id,
                    });
                }
            }
            (Some(before), None) => changes.push(ObjectChange::Removed {
                isa: before.isa().to_string(),
                id,
            }),
            (None, Some(after)) => changes.push(ObjectChange::Added {
                isa: after.isa().to_string(),
                id,
            }),
            (None, None) => {}
        }
    }
    DocumentDiff { header, changes }
}

fn changed_attributes(before: &PbxObject, after: &PbxObject) -> Vec<String> {
    let mut attributes = Vec::new();
    if before.isa() != after.isa() {
        attributes.push("isa".to_string());
    }
    let (before, after) = (before.body().fields(), after.body().fields());
    let keys: BTreeSet<&String> = before.iter().chain(after.iter()).map(|(k, _)| k).collect();
    for key in keys {
        if before.get(key) != after.get(key) {
            attributes.push(key.clone());
        }
    }
    attributes
}

/// A line diff of two encoded documents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextChanges {
    pub hunks: Vec<Hunk>,
}

impl TextChanges {
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    pub fn additions(&self) -> usize {
        self.lines()
            .filter(|l| matches!(l, Line::Added(_)))
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.lines()
            .filter(|l| matches!(l, Line::Removed(_)))
            .count()
    }

    fn lines(&self) -> impl Iterator<Item = &Line> {
        self.hunks.iter().flat_map(|h| &h.lines)
    }
}

/// A run of changed lines with surrounding context. Line numbers are
/// 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub new_start: usize,
    pub lines: Vec<Line>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
    Context(String),
    Added(String),
    Removed(String),
}

/// Line diff with `context` lines around each change.
pub fn diff_text(old: &str, new: &str, context: usize) -> TextChanges {
    if old == new {
        return TextChanges { hunks: Vec::new() };
    }
    let diff = TextDiff::from_lines(old, new);
    let mut hunks = Vec::new();
    for group in diff.grouped_ops(context) {
        let Some(first) = group.first() else {
            continue;
        };
        let mut hunk = Hunk {
            old_start: first.old_range().start + 1,
            new_start: first.new_range().start + 1,
            lines: Vec::new(),
        };
        for op in &group {
            for change in diff.iter_changes(op) {
                let text = change.value().trim_end_matches('\n').to_string();
                hunk.lines.push(match change.tag() {
                    ChangeTag::Equal => Line::Context(text),
                    ChangeTag::Delete => Line::Removed(text),
                    ChangeTag::Insert => Line::Added(text),
                });
            }
        }
        hunks.push(hunk);
    }
    TextChanges { hunks }
}
