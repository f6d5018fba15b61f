//! The edit primitive: positional mutation descriptors over one source
//! version, with overlap detection and deterministic application ordering.
//!
//! All high-level operations (rename, insertion, removal) compile down to
//! this single primitive. Intelligence lives in span acquisition via the
//! query layer, not in the application logic.

use crate::position::Span;
use serde::{Deserialize, Serialize};

/// How an edit's text interacts with its anchor span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    /// Place `new_text` immediately before `span.start`, consuming nothing.
    InsertBefore,
    /// Place `new_text` immediately after `span.end`, consuming nothing.
    InsertAfter,
    /// Replace the bytes at `span` with `new_text`.
    Replace,
    /// Remove the bytes at `span`.
    Delete,
}

/// A positional mutation descriptor.
///
/// Byte offsets refer to the source version the edit was created against;
/// the edit is invalid against any other version, which range validation at
/// apply time turns into [`crate::apply::ApplyError::OutOfRange`].
///
/// The serialized form is the cross-process exchange shape:
/// `{"kind": "replace", "start": 120, "end": 131, "text": "newName",
/// "description": "rename method"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "an Edit does nothing until applied"]
pub struct Edit {
    pub kind: EditKind,
    #[serde(flatten)]
    pub span: Span,
    #[serde(rename = "text")]
    pub new_text: String,
    pub description: String,
}

impl Edit {
    pub fn replace(span: Span, new_text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Replace,
            span,
            new_text: new_text.into(),
            description: description.into(),
        }
    }

    pub fn delete(span: Span, description: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Delete,
            span,
            new_text: String::new(),
            description: description.into(),
        }
    }

    pub fn insert_before(
        span: Span,
        new_text: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind: EditKind::InsertBefore,
            span,
            new_text: new_text.into(),
            description: description.into(),
        }
    }

    pub fn insert_after(
        span: Span,
        new_text: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind: EditKind::InsertAfter,
            span,
            new_text: new_text.into(),
            description: description.into(),
        }
    }

    /// The span the edit consumes. Inserts are zero-width at their anchor,
    /// so an insert sharing an exact boundary byte with another edit does
    /// not overlap it.
    pub fn effective_span(&self) -> Span {
        match self.kind {
            EditKind::InsertBefore => Span::empty(self.span.start),
            EditKind::InsertAfter => Span::empty(self.span.end),
            EditKind::Replace | EditKind::Delete => self.span,
        }
    }

    /// Text spliced over the effective span.
    pub fn replacement(&self) -> &str {
        match self.kind {
            EditKind::Delete => "",
            _ => &self.new_text,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Overlap policy for a collection.
///
/// The default rejects every overlapping pair. The one interaction that can
/// be validated instead is a Delete nested entirely inside a Replace, whose
/// bytes the replacement subsumes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    #[default]
    RejectAll,
    AllowNestedDelete,
}

/// Ordered set of edits over one fixed source version.
///
/// `add` is O(1); conflict checking is deferred to [`has_conflicts`] /
/// [`get_conflicts`] so batch construction stays cheap.
///
/// [`has_conflicts`]: EditCollection::has_conflicts
/// [`get_conflicts`]: EditCollection::get_conflicts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditCollection {
    edits: Vec<Edit>,
    #[serde(skip)]
    policy: ConflictPolicy,
}

impl EditCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ConflictPolicy) -> Self {
        Self {
            edits: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Append an edit. No conflict checking happens here.
    pub fn add(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn into_edits(self) -> Vec<Edit> {
        self.edits
    }

    /// O(n log n): sort by effective start, then sweep for the first
    /// disallowed overlap.
    pub fn has_conflicts(&self) -> bool {
        !self.conflict_pairs(true).is_empty()
    }

    /// Every disallowed overlapping pair, not just the first, so callers
    /// can report all problems at once.
    pub fn get_conflicts(&self) -> Vec<(&Edit, &Edit)> {
        self.conflict_pairs(false)
            .into_iter()
            .map(|(a, b)| (&self.edits[a], &self.edits[b]))
            .collect()
    }

    fn conflict_pairs(&self, first_only: bool) -> Vec<(usize, usize)> {
        let mut order: Vec<usize> = (0..self.edits.len()).collect();
        order.sort_by_key(|&i| {
            let span = self.edits[i].effective_span();
            (span.start, span.end)
        });

        let mut pairs = Vec::new();
        for (pos, &i) in order.iter().enumerate() {
            let a = &self.edits[i];
            let a_span = a.effective_span();
            for &j in &order[pos + 1..] {
                let b = &self.edits[j];
                let b_span = b.effective_span();
                if b_span.start >= a_span.end {
                    break;
                }
                if a_span.overlaps(&b_span) && !self.allowed_overlap(a, b) {
                    pairs.push((i, j));
                    if first_only {
                        return pairs;
                    }
                }
            }
        }
        pairs
    }

    fn allowed_overlap(&self, a: &Edit, b: &Edit) -> bool {
        if self.policy != ConflictPolicy::AllowNestedDelete {
            return false;
        }
        match (a.kind, b.kind) {
            (EditKind::Replace, EditKind::Delete) => a.span.contains(&b.span),
            (EditKind::Delete, EditKind::Replace) => b.span.contains(&a.span),
            _ => false,
        }
    }

    /// Order for sequential application against a single buffer: descending
    /// effective start, ties broken by descending end. Edits applied later
    /// in the buffer never shift offsets earlier in the buffer, so this is
    /// the only ordering that preserves the validity of not-yet-applied
    /// edits' byte offsets.
    pub fn sorted_for_application(&self) -> Vec<Edit> {
        let mut edits = self.edits.clone();
        edits.sort_by(|a, b| {
            let (sa, sb) = (a.effective_span(), b.effective_span());
            sb.start.cmp(&sa.start).then(sb.end.cmp(&sa.end))
        });
        edits
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl FromIterator<Edit> for EditCollection {
    fn from_iter<I: IntoIterator<Item = Edit>>(iter: I) -> Self {
        Self {
            edits: iter.into_iter().collect(),
            policy: ConflictPolicy::default(),
        }
    }
}
