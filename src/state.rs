//! Versioned analysis snapshots and their checkpoint history.
//!
//! A snapshot is never mutated in place: every stage transition builds a
//! replacement value, and checkpoints retain whole snapshots so any point
//! of the run can be forked from later.

use crate::edit::{Edit, EditCollection};
use crate::facts::SourceFacts;
use crate::position::Span;
use crate::ts::ParsedSource;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The workflow's step identifiers; also the state machine's node set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Init,
    Parsing,
    ExtractingFacts,
    Analyzing,
    Editing,
    Reparsing,
    Done,
    Failed,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Init => "init",
            Step::Parsing => "parsing",
            Step::ExtractingFacts => "extracting_facts",
            Step::Analyzing => "analyzing",
            Step::Editing => "editing",
            Step::Reparsing => "reparsing",
            Step::Done => "done",
            Step::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("pending edit \"{description}\" spans {span} beyond current source length {len}")]
    EditOutOfRange {
        description: String,
        span: Span,
        len: usize,
    },

    #[error("pending edits conflict: {count} overlapping pair(s)")]
    PendingConflicts { count: usize },
}

/// One immutable snapshot of a document's analysis.
///
/// Field updates go through the consuming `with_*` builders plus
/// [`advance_to`], which records the step being left; the previous snapshot
/// value is never observed mutated.
///
/// [`advance_to`]: AnalysisState::advance_to
#[derive(Clone)]
pub struct AnalysisState {
    pub file_path: PathBuf,
    pub original_source: String,
    pub current_source: String,
    /// Present only between a successful parse and the next applied edit;
    /// consumers must check presence rather than assume availability.
    pub tree: Option<ParsedSource>,
    pub facts: SourceFacts,
    pub pending_edits: EditCollection,
    pub applied_edits: Vec<Edit>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub current_step: Step,
    pub completed_steps: Vec<Step>,
}

impl AnalysisState {
    pub fn initialize(file_path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            file_path: file_path.into(),
            original_source: source.clone(),
            current_source: source,
            tree: None,
            facts: SourceFacts::default(),
            pending_edits: EditCollection::default(),
            applied_edits: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            current_step: Step::Init,
            completed_steps: Vec::new(),
        }
    }

    /// New snapshot at `step`, recording the step being left.
    pub fn advance_to(mut self, step: Step) -> Self {
        self.completed_steps.push(self.current_step);
        self.current_step = step;
        self
    }

    pub fn with_tree(mut self, tree: Option<ParsedSource>) -> Self {
        self.tree = tree;
        self
    }

    pub fn with_facts(mut self, facts: SourceFacts) -> Self {
        self.facts = facts;
        self
    }

    pub fn with_current_source(mut self, source: String) -> Self {
        self.current_source = source;
        self
    }

    pub fn with_pending_edits(mut self, edits: EditCollection) -> Self {
        self.pending_edits = edits;
        self
    }

    /// Move every pending edit into the applied list.
    pub fn promote_pending(mut self) -> Self {
        let pending = std::mem::take(&mut self.pending_edits);
        self.applied_edits.extend(pending.into_edits());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.current_step, Step::Done | Step::Failed)
    }

    /// Structural invariants checked before the workflow commits to an edit
    /// pass: every pending span addresses the current source version, and
    /// the pending collection is conflict-free.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.current_source.len();
        for edit in self.pending_edits.edits() {
            let span = edit.effective_span();
            if span.start > span.end || span.end > len {
                return Err(ValidationError::EditOutOfRange {
                    description: edit.description.clone(),
                    span,
                    len,
                });
            }
        }

        let conflicts = self.pending_edits.get_conflicts();
        if !conflicts.is_empty() {
            return Err(ValidationError::PendingConflicts {
                count: conflicts.len(),
            });
        }
        Ok(())
    }

    /// Serializable analysis output for this snapshot.
    pub fn report(&self) -> AnalysisReport {
        AnalysisReport {
            facts: self.facts.clone(),
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
        }
    }
}

impl fmt::Debug for AnalysisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisState")
            .field("file_path", &self.file_path)
            .field("current_step", &self.current_step)
            .field("source_len", &self.current_source.len())
            .field("tree", &self.tree.is_some())
            .field("pending_edits", &self.pending_edits.len())
            .field("applied_edits", &self.applied_edits.len())
            .field("errors", &self.errors)
            .field("warnings", &self.warnings)
            .finish()
    }
}

/// Structured analysis report: the extracted facts plus diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub facts: SourceFacts,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Checkpointed snapshots, addressable by index for rollback.
///
/// Retention is caller-controlled: without a limit the history grows with
/// every checkpoint, which is a known resource cost; with one, the oldest
/// checkpoint is evicted and retained indices shift down by one.
#[derive(Debug, Clone, Default)]
pub struct StateHistory {
    snapshots: Vec<AnalysisState>,
    limit: Option<usize>,
}

impl StateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            limit: Some(limit),
        }
    }

    pub fn checkpoint(&mut self, state: &AnalysisState) {
        if let Some(limit) = self.limit {
            while self.snapshots.len() >= limit.max(1) {
                self.snapshots.remove(0);
            }
        }
        self.snapshots.push(state.clone());
    }

    /// Non-destructive rollback: clones the snapshot at `index` as a fork
    /// point, discarding nothing.
    pub fn rollback(&self, index: usize) -> Option<AnalysisState> {
        self.snapshots.get(index).cloned()
    }

    pub fn latest(&self) -> Option<&AnalysisState> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
