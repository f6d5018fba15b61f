//! The refactor state machine.
//!
//! `Parsing → ExtractingFacts → Analyzing → {Editing → Reparsing →
//! Analyzing} → Done`, with a permanent `Failed` state for irrecoverable
//! errors. The transition structure is a pure function over the snapshot
//! ([`next_step`]), independent of any orchestration framework: the
//! built-in runner drives it with a plain loop, and callers needing their
//! own scheduling can call [`RefactorWorkflow::step`] one transition at a
//! time.

use crate::apply;
use crate::edit::{Edit, EditCollection};
use crate::facts::{self, SourceFacts};
use crate::pool;
use crate::state::{AnalysisState, StateHistory, Step};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An edit-producing operation, invoked by the workflow at each pass
/// through `Analyzing`.
///
/// Returning no edits terminates the loop. The workflow itself does not
/// bound iteration: an operation that keeps planning edits against its own
/// output cycles forever, so operations must converge — plan from facts
/// that the planned edits remove, as [`crate::ops::RenameMethod`] does.
pub trait RefactorOp {
    fn name(&self) -> &str;

    fn plan(&mut self, state: &AnalysisState) -> Vec<Edit>;
}

/// Pure transition function: where the machine goes next, judged from the
/// snapshot alone.
///
/// Guards: `Analyzing` leaves for `Editing` only with pending edits, and
/// for `Done` otherwise; `Parsing`/`Reparsing` require a tree to proceed;
/// `Editing` requires the pending set to have been drained. `Done` and
/// `Failed` are terminal.
pub fn next_step(state: &AnalysisState) -> Step {
    match state.current_step {
        Step::Init => Step::Parsing,
        Step::Parsing => {
            if state.tree.is_some() {
                Step::ExtractingFacts
            } else {
                Step::Failed
            }
        }
        Step::ExtractingFacts => Step::Analyzing,
        Step::Analyzing => {
            if state.pending_edits.is_empty() {
                Step::Done
            } else {
                Step::Editing
            }
        }
        Step::Editing => {
            if state.pending_edits.is_empty() {
                Step::Reparsing
            } else {
                Step::Failed
            }
        }
        Step::Reparsing => {
            if state.tree.is_some() {
                Step::Analyzing
            } else {
                Step::Failed
            }
        }
        Step::Done => Step::Done,
        Step::Failed => Step::Failed,
    }
}

/// Drives one document through the state machine with a caller-supplied
/// edit-producing operation, checkpointing every snapshot.
pub struct RefactorWorkflow<O> {
    op: O,
    history: StateHistory,
}

impl<O: RefactorOp> RefactorWorkflow<O> {
    pub fn new(op: O) -> Self {
        Self {
            op,
            history: StateHistory::new(),
        }
    }

    /// Cap checkpoint retention; without a cap, history grows with every
    /// transition of every iteration.
    pub fn with_history_limit(op: O, limit: usize) -> Self {
        Self {
            op,
            history: StateHistory::with_limit(limit),
        }
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Run to a terminal step.
    pub fn run(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> AnalysisState {
        let mut state = AnalysisState::initialize(path, source);
        loop {
            self.history.checkpoint(&state);
            if state.is_terminal() {
                return state;
            }
            state = self.step(state);
        }
    }

    /// Run against a file on disk.
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<AnalysisState, WorkflowError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| WorkflowError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(self.run(path, source))
    }

    /// Execute the action for the current step and advance. One call is one
    /// transition; terminal states return unchanged.
    pub fn step(&mut self, state: AnalysisState) -> AnalysisState {
        let from = state.current_step;
        let state = match from {
            Step::Init => state.advance_to(Step::Parsing),
            Step::Parsing => Self::parse_current(state),
            Step::ExtractingFacts => Self::extract_facts(state),
            Step::Analyzing => self.analyze(state),
            Step::Editing => Self::apply_pending(state),
            Step::Reparsing => Self::reparse_current(state),
            Step::Done | Step::Failed => state,
        };
        debug!("workflow step: {from} -> {}", state.current_step);
        state
    }

    /// Parse `current_source`, surfacing ERROR nodes as warnings.
    ///
    /// Outright grammar refusal is irrecoverable; a partial tree is not.
    fn parse_current(state: AnalysisState) -> AnalysisState {
        let parsed = pool::with_parser(|parser| parser.parse(state.current_source.clone()))
            .and_then(|result| result);

        match parsed {
            Err(e) => {
                let state = state.with_error(format!("parse failed: {e}"));
                let next = next_step(&state);
                state.advance_to(next)
            }
            Ok(parsed) => {
                let mut state = state;
                for node in parsed.error_nodes() {
                    warn!("partial parse: {node}");
                    state = state.with_warning(format!("partial parse: {node}"));
                }
                let state = state.with_tree(Some(parsed));
                let next = next_step(&state);
                state.advance_to(next)
            }
        }
    }

    fn extract_facts(state: AnalysisState) -> AnalysisState {
        let extracted = match state.tree.as_ref() {
            Some(parsed) => facts::extract(parsed),
            None => {
                return state
                    .with_error("no tree available for fact extraction")
                    .advance_to(Step::Failed)
            }
        };

        match extracted {
            Ok(facts) => {
                let state = state.with_facts(facts);
                let next = next_step(&state);
                state.advance_to(next)
            }
            Err(e) => state
                .with_error(format!("fact extraction failed: {e}"))
                .advance_to(Step::Failed),
        }
    }

    /// Invoke the edit-producing operation, then take the guarded edge:
    /// pending edits lead to `Editing` (validated first), none to `Done`.
    fn analyze(&mut self, state: AnalysisState) -> AnalysisState {
        let planned = self.op.plan(&state);
        debug!("op `{}` planned {} edit(s)", self.op.name(), planned.len());

        let state = state.with_pending_edits(planned.into_iter().collect::<EditCollection>());
        match next_step(&state) {
            Step::Editing => match state.validate() {
                Ok(()) => state.advance_to(Step::Editing),
                Err(e) => state
                    .with_error(format!("state validation failed: {e}"))
                    .advance_to(Step::Failed),
            },
            step => state.advance_to(step),
        }
    }

    /// Apply all pending edits to `current_source`; the tree is stale from
    /// here until the re-parse.
    fn apply_pending(state: AnalysisState) -> AnalysisState {
        match apply::apply_all(&state.current_source, &state.pending_edits) {
            Ok(new_source) => {
                let state = state
                    .promote_pending()
                    .with_current_source(new_source)
                    .with_tree(None);
                let next = next_step(&state);
                state.advance_to(next)
            }
            Err(e) => state
                .with_error(format!("edit application failed: {e}"))
                .advance_to(Step::Failed),
        }
    }

    /// Re-parse the mutated source and re-derive the facts the edit pass
    /// made stale, then return to analysis.
    fn reparse_current(state: AnalysisState) -> AnalysisState {
        let state = Self::parse_current(state.with_facts(SourceFacts::default()));
        if state.current_step == Step::Failed {
            return state;
        }

        let extracted = match state.tree.as_ref() {
            Some(parsed) => facts::extract(parsed),
            None => {
                return state
                    .with_error("no tree available after re-parse")
                    .advance_to(Step::Failed)
            }
        };

        match extracted {
            Ok(facts) => state.with_facts(facts),
            Err(e) => state
                .with_error(format!("fact extraction failed: {e}"))
                .advance_to(Step::Failed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoEdits;

    impl RefactorOp for NoEdits {
        fn name(&self) -> &str {
            "no-edits"
        }

        fn plan(&mut self, _state: &AnalysisState) -> Vec<Edit> {
            Vec::new()
        }
    }

    #[test]
    fn edit_free_run_is_a_round_trip() {
        let mut workflow = RefactorWorkflow::new(NoEdits);
        let state = workflow.run("A.java", "class A { void m() {} }");

        assert_eq!(state.current_step, Step::Done);
        assert_eq!(state.current_source, state.original_source);
        assert!(state.applied_edits.is_empty());
        assert!(state.errors.is_empty());
    }

    #[test]
    fn edit_free_run_visits_each_stage_once() {
        let mut workflow = RefactorWorkflow::new(NoEdits);
        let state = workflow.run("A.java", "class A {}");

        assert_eq!(
            state.completed_steps,
            vec![
                Step::Init,
                Step::Parsing,
                Step::ExtractingFacts,
                Step::Analyzing,
            ]
        );
    }

    #[test]
    fn transition_function_guards_on_pending_edits() {
        let idle = AnalysisState::initialize("A.java", "class A {}")
            .advance_to(Step::Parsing)
            .advance_to(Step::ExtractingFacts)
            .advance_to(Step::Analyzing);
        assert_eq!(next_step(&idle), Step::Done);

        let mut pending = EditCollection::new();
        pending.add(Edit::replace(crate::position::Span::new(6, 7), "B", "rename"));
        let busy = idle.with_pending_edits(pending);
        assert_eq!(next_step(&busy), Step::Editing);
    }

    #[test]
    fn terminal_steps_absorb() {
        let done = AnalysisState::initialize("A.java", "class A {}").advance_to(Step::Done);
        assert_eq!(next_step(&done), Step::Done);

        let failed = AnalysisState::initialize("A.java", "class A {}").advance_to(Step::Failed);
        assert_eq!(next_step(&failed), Step::Failed);
    }

    #[test]
    fn history_checkpoints_every_snapshot() {
        let mut workflow = RefactorWorkflow::new(NoEdits);
        let state = workflow.run("A.java", "class A {}");

        // one checkpoint per visited step, terminal included
        assert_eq!(workflow.history().len(), state.completed_steps.len() + 1);
        let initial = workflow.history().rollback(0).unwrap();
        assert_eq!(initial.current_step, Step::Init);
    }
}
