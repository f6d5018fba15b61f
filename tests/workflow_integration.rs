//! End-to-end workflow tests
//!
//! Drives the full cycle against real Java sources:
//! 1. Parse and extract facts
//! 2. Plan edits from the facts
//! 3. Apply, re-parse, re-analyze
//! 4. Terminate when no edits are pending

use refactory::ops::RenameMethod;
use refactory::{AnalysisState, Edit, RefactorOp, RefactorWorkflow, Span, Step};
use std::fs;

const CART: &str = "\
package com.acme.app;

import java.util.List;

public class Cart {
    private List<String> items;

    public void oldName(String item) {}

    public int count() { return 0; }
}
";

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
fn rename_runs_to_done_and_rewrites_exactly_once() {
    let op = RenameMethod {
        target: "oldName".into(),
        replacement: "newName".into(),
    };
    let mut workflow = RefactorWorkflow::new(op);
    let state = workflow.run("Cart.java", CART);

    assert_eq!(state.current_step, Step::Done);
    assert!(!state.current_source.contains("oldName"));
    assert_eq!(state.current_source.matches("newName").count(), 1);
    assert_eq!(state.applied_edits.len(), 1);
    assert!(state.errors.is_empty());

    // the refreshed facts describe the mutated source
    let names: Vec<&str> = state.facts.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["newName", "count"]);
}

#[test]
fn rename_visits_the_edit_cycle_once() {
    let op = RenameMethod {
        target: "oldName".into(),
        replacement: "newName".into(),
    };
    let mut workflow = RefactorWorkflow::new(op);
    let state = workflow.run("Cart.java", CART);

    assert_eq!(
        state.completed_steps,
        vec![
            Step::Init,
            Step::Parsing,
            Step::ExtractingFacts,
            Step::Analyzing,
            Step::Editing,
            Step::Reparsing,
            Step::Analyzing,
        ]
    );
}

#[test]
fn edit_free_workflow_round_trips_the_source() {
    let mut workflow = RefactorWorkflow::new(NoEdits);
    let state = workflow.run("Cart.java", CART);

    assert_eq!(state.current_step, Step::Done);
    assert_eq!(state.current_source, state.original_source);
    assert!(state.applied_edits.is_empty());
    assert!(state.warnings.is_empty());
}

#[test]
fn broken_source_proceeds_with_warnings() {
    // unbalanced brace: partial parse, not a failure
    let mut workflow = RefactorWorkflow::new(NoEdits);
    let state = workflow.run("Broken.java", "class A { void m() {");

    assert_eq!(state.current_step, Step::Done);
    assert!(!state.warnings.is_empty());
    assert!(state.warnings[0].contains("partial parse"));
    assert!(state.errors.is_empty());
    // fact extraction still ran past the warning
    assert!(state.completed_steps.contains(&Step::ExtractingFacts));
    assert_eq!(state.facts.classes[0].name, "A");
}

#[test]
fn conflicting_plan_fails_without_corrupting_the_source() {
    struct ConflictingPlan;

    impl RefactorOp for ConflictingPlan {
        fn name(&self) -> &str {
            "conflicting-plan"
        }

        fn plan(&mut self, state: &AnalysisState) -> Vec<Edit> {
            if !state.applied_edits.is_empty() {
                return Vec::new();
            }
            vec![
                Edit::replace(Span::new(5, 10), "x", "first"),
                Edit::replace(Span::new(8, 12), "y", "second"),
            ]
        }
    }

    let mut workflow = RefactorWorkflow::new(ConflictingPlan);
    let state = workflow.run("Cart.java", CART);

    assert_eq!(state.current_step, Step::Failed);
    assert!(state.errors.iter().any(|e| e.contains("overlapping")));
    assert_eq!(state.current_source, state.original_source);
    assert!(state.applied_edits.is_empty());
}

#[test]
fn stale_plan_fails_validation() {
    struct StalePlan;

    impl RefactorOp for StalePlan {
        fn name(&self) -> &str {
            "stale-plan"
        }

        fn plan(&mut self, state: &AnalysisState) -> Vec<Edit> {
            let past_end = state.current_source.len() + 10;
            vec![Edit::replace(
                Span::new(past_end, past_end + 4),
                "x",
                "stale offset",
            )]
        }
    }

    let mut workflow = RefactorWorkflow::new(StalePlan);
    let state = workflow.run("Cart.java", CART);

    assert_eq!(state.current_step, Step::Failed);
    assert!(state
        .errors
        .iter()
        .any(|e| e.contains("state validation failed")));
}

#[test]
fn history_allows_forking_from_any_checkpoint() {
    let op = RenameMethod {
        target: "oldName".into(),
        replacement: "newName".into(),
    };
    let mut workflow = RefactorWorkflow::new(op);
    let final_state = workflow.run("Cart.java", CART);

    let initial = workflow.history().rollback(0).unwrap();
    assert_eq!(initial.current_step, Step::Init);
    assert_eq!(initial.current_source, CART);

    // rollback discards nothing
    assert_eq!(
        workflow.history().latest().unwrap().current_step,
        final_state.current_step
    );
}

#[test]
fn run_file_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Cart.java");
    fs::write(&path, CART).unwrap();

    let op = RenameMethod {
        target: "oldName".into(),
        replacement: "newName".into(),
    };
    let mut workflow = RefactorWorkflow::new(op);
    let state = workflow.run_file(&path).unwrap();

    assert_eq!(state.current_step, Step::Done);
    assert_eq!(state.file_path, path);
    assert!(state.current_source.contains("newName"));
}

#[test]
fn run_file_surfaces_io_errors() {
    let mut workflow = RefactorWorkflow::new(NoEdits);
    let result = workflow.run_file("/no/such/Cart.java");
    assert!(result.is_err());
}

#[test]
fn report_carries_facts_and_diagnostics() {
    let mut workflow = RefactorWorkflow::new(NoEdits);
    let state = workflow.run("Cart.java", CART);

    let report = serde_json::to_value(state.report()).unwrap();
    assert_eq!(report["package"]["name"], "com.acme.app");
    assert_eq!(report["classes"][0]["name"], "Cart");
    assert_eq!(report["methods"].as_array().unwrap().len(), 2);
    assert_eq!(report["imports"][0]["path"], "java.util.List");
    assert!(report["errors"].as_array().unwrap().is_empty());
}
