//! Refactory: a source transformation engine over concrete syntax trees.
//!
//! Parses a program into a tree-sitter CST, queries it for structural
//! patterns, generates byte-positional edits, and applies them back to the
//! source while keeping a derived analysis in sync across re-parses.
//!
//! # Architecture
//!
//! Every high-level operation compiles down to a single primitive:
//! [`Edit`], a byte-span mutation over one fixed source version.
//! Intelligence lives in span acquisition (tree-sitter queries over the
//! parse, [`facts`] extraction), not in the application logic. The
//! [`workflow`] state machine keeps the derived analysis honest: applying
//! edits invalidates the tree, and a re-parse rebuilds both the tree and
//! the facts before the next planning pass.
//!
//! # Safety
//!
//! - Byte offsets are the canonical coordinate system; line/column values
//!   are derived per parse and display-only
//! - Overlapping edits are conflicts, reported in full and never silently
//!   resolved
//! - Application is all-or-nothing and ordered descending by start offset,
//!   so no applied edit shifts a pending edit's target
//! - Buffer slicing fails loudly on stale ranges and split UTF-8 sequences
//!
//! # Example
//!
//! ```
//! use refactory::{ops::RenameMethod, RefactorWorkflow, Step};
//!
//! let source = "class Greeter { void hello() {} }";
//! let op = RenameMethod {
//!     target: "hello".into(),
//!     replacement: "greet".into(),
//! };
//!
//! let mut workflow = RefactorWorkflow::new(op);
//! let state = workflow.run("Greeter.java", source);
//!
//! assert_eq!(state.current_step, Step::Done);
//! assert!(state.current_source.contains("void greet()"));
//! ```

pub mod apply;
pub mod cache;
pub mod edit;
pub mod facts;
pub mod ops;
pub mod pool;
pub mod position;
pub mod state;
pub mod ts;
pub mod workflow;

// Re-exports
pub use apply::{apply_all, apply_single, preview, preview_diff, ApplyError};
pub use edit::{ConflictPolicy, Edit, EditCollection, EditKind};
pub use facts::{DeclarationFact, ImportFact, PackageFact, SourceFacts};
pub use position::{Position, SourceRange, Span};
pub use state::{AnalysisReport, AnalysisState, StateHistory, Step, ValidationError};
pub use ts::{JavaParser, ParsedSource, QueryEngine, QueryMatch, TreeSitterError};
pub use workflow::{next_step, RefactorOp, RefactorWorkflow, WorkflowError};
