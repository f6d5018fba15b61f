//! Tree-sitter integration: parsing, tree access, and structural queries.
//!
//! This module provides CST-based span location, enabling precise byte-span
//! extraction for source constructs without losing comments or formatting.

pub mod errors;
pub mod parser;
pub mod query;

pub use errors::TreeSitterError;
pub use parser::{Descendants, ErrorNode, JavaParser, ParsedSource};
pub use query::{queries, CapturedNode, QueryEngine, QueryMatch};
