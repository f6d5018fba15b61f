//! Structural facts extracted from one parse.
//!
//! Facts are owned snapshots (names plus byte spans) rather than tree
//! references, so they survive until the edits derived from them are
//! applied; like every byte offset, they go stale with the next re-parse.

use crate::cache;
use crate::position::Span;
use crate::ts::{queries, ParsedSource, TreeSitterError};
use serde::Serialize;

/// A named declaration: the declared name, the span of the name token, and
/// the span of the whole declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationFact {
    pub name: String,
    pub name_span: Span,
    pub decl_span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFact {
    pub path: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageFact {
    pub name: String,
    pub span: Span,
}

/// Everything the analysis tracks about one source version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceFacts {
    pub package: Option<PackageFact>,
    pub imports: Vec<ImportFact>,
    pub classes: Vec<DeclarationFact>,
    pub methods: Vec<DeclarationFact>,
    pub fields: Vec<DeclarationFact>,
}

/// Run the canned fact queries against a parse.
pub fn extract(parsed: &ParsedSource) -> Result<SourceFacts, TreeSitterError> {
    let root = parsed.root_node();
    let source = parsed.source();

    let package = cache::get_or_compile(queries::FIND_PACKAGE)?
        .find_all(root, source)
        .first()
        .map(|m| {
            Ok::<_, TreeSitterError>(PackageFact {
                name: m.capture("package.name")?.text.clone(),
                span: m.capture("package.decl")?.span,
            })
        })
        .transpose()?;

    let imports = cache::get_or_compile(queries::FIND_IMPORTS)?
        .find_all(root, source)
        .iter()
        .map(|m| {
            Ok(ImportFact {
                path: m.capture("import.path")?.text.clone(),
                span: m.capture("import.decl")?.span,
            })
        })
        .collect::<Result<Vec<_>, TreeSitterError>>()?;

    Ok(SourceFacts {
        package,
        imports,
        classes: declarations(parsed, queries::FIND_CLASSES, "class")?,
        methods: declarations(parsed, queries::FIND_METHODS, "method")?,
        fields: declarations(parsed, queries::FIND_FIELDS, "field")?,
    })
}

fn declarations(
    parsed: &ParsedSource,
    pattern: &str,
    capture_prefix: &str,
) -> Result<Vec<DeclarationFact>, TreeSitterError> {
    let name_capture = format!("{capture_prefix}.name");
    let decl_capture = format!("{capture_prefix}.decl");

    cache::get_or_compile(pattern)?
        .find_all(parsed.root_node(), parsed.source())
        .iter()
        .map(|m| {
            let name = m.capture(&name_capture)?;
            Ok(DeclarationFact {
                name: name.text.clone(),
                name_span: name.span,
                decl_span: m.capture(&decl_capture)?.span,
            })
        })
        .collect()
}
