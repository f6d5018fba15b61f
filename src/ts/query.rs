use crate::position::Span;
use crate::ts::errors::TreeSitterError;
use std::collections::HashMap;
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator};

/// A match from a tree-sitter query with captured nodes.
///
/// Captured spans and text are snapshots of the tree revision the query ran
/// against; they are stale after the next parse and must be re-derived by
/// re-running the query.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    /// Byte span covering every capture in the match
    pub span: Span,
    /// Named captures: capture name -> captured node
    pub captures: HashMap<String, CapturedNode>,
}

impl QueryMatch {
    pub fn capture(&self, name: &str) -> Result<&CapturedNode, TreeSitterError> {
        self.captures
            .get(name)
            .ok_or_else(|| TreeSitterError::CaptureNotFound {
                name: name.to_string(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct CapturedNode {
    pub span: Span,
    pub kind: String,
    pub text: String,
}

/// Compiled structural pattern, executable against any tree of the grammar.
///
/// Compilation cost dominates execution for small files; engines are
/// reusable across tree revisions (see [`crate::cache`]) since the compiled
/// form depends only on the pattern and the grammar, never on a source
/// version.
pub struct QueryEngine {
    query: Query,
    capture_names: Vec<String>,
}

impl QueryEngine {
    /// Compile a tree-sitter query.
    ///
    /// # Query Syntax
    ///
    /// Tree-sitter queries use S-expression syntax:
    /// ```text
    /// (method_declaration
    ///   name: (identifier) @method.name) @method.decl
    /// ```
    ///
    /// Malformed patterns and unknown node or field names are rejected with
    /// the grammar's message for the offending fragment.
    pub fn new(pattern: &str) -> Result<Self, TreeSitterError> {
        let language = tree_sitter::Language::from(tree_sitter_java::LANGUAGE);
        let query =
            Query::new(&language, pattern).map_err(|e| TreeSitterError::InvalidQuery {
                message: e.to_string(),
            })?;

        let capture_names = query.capture_names().iter().map(|s| s.to_string()).collect();

        Ok(Self {
            query,
            capture_names,
        })
    }

    /// Execute against a tree revision and return all matches.
    ///
    /// Never mutates the tree; safe to call repeatedly against the same
    /// revision.
    pub fn find_all(&self, root: Node<'_>, source: &str) -> Vec<QueryMatch> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, root, source.as_bytes());

        let mut results = Vec::new();

        // tree-sitter 0.25+ uses StreamingIterator
        while let Some(m) = matches.next() {
            let mut captures = HashMap::new();
            let mut overall_start = usize::MAX;
            let mut overall_end = 0usize;

            for capture in m.captures {
                let node = capture.node;
                let name = &self.capture_names[capture.index as usize];
                let text = source
                    .get(node.byte_range())
                    .unwrap_or_default()
                    .to_string();

                overall_start = overall_start.min(node.start_byte());
                overall_end = overall_end.max(node.end_byte());

                captures.insert(
                    name.clone(),
                    CapturedNode {
                        span: Span::of_node(node),
                        kind: node.kind().to_string(),
                        text,
                    },
                );
            }

            if overall_start != usize::MAX {
                results.push(QueryMatch {
                    span: Span::new(overall_start, overall_end),
                    captures,
                });
            }
        }

        results
    }

    /// Execute and expect exactly one match.
    pub fn find_unique(&self, root: Node<'_>, source: &str) -> Result<QueryMatch, TreeSitterError> {
        let mut matches = self.find_all(root, source);

        match matches.len() {
            0 => Err(TreeSitterError::NoMatch),
            1 => Ok(matches.remove(0)),
            n => Err(TreeSitterError::AmbiguousMatch { count: n }),
        }
    }

    /// Capture names defined in the pattern.
    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }
}

/// Canned tree-sitter queries for Java constructs.
pub mod queries {
    /// Every method declaration, name captured as `method.name`.
    pub const FIND_METHODS: &str =
        "(method_declaration name: (identifier) @method.name) @method.decl";

    /// Every class declaration, name captured as `class.name`.
    pub const FIND_CLASSES: &str =
        "(class_declaration name: (identifier) @class.name) @class.decl";

    /// Every field declaration, name captured as `field.name`.
    pub const FIND_FIELDS: &str = "(field_declaration declarator: (variable_declarator \
         name: (identifier) @field.name)) @field.decl";

    /// Every import declaration, imported path captured as `import.path`.
    pub const FIND_IMPORTS: &str =
        "(import_declaration [(scoped_identifier) (identifier)] @import.path) @import.decl";

    /// The package declaration, package name captured as `package.name`.
    pub const FIND_PACKAGE: &str =
        "(package_declaration [(scoped_identifier) (identifier)] @package.name) @package.decl";

    /// Query for a method by name.
    pub fn method_by_name(name: &str) -> String {
        format!(
            r#"(method_declaration
                name: (identifier) @method.name
                (#eq? @method.name "{name}")
            ) @method.decl"#
        )
    }

    /// Query for a class by name.
    pub fn class_by_name(name: &str) -> String {
        format!(
            r#"(class_declaration
                name: (identifier) @class.name
                (#eq? @class.name "{name}")
            ) @class.decl"#
        )
    }
}
