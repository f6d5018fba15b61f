use crate::position::{LineMap, Position, SourceRange, Span};
use crate::ts::errors::TreeSitterError;
use std::fmt;
use tree_sitter::{Node, Parser, Tree};

/// Tree-sitter parser wrapper for Java source code.
pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        let language = tree_sitter::Language::from(tree_sitter_java::LANGUAGE);
        parser
            .set_language(&language)
            .map_err(|_| TreeSitterError::LanguageSet)?;
        Ok(Self { parser })
    }

    /// Parse a source snapshot into an owned tree.
    ///
    /// Syntactically broken input still yields a best-effort tree carrying
    /// ERROR/MISSING markers; only grammar-level refusal is an error here.
    /// Callers decide whether a partial tree is usable.
    pub fn parse(&mut self, source: impl Into<String>) -> Result<ParsedSource, TreeSitterError> {
        let source = source.into();
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or(TreeSitterError::ParseFailed)?;
        Ok(ParsedSource::from_parts(source, tree))
    }
}

/// One parsed source version: the buffer, its tree, and the line index.
///
/// Exclusive owner of the tree until superseded by the next parse. Nothing
/// here mutates in place; a re-parse builds an entirely new value, and any
/// nodes or query results taken from the old one must not be carried over.
#[derive(Clone)]
pub struct ParsedSource {
    source: String,
    tree: Tree,
    lines: LineMap,
}

impl ParsedSource {
    fn from_parts(source: String, tree: Tree) -> Self {
        let lines = LineMap::new(&source);
        Self {
            source,
            tree,
            lines,
        }
    }

    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Slice the buffer by the node's byte range.
    ///
    /// Fails loudly when the range falls outside the buffer or splits a
    /// UTF-8 sequence; byte-offset correctness is safety-critical for the
    /// edit pipeline, so nothing is silently replaced.
    pub fn node_text(&self, node: Node<'_>) -> Result<&str, TreeSitterError> {
        self.source
            .get(node.byte_range())
            .ok_or(TreeSitterError::TextOutOfBounds {
                span: Span::of_node(node),
                len: self.source.len(),
            })
    }

    /// Depth-first pre-order traversal over every node of the tree.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.root_node()],
        }
    }

    /// Lazy depth-first search for nodes of a given kind, restartable by
    /// calling again.
    pub fn find_by_type<'s>(&'s self, kind: &str) -> impl Iterator<Item = Node<'s>> + 's {
        let kind = kind.to_string();
        self.descendants().filter(move |node| node.kind() == kind)
    }

    /// Resolve a byte offset against this version's line index.
    pub fn position_at(&self, offset: usize) -> Position {
        self.lines.position_at(offset)
    }

    pub fn position_of(&self, node: Node<'_>) -> SourceRange {
        self.lines.range_of(Span::of_node(node))
    }

    /// Check if the tree contains any ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.descendants()
            .any(|node| node.is_error() || node.is_missing())
    }

    /// Locations of every ERROR/MISSING node in a best-effort parse.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        self.descendants()
            .filter(|node| node.is_error() || node.is_missing())
            .map(|node| {
                let span = Span::of_node(node);
                ErrorNode {
                    span,
                    position: self.lines.position_at(span.start),
                }
            })
            .collect()
    }
}

impl fmt::Debug for ParsedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedSource")
            .field("len", &self.source.len())
            .field("root", &self.tree.root_node().kind())
            .finish()
    }
}

/// Location of an ERROR or MISSING node in a best-effort parse.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    pub span: Span,
    pub position: Position,
}

impl fmt::Display for ErrorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "syntax error at line {}, column {} (byte {})",
            self.position.line + 1,
            self.position.column + 1,
            self.span.start
        )
    }
}

/// Depth-first pre-order iterator over a tree's nodes.
pub struct Descendants<'t> {
    stack: Vec<Node<'t>>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        let node = self.stack.pop()?;
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
        self.stack.extend(children.into_iter().rev());
        Some(node)
    }
}
