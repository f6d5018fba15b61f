//! Thread-local parser pooling.
//!
//! Eliminates redundant parser creation by maintaining a thread-local
//! reusable parser. Creates a new parser on first use per thread, reuses it
//! for subsequent operations; each document is processed on one thread, so
//! the pool shares nothing across documents.

use crate::ts::{JavaParser, TreeSitterError};
use std::cell::RefCell;

thread_local! {
    static JAVA_PARSER: RefCell<Option<JavaParser>> = const { RefCell::new(None) };
}

/// Execute a function with the pooled parser instance.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use refactory::pool::with_parser;
///
/// let parsed = with_parser(|parser| parser.parse("class A {}"))??;
/// assert!(!parsed.has_errors());
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut JavaParser) -> R,
{
    JAVA_PARSER.with(|cell| {
        let mut opt = cell.borrow_mut();
        if opt.is_none() {
            *opt = Some(JavaParser::new()?);
        }
        Ok(f(opt.as_mut().expect("parser was just initialized above")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_parser_is_reused_across_calls() {
        let first = with_parser(|p| p.parse("class A {}")).unwrap().unwrap();
        let second = with_parser(|p| p.parse("class B {}")).unwrap().unwrap();
        assert_eq!(first.root_node().kind(), second.root_node().kind());
    }
}
