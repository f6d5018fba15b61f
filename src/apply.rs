//! Applies validated edit collections to a source buffer.
//!
//! Application is all-or-nothing: conflicts and stale ranges are rejected
//! before any byte moves, and the input buffer is never observed in a
//! half-applied state.

use crate::edit::{ConflictPolicy, Edit, EditCollection, EditKind};
use crate::position::Span;
use similar::TextDiff;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApplyError {
    /// Overlapping edits in one collection; never silently resolved.
    #[error("{} conflicting edit pair(s) in collection", .pairs.len())]
    Conflict { pairs: Vec<(String, String)> },

    /// An edit's byte range exceeds the current buffer, typically because
    /// the edit was generated against a stale source version.
    #[error("edit span {span} exceeds buffer of {len} bytes")]
    OutOfRange { span: Span, len: usize },

    /// The span boundary splits a multi-byte UTF-8 sequence.
    #[error("edit span {span} splits a UTF-8 sequence")]
    Utf8Boundary { span: Span },
}

/// Apply one edit, producing a new buffer.
///
/// Splices `source[..start]`, the edit's replacement text, and
/// `source[end..]` over the kind's effective span.
pub fn apply_single(source: &str, edit: &Edit) -> Result<String, ApplyError> {
    let span = edit.effective_span();
    check_span(span, source.len())?;

    let (head, tail) = match (source.get(..span.start), source.get(span.end..)) {
        (Some(head), Some(tail)) => (head, tail),
        _ => return Err(ApplyError::Utf8Boundary { span }),
    };

    let replacement = edit.replacement();
    let mut out = String::with_capacity(head.len() + replacement.len() + tail.len());
    out.push_str(head);
    out.push_str(replacement);
    out.push_str(tail);
    Ok(out)
}

/// Apply a whole collection, producing a new buffer.
///
/// Fails fast on conflicts, validates every range against the input
/// version, then applies in descending-start order so that edits applied
/// later in the buffer never shift offsets earlier in the buffer.
pub fn apply_all(source: &str, collection: &EditCollection) -> Result<String, ApplyError> {
    let conflicts = collection.get_conflicts();
    if !conflicts.is_empty() {
        return Err(ApplyError::Conflict {
            pairs: conflicts
                .iter()
                .map(|(a, b)| (a.description.clone(), b.description.clone()))
                .collect(),
        });
    }

    for edit in collection.edits() {
        check_span(edit.effective_span(), source.len())?;
    }

    let mut buffer = source.to_string();
    for edit in collection.sorted_for_application() {
        if subsumed_by_replacement(&edit, collection) {
            continue;
        }
        buffer = apply_single(&buffer, &edit)?;
    }
    Ok(buffer)
}

/// Identical computation to [`apply_single`], but non-authoritative: the
/// result updates no stored state and exists for dry-run display.
pub fn preview(source: &str, edit: &Edit) -> Result<String, ApplyError> {
    apply_single(source, edit)
}

/// Unified diff of what [`preview`] would produce.
pub fn preview_diff(source: &str, edit: &Edit) -> Result<String, ApplyError> {
    let edited = apply_single(source, edit)?;
    Ok(TextDiff::from_lines(source, &edited)
        .unified_diff()
        .context_radius(2)
        .header("current", "preview")
        .to_string())
}

fn check_span(span: Span, len: usize) -> Result<(), ApplyError> {
    if span.start > span.end || span.end > len {
        return Err(ApplyError::OutOfRange { span, len });
    }
    Ok(())
}

/// Under `AllowNestedDelete` an inner delete's bytes are already covered by
/// the replacement that contains it.
fn subsumed_by_replacement(edit: &Edit, collection: &EditCollection) -> bool {
    collection.policy() == ConflictPolicy::AllowNestedDelete
        && edit.kind == EditKind::Delete
        && collection.edits().iter().any(|other| {
            other.kind == EditKind::Replace && other.span.contains(&edit.span)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_class_name() {
        let source = "public class A {}";
        let start = source.find('A').unwrap();
        let edit = Edit::replace(Span::new(start, start + 1), "B", "rename class");

        assert_eq!(apply_single(source, &edit).unwrap(), "public class B {}");
        // preview computes the same buffer without recording anything
        assert_eq!(preview(source, &edit).unwrap(), "public class B {}");
    }

    #[test]
    fn delete_drops_the_span() {
        let edit = Edit::delete(Span::new(5, 11), "drop qualifier");
        assert_eq!(apply_single("class Inner A {}", &edit).unwrap(), "class A {}");
    }

    #[test]
    fn insert_before_and_after_anchor() {
        let source = "class A {}";
        let anchor = Span::new(0, 5);

        let before = Edit::insert_before(anchor, "public ", "add modifier");
        assert_eq!(apply_single(source, &before).unwrap(), "public class A {}");

        let after = Edit::insert_after(anchor, " final", "add modifier");
        assert_eq!(apply_single(source, &after).unwrap(), "class final A {}");
    }

    #[test]
    fn out_of_range_is_rejected() {
        let edit = Edit::replace(Span::new(5, 20), "x", "stale edit");
        let result = apply_single("short", &edit);
        assert!(matches!(result, Err(ApplyError::OutOfRange { .. })));
    }

    #[test]
    fn inverted_span_is_rejected() {
        let edit = Edit::replace(Span::new(9, 5), "x", "inverted");
        let result = apply_single("long enough", &edit);
        assert!(matches!(result, Err(ApplyError::OutOfRange { .. })));
    }

    #[test]
    fn utf8_boundary_is_rejected() {
        // 'é' occupies bytes 4..6; byte 5 splits it
        let edit = Edit::replace(Span::new(5, 6), "x", "mid-sequence");
        let result = apply_single("int é;", &edit);
        assert!(matches!(result, Err(ApplyError::Utf8Boundary { .. })));
    }

    #[test]
    fn conflicting_collection_fails_fast() {
        let mut collection = EditCollection::new();
        collection.add(Edit::replace(Span::new(5, 10), "x", "first"));
        collection.add(Edit::replace(Span::new(8, 12), "y", "second"));

        let result = apply_all("a long enough buffer", &collection);
        match result {
            Err(ApplyError::Conflict { pairs }) => {
                assert_eq!(pairs, vec![("first".to_string(), "second".to_string())]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn collection_applies_in_reverse_order() {
        let source = "int a; int b; int c;";
        let mut collection = EditCollection::new();
        for (name, replacement) in [("a", "alpha"), ("b", "beta"), ("c", "gamma")] {
            let at = source.find(&format!("int {name}")).unwrap() + 4;
            collection.add(Edit::replace(
                Span::new(at, at + 1),
                replacement,
                format!("rename {name}"),
            ));
        }

        assert_eq!(
            apply_all(source, &collection).unwrap(),
            "int alpha; int beta; int gamma;"
        );
    }

    #[test]
    fn stale_range_in_collection_is_rejected_before_any_edit() {
        let mut collection = EditCollection::new();
        collection.add(Edit::replace(Span::new(0, 3), "x", "fine"));
        collection.add(Edit::replace(Span::new(50, 60), "y", "stale"));

        let result = apply_all("short buffer", &collection);
        assert!(matches!(result, Err(ApplyError::OutOfRange { .. })));
    }

    #[test]
    fn nested_delete_is_subsumed_under_policy() {
        let source = "void oldBody() {}";
        let mut collection = EditCollection::with_policy(ConflictPolicy::AllowNestedDelete);
        collection.add(Edit::replace(Span::new(5, 12), "newBody", "replace name"));
        collection.add(Edit::delete(Span::new(8, 11), "inner delete"));

        assert_eq!(apply_all(source, &collection).unwrap(), "void newBody() {}");
    }

    #[test]
    fn preview_diff_renders_both_sides() {
        let source = "class A {}\n";
        let start = source.find('A').unwrap();
        let edit = Edit::replace(Span::new(start, start + 1), "B", "rename");

        let diff = preview_diff(source, &edit).unwrap();
        assert!(diff.contains("-class A {}"));
        assert!(diff.contains("+class B {}"));
    }
}
