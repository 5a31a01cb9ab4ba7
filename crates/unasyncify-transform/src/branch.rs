//! Collapsing of conditionals guarded by the async-truth marker.
//!
//! Matching looks at the original condition: by the time an `if_statement` is
//! left, the marker identifier inside it has already been substituted.

use crate::shape::Shape;
use crate::tree::{Reindent, Rendered, Rewrite, is_first_on_line, line_indent};
use tree_sitter::Node;

/// Whether `condition` is exactly the bare marker, parentheses aside.
pub fn is_marker_test(condition: Node<'_>, source: &str, marker: &str) -> bool {
    Shape::of(condition, source).name() == Some(marker)
}

/// Resolve an `if_statement` to the branch taken when running synchronously.
pub fn resolve<'a>(node: Node<'a>, updated: &Rendered<'a>, source: &'a str, marker: &str) -> Rewrite {
    let guarded = node
        .child_by_field_name("condition")
        .is_some_and(|condition| is_marker_test(condition, source, marker));
    if !guarded {
        return Rewrite::Keep;
    }

    let mut cursor = node.walk();
    for alternative in node.children_by_field_name("alternative", &mut cursor) {
        match alternative.kind() {
            "elif_clause" => {
                let also_guarded = alternative
                    .child_by_field_name("condition")
                    .is_some_and(|condition| is_marker_test(condition, source, marker));
                if also_guarded {
                    continue;
                }
                return promote_elif(alternative, updated);
            }
            "else_clause" => return inline_else(node, alternative, updated, source),
            _ => {}
        }
    }
    Rewrite::Remove
}

/// `elif cond: ...` plus everything after it becomes `if cond: ...`.
fn promote_elif<'a>(clause: Node<'a>, updated: &Rendered<'a>) -> Rewrite {
    let Some(rendered) = updated.child(clause) else {
        return Rewrite::Keep;
    };
    let Some(keyword) = rendered.token("elif") else {
        return Rewrite::Keep;
    };

    let mut out = String::from("if");
    rendered.write_after(keyword, &mut out, None);
    updated.write_after(clause, &mut out, None);
    Rewrite::Replace(out)
}

/// The body of the `else` replaces the whole statement, dedented to the
/// statement's own column.
fn inline_else<'a>(
    statement: Node<'a>,
    clause: Node<'a>,
    updated: &Rendered<'a>,
    source: &'a str,
) -> Rewrite {
    let Some(rendered) = updated.child(clause) else {
        return Rewrite::Keep;
    };
    let Some(colon) = rendered.token(":") else {
        return Rewrite::Keep;
    };

    let target = line_indent(source, statement.start_byte());
    let body_indent = clause
        .child_by_field_name("body")
        .and_then(|body| {
            let mut cursor = body.walk();
            body.named_children(&mut cursor)
                .find(|child| child.kind() != "comment")
        })
        .filter(|first| is_first_on_line(source, first.start_byte()))
        .map(|first| line_indent(source, first.start_byte()));

    let mut out = String::new();
    match body_indent {
        Some(from) => rendered.write_after(colon, &mut out, Some(&Reindent::new(from, target))),
        None => rendered.write_after(colon, &mut out, None),
    }
    Rewrite::Replace(out.trim_start().to_string())
}
