//! Identifier substitution and call-target renaming.

use crate::naming::strip_async_prefix;
use crate::renames::RenameTable;
use crate::tree::{Rendered, Rewrite, node_text};
use tree_sitter::Node;

/// Replace an identifier found in the rename table.
pub fn substitute_identifier(node: Node<'_>, source: &str, table: &RenameTable) -> Rewrite {
    match table.get(node_text(node, source)) {
        Some(replacement) => Rewrite::Replace(replacement.to_string()),
        None => Rewrite::Keep,
    }
}

/// Drop the async prefix from the target of a call, either a bare name or
/// the last segment of an attribute chain. Returns whether anything changed;
/// a miss leaves the call alone.
pub fn rewrite_call_target<'a>(node: Node<'a>, updated: &mut Rendered<'a>) -> bool {
    let Some(func) = node.child_by_field_name("function") else {
        return false;
    };

    let renamed = match func.kind() {
        "identifier" => updated
            .child_text(func)
            .and_then(|name| strip_async_prefix(&name))
            .is_some_and(|name| updated.replace_child(func, name)),
        "attribute" => {
            let Some(attr) = func.child_by_field_name("attribute") else {
                return false;
            };
            updated.child_mut(func).is_some_and(|target| {
                target
                    .child_text(attr)
                    .and_then(|name| strip_async_prefix(&name))
                    .is_some_and(|name| target.replace_child(attr, name))
            })
        }
        _ => false,
    };

    if !renamed {
        tracing::trace!(
            target_kind = func.kind(),
            line = func.start_position().row + 1,
            "call target left unchanged"
        );
    }
    renamed
}
