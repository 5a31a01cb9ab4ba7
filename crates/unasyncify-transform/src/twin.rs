//! Building the sync twin of one opted-in function.

use crate::branch;
use crate::lower::{strip_async, unwrap_await};
use crate::marker::{ASYNC_UNSAFE, FROM_CODEGEN, first_decorator, is_generated};
use crate::naming::derive_twin_name;
use crate::renames::RenameTable;
use crate::rewrite::{rewrite_call_target, substitute_identifier};
use crate::tree::{Rendered, Rewrite, Transformer, Visit, line_indent, node_text, render, splice};
use crate::Error;
use tree_sitter::Node;

/// A rendered twin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Twin {
    pub name: String,
    pub text: String,
    /// The async-truth marker appeared somewhere in the source function.
    pub marker_seen: bool,
}

/// Rewrites a `decorated_definition` into its sync twin in a single walk.
struct TwinRewriter<'a, 'o> {
    source: &'a str,
    table: &'o RenameTable,
    marker: &'o str,
    root: Node<'a>,
    definition: Node<'a>,
    twin_name: String,
    async_unsafe: bool,
    /// Nesting depth of `await` expressions.
    depth: usize,
    marker_seen: bool,
}

impl<'a> Transformer<'a> for TwinRewriter<'a, '_> {
    fn enter(&mut self, node: Node<'a>) -> Result<Visit, Error> {
        match node.kind() {
            "await" => self.depth += 1,
            "decorated_definition" if node != self.root && is_generated(node, self.source) => {
                return Ok(Visit::Skip);
            }
            _ => {}
        }
        Ok(Visit::Children)
    }

    fn leave(&mut self, node: Node<'a>, updated: &mut Rendered<'a>) -> Result<Rewrite, Error> {
        let rewrite = match node.kind() {
            "identifier" => {
                if node_text(node, self.source) == self.marker {
                    self.marker_seen = true;
                }
                substitute_identifier(node, self.source, self.table)
            }
            "await" => {
                self.depth = self.depth.saturating_sub(1);
                unwrap_await(updated)
            }
            "call" => {
                if self.depth > 0 {
                    rewrite_call_target(node, updated);
                }
                Rewrite::Keep
            }
            "for_statement" | "with_statement" | "for_in_clause" => strip_async(updated),
            "if_statement" => branch::resolve(node, updated, self.source, self.marker),
            "function_definition" if node == self.definition => {
                if let Some(name) = node.child_by_field_name("name") {
                    updated.replace_child(name, self.twin_name.clone());
                }
                strip_async(updated)
            }
            "decorated_definition" if node == self.root => {
                self.mark_generated(updated);
                Rewrite::Keep
            }
            "decorated_definition" if is_generated(node, self.source) => Rewrite::Remove,
            _ => Rewrite::Keep,
        };
        Ok(rewrite)
    }
}

impl<'a> TwinRewriter<'a, '_> {
    /// Swap the request decorator for the generated markers.
    fn mark_generated(&self, updated: &mut Rendered<'a>) {
        let Some(decorator) = first_decorator(self.root) else {
            return;
        };
        let mut markers = vec![format!("@{FROM_CODEGEN}")];
        if self.async_unsafe {
            markers.push(format!("@{ASYNC_UNSAFE}"));
        }
        let indent = line_indent(self.source, decorator.start_byte());
        updated.replace_child(decorator, splice(&markers, indent));
    }
}

/// Build the twin of an opted-in `decorated_definition`.
pub fn synthesize<'a>(
    node: Node<'a>,
    source: &'a str,
    table: &RenameTable,
    marker: &str,
    async_unsafe: bool,
) -> Result<Twin, Error> {
    let definition = node
        .child_by_field_name("definition")
        .ok_or_else(|| Error::Parse("decorated definition without a body".into()))?;
    let name = definition
        .child_by_field_name("name")
        .map_or("", |name| node_text(name, source));
    let twin_name = derive_twin_name(name)?;

    let mut rewriter = TwinRewriter {
        source,
        table,
        marker,
        root: node,
        definition,
        twin_name,
        async_unsafe,
        depth: 0,
        marker_seen: false,
    };
    let (_, rendered) = render(&mut rewriter, node, source)?;

    tracing::debug!(function = name, twin = %rewriter.twin_name, "synthesized twin");
    Ok(Twin {
        text: rendered.text(),
        name: rewriter.twin_name,
        marker_seen: rewriter.marker_seen,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse;

    fn twin_of(source: &str) -> Result<Twin, Error> {
        let table = RenameTable::new([("aconnection", "connection")], "IS_ASYNC");
        let tree = parse(source).unwrap();
        let mut cursor = tree.root_node().walk();
        let node = tree
            .root_node()
            .named_children(&mut cursor)
            .find(|child| child.kind() == "decorated_definition")
            .unwrap();
        synthesize(node, source, &table, "IS_ASYNC", false)
    }

    #[test]
    fn test_await_and_call_target() {
        let source = "@generate_unasynced()\nasync def aoperation(self):\n    # a comment to be preserved\n    await self.afoo()\n";
        let twin = twin_of(source).unwrap();
        assert_eq!(twin.name, "operation");
        assert_eq!(
            twin.text,
            "@from_codegen\ndef operation(self):\n    # a comment to be preserved\n    self.foo()"
        );
        assert!(!twin.marker_seen);
    }

    #[test]
    fn test_calls_outside_await_keep_their_names() {
        let source = "@generate_unasynced()\nasync def aget(self):\n    return self.aconnection.acursor(all(x))\n";
        let twin = twin_of(source).unwrap();
        assert_eq!(
            twin.text,
            "@from_codegen\ndef get(self):\n    return self.connection.acursor(all(x))"
        );
    }

    #[test]
    fn test_renamed_attribute_under_await() {
        let source = "@generate_unasynced()\nasync def aget(self):\n    await self.aconnection.aconnect()\n    await all(self.afetch())\n";
        let twin = twin_of(source).unwrap();
        assert_eq!(
            twin.text,
            "@from_codegen\ndef get(self):\n    self.connection.connect()\n    all(self.fetch())"
        );
    }

    #[test]
    fn test_unknown_name_is_fatal() {
        let source = "@generate_unasynced()\nasync def run(self):\n    pass\n";
        assert!(matches!(
            twin_of(source),
            Err(Error::UnknownNamePattern { name }) if name == "run"
        ));
    }

    #[test]
    fn test_marker_seen_outside_conditions() {
        let source = "@generate_unasynced()\nasync def aflag():\n    return IS_ASYNC\n";
        let twin = twin_of(source).unwrap();
        assert_eq!(twin.text, "@from_codegen\ndef flag():\n    return False");
        assert!(twin.marker_seen);
    }
}
