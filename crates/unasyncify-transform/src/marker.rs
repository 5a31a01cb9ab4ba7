//! Classification of functions by their first decorator.

use crate::shape::{Arg, Shape};
use crate::tree::node_text;
use crate::Error;
use tree_sitter::Node;

/// Decorator requesting a sync twin.
pub const GENERATE_UNASYNCED: &str = "generate_unasynced";
/// Decorator carried by every generated twin.
pub const FROM_CODEGEN: &str = "from_codegen";
/// Decorator restricting a twin to sync callers.
pub const ASYNC_UNSAFE: &str = "async_unsafe";
/// Default name of the async-truth constant.
pub const DEFAULT_ASYNC_MARKER: &str = "IS_ASYNC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoratorMarker {
    /// Opted in for twin generation.
    Fresh { async_unsafe: bool },
    /// A twin produced by an earlier run.
    Generated,
    Plain,
}

/// The first decorator of a decorated function definition, if it is one.
pub(crate) fn first_decorator(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() != "decorated_definition" {
        return None;
    }
    let definition = node.child_by_field_name("definition")?;
    if definition.kind() != "function_definition" {
        return None;
    }
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .find(|child| child.kind() == "decorator")
}

fn decorator_shape<'s>(decorator: Node<'_>, source: &'s str) -> Option<Shape<'s>> {
    let mut cursor = decorator.walk();
    let expr = decorator
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment")?;
    Some(Shape::of(expr, source))
}

/// Classify a `decorated_definition`. Anything that is not a decorated
/// function is [`DecoratorMarker::Plain`].
pub fn classify(node: Node<'_>, source: &str) -> Result<DecoratorMarker, Error> {
    let Some(shape) = first_decorator(node).and_then(|d| decorator_shape(d, source)) else {
        return Ok(DecoratorMarker::Plain);
    };

    match shape {
        Shape::Name(GENERATE_UNASYNCED) => Ok(DecoratorMarker::Fresh {
            async_unsafe: false,
        }),
        Shape::Name(FROM_CODEGEN) => Ok(DecoratorMarker::Generated),
        Shape::Call { func, args } if func.name() == Some(GENERATE_UNASYNCED) => {
            match args.as_slice() {
                [] => Ok(DecoratorMarker::Fresh {
                    async_unsafe: false,
                }),
                [Arg::Keyword {
                    name: ASYNC_UNSAFE,
                    value: Shape::Literal("True"),
                }] => Ok(DecoratorMarker::Fresh { async_unsafe: true }),
                [arg] => Err(marker_error(node, source, describe(arg))),
                _ => Err(marker_error(
                    node,
                    source,
                    format!("expected at most one argument, got {}", args.len()),
                )),
            }
        }
        _ => Ok(DecoratorMarker::Plain),
    }
}

/// Whether a node is a twin from an earlier run. Unlike [`classify`] this
/// never fails, so it can be used to skip subtrees.
pub fn is_generated(node: Node<'_>, source: &str) -> bool {
    first_decorator(node)
        .and_then(|d| decorator_shape(d, source))
        .is_some_and(|shape| shape == Shape::Name(FROM_CODEGEN))
}

fn describe(arg: &Arg<'_>) -> String {
    match arg {
        Arg::Keyword {
            name: ASYNC_UNSAFE,
            ..
        } => "`async_unsafe` must be the literal `True`".to_string(),
        Arg::Keyword { name, .. } => format!("unexpected keyword argument `{name}`"),
        Arg::Positional(_) => "unexpected positional argument".to_string(),
        Arg::Splat => "unexpected unpacked argument".to_string(),
    }
}

fn marker_error(node: Node<'_>, source: &str, detail: String) -> Error {
    let function = node
        .child_by_field_name("definition")
        .and_then(|def| def.child_by_field_name("name"))
        .map_or("<unknown>", |name| node_text(name, source));
    Error::MarkerShape {
        function: function.to_string(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse;

    fn classify_first(source: &str) -> Result<DecoratorMarker, Error> {
        let tree = parse(source).unwrap();
        let node = tree.root_node().named_child(0).unwrap();
        classify(node, source)
    }

    #[test]
    fn test_request_forms() {
        let fresh = DecoratorMarker::Fresh {
            async_unsafe: false,
        };
        assert_eq!(
            classify_first("@generate_unasynced\nasync def aget(): pass\n").unwrap(),
            fresh
        );
        assert_eq!(
            classify_first("@generate_unasynced()\nasync def aget(): pass\n").unwrap(),
            fresh
        );
        assert_eq!(
            classify_first("@generate_unasynced(async_unsafe=True)\nasync def aget(): pass\n")
                .unwrap(),
            DecoratorMarker::Fresh { async_unsafe: true }
        );
    }

    #[test]
    fn test_generated_and_plain() {
        assert_eq!(
            classify_first("@from_codegen\ndef get(): pass\n").unwrap(),
            DecoratorMarker::Generated
        );
        assert_eq!(
            classify_first("@property\n@generate_unasynced()\nasync def aget(): pass\n").unwrap(),
            DecoratorMarker::Plain
        );
        assert_eq!(
            classify_first("@generate_unasynced()\nclass AThing: pass\n").unwrap(),
            DecoratorMarker::Plain
        );
        assert_eq!(
            classify_first("async def aget(): pass\n").unwrap(),
            DecoratorMarker::Plain
        );
    }

    #[test]
    fn test_malformed_request_is_fatal() {
        for decorator in [
            "@generate_unasynced(async_unsafe=False)",
            "@generate_unasynced(async_unsafe=flag)",
            "@generate_unasynced(unsafe=True)",
            "@generate_unasynced(True)",
            "@generate_unasynced(async_unsafe=True, extra=1)",
        ] {
            let source = format!("{decorator}\nasync def aget(): pass\n");
            let err = classify_first(&source).unwrap_err();
            assert!(
                matches!(&err, Error::MarkerShape { function, .. } if function == "aget"),
                "{decorator}: {err}"
            );
        }
    }

    #[test]
    fn test_is_generated_ignores_malformed_requests() {
        let source = "@generate_unasynced(1, 2)\nasync def aget(): pass\n";
        let tree = parse(source).unwrap();
        let node = tree.root_node().named_child(0).unwrap();
        assert!(!is_generated(node, source));
    }
}
