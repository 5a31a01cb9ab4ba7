//! A small structural view over the expressions that decorators and
//! conditions are made of.

use crate::tree::node_text;
use tree_sitter::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape<'a> {
    Name(&'a str),
    Attribute { attr: &'a str },
    Call { func: Box<Shape<'a>>, args: Vec<Arg<'a>> },
    /// `True`, `False` or `None`.
    Literal(&'a str),
    /// Any other expression, by node kind.
    Other(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg<'a> {
    Positional(Shape<'a>),
    Keyword { name: &'a str, value: Shape<'a> },
    /// `*args` or `**kwargs`.
    Splat,
}

impl<'a> Shape<'a> {
    pub fn of(node: Node<'_>, source: &'a str) -> Self {
        match node.kind() {
            "identifier" => Shape::Name(node_text(node, source)),
            "true" | "false" | "none" => Shape::Literal(node_text(node, source)),
            "parenthesized_expression" => {
                let mut cursor = node.walk();
                let inner = node
                    .named_children(&mut cursor)
                    .find(|child| child.kind() != "comment");
                match inner {
                    Some(inner) => Shape::of(inner, source),
                    None => Shape::Other(node.kind()),
                }
            }
            "attribute" => match node.child_by_field_name("attribute") {
                Some(attr) => Shape::Attribute {
                    attr: node_text(attr, source),
                },
                None => Shape::Other(node.kind()),
            },
            "call" => {
                let func = node
                    .child_by_field_name("function")
                    .map_or(Shape::Other("call"), |func| Shape::of(func, source));
                let args = node
                    .child_by_field_name("arguments")
                    .map(|args| arguments(args, source))
                    .unwrap_or_default();
                Shape::Call {
                    func: Box::new(func),
                    args,
                }
            }
            kind => Shape::Other(kind),
        }
    }

    /// The bare name this expression is, if any.
    pub fn name(&self) -> Option<&'a str> {
        match self {
            Shape::Name(name) => Some(name),
            _ => None,
        }
    }
}

fn arguments<'a>(node: Node<'_>, source: &'a str) -> Vec<Arg<'a>> {
    // `f(x for x in y)` hands the generator over as the whole argument list.
    if node.kind() == "generator_expression" {
        return vec![Arg::Positional(Shape::Other(node.kind()))];
    }

    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .map(|child| match child.kind() {
            "keyword_argument" => {
                let name = child
                    .child_by_field_name("name")
                    .map_or("", |name| node_text(name, source));
                let value = child
                    .child_by_field_name("value")
                    .map_or(Shape::Other("keyword_argument"), |value| {
                        Shape::of(value, source)
                    });
                Arg::Keyword { name, value }
            }
            "list_splat" | "dictionary_splat" => Arg::Splat,
            _ => Arg::Positional(Shape::of(child, source)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{parse, statement_expression};

    fn expression_shape(source: &str) -> Shape<'_> {
        let tree = parse(source).unwrap();
        let statement = tree.root_node().named_child(0).unwrap();
        let expr = statement_expression(statement).unwrap();
        Shape::of(expr, source)
    }

    #[test]
    fn test_names_and_literals() {
        assert_eq!(expression_shape("IS_ASYNC\n"), Shape::Name("IS_ASYNC"));
        assert_eq!(expression_shape("((IS_ASYNC))\n"), Shape::Name("IS_ASYNC"));
        assert_eq!(expression_shape("True\n"), Shape::Literal("True"));
    }

    #[test]
    fn test_call_arguments() {
        let shape = expression_shape("mod.make(1, flag=True, *rest, **more)\n");
        let Shape::Call { func, args } = shape else {
            panic!("expected a call");
        };
        assert_eq!(*func, Shape::Attribute { attr: "make" });
        assert_eq!(
            args,
            vec![
                Arg::Positional(Shape::Other("integer")),
                Arg::Keyword {
                    name: "flag",
                    value: Shape::Literal("True"),
                },
                Arg::Splat,
                Arg::Splat,
            ]
        );
    }

    #[test]
    fn test_generator_argument() {
        let shape = expression_shape("f(x for x in y)\n");
        let Shape::Call { args, .. } = shape else {
            panic!("expected a call");
        };
        assert_eq!(args, vec![Arg::Positional(Shape::Other("generator_expression"))]);
    }
}
