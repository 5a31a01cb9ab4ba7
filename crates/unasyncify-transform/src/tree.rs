//! Lossless rendering over tree-sitter syntax trees.
//!
//! A node renders as the original text between its children ("gaps") plus the
//! rendering of each child; a leaf renders as its own text. Any subtree that no
//! rule touches therefore comes back byte-for-byte, comments and layout
//! included. Rules plug in through [`Transformer`] and answer each node with a
//! [`Rewrite`].

use crate::Error;
use std::borrow::Cow;
use tree_sitter::{Node, Parser, Tree};

/// Parse Python source, rejecting sources with syntax errors.
pub fn parse(source: &str) -> Result<Tree, Error> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_python::language().into())
        .map_err(|err| Error::Parse(err.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::Parse("failed to parse".into()))?;

    if tree.root_node().has_error() {
        return Err(Error::Parse("syntax error in source".into()));
    }
    Ok(tree)
}

/// Source text of a node.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Whether `node` sits directly in a module or block.
pub(crate) fn is_statement(node: Node<'_>) -> bool {
    node.is_named()
        && node.kind() != "comment"
        && node
            .parent()
            .is_some_and(|parent| matches!(parent.kind(), "module" | "block"))
}

/// The expression a statement consists of.
///
/// arborium's grammar places a bare expression directly in its block, while
/// older grammars wrap it in `expression_statement`. Both are accepted.
pub(crate) fn statement_expression(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "expression_statement" if node.named_child_count() == 1 => node.named_child(0),
        "expression_statement" => None,
        _ if is_statement(node) => Some(node),
        _ => None,
    }
}

/// Leading whitespace of the line containing `byte`.
pub fn line_indent(source: &str, byte: usize) -> &str {
    let line_start = source[..byte].rfind('\n').map_or(0, |i| i + 1);
    let line = &source[line_start..];
    let width = line.len() - line.trim_start_matches(is_indent_char).len();
    &line[..width]
}

/// Whether only indentation precedes `byte` on its line.
pub fn is_first_on_line(source: &str, byte: usize) -> bool {
    let line_start = source[..byte].rfind('\n').map_or(0, |i| i + 1);
    source[line_start..byte].chars().all(is_indent_char)
}

fn is_indent_char(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\x0c'
}

/// Join statement texts into one splice. The first item sits where the
/// replaced node started; later items go on their own lines at `indent`, and
/// an empty item becomes a blank line.
pub fn splice(items: &[String], indent: &str) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            if !item.is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(item);
    }
    out
}

/// What a rule does with the node it just left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Keep the (possibly edited) updated rendering.
    Keep,
    /// Replace the node with this text.
    Replace(String),
    /// Replace the node with several statements, see [`splice`].
    Flatten(Vec<String>),
    /// Drop the node together with the gap in front of it.
    Remove,
}

/// Whether the walk descends into a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Children,
    /// Render the node verbatim without visiting its children.
    Skip,
}

/// Hooks for a single depth-first, bottom-up walk. Only named nodes are
/// reported; keyword and punctuation tokens pass through untouched.
pub trait Transformer<'a> {
    fn enter(&mut self, _node: Node<'a>) -> Result<Visit, Error> {
        Ok(Visit::Children)
    }

    /// Called once every child of `node` has been rendered. `updated` may be
    /// edited in place before answering [`Rewrite::Keep`].
    fn leave(&mut self, node: Node<'a>, updated: &mut Rendered<'a>) -> Result<Rewrite, Error>;
}

/// Indentation shift applied to gaps when a block moves to another column.
#[derive(Debug, Clone, Copy)]
pub struct Reindent<'s> {
    from: &'s str,
    to: &'s str,
}

impl<'s> Reindent<'s> {
    pub fn new(from: &'s str, to: &'s str) -> Self {
        Self { from, to }
    }

    fn push(&self, text: &str, out: &mut String) {
        let mut lines = text.split('\n');
        if let Some(first) = lines.next() {
            out.push_str(first);
        }
        for line in lines {
            out.push('\n');
            match line.strip_prefix(self.from) {
                Some(rest) => {
                    out.push_str(self.to);
                    out.push_str(rest);
                }
                None => out.push_str(line),
            }
        }
    }
}

fn push_shifted(text: &str, out: &mut String, reindent: Option<&Reindent<'_>>) {
    match reindent {
        Some(shift) => shift.push(text, out),
        None => out.push_str(text),
    }
}

/// A node re-rendered from its children.
#[derive(Debug, Clone)]
pub struct Rendered<'a> {
    node: Node<'a>,
    segments: Vec<Segment<'a>>,
}

#[derive(Debug, Clone)]
enum Segment<'a> {
    Gap(Cow<'a, str>),
    Token(&'a str),
    Child(Node<'a>, Output<'a>),
}

#[derive(Debug, Clone)]
enum Output<'a> {
    Tree(Rendered<'a>),
    Text(String),
}

impl<'a> Rendered<'a> {
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, None);
        out
    }

    pub fn write(&self, out: &mut String, reindent: Option<&Reindent<'_>>) {
        self.write_segments(0, out, reindent);
    }

    fn write_segments(&self, start: usize, out: &mut String, reindent: Option<&Reindent<'_>>) {
        // String bodies keep their exact layout wherever they end up.
        let reindent = if self.node.kind() == "string" {
            None
        } else {
            reindent
        };
        for segment in self.segments.iter().skip(start) {
            match segment {
                Segment::Token(text) => out.push_str(text),
                Segment::Gap(text) => push_shifted(text, out, reindent),
                Segment::Child(_, Output::Text(text)) => push_shifted(text, out, reindent),
                Segment::Child(_, Output::Tree(rendered)) => rendered.write(out, reindent),
            }
        }
    }

    fn position(&self, node: Node<'a>) -> Option<usize> {
        self.segments
            .iter()
            .position(|segment| matches!(segment, Segment::Child(child, _) if *child == node))
    }

    /// Rendering of a direct child that no rule has replaced.
    pub fn child(&self, node: Node<'a>) -> Option<&Rendered<'a>> {
        match self.segments.get(self.position(node)?)? {
            Segment::Child(_, Output::Tree(rendered)) => Some(rendered),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, node: Node<'a>) -> Option<&mut Rendered<'a>> {
        let index = self.position(node)?;
        match self.segments.get_mut(index)? {
            Segment::Child(_, Output::Tree(rendered)) => Some(rendered),
            _ => None,
        }
    }

    /// Current text of a direct child, replaced or not.
    pub fn child_text(&self, node: Node<'a>) -> Option<String> {
        match self.segments.get(self.position(node)?)? {
            Segment::Child(_, Output::Tree(rendered)) => Some(rendered.text()),
            Segment::Child(_, Output::Text(text)) => Some(text.clone()),
            _ => None,
        }
    }

    pub fn replace_child(&mut self, node: Node<'a>, text: impl Into<String>) -> bool {
        let Some(index) = self.position(node) else {
            return false;
        };
        if let Some(Segment::Child(_, output)) = self.segments.get_mut(index) {
            *output = Output::Text(text.into());
        }
        true
    }

    /// First anonymous token child of the given kind (`async`, `:`, `elif`).
    pub fn token(&self, kind: &str) -> Option<Node<'a>> {
        self.segments.iter().find_map(|segment| match segment {
            Segment::Child(child, _) if !child.is_named() && child.kind() == kind => Some(*child),
            _ => None,
        })
    }

    /// First named child that is not a comment.
    pub fn first_named_child(&self) -> Option<Node<'a>> {
        self.segments.iter().find_map(|segment| match segment {
            Segment::Child(child, _) if child.is_named() && child.kind() != "comment" => {
                Some(*child)
            }
            _ => None,
        })
    }

    /// Drop an anonymous token and the whitespace after it.
    pub fn drop_token(&mut self, kind: &str) -> bool {
        let Some(index) = self.token(kind).and_then(|token| self.position(token)) else {
            return false;
        };
        self.segments.remove(index);
        if matches!(self.segments.get(index), Some(Segment::Gap(_))) {
            self.segments.remove(index);
        }
        true
    }

    /// Write everything after the child `node`.
    pub fn write_after(&self, node: Node<'a>, out: &mut String, reindent: Option<&Reindent<'_>>) {
        if let Some(index) = self.position(node) {
            self.write_segments(index + 1, out, reindent);
        }
    }
}

/// Walk `node` bottom-up, returning the rule's verdict for it together with
/// its updated rendering.
pub fn render<'a, T: Transformer<'a>>(
    transformer: &mut T,
    node: Node<'a>,
    source: &'a str,
) -> Result<(Rewrite, Rendered<'a>), Error> {
    let visit = if node.is_named() {
        transformer.enter(node)?
    } else {
        Visit::Children
    };

    let mut rendered = Rendered {
        node,
        segments: Vec::new(),
    };

    if node.child_count() == 0 || visit == Visit::Skip {
        rendered.segments.push(Segment::Token(node_text(node, source)));
    } else {
        render_children(transformer, node, source, &mut rendered)?;
    }

    let rewrite = if node.is_named() {
        transformer.leave(node, &mut rendered)?
    } else {
        Rewrite::Keep
    };
    Ok((rewrite, rendered))
}

fn render_children<'a, T: Transformer<'a>>(
    transformer: &mut T,
    node: Node<'a>,
    source: &'a str,
    rendered: &mut Rendered<'a>,
) -> Result<(), Error> {
    let gap = |start: usize, end: usize| Cow::Borrowed(source.get(start..end).unwrap_or(""));

    let mut cursor = node.walk();
    let mut prev_end = node.start_byte();
    // The gap in front of a removed child moves to the next surviving sibling.
    let mut carried: Option<Cow<'a, str>> = None;
    let mut statements_kept = 0usize;
    let mut first_child: Option<Node<'a>> = None;

    for child in node.children(&mut cursor) {
        first_child.get_or_insert(child);
        let before = gap(prev_end, child.start_byte());
        prev_end = child.end_byte();

        let (rewrite, child_rendered) = render(transformer, child, source)?;
        let output = match rewrite {
            Rewrite::Keep => Output::Tree(child_rendered),
            Rewrite::Replace(text) => Output::Text(text),
            Rewrite::Flatten(items) => {
                Output::Text(splice(&items, line_indent(source, child.start_byte())))
            }
            Rewrite::Remove => {
                carried.get_or_insert(before);
                continue;
            }
        };

        if child.kind() != "comment" {
            statements_kept += 1;
        }
        rendered
            .segments
            .push(Segment::Gap(carried.take().unwrap_or(before)));
        rendered.segments.push(Segment::Child(child, output));
    }
    rendered
        .segments
        .push(Segment::Gap(gap(prev_end, node.end_byte())));

    // A block emptied by removals still has to be a valid suite.
    if node.kind() == "block" && statements_kept == 0 {
        let has_comments = rendered
            .segments
            .iter()
            .any(|segment| matches!(segment, Segment::Child(..)));
        if has_comments {
            let indent = first_child.map_or("", |child| line_indent(source, child.start_byte()));
            rendered
                .segments
                .push(Segment::Gap(Cow::Owned(format!("\n{indent}"))));
            rendered.segments.push(Segment::Token("pass"));
        } else {
            rendered.segments = vec![
                Segment::Gap(carried.unwrap_or(Cow::Borrowed(""))),
                Segment::Token("pass"),
            ];
        }
    }
    Ok(())
}

/// Render a whole file, keeping any text outside the root node.
pub fn render_source<'a, T: Transformer<'a>>(
    transformer: &mut T,
    tree: &'a Tree,
    source: &'a str,
) -> Result<String, Error> {
    let root = tree.root_node();
    let (_, rendered) = render(transformer, root, source)?;

    let mut out = String::with_capacity(source.len());
    out.push_str(&source[..root.start_byte()]);
    rendered.write(&mut out, None);
    out.push_str(&source[root.end_byte()..]);
    Ok(out)
}
