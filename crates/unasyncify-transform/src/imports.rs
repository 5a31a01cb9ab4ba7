//! Tracking and inserting the marker imports a rewritten module needs.

use crate::tree::{node_text, parse, statement_expression};
use crate::Error;
use std::collections::{BTreeMap, BTreeSet};
use tree_sitter::Node;

/// Symbols to import, per module. Both levels are kept in lexical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    modules: BTreeMap<String, BTreeSet<String>>,
}

impl ImportSet {
    pub fn insert(&mut self, module: &str, name: &str) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.modules
            .get(module)
            .is_some_and(|names| names.contains(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, impl Iterator<Item = &str>)> {
        self.modules
            .iter()
            .map(|(module, names)| (module.as_str(), names.iter().map(String::as_str)))
    }
}

/// Make sure every symbol in `imports` is imported by `source`.
pub fn insert_imports(source: &str, imports: &ImportSet) -> Result<String, Error> {
    let mut text = source.to_string();
    for (module, names) in imports.iter() {
        let names: Vec<&str> = names.collect();
        text = insert_module_import(&text, module, &names)?;
    }
    Ok(text)
}

fn insert_module_import(source: &str, module: &str, names: &[&str]) -> Result<String, Error> {
    let tree = parse(source)?;
    let root = tree.root_node();
    let mut cursor = root.walk();
    let statements: Vec<Node<'_>> = root
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();

    let existing = statements.iter().copied().find(|statement| {
        statement.kind() == "import_from_statement"
            && statement
                .child_by_field_name("module_name")
                .is_some_and(|name| node_text(name, source) == module)
    });

    if let Some(statement) = existing {
        let Some(bound) = bound_names(statement, source) else {
            return Ok(source.to_string());
        };
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| !bound.contains(name))
            .collect();
        if missing.is_empty() {
            return Ok(source.to_string());
        }

        let mut cursor = statement.walk();
        let last_name = statement
            .children_by_field_name("name", &mut cursor)
            .last();
        if let Some(last_name) = last_name {
            tracing::debug!(module, names = ?missing, "extending import");
            let mut addition = String::new();
            for name in missing {
                addition.push_str(", ");
                addition.push_str(name);
            }
            return Ok(insert_at(source, last_name.end_byte(), &addition));
        }
    }

    let statement = format!("from {module} import {}", names.join(", "));
    tracing::debug!(%statement, "adding import");

    let docstring = statements.first().copied().filter(|first| is_docstring(*first));
    let body_start = usize::from(docstring.is_some());
    let header = &statements[body_start.min(statements.len())..];
    let imports = header
        .iter()
        .take_while(|statement| is_import(**statement))
        .count();
    let last_import = imports.checked_sub(1).map(|last| header[last]);

    let text = match (last_import, docstring, statements.get(body_start)) {
        (Some(import), _, _) => {
            let end = import.end_byte();
            let separated = header
                .get(imports)
                .is_none_or(|next| has_blank_line(&source[end..next.start_byte()]));
            let addition = if separated {
                format!("\n{statement}")
            } else {
                format!("\n{statement}\n")
            };
            insert_at(source, end, &addition)
        }
        (None, Some(doc), _) => insert_at(source, doc.end_byte(), &format!("\n\n{statement}")),
        (None, None, Some(first)) => {
            insert_at(source, first.start_byte(), &format!("{statement}\n\n"))
        }
        (None, None, None) => {
            let mut text = source.to_string();
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&statement);
            text.push('\n');
            text
        }
    };
    Ok(text)
}

/// Names bound by a `from ... import` statement; `None` for a wildcard.
fn bound_names<'s>(statement: Node<'_>, source: &'s str) -> Option<BTreeSet<&'s str>> {
    let mut cursor = statement.walk();
    if statement
        .named_children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import")
    {
        return None;
    }

    let mut cursor = statement.walk();
    let names = statement
        .children_by_field_name("name", &mut cursor)
        .filter_map(|name| match name.kind() {
            "aliased_import" => name.child_by_field_name("alias"),
            _ => Some(name),
        })
        .map(|name| node_text(name, source))
        .collect();
    Some(names)
}

fn is_import(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "import_statement" | "import_from_statement" | "future_import_statement"
    )
}

fn is_docstring(node: Node<'_>) -> bool {
    statement_expression(node)
        .is_some_and(|expr| matches!(expr.kind(), "string" | "concatenated_string"))
}

/// Whether the text between two statements contains an empty line.
fn has_blank_line(gap: &str) -> bool {
    let lines: Vec<&str> = gap.split('\n').collect();
    lines.len() > 2
        && lines[1..lines.len() - 1]
            .iter()
            .any(|line| line.trim().is_empty())
}

fn insert_at(source: &str, at: usize, text: &str) -> String {
    let mut out = String::with_capacity(source.len() + text.len());
    out.push_str(&source[..at]);
    out.push_str(text);
    out.push_str(&source[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helpers(names: &[&str]) -> ImportSet {
        let mut imports = ImportSet::default();
        for name in names {
            imports.insert("unasync_utils", name);
        }
        imports
    }

    #[test]
    fn test_extends_existing_import() {
        let source = "from unasync_utils import IS_ASYNC, generate_unasynced\n\nx = 1\n";
        let out = insert_imports(source, &helpers(&["from_codegen", "generate_unasynced"])).unwrap();
        assert_eq!(
            out,
            "from unasync_utils import IS_ASYNC, generate_unasynced, from_codegen\n\nx = 1\n"
        );
    }

    #[test]
    fn test_alias_and_wildcard_count_as_imported() {
        let aliased = "from unasync_utils import from_codegen as fc\n";
        let out = insert_imports(aliased, &helpers(&["fc"])).unwrap();
        assert_eq!(out, aliased);

        let wildcard = "from unasync_utils import *\n";
        let out = insert_imports(wildcard, &helpers(&["from_codegen"])).unwrap();
        assert_eq!(out, wildcard);
    }

    #[test]
    fn test_new_import_after_header_imports() {
        let source = "\"\"\"Doc.\"\"\"\nimport os\nfrom typing import Any\n\nx = 1\n";
        let out = insert_imports(source, &helpers(&["generate_unasynced", "from_codegen"])).unwrap();
        assert_eq!(
            out,
            "\"\"\"Doc.\"\"\"\nimport os\nfrom typing import Any\nfrom unasync_utils import from_codegen, generate_unasynced\n\nx = 1\n"
        );
    }

    #[test]
    fn test_new_import_after_docstring() {
        let source = "\"\"\"Doc.\"\"\"\n\nx = 1\n";
        let out = insert_imports(source, &helpers(&["from_codegen"])).unwrap();
        assert_eq!(
            out,
            "\"\"\"Doc.\"\"\"\n\nfrom unasync_utils import from_codegen\n\nx = 1\n"
        );
    }

    #[test]
    fn test_new_import_after_future_import_below_docstring() {
        let source = "\"\"\"Doc.\"\"\"\nfrom __future__ import annotations\n\nimport os\n\n\ndef f():\n    pass\n";
        let out = insert_imports(source, &helpers(&["from_codegen"])).unwrap();
        assert_eq!(
            out,
            "\"\"\"Doc.\"\"\"\nfrom __future__ import annotations\n\nimport os\nfrom unasync_utils import from_codegen\n\n\ndef f():\n    pass\n"
        );
    }

    #[test]
    fn test_new_import_separated_from_following_code() {
        let source = "from __future__ import annotations\n# note\ndef f():\n    pass\n";
        let out = insert_imports(source, &helpers(&["from_codegen"])).unwrap();
        assert_eq!(
            out,
            "from __future__ import annotations\nfrom unasync_utils import from_codegen\n\n# note\ndef f():\n    pass\n"
        );
    }

    #[test]
    fn test_docstring_detection() {
        let source = "\"\"\"Doc.\"\"\"\nx = 1\n";
        let tree = parse(source).unwrap();
        let root = tree.root_node();
        assert!(is_docstring(root.named_child(0).unwrap()));
        assert!(!is_docstring(root.named_child(1).unwrap()));
    }

    #[test]
    fn test_new_import_before_first_statement() {
        let source = "# header comment\nx = 1\n";
        let out = insert_imports(source, &helpers(&["from_codegen"])).unwrap();
        assert_eq!(
            out,
            "# header comment\nfrom unasync_utils import from_codegen\n\nx = 1\n"
        );
    }

    #[test]
    fn test_modules_are_handled_in_order() {
        let mut imports = helpers(&["from_codegen"]);
        imports.insert("django.utils.asyncio", "async_unsafe");
        let source = "from unasync_utils import generate_unasynced\n";
        let out = insert_imports(source, &imports).unwrap();
        assert_eq!(
            out,
            "from unasync_utils import generate_unasynced, from_codegen\nfrom django.utils.asyncio import async_unsafe\n"
        );
    }
}
