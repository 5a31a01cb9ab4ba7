//! The file pass: regenerate every twin in a module.

use crate::imports::ImportSet;
use crate::marker::{
    ASYNC_UNSAFE, DecoratorMarker, FROM_CODEGEN, GENERATE_UNASYNCED, classify, is_generated,
};
use crate::options::Options;
use crate::renames::RenameTable;
use crate::tree::{Rendered, Rewrite, Transformer, Visit};
use crate::twin::synthesize;
use crate::Error;
use tree_sitter::Node;

pub(crate) struct TwinSynthesizer<'a, 'o> {
    source: &'a str,
    options: &'o Options,
    table: RenameTable,
    pub(crate) imports: ImportSet,
    pub(crate) twins: usize,
}

impl<'a, 'o> TwinSynthesizer<'a, 'o> {
    pub(crate) fn new(source: &'a str, options: &'o Options) -> Self {
        Self {
            source,
            options,
            table: options.rename_table(),
            imports: ImportSet::default(),
            twins: 0,
        }
    }
}

impl<'a> Transformer<'a> for TwinSynthesizer<'a, '_> {
    fn enter(&mut self, node: Node<'a>) -> Result<Visit, Error> {
        if node.kind() == "decorated_definition" && is_generated(node, self.source) {
            return Ok(Visit::Skip);
        }
        Ok(Visit::Children)
    }

    fn leave(&mut self, node: Node<'a>, updated: &mut Rendered<'a>) -> Result<Rewrite, Error> {
        if node.kind() != "decorated_definition" {
            return Ok(Rewrite::Keep);
        }

        match classify(node, self.source)? {
            DecoratorMarker::Plain => Ok(Rewrite::Keep),
            // Stale twins go; the source that follows brings a fresh one.
            DecoratorMarker::Generated => Ok(Rewrite::Remove),
            DecoratorMarker::Fresh { async_unsafe } => {
                let twin = synthesize(
                    node,
                    self.source,
                    &self.table,
                    &self.options.async_marker,
                    async_unsafe,
                )?;

                let helpers = &self.options.helpers_import_path;
                self.imports.insert(helpers, FROM_CODEGEN);
                self.imports.insert(helpers, GENERATE_UNASYNCED);
                if twin.marker_seen {
                    self.imports.insert(helpers, &self.options.async_marker);
                }
                if async_unsafe {
                    self.imports
                        .insert(self.options.async_unsafe_module(), ASYNC_UNSAFE);
                }
                self.twins += 1;

                Ok(Rewrite::Flatten(vec![twin.text, String::new(), updated.text()]))
            }
        }
    }
}
