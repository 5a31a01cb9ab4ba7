//! Generate synchronous twins of async Python functions.
//!
//! A function opts in with `@generate_unasynced`; every run places a fresh
//! sync copy (decorated `@from_codegen`) directly above it, replacing the twin
//! produced by the previous run. Text the rules do not touch is reproduced
//! exactly, so running twice gives the same file.
//!
//! ```ignore
//! use unasyncify_transform::{Options, transform_source};
//!
//! let out = transform_source(source, &Options::default())?;
//! std::fs::write(path, out.text)?;
//! ```

mod branch;
mod error;
mod imports;
mod lower;
mod marker;
mod naming;
mod options;
mod renames;
mod rewrite;
mod shape;
mod synth;
mod tree;
mod twin;

pub use error::Error;
pub use imports::{ImportSet, insert_imports};
pub use marker::{
    ASYNC_UNSAFE, DEFAULT_ASYNC_MARKER, DecoratorMarker, FROM_CODEGEN, GENERATE_UNASYNCED,
    classify, is_generated,
};
pub use naming::{derive_twin_name, strip_async_prefix};
pub use options::Options;
pub use renames::RenameTable;
pub use tree::parse;

use synth::TwinSynthesizer;

/// Result of transforming one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub text: String,
    /// Number of twins emitted.
    pub twins: usize,
    /// Marker imports the module needs.
    pub imports: ImportSet,
}

/// Regenerate every twin in `source`.
pub fn transform_source(source: &str, options: &Options) -> Result<Transformed, Error> {
    let tree = parse(source)?;
    let mut synthesizer = TwinSynthesizer::new(source, options);
    let text = tree::render_source(&mut synthesizer, &tree, source)?;

    let text = if synthesizer.imports.is_empty() {
        text
    } else {
        insert_imports(&text, &synthesizer.imports)?
    };

    Ok(Transformed {
        text,
        twins: synthesizer.twins,
        imports: synthesizer.imports,
    })
}
