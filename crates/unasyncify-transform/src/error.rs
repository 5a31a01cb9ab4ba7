//! Errors raised while transforming a single file.

/// A fatal transformation error. Any of these aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid `@generate_unasynced` on `{function}`: {detail}")]
    MarkerShape { function: String, detail: String },

    #[error(
        "unknown name replacement pattern for `{name}` \
         (expected a `test_async_`, `_a` or `a` prefix)"
    )]
    UnknownNamePattern { name: String },
}
