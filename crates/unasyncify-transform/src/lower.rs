//! Lowering of async-only syntax.

use crate::tree::{Rendered, Rewrite};

/// `await expr` becomes `expr`.
pub fn unwrap_await(updated: &Rendered<'_>) -> Rewrite {
    match updated
        .first_named_child()
        .and_then(|inner| updated.child_text(inner))
    {
        Some(inner) => Rewrite::Replace(inner),
        None => Rewrite::Keep,
    }
}

/// Remove the `async` qualifier of a `for`, `with`, comprehension clause or
/// function signature.
pub fn strip_async(updated: &mut Rendered<'_>) -> Rewrite {
    updated.drop_token("async");
    Rewrite::Keep
}
