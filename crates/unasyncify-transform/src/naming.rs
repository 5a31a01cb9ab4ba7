use crate::Error;

/// Name of the sync twin of `name`.
///
/// Tried in order: `test_async_x -> test_x`, `_ax -> _x`, `ax -> x`. Any other
/// name is an error, as is a name that would derive to nothing.
pub fn derive_twin_name(name: &str) -> Result<String, Error> {
    let derived = if let Some(rest) = name.strip_prefix("test_async_") {
        Some(format!("test_{rest}"))
    } else if let Some(rest) = name.strip_prefix("_a") {
        Some(format!("_{rest}"))
    } else {
        name.strip_prefix('a')
            .filter(|rest| !rest.is_empty())
            .map(str::to_string)
    };

    derived.ok_or_else(|| Error::UnknownNamePattern {
        name: name.to_string(),
    })
}

/// Sync name of a call target, or `None` when the target has no async
/// prefix. `all` is never touched.
pub fn strip_async_prefix(name: &str) -> Option<String> {
    if name == "all" {
        return None;
    }
    if let Some(rest) = name.strip_prefix("_a") {
        return Some(format!("_{rest}"));
    }
    name.strip_prefix('a')
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twin_names() {
        assert_eq!(derive_twin_name("test_async_get").unwrap(), "test_get");
        assert_eq!(derive_twin_name("_ainsert").unwrap(), "_insert");
        assert_eq!(derive_twin_name("aget").unwrap(), "get");
        assert_eq!(derive_twin_name("asave_base").unwrap(), "save_base");
    }

    #[test]
    fn test_unknown_twin_names() {
        for name in ["run", "get_async", "a", "_get", "test_get"] {
            let err = derive_twin_name(name).unwrap_err();
            assert!(
                matches!(&err, Error::UnknownNamePattern { name: n } if n == name),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn test_call_targets() {
        assert_eq!(strip_async_prefix("afoo").as_deref(), Some("foo"));
        assert_eq!(strip_async_prefix("_afetch").as_deref(), Some("_fetch"));
        assert_eq!(strip_async_prefix("all"), None);
        assert_eq!(strip_async_prefix("a"), None);
        assert_eq!(strip_async_prefix("sleep"), None);
    }
}
