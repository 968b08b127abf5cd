use serde_json::Value;

/// Resolves a dotted `path` against an arbitrary JSON value.
///
/// An empty path returns `value` unchanged; templates use it to opt out of
/// extraction. Each segment is a checked lookup: objects are indexed by
/// key, arrays by numeric position. A missing or non-indexable step
/// short-circuits to `None` instead of failing, since absence is
/// meaningful (e.g. "this backend has no context-length field").
pub fn resolve<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.')
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_path_is_identity() {
        let value = json!({"a": {"b": 7}});
        assert_eq!(resolve(&value, ""), Some(&value));
        assert_eq!(resolve(&json!(null), ""), Some(&json!(null)));
    }

    #[test]
    fn walks_nested_objects() {
        let value = json!({"a": {"b": 7}});
        assert_eq!(resolve(&value, "a.b"), Some(&json!(7)));
    }

    #[test]
    fn missing_step_resolves_to_none() {
        assert_eq!(resolve(&json!({"a": {}}), "a.b"), None);
        assert_eq!(resolve(&json!({"a": 3}), "a.b.c"), None);
        assert_eq!(resolve(&json!("flat"), "a"), None);
    }

    #[test]
    fn indexes_arrays_by_position() {
        let value = json!({"data": [{"id": "m1"}, {"id": "m2"}]});
        assert_eq!(resolve(&value, "data.1.id"), Some(&json!("m2")));
        assert_eq!(resolve(&value, "data.9.id"), None);
        assert_eq!(resolve(&value, "data.x"), None);
    }
}
