//! Layer merge
//!
//! - Objects: deep-merge by key
//! - Arrays: replace (last wins)
//! - Scalars: override (last wins)

use serde_json::Value;

/// Deep merge `overlay` onto `base`.
///
/// A `null` in the overlay leaves the base value in place, so CLI layers
/// can carry every flag and only the ones actually given take effect.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let result = deep_merge(json!({"timeout_minutes": 30}), json!({"timeout_minutes": 5}));
        assert_eq!(result["timeout_minutes"], 5);
    }

    #[test]
    fn test_null_keeps_base() {
        let result = deep_merge(
            json!({"scheduler_bin": "arena", "poll_interval_seconds": 3}),
            json!({"scheduler_bin": null, "poll_interval_seconds": 1}),
        );
        assert_eq!(result["scheduler_bin"], "arena");
        assert_eq!(result["poll_interval_seconds"], 1);
    }

    #[test]
    fn test_nested_objects_merge() {
        let result = deep_merge(
            json!({"logging": {"filter": "info", "ansi": false}}),
            json!({"logging": {"filter": "debug"}}),
        );
        assert_eq!(result["logging"]["filter"], "debug");
        assert_eq!(result["logging"]["ansi"], false);
    }

    #[test]
    fn test_array_replace() {
        let result = deep_merge(json!({"data": ["a:/a", "b:/b"]}), json!({"data": ["c:/c"]}));
        assert_eq!(result["data"], json!(["c:/c"]));
    }

    #[test]
    fn test_merge_layers_precedence() {
        let merged = merge_layers(vec![
            json!({"timeout_minutes": 30, "wait_mode": "running"}),
            json!({"timeout_minutes": 10}),
            json!({"wait_mode": "terminal", "timeout_minutes": null}),
        ]);
        assert_eq!(merged["timeout_minutes"], 10);
        assert_eq!(merged["wait_mode"], "terminal");
    }
}
