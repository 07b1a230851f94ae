//! Response-shape path extraction.
//!
//! Vendor response shapes drift across API versions, so each adapter keeps
//! an explicit ordered list of known paths, most-recent-first. Extraction
//! tries each path in order and takes the first non-empty string.

use serde_json::Value;

/// Look up a dotted path in a JSON value.
///
/// Segments are separated by `.`; a trailing `[n]` on a segment indexes
/// into an array, e.g. `data.task_result.videos[0].url`.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        let (key, index) = parse_segment(segment)?;
        if !key.is_empty() {
            current = current.get(key)?;
        }
        if let Some(i) = index {
            current = current.get(i)?;
        }
    }
    Some(current)
}

/// Try each path in order, returning the first non-empty string value.
pub fn first_string(value: &Value, paths: &[&str]) -> Option<String> {
    for path in paths {
        if let Some(Value::String(s)) = lookup_path(value, path) {
            let s = s.trim();
            if !s.is_empty() {
                return Some(s.to_string());
            }
        }
    }
    None
}

/// Try each path in order, returning the first number coerced to u64.
pub fn first_u64(value: &Value, paths: &[&str]) -> Option<u64> {
    for path in paths {
        match lookup_path(value, path) {
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    return Some(v);
                }
            }
            Some(Value::String(s)) => {
                if let Ok(v) = s.trim().parse() {
                    return Some(v);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a path segment into its key and optional `[index]` suffix.
fn parse_segment(segment: &str) -> Option<(&str, Option<usize>)> {
    match segment.find('[') {
        None => Some((segment, None)),
        Some(open) => {
            let close = segment.rfind(']')?;
            if close < open {
                return None;
            }
            let index: usize = segment[open + 1..close].parse().ok()?;
            Some((&segment[..open], Some(index)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_path() {
        let v = json!({"data": {"task_result": {"videos": [{"url": "https://a/v.mp4"}]}}});
        let got = lookup_path(&v, "data.task_result.videos[0].url");
        assert_eq!(got, Some(&json!("https://a/v.mp4")));
    }

    #[test]
    fn test_lookup_missing_path() {
        let v = json!({"data": {}});
        assert!(lookup_path(&v, "data.task_result.videos[0].url").is_none());
        assert!(lookup_path(&v, "data.items[5]").is_none());
    }

    #[test]
    fn test_first_string_preference_order() {
        // Most-recent-first: the unwatermarked asset wins when both exist
        let v = json!({
            "assets": {"video": "https://a/raw.mp4", "video_watermarked": "https://a/wm.mp4"}
        });
        let got = first_string(&v, &["assets.video", "assets.video_watermarked"]);
        assert_eq!(got.as_deref(), Some("https://a/raw.mp4"));

        // Falls through to the older shape when the first path is absent
        let v = json!({"assets": {"video_watermarked": "https://a/wm.mp4"}});
        let got = first_string(&v, &["assets.video", "assets.video_watermarked"]);
        assert_eq!(got.as_deref(), Some("https://a/wm.mp4"));
    }

    #[test]
    fn test_first_string_skips_empty_values() {
        let v = json!({"assets": {"video": "  ", "video_watermarked": "https://a/wm.mp4"}});
        let got = first_string(&v, &["assets.video", "assets.video_watermarked"]);
        assert_eq!(got.as_deref(), Some("https://a/wm.mp4"));
    }

    #[test]
    fn test_first_u64_coerces_strings() {
        let v = json!({"data": {"progress": "42"}});
        assert_eq!(first_u64(&v, &["progress", "data.progress"]), Some(42));
        let v = json!({"progress": 88});
        assert_eq!(first_u64(&v, &["progress"]), Some(88));
    }
}
