use serde_json::Value;

/// Shown whenever a catalog row has no image of its own.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://storage.dentascan.app/assets/placeholder-card.jpg";

/// The `keys` column is free-form legacy data: either a comma-joined string
/// or an actual JSON array of strings. Canonicalize to a list here so the
/// rest of the code never sees the ambiguity.
pub fn normalize_keys(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

pub fn normalize_image(value: Option<String>) -> String {
    match value {
        Some(url) if !url.is_empty() => url,
        _ => PLACEHOLDER_IMAGE_URL.to_string(),
    }
}

pub fn normalize_rating(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn comma_joined_string_becomes_trimmed_list() {
        let value = json!("caries, gigi berlubang , , prevention");
        assert_eq!(
            normalize_keys(Some(&value)),
            vec!["caries", "gigi berlubang", "prevention"]
        );
    }

    #[test]
    fn existing_list_passes_through_unchanged() {
        let value = json!([" caries", "prevention "]);
        assert_eq!(normalize_keys(Some(&value)), vec![" caries", "prevention "]);
    }

    #[test]
    fn missing_or_null_keys_become_empty_list() {
        assert!(normalize_keys(None).is_empty());
        assert!(normalize_keys(Some(&Value::Null)).is_empty());
    }

    #[test]
    fn missing_image_gets_the_placeholder() {
        assert_eq!(normalize_image(None), PLACEHOLDER_IMAGE_URL);
        assert_eq!(normalize_image(Some(String::new())), PLACEHOLDER_IMAGE_URL);
        assert_eq!(
            normalize_image(Some("https://cdn.example/a.jpg".into())),
            "https://cdn.example/a.jpg"
        );
    }

    #[test]
    fn missing_rating_is_zero() {
        assert_eq!(normalize_rating(None), 0.0);
        assert_eq!(normalize_rating(Some(4.5)), 4.5);
    }
}
