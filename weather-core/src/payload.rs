use serde::de::DeserializeOwned;

/// Decode the outermost `{...}` fragment embedded in `text` into `T`.
///
/// The fragment runs from the first `{` to the last `}`, so nested objects and
/// surrounding chatter (progress lines, banners) are tolerated.
pub(crate) fn extract_object<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    let start = text
        .find('{')
        .ok_or_else(|| "output has no dictionary inside".to_string())?;
    let end = text
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| "output has no dictionary inside".to_string())?;

    serde_json::from_str(&text[start..=end])
        .map_err(|err| format!("embedded dictionary is malformed ({err})"))
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn finds_object_between_noise() {
        let value: Value = extract_object("progress... {\"a\": {\"b\": 1}} done").unwrap();
        assert_eq!(value["a"]["b"], 1);
    }

    #[test]
    fn spans_multiple_lines() {
        let value: Value =
            extract_object("{\n  \"latitude\": 1.0,\n  \"longitude\": 2.0\n}").unwrap();
        assert_eq!(value.as_object().map(|map| map.len()), Some(2));
    }

    #[test]
    fn rejects_text_without_braces() {
        assert!(extract_object::<Value>("Output without dictionary").is_err());
        assert!(extract_object::<Value>("} reversed {").is_err());
    }

    #[test]
    fn rejects_broken_dictionaries() {
        for text in [
            "Output without dictionary: {broken dictionary]",
            "Output without dictionary: {'also': 'broken', dictionary, 'a': '1'}",
            "Output without dictionary: {'broken': 'dictionary', 'too': ''}}",
            "{\"ok\": 1}}",
        ] {
            assert!(extract_object::<Value>(text).is_err(), "accepted {text}");
        }
    }
}
