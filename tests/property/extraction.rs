//! Recovery of JSON objects from free-form model output

use brandline::error::StageError;
use brandline::extract::{extract_json, ExtractionPath};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn flat_object() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z_]{1,12}", "[A-Za-z0-9 .,!?'-]{0,40}", 0..6).prop_map(
        |entries| {
            let map: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            Value::Object(map)
        },
    )
}

/// Prose with no braces, as chatty models put around their answer.
fn prose() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .,:;!?'\n-]{0,80}"
}

proptest! {
    #[test]
    fn test_wrapped_object_matches_direct_parse(
        object in flat_object(),
        before in prose(),
        after in prose(),
    ) {
        let text = format!("{}{}{}", before, object, after);
        let extracted = extract_json(&text).unwrap();
        prop_assert_eq!(&extracted.value, &object);

        let direct = extract_json(&object.to_string()).unwrap();
        prop_assert_eq!(direct.path, ExtractionPath::Direct);
        prop_assert_eq!(direct.value, extracted.value);
    }

    #[test]
    fn test_text_without_braces_is_an_extraction_error(text in prose()) {
        let is_extraction_error = matches!(extract_json(&text), Err(StageError::Extraction { .. }));
        prop_assert!(is_extraction_error);
    }

    #[test]
    fn test_surrounding_whitespace_keeps_direct_path(
        object in flat_object(),
        pad in "[ \t\n]{0,6}",
    ) {
        let text = format!("{pad}{object}{pad}");
        let extracted = extract_json(&text).unwrap();
        prop_assert_eq!(extracted.path, ExtractionPath::Direct);
        prop_assert_eq!(extracted.value, object);
    }
}

#[test]
fn test_nested_object_in_fenced_block() {
    let expected = json!({"overall": {"average_score": 4}, "items": [{"asset_id": "landing_page"}]});
    let text = format!("```json\n{}\n```", serde_json::to_string_pretty(&expected).unwrap());
    let extracted = extract_json(&text).unwrap();
    assert_eq!(extracted.path, ExtractionPath::Recovered);
    assert_eq!(extracted.value, expected);
}
