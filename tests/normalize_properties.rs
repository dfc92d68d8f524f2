// tests/normalize_properties.rs
//
// Response-shape properties of the reading normalizer, through the public API.

use co2_reading::normalize::{content_items, normalize, ContentItem};
use co2_reading::{FetchError, Reading};
use serde_json::json;

fn reading(ppm: f64, source: &str, timestamp: &str) -> Reading {
    Reading {
        concentration: ppm,
        source: source.to_string(),
        timestamp: timestamp.to_string(),
    }
}

#[test]
fn structured_reply_values_pass_through_untouched() {
    for (ppm, source, ts) in [
        (421.3, "https://example.org/co2", "2024-05-01T00:00:00Z"),
        (419.05, "https://gml.noaa.gov/ccgg/trends/", "2023-12-31T23:59:59+00:00"),
        (0.5, " https://padded.example ", "2024-01-01"),
    ] {
        let body = json!({
            "id": "resp_1",
            "output": [
                { "type": "web_search_call", "id": "ws_1", "status": "completed" },
                { "type": "message", "role": "assistant", "content": [
                    { "type": "output_json", "json": { "ppm": ppm, "source": source, "timestamp": ts } }
                ]}
            ]
        });
        assert_eq!(normalize(&body).unwrap(), reading(ppm, source, ts));
    }
}

#[test]
fn legacy_free_text_reply_is_parsed() {
    let body = json!({
        "output": [{ "type": "message", "content": [
            { "type": "output_text", "text": "{\"ppm\": 423.9, \"source\": \"https://a.example\", \"timestamp\": \"2025-01-01T00:00:00Z\"}", "annotations": [] }
        ]}]
    });
    assert_eq!(
        normalize(&body).unwrap(),
        reading(423.9, "https://a.example", "2025-01-01T00:00:00Z")
    );
}

#[test]
fn aggregate_output_text_string_and_list() {
    let text = "{\"ppm\": 424, \"source\": \"https://b.example\", \"timestamp\": \"2025-02-01T00:00:00Z\"}";
    let expected = reading(424.0, "https://b.example", "2025-02-01T00:00:00Z");

    assert_eq!(normalize(&json!({ "output_text": text })).unwrap(), expected);
    assert_eq!(
        normalize(&json!({ "output_text": [text, "{}"] })).unwrap(),
        expected
    );
}

#[test]
fn content_item_text_is_preferred_over_aggregate() {
    let body = json!({
        "output": [{ "type": "message", "content": [
            { "type": "output_text", "text": "{\"ppm\": 1.5, \"source\": \"https://item.example\", \"timestamp\": \"t\"}" }
        ]}],
        "output_text": "{\"ppm\": 2.5, \"source\": \"https://aggregate.example\", \"timestamp\": \"t\"}"
    });
    assert_eq!(normalize(&body).unwrap().source, "https://item.example");
}

#[test]
fn nothing_usable_is_no_content() {
    let body = json!({
        "output": [{ "type": "web_search_call", "status": "completed" }],
        "output_text": []
    });
    assert!(matches!(normalize(&body), Err(FetchError::NoContent)));
}

#[test]
fn unparseable_text_is_malformed_json() {
    let body = json!({ "output_text": "{\"ppm\": 421.3, \"source\": " });
    let err = normalize(&body).unwrap_err();
    assert!(matches!(err, FetchError::MalformedJson(_)));
    assert_eq!(err.kind(), "malformed_json");
}

#[test]
fn missing_source_fails_validation_naming_source() {
    let body = json!({
        "output": [{ "type": "message", "content": [
            { "type": "output_json", "json": { "ppm": 421.3, "timestamp": "2024-05-01T00:00:00Z" } }
        ]}]
    });
    let err = normalize(&body).unwrap_err();
    match &err {
        FetchError::Validation { missing } => assert_eq!(missing, &vec!["source"]),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(err.to_string().contains("source"));
}

#[test]
fn items_are_classified_in_order() {
    let body = json!({
        "output": [
            { "type": "web_search_call" },
            { "type": "message", "content": [
                { "type": "output_text", "text": "a" },
                { "type": "output_json", "json": { "ppm": 1 } }
            ]}
        ]
    });
    assert_eq!(
        content_items(&body),
        vec![
            ContentItem::Other,
            ContentItem::FreeText("a".into()),
            ContentItem::StructuredJson(json!({ "ppm": 1 })),
        ]
    );
}
