//! Normalization of OCR engine output into [`TextLine`]s.
//!
//! Engine releases disagree on the shape of their results:
//!
//! - the dict schema holds parallel arrays (`rec_texts`, `rec_scores`,
//!   `rec_boxes`), possibly wrapped in a `prunedResult` or `res` envelope;
//! - the legacy schema is a list of `[bbox, [text, score]]` tuples, usually
//!   nested once per input image, with `null` standing for "nothing found";
//! - some builds return bare strings.
//!
//! All of them are accepted here; nothing outside this module needs to know
//! which one the engine produced.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::FileKind;

/// Keys marking the parallel-array schema.
const PARALLEL_KEYS: [&str; 4] = ["rec_texts", "rec_scores", "rec_boxes", "rec_polys"];

/// Keys holding boxes, in order of preference.
const BOX_KEYS: [&str; 3] = ["rec_boxes", "rec_polys", "dt_polys"];

/// Keys wrapping the actual result.
const ENVELOPE_KEYS: [&str; 2] = ["prunedResult", "res"];

/// A single recognized line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct TextLine {
    /// Recognized text.
    pub text: String,
    /// Recognition confidence reported by the engine, `0.0` when unknown.
    pub confidence: f64,
    /// Bounding box or polygon, `[]` when unknown.
    pub bbox: Value,
    /// One-based page number, present for PDF input only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl TextLine {
    /// Creates a line without a page number.
    pub fn new(text: impl Into<String>, confidence: f64, bbox: Value) -> Self {
        Self {
            text: text.into(),
            confidence,
            bbox,
            page: None,
        }
    }

    /// Sets the one-based page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// Normalizes raw per-page engine payloads into text lines.
///
/// Image lines carry no page number. PDF lines are numbered from 1, using the
/// engine's `page_index` when present and the payload position otherwise.
pub fn normalize_pages(kind: FileKind, pages: &[Value]) -> Vec<TextLine> {
    match kind {
        FileKind::Image => pages.iter().flat_map(normalize_payload).collect(),
        FileKind::Pdf => pages
            .iter()
            .enumerate()
            .flat_map(|(position, page)| {
                let index = page_index(page).unwrap_or(position);
                let number = u32::try_from(index + 1).unwrap_or(u32::MAX);
                normalize_payload(page)
                    .into_iter()
                    .map(move |line| line.with_page(number))
            })
            .collect(),
    }
}

/// Normalizes a single page payload in any supported schema.
pub fn normalize_payload(payload: &Value) -> Vec<TextLine> {
    let payload = unwrap_envelope(payload);

    if let Some(lines) = from_parallel_arrays(payload) {
        return lines;
    }

    if let Some(lines) = from_legacy_list(payload) {
        return lines;
    }

    from_strings(payload)
}

fn is_envelope(map: &Map<String, Value>) -> bool {
    ENVELOPE_KEYS
        .iter()
        .chain(PARALLEL_KEYS.iter())
        .any(|key| map.contains_key(*key))
}

fn unwrap_envelope(mut payload: &Value) -> &Value {
    loop {
        match payload {
            Value::Object(map) if !PARALLEL_KEYS.iter().any(|key| map.contains_key(*key)) => {
                match ENVELOPE_KEYS.iter().find_map(|key| map.get(*key)) {
                    Some(inner) => payload = inner,
                    None => return payload,
                }
            }
            Value::Array(items) if items.len() == 1 => match &items[0] {
                Value::Object(map) if is_envelope(map) => payload = &items[0],
                _ => return payload,
            },
            _ => return payload,
        }
    }
}

fn page_index(page: &Value) -> Option<usize> {
    let read = |value: &Value| {
        value
            .get("page_index")
            .and_then(Value::as_u64)
            .and_then(|index| usize::try_from(index).ok())
    };

    read(page).or_else(|| read(unwrap_envelope(page)))
}

fn from_parallel_arrays(payload: &Value) -> Option<Vec<TextLine>> {
    let map = payload.as_object()?;
    if !PARALLEL_KEYS.iter().any(|key| map.contains_key(*key)) {
        return None;
    }

    let array = |key: &str| map.get(key).and_then(Value::as_array);
    let texts = array("rec_texts").map(Vec::as_slice).unwrap_or_default();
    let scores = array("rec_scores").map(Vec::as_slice).unwrap_or_default();
    let boxes = BOX_KEYS
        .iter()
        .filter_map(|key| array(*key))
        .find(|boxes| !boxes.is_empty())
        .map(Vec::as_slice)
        .unwrap_or_default();

    let lines = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            TextLine::new(
                text_of(text),
                scores.get(i).map(score_of).unwrap_or(0.0),
                boxes.get(i).cloned().unwrap_or_else(empty_bbox),
            )
        })
        .collect();

    Some(lines)
}

fn from_legacy_list(payload: &Value) -> Option<Vec<TextLine>> {
    let items = payload.as_array()?;

    if items.iter().all(Value::is_null) {
        return Some(Vec::new());
    }

    if items.iter().any(is_legacy_line) {
        return Some(items.iter().filter_map(legacy_line).collect());
    }

    let nested = items
        .iter()
        .filter_map(Value::as_array)
        .any(|group| group.iter().any(is_legacy_line));

    if nested {
        let lines = items
            .iter()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(legacy_line)
            .collect();
        return Some(lines);
    }

    None
}

/// Matches `[bbox, [text, score]]` and `{"text": ...}` items.
fn is_legacy_line(item: &Value) -> bool {
    match item {
        Value::Array(parts) => parts
            .get(1)
            .and_then(Value::as_array)
            .and_then(|pair| pair.first())
            .is_some_and(Value::is_string),
        Value::Object(map) => map.contains_key("text"),
        _ => false,
    }
}

fn legacy_line(item: &Value) -> Option<TextLine> {
    match item {
        Value::Array(parts) => {
            let pair = parts.get(1).and_then(Value::as_array)?;
            let text = pair.first().map(text_of)?;
            let confidence = pair.get(1).map(score_of).unwrap_or(0.0);
            let bbox = parts.first().cloned().unwrap_or_else(empty_bbox);
            Some(TextLine::new(text, confidence, bbox))
        }
        Value::Object(map) => line_from_object(map),
        Value::String(text) => Some(TextLine::new(text.as_str(), 0.0, empty_bbox())),
        _ => None,
    }
}

fn line_from_object(map: &Map<String, Value>) -> Option<TextLine> {
    let text = map.get("text").map(text_of)?;
    let confidence = ["score", "confidence"]
        .iter()
        .find_map(|key| map.get(*key))
        .map(score_of)
        .unwrap_or(0.0);
    let bbox = ["bbox", "box"]
        .iter()
        .find_map(|key| map.get(*key))
        .cloned()
        .unwrap_or_else(empty_bbox);

    Some(TextLine::new(text, confidence, bbox))
}

fn from_strings(payload: &Value) -> Vec<TextLine> {
    match payload {
        Value::String(text) => vec![TextLine::new(text.as_str(), 0.0, empty_bbox())],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|text| TextLine::new(text, 0.0, empty_bbox()))
            .collect(),
        Value::Object(map) => line_from_object(map).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

fn score_of(value: &Value) -> f64 {
    let score = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    score.filter(|score| score.is_finite()).unwrap_or(0.0)
}

fn empty_bbox() -> Value {
    Value::Array(Vec::new())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parallel_arrays() {
        let payload = json!({
            "rec_texts": ["Patient", "Diagnosis"],
            "rec_scores": [0.98, 0.91],
            "rec_boxes": [[1, 2, 30, 12], [1, 20, 40, 32]],
        });

        let lines = normalize_payload(&payload);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Patient");
        assert_eq!(lines[0].confidence, 0.98);
        assert_eq!(lines[1].bbox, json!([1, 20, 40, 32]));
        assert_eq!(lines[1].page, None);
    }

    #[test]
    fn parallel_arrays_fill_missing_scores_and_boxes() {
        let payload = json!({
            "rec_texts": ["a", "b", "c"],
            "rec_scores": [0.5],
        });

        let lines = normalize_payload(&payload);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].confidence, 0.0);
        assert_eq!(lines[2].bbox, json!([]));
    }

    #[test]
    fn parallel_arrays_fall_back_to_polygons() {
        let payload = json!({
            "rec_texts": ["a"],
            "rec_scores": [0.7],
            "rec_boxes": [],
            "rec_polys": [[[0, 0], [5, 0], [5, 5], [0, 5]]],
        });

        let lines = normalize_payload(&payload);
        assert_eq!(lines[0].bbox, json!([[0, 0], [5, 0], [5, 5], [0, 5]]));
    }

    #[test]
    fn envelopes_are_unwrapped() {
        let payload = json!({
            "prunedResult": {
                "page_index": null,
                "rec_texts": ["wrapped"],
                "rec_scores": [0.9],
            }
        });
        assert_eq!(normalize_payload(&payload)[0].text, "wrapped");

        let payload = json!([{ "res": { "rec_texts": ["listed"] } }]);
        assert_eq!(normalize_payload(&payload)[0].text, "listed");
    }

    #[test]
    fn legacy_nested_tuples() {
        let payload = json!([[
            [[[0, 0], [10, 0], [10, 5], [0, 5]], ["Hello", 0.99]],
            [[[0, 6], [10, 6], [10, 11], [0, 11]], ["World", "0.87"]],
        ]]);

        let lines = normalize_payload(&payload);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hello");
        assert_eq!(lines[0].bbox, json!([[0, 0], [10, 0], [10, 5], [0, 5]]));
        assert_eq!(lines[1].confidence, 0.87);
    }

    #[test]
    fn legacy_flat_tuples_with_object_fallback() {
        let payload = json!([
            [[[0, 0], [1, 1]], ["tuple", 0.5]],
            { "text": "object", "score": 0.25, "bbox": [1, 2, 3, 4] },
            null,
        ]);

        let lines = normalize_payload(&payload);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "object");
        assert_eq!(lines[1].confidence, 0.25);
        assert_eq!(lines[1].bbox, json!([1, 2, 3, 4]));
    }

    #[test]
    fn legacy_empty_result() {
        assert!(normalize_payload(&json!([null])).is_empty());
        assert!(normalize_payload(&json!([])).is_empty());
    }

    #[test]
    fn single_object_line_in_list_is_not_unwrapped() {
        let payload = json!([{ "text": "only", "confidence": 0.4 }]);
        let lines = normalize_payload(&payload);
        assert_eq!(lines, vec![TextLine::new("only", 0.4, json!([]))]);
    }

    #[test]
    fn bare_strings() {
        let lines = normalize_payload(&json!(["first", 3, "second"]));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].confidence, 0.0);
        assert_eq!(lines[1].bbox, json!([]));

        assert_eq!(normalize_payload(&json!("solo"))[0].text, "solo");
        assert!(normalize_payload(&json!(42)).is_empty());
    }

    #[test]
    fn invalid_scores_become_zero() {
        let payload = json!({ "rec_texts": ["x", "y"], "rec_scores": ["high", null] });
        let lines = normalize_payload(&payload);
        assert!(lines.iter().all(|line| line.confidence == 0.0));
    }

    #[test]
    fn pdf_pages_are_numbered_from_one() {
        let pages = vec![
            json!({ "prunedResult": { "rec_texts": ["first page"], "rec_scores": [0.9] } }),
            json!({ "prunedResult": { "rec_texts": [] } }),
            json!({ "prunedResult": { "rec_texts": ["third page"], "rec_scores": [0.8] } }),
        ];

        let lines = normalize_pages(FileKind::Pdf, &pages);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].page, Some(1));
        assert_eq!(lines[1].page, Some(3));
    }

    #[test]
    fn pdf_page_index_from_payload_wins() {
        let pages = vec![json!({ "page_index": 4, "res": { "rec_texts": ["p5"] } })];
        let lines = normalize_pages(FileKind::Pdf, &pages);
        assert_eq!(lines[0].page, Some(5));
    }

    #[test]
    fn image_lines_have_no_page() {
        let pages = vec![json!({ "rec_texts": ["a"], "rec_scores": [1.0] })];
        let lines = normalize_pages(FileKind::Image, &pages);
        assert_eq!(lines[0].page, None);

        let encoded = serde_json::to_value(&lines[0]).unwrap();
        assert!(encoded.get("page").is_none());
    }
}
