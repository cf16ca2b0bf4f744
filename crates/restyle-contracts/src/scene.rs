use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceType {
    Interior,
    Exterior,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lighting {
    Natural,
    Artificial,
    Mixed,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Perspective {
    Wide,
    Closeup,
    Corner,
    Elevated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    pub category: String,
    pub confidence: f64,
    pub sub_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRead {
    pub primary: String,
    pub secondary: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub lighting: Lighting,
    pub time_of_day: Option<String>,
    pub weather: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: Vec<String>,
    pub accent: Option<String>,
    pub neutral: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedElements {
    pub furniture: Vec<String>,
    pub fixtures: Vec<String>,
    pub materials: Vec<String>,
    pub colors: ColorPalette,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spatial {
    pub perspective: Perspective,
    pub is_empty: bool,
    pub scale: Scale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quality {
    pub resolution: Resolution,
    pub clarity: f64,
    pub processable: bool,
}

/// Fully populated reading of one photograph. Every field is backfilled with
/// a documented default when the vision reply omits it, so downstream code
/// never sees a partial schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneAnalysis {
    pub space_type: SpaceType,
    pub room_type: Option<RoomType>,
    pub current_style: StyleRead,
    pub environment: Environment,
    pub detected_elements: DetectedElements,
    pub spatial: Spatial,
    pub quality: Quality,
}

impl Default for SceneAnalysis {
    fn default() -> Self {
        Self {
            space_type: SpaceType::Interior,
            room_type: None,
            current_style: StyleRead {
                primary: "contemporary".to_string(),
                secondary: Vec::new(),
                confidence: 0.5,
            },
            environment: Environment {
                lighting: Lighting::Mixed,
                time_of_day: None,
                weather: None,
            },
            detected_elements: DetectedElements {
                furniture: Vec::new(),
                fixtures: Vec::new(),
                materials: Vec::new(),
                colors: ColorPalette {
                    primary: "neutral".to_string(),
                    secondary: Vec::new(),
                    accent: None,
                    neutral: Vec::new(),
                },
            },
            spatial: Spatial {
                perspective: Perspective::Wide,
                is_empty: false,
                scale: Scale::Medium,
            },
            quality: Quality {
                resolution: Resolution::Medium,
                clarity: 0.8,
                processable: true,
            },
        }
    }
}

impl SceneAnalysis {
    /// Validate an untrusted object field by field, backfilling defaults.
    /// Total: never rejects, never leaves a confidence outside [0, 1].
    pub fn from_value(raw: &Map<String, Value>) -> Self {
        let defaults = Self::default();

        let room_type = raw
            .get("roomType")
            .and_then(Value::as_object)
            .and_then(|room| {
                let category = text_field(room, "category")?;
                Some(RoomType {
                    category,
                    confidence: unit_field(room, "confidence", 0.5),
                    sub_type: text_field(room, "subType"),
                })
            });

        let current_style = match raw.get("currentStyle").and_then(Value::as_object) {
            Some(style) => StyleRead {
                primary: text_field(style, "primary")
                    .unwrap_or_else(|| defaults.current_style.primary.clone()),
                secondary: text_list(style.get("secondary")),
                confidence: unit_field(style, "confidence", defaults.current_style.confidence),
            },
            None => defaults.current_style.clone(),
        };

        let environment = match raw.get("environment").and_then(Value::as_object) {
            Some(env) => Environment {
                lighting: lighting_from(env.get("lighting")),
                time_of_day: text_field(env, "timeOfDay"),
                weather: text_field(env, "weather"),
            },
            None => defaults.environment.clone(),
        };

        let detected_elements = match raw.get("detectedElements").and_then(Value::as_object) {
            Some(elements) => {
                let colors = match elements.get("colors").and_then(Value::as_object) {
                    Some(colors) => ColorPalette {
                        primary: text_field(colors, "primary")
                            .unwrap_or_else(|| "neutral".to_string()),
                        secondary: text_list(colors.get("secondary")),
                        accent: text_field(colors, "accent"),
                        neutral: text_list(colors.get("neutral")),
                    },
                    None => defaults.detected_elements.colors.clone(),
                };
                DetectedElements {
                    furniture: text_list(elements.get("furniture")),
                    fixtures: text_list(elements.get("fixtures")),
                    materials: text_list(elements.get("materials")),
                    colors,
                }
            }
            None => defaults.detected_elements.clone(),
        };

        let spatial = match raw.get("spatial").and_then(Value::as_object) {
            Some(spatial) => Spatial {
                perspective: perspective_from(spatial.get("perspective")),
                is_empty: spatial
                    .get("isEmpty")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                scale: scale_from(spatial.get("scale")),
            },
            None => defaults.spatial.clone(),
        };

        let quality = match raw.get("quality").and_then(Value::as_object) {
            Some(quality) => Quality {
                resolution: resolution_from(quality.get("resolution")),
                clarity: unit_field(quality, "clarity", defaults.quality.clarity),
                processable: quality
                    .get("processable")
                    .and_then(Value::as_bool)
                    .unwrap_or(true),
            },
            None => defaults.quality.clone(),
        };

        Self {
            space_type: space_type_from(raw.get("spaceType")),
            room_type,
            current_style,
            environment,
            detected_elements,
            spatial,
            quality,
        }
    }
}

/// Outcome of the defensive parsing boundary: either a fully backfilled
/// analysis or the raw payload that could not be coerced into one.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedScene {
    Parsed(SceneAnalysis),
    Malformed(String),
}

/// Coerce whatever the vision capability returned. Objects are validated in
/// place; strings are scanned for an embedded JSON object; everything else
/// is malformed.
pub fn parse_vision_reply(raw: &Value) -> ParsedScene {
    match raw {
        Value::Object(object) => ParsedScene::Parsed(SceneAnalysis::from_value(object)),
        Value::String(text) => match extract_json_object(text) {
            Some(object) => ParsedScene::Parsed(SceneAnalysis::from_value(&object)),
            None => ParsedScene::Malformed(clamp_text(text, 200)),
        },
        other => ParsedScene::Malformed(clamp_text(&other.to_string(), 200)),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let raw = text.trim();
    let Some(rest) = raw.strip_prefix("```") else {
        return raw;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return raw;
    };
    // Drop the language tag on the opening fence line, if any.
    let body = match body.split_once('\n') {
        Some((tag, rest)) if tag.trim().chars().all(|ch| ch.is_ascii_alphanumeric()) => rest,
        _ => body,
    };
    body.trim()
}

/// First balanced `{...}` substring that parses as a JSON object, if any.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let raw = strip_code_fence(text);
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in raw[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &raw[start..=start + offset];
                    return serde_json::from_str::<Value>(candidate)
                        .ok()
                        .and_then(|parsed| parsed.as_object().cloned());
                }
            }
            _ => {}
        }
    }
    None
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

fn unit_field(object: &Map<String, Value>, key: &str, default: f64) -> f64 {
    match object.get(key).and_then(Value::as_f64) {
        Some(value) => clamp_unit(value),
        None => clamp_unit(default),
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    let text = object.get(key)?.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.to_string())
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    let mut items: Vec<String> = Vec::new();
    let raw: Vec<String> = match value {
        Value::Array(rows) => rows
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(text) => text.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    for row in raw {
        let text = row.trim().to_string();
        if text.is_empty() {
            continue;
        }
        let key = text.to_ascii_lowercase();
        if items.iter().any(|existing| existing.to_ascii_lowercase() == key) {
            continue;
        }
        items.push(text);
    }
    items
}

fn clamp_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

fn space_type_from(value: Option<&Value>) -> SpaceType {
    match value.and_then(Value::as_str) {
        Some(text) => match text.trim().to_ascii_lowercase().as_str() {
            "exterior" => SpaceType::Exterior,
            "mixed" => SpaceType::Mixed,
            _ => SpaceType::Interior,
        },
        None => SpaceType::Interior,
    }
}

fn lighting_from(value: Option<&Value>) -> Lighting {
    match value.and_then(Value::as_str) {
        Some(text) => match text.trim().to_ascii_lowercase().as_str() {
            "natural" => Lighting::Natural,
            "artificial" => Lighting::Artificial,
            "low" | "dim" => Lighting::Low,
            _ => Lighting::Mixed,
        },
        None => Lighting::Mixed,
    }
}

fn perspective_from(value: Option<&Value>) -> Perspective {
    match value.and_then(Value::as_str) {
        Some(text) => match text.trim().to_ascii_lowercase().as_str() {
            "closeup" | "close-up" | "detail" => Perspective::Closeup,
            "corner" => Perspective::Corner,
            "elevated" | "aerial" => Perspective::Elevated,
            _ => Perspective::Wide,
        },
        None => Perspective::Wide,
    }
}

fn scale_from(value: Option<&Value>) -> Scale {
    match value.and_then(Value::as_str) {
        Some(text) => match text.trim().to_ascii_lowercase().as_str() {
            "small" => Scale::Small,
            "large" => Scale::Large,
            _ => Scale::Medium,
        },
        None => Scale::Medium,
    }
}

fn resolution_from(value: Option<&Value>) -> Resolution {
    match value.and_then(Value::as_str) {
        Some(text) => match text.trim().to_ascii_lowercase().as_str() {
            "low" => Resolution::Low,
            "high" => Resolution::High,
            _ => Resolution::Medium,
        },
        None => Resolution::Medium,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn from_value_fills_every_default_on_empty_object() {
        let analysis = SceneAnalysis::from_value(&Map::new());
        assert_eq!(analysis, SceneAnalysis::default());
        assert_eq!(analysis.current_style.primary, "contemporary");
        assert_eq!(analysis.current_style.confidence, 0.5);
        assert_eq!(analysis.environment.lighting, Lighting::Mixed);
        assert_eq!(analysis.quality.clarity, 0.8);
        assert!(analysis.quality.processable);
    }

    #[test]
    fn from_value_reads_complete_payload() {
        let raw = obj(json!({
            "spaceType": "exterior",
            "roomType": {"category": "kitchen", "confidence": 0.9, "subType": "galley"},
            "currentStyle": {"primary": "modern", "secondary": ["industrial"], "confidence": 0.7},
            "environment": {"lighting": "natural", "timeOfDay": "morning", "weather": "sunny"},
            "detectedElements": {
                "furniture": ["stove", "kitchen_island"],
                "fixtures": ["pendant_light"],
                "materials": ["marble"],
                "colors": {"primary": "white", "secondary": ["grey"], "accent": "brass", "neutral": ["beige"]},
            },
            "spatial": {"perspective": "corner", "isEmpty": false, "scale": "large"},
            "quality": {"resolution": "high", "clarity": 0.95, "processable": true},
        }));
        let analysis = SceneAnalysis::from_value(&raw);
        assert_eq!(analysis.space_type, SpaceType::Exterior);
        assert_eq!(analysis.room_type.as_ref().map(|room| room.category.as_str()), Some("kitchen"));
        assert_eq!(analysis.current_style.primary, "modern");
        assert_eq!(analysis.environment.lighting, Lighting::Natural);
        assert_eq!(analysis.detected_elements.furniture, vec!["stove", "kitchen_island"]);
        assert_eq!(analysis.detected_elements.colors.accent.as_deref(), Some("brass"));
        assert_eq!(analysis.spatial.scale, Scale::Large);
        assert_eq!(analysis.quality.resolution, Resolution::High);
    }

    #[test]
    fn from_value_clamps_out_of_range_confidences() {
        let raw = obj(json!({
            "roomType": {"category": "bedroom", "confidence": 7.5},
            "currentStyle": {"primary": "modern", "confidence": -2.0},
            "quality": {"clarity": 1.4},
        }));
        let analysis = SceneAnalysis::from_value(&raw);
        assert_eq!(analysis.room_type.as_ref().map(|room| room.confidence), Some(1.0));
        assert_eq!(analysis.current_style.confidence, 0.0);
        assert_eq!(analysis.quality.clarity, 1.0);
    }

    #[test]
    fn from_value_drops_room_type_without_category() {
        let raw = obj(json!({"roomType": {"confidence": 0.9}}));
        assert!(SceneAnalysis::from_value(&raw).room_type.is_none());
    }

    #[test]
    fn parse_vision_reply_accepts_structured_object() {
        let parsed = parse_vision_reply(&json!({"spaceType": "mixed"}));
        match parsed {
            ParsedScene::Parsed(analysis) => assert_eq!(analysis.space_type, SpaceType::Mixed),
            ParsedScene::Malformed(raw) => panic!("unexpected malformed: {raw}"),
        }
    }

    #[test]
    fn parse_vision_reply_extracts_embedded_json_from_prose() {
        let text = "Sure! Here is the analysis:\n```json\n{\"spaceType\": \"exterior\", \"quality\": {\"resolution\": \"low\"}}\n```\nLet me know.";
        match parse_vision_reply(&Value::String(text.to_string())) {
            ParsedScene::Parsed(analysis) => {
                assert_eq!(analysis.space_type, SpaceType::Exterior);
                assert_eq!(analysis.quality.resolution, Resolution::Low);
            }
            ParsedScene::Malformed(raw) => panic!("unexpected malformed: {raw}"),
        }
    }

    #[test]
    fn parse_vision_reply_reads_fences_with_and_without_language_tags() {
        for text in [
            "```json\n{\"spaceType\": \"exterior\"}\n```",
            "```\n{\"spaceType\": \"exterior\"}\n```",
        ] {
            match parse_vision_reply(&Value::String(text.to_string())) {
                ParsedScene::Parsed(analysis) => {
                    assert_eq!(analysis.space_type, SpaceType::Exterior)
                }
                ParsedScene::Malformed(raw) => panic!("unexpected malformed: {raw}"),
            }
        }
    }

    #[test]
    fn parse_vision_reply_handles_braces_inside_strings() {
        let text = "prefix {\"currentStyle\": {\"primary\": \"mo{de}rn\"}} suffix";
        match parse_vision_reply(&Value::String(text.to_string())) {
            ParsedScene::Parsed(analysis) => assert_eq!(analysis.current_style.primary, "mo{de}rn"),
            ParsedScene::Malformed(raw) => panic!("unexpected malformed: {raw}"),
        }
    }

    #[test]
    fn parse_vision_reply_flags_garbage() {
        assert!(matches!(
            parse_vision_reply(&Value::String("no json here".to_string())),
            ParsedScene::Malformed(_)
        ));
        assert!(matches!(
            parse_vision_reply(&json!([1, 2, 3])),
            ParsedScene::Malformed(_)
        ));
    }

    #[test]
    fn text_list_deduplicates_case_insensitively() {
        let value = json!(["Sofa", "sofa", "", "table"]);
        assert_eq!(text_list(Some(&value)), vec!["Sofa", "table"]);
    }
}
