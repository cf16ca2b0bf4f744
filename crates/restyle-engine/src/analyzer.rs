use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use restyle_contracts::scene::{parse_vision_reply, ParsedScene, SceneAnalysis};

use crate::error::AnalysisError;
use crate::vision::{ImageRef, VisionProvider};

pub const ANALYSIS_PROMPT_VERSION: &str = "scene-analysis/v1";

/// Fixed instruction sent with every image. The requested shape mirrors the
/// `SceneAnalysis` schema; missing fields are backfilled on our side.
pub const ANALYSIS_PROMPT: &str = r#"Analyze this photograph of a physical space. Respond with one JSON object only, no prose, using this exact shape:
{
  "spaceType": "interior" | "exterior" | "mixed",
  "roomType": {"category": string, "confidence": 0..1, "subType": string?},
  "currentStyle": {"primary": string, "secondary": [string], "confidence": 0..1},
  "environment": {"lighting": "natural" | "artificial" | "mixed" | "low", "timeOfDay": string?, "weather": string?},
  "detectedElements": {
    "furniture": [string], "fixtures": [string], "materials": [string],
    "colors": {"primary": string, "secondary": [string], "accent": string?, "neutral": [string]}
  },
  "spatial": {"perspective": "wide" | "closeup" | "corner" | "elevated", "isEmpty": bool, "scale": "small" | "medium" | "large"},
  "quality": {"resolution": "low" | "medium" | "high", "clarity": 0..1, "processable": bool}
}
Omit fields you cannot judge rather than guessing."#;

/// Cache-first wrapper around the vision capability. One external call per
/// distinct image identity for the lifetime of the process; parse failures
/// degrade to a low-confidence default instead of erroring.
pub struct SceneAnalyzer {
    provider: Arc<dyn VisionProvider>,
    cache: Mutex<HashMap<String, SceneAnalysis>>,
}

impl SceneAnalyzer {
    pub fn new(provider: Arc<dyn VisionProvider>) -> Self {
        Self {
            provider,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn analyze(&self, image: &ImageRef) -> Result<SceneAnalysis, AnalysisError> {
        if let Some(hit) = self.cached(image.identity()) {
            return Ok(hit);
        }

        let reply = self
            .provider
            .describe(image, ANALYSIS_PROMPT)
            .map_err(AnalysisError::CapabilityUnavailable)?;

        let analysis = match parse_vision_reply(&reply) {
            ParsedScene::Parsed(analysis) => analysis,
            ParsedScene::Malformed(raw) => {
                log::warn!(
                    "unusable vision reply for {} ({}), using default analysis: {raw}",
                    image.identity(),
                    self.provider.name(),
                );
                SceneAnalysis::default()
            }
        };

        self.lock_cache()
            .insert(image.identity().to_string(), analysis.clone());
        Ok(analysis)
    }

    pub fn cached(&self, identity: &str) -> Option<SceneAnalysis> {
        self.lock_cache().get(identity).cloned()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, SceneAnalysis>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
