use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scene::SceneAnalysis;

/// Prompt-derived signals layered on top of a scene analysis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enhancements {
    pub intent: Vec<String>,
    pub style_preferences: Vec<String>,
    pub functional_requirements: Vec<String>,
    pub conflicts: Vec<String>,
    #[serde(default)]
    pub cultural_influences: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetEstimate {
    pub min: f64,
    pub max: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Climate {
    Tropical,
    Temperate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationHint {
    pub climate: Climate,
}

/// A scene analysis enriched with user intent and heuristic inference.
/// Produced once per (image, prompt) pair and cached for five minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedContext {
    #[serde(flatten)]
    pub analysis: SceneAnalysis,
    pub user_prompt: Option<String>,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub enhancements: Option<Enhancements>,
    pub budget_estimate: Option<BudgetEstimate>,
    pub location: Option<LocationHint>,
}

impl EnrichedContext {
    /// Minimal wrapper around an analysis, before any prompt enrichment.
    pub fn minimal(analysis: SceneAnalysis, confidence: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            analysis,
            user_prompt: None,
            confidence,
            timestamp,
            enhancements: None,
            budget_estimate: None,
            location: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub favorite_styles: Vec<String>,
    pub previous_selections: Vec<String>,
    pub budget_range: Option<(f64, f64)>,
}
