//! Heuristic enrichment of a scene analysis with prompt-derived signals.
//! Every function here is total over its inputs; the tables it reads live in
//! `restyle_contracts::tables`.

use chrono::{DateTime, Utc};

use restyle_contracts::context::{
    BudgetEstimate, EnrichedContext, Enhancements, LocationHint,
};
use restyle_contracts::scene::{RoomType, SceneAnalysis, SpaceType};
use restyle_contracts::tables;

pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Build an enriched context from an analysis and an optional prompt.
/// Without a prompt, or when the scene is not processable, this is a minimal
/// wrapper; otherwise keyword matching and the inference heuristics run.
pub fn enrich(
    analysis: SceneAnalysis,
    user_prompt: Option<&str>,
    timestamp: DateTime<Utc>,
) -> EnrichedContext {
    let Some(prompt) = user_prompt.filter(|_| analysis.quality.processable) else {
        let confidence = aggregate_confidence(&analysis, None);
        let mut context = EnrichedContext::minimal(analysis, confidence, timestamp);
        context.user_prompt = user_prompt.map(str::to_string);
        return context;
    };

    let prompt_lower = prompt.to_lowercase();
    let mut analysis = analysis;
    let mut enhancements = derive_enhancements(&prompt_lower, analysis.space_type);

    if analysis.room_type.is_none() && !analysis.detected_elements.furniture.is_empty() {
        analysis.room_type = infer_room_type(&analysis.detected_elements.furniture);
    }
    enhancements.cultural_influences = cultural_influences(&analysis.current_style.primary);

    let budget_estimate = estimate_budget(&analysis);
    let location = infer_climate(&analysis);
    let confidence = aggregate_confidence(&analysis, Some(&enhancements));

    EnrichedContext {
        analysis,
        user_prompt: Some(prompt.to_string()),
        confidence,
        timestamp,
        enhancements: Some(enhancements),
        budget_estimate: Some(budget_estimate),
        location,
    }
}

/// Keyword-set matching over the lowercased prompt: style preferences,
/// functional requirements, intent categories, and conflict detection.
pub fn derive_enhancements(prompt_lower: &str, space_type: SpaceType) -> Enhancements {
    let style_preferences = match_table(tables::STYLE_KEYWORDS, prompt_lower);
    let functional_requirements = match_table(tables::FUNCTIONAL_KEYWORDS, prompt_lower);
    let mut intent = match_table(tables::INTENT_KEYWORDS, prompt_lower);
    if intent.is_empty() {
        intent.push(tables::DEFAULT_INTENT.to_string());
    }

    let mut conflicts = Vec::new();
    let wants = |name: &str| style_preferences.iter().any(|style| style == name);
    if wants("modern") && wants("traditional") {
        conflicts.push(
            "conflicting style directions: modern and traditional requested together"
                .to_string(),
        );
    }
    if space_type == SpaceType::Exterior {
        for requirement in &functional_requirements {
            if tables::INTERIOR_ONLY_REQUIREMENTS.contains(&requirement.as_str()) {
                conflicts.push(format!("{requirement} requested for an exterior space"));
            }
        }
    }

    Enhancements {
        intent,
        style_preferences,
        functional_requirements,
        conflicts,
        cultural_influences: Vec::new(),
    }
}

/// Score the six room categories by how many detected furniture items match
/// their indicator lists; the best non-zero count wins with confidence
/// `min(count / 3, 1)`.
pub fn infer_room_type(furniture: &[String]) -> Option<RoomType> {
    let normalized: Vec<String> = furniture
        .iter()
        .map(|item| item.trim().to_lowercase().replace(' ', "_"))
        .collect();

    let mut best: Option<(&str, usize)> = None;
    for (room, indicators) in tables::ROOM_FURNITURE {
        let count = normalized
            .iter()
            .filter(|item| {
                indicators
                    .iter()
                    .any(|indicator| item.as_str() == *indicator || item.contains(indicator))
            })
            .count();
        if count > 0 && best.map_or(true, |(_, top)| count > top) {
            best = Some((room, count));
        }
    }

    best.map(|(room, count)| RoomType {
        category: room.to_string(),
        confidence: ((count as f64) / 3.0).min(1.0),
        sub_type: None,
    })
}

pub fn cultural_influences(primary_style: &str) -> Vec<String> {
    let key = primary_style.trim().to_lowercase();
    tables::lookup(tables::CULTURAL_INFLUENCES, &key)
        .map(|influences| influences.iter().map(|tag| (*tag).to_string()).collect())
        .unwrap_or_default()
}

/// Base band from image resolution, scaled by the largest matching material
/// multiplier (1.0 when no material matches).
pub fn estimate_budget(analysis: &SceneAnalysis) -> BudgetEstimate {
    let (_, min, max) = tables::BUDGET_BANDS
        .iter()
        .find(|(resolution, _, _)| *resolution == analysis.quality.resolution)
        .copied()
        .unwrap_or((analysis.quality.resolution, 5_000.0, 15_000.0));

    let mut multiplier: Option<f64> = None;
    for material in &analysis.detected_elements.materials {
        let material = material.to_lowercase();
        for (key, value) in tables::MATERIAL_MULTIPLIERS {
            if material.contains(key) {
                multiplier = Some(multiplier.map_or(*value, |best| best.max(*value)));
            }
        }
    }
    let multiplier = multiplier.unwrap_or(1.0);

    BudgetEstimate {
        min: min * multiplier,
        max: max * multiplier,
        confidence: tables::BUDGET_CONFIDENCE,
    }
}

/// Exterior scenes only: weather and lighting map to a climate hint.
pub fn infer_climate(analysis: &SceneAnalysis) -> Option<LocationHint> {
    if analysis.space_type != SpaceType::Exterior {
        return None;
    }
    let weather = analysis
        .environment
        .weather
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let climate = tables::CLIMATE_RULES
        .iter()
        .find(|(keyword, lighting, _)| {
            weather.contains(keyword)
                && lighting.map_or(true, |required| required == analysis.environment.lighting)
        })
        .map(|(_, _, climate)| *climate)
        .unwrap_or(tables::DEFAULT_CLIMATE);
    Some(LocationHint { climate })
}

/// Mean of the available confidence terms: clarity (processable scenes),
/// style detection, inferred room type, and a conflict-free bonus once
/// enhancements exist. Neutral 0.5 when nothing is available.
pub fn aggregate_confidence(
    analysis: &SceneAnalysis,
    enhancements: Option<&Enhancements>,
) -> f64 {
    let mut terms = Vec::new();
    if analysis.quality.processable {
        terms.push(analysis.quality.clarity);
    }
    terms.push(analysis.current_style.confidence);
    if let Some(room) = &analysis.room_type {
        terms.push(room.confidence);
    }
    if let Some(enhancements) = enhancements {
        terms.push(if enhancements.conflicts.is_empty() {
            1.0
        } else {
            0.0
        });
    }
    if terms.is_empty() {
        return NEUTRAL_CONFIDENCE;
    }
    terms.iter().sum::<f64>() / terms.len() as f64
}

fn match_table(table: &[(&str, &[&str])], prompt_lower: &str) -> Vec<String> {
    let mut matched = Vec::new();
    for (name, keywords) in table {
        if keywords.iter().any(|keyword| prompt_lower.contains(keyword)) {
            matched.push((*name).to_string());
        }
    }
    matched
}
