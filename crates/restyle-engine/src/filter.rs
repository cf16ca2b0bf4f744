use std::cmp::Ordering;
use std::collections::HashMap;

use restyle_contracts::catalog::{
    AffordanceCatalog, AffordanceCategory, AffordanceDefinition, ContextSnapshot,
    RankedAffordance, VisibilityRules,
};
use restyle_contracts::context::{EnrichedContext, UserPreferences};
use restyle_contracts::tables;

/// Pure ranking over a static catalog: eligibility, weighted scoring,
/// deterministic tie-break, diversity cap, badges, truncation to
/// `tables::MAX_RESULTS`. No caching and no external calls.
#[derive(Debug, Default)]
pub struct AffordanceFilter;

struct Scored {
    definition: AffordanceDefinition,
    score: f64,
}

impl AffordanceFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn rank(
        &self,
        context: &EnrichedContext,
        catalog: &AffordanceCatalog,
        preferences: Option<&UserPreferences>,
    ) -> Vec<RankedAffordance> {
        let prompt_lower = context.user_prompt.as_deref().map(str::to_lowercase);

        let mut scored: Vec<Scored> = catalog
            .definitions()
            .filter(|definition| eligible(definition, context))
            .map(|definition| Scored {
                definition: definition.clone(),
                score: weighted_score(definition, context, prompt_lower.as_deref(), preferences),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        settle_ties(&mut scored);

        let snapshot = ContextSnapshot {
            room_category: context
                .analysis
                .room_type
                .as_ref()
                .map(|room| room.category.clone()),
            primary_style: context.analysis.current_style.primary.clone(),
            space_type: context.analysis.space_type,
        };
        let room_category = snapshot.room_category.clone();

        apply_diversity(scored)
            .into_iter()
            .take(tables::MAX_RESULTS)
            .map(|row| {
                let badge = badge_for(&row.definition, row.score, room_category.as_deref());
                RankedAffordance {
                    definition: row.definition,
                    score: row.score,
                    badge,
                    contextual_data: snapshot.clone(),
                }
            })
            .collect()
    }
}

fn eligible(definition: &AffordanceDefinition, context: &EnrichedContext) -> bool {
    let Some(rules) = &definition.visibility else {
        return true;
    };

    if let Some(required) = &rules.required_space_types {
        if !required.contains(&context.analysis.space_type) {
            return false;
        }
    }

    let room_category = context
        .analysis
        .room_type
        .as_ref()
        .map(|room| room.category.to_lowercase());
    if let Some(required) = &rules.required_room_types {
        match &room_category {
            Some(category) => {
                if !required.iter().any(|rule| room_matches(rule, category)) {
                    return false;
                }
            }
            None => return false,
        }
    }
    if let (Some(excluded), Some(category)) = (&rules.excluded_room_types, &room_category) {
        if excluded.iter().any(|rule| room_matches(rule, category)) {
            return false;
        }
    }

    if let Some(required) = &rules.required_styles {
        if !required.iter().any(|style| style_matches(style, context)) {
            return false;
        }
    }
    if let Some(excluded) = &rules.excluded_styles {
        if excluded.iter().any(|style| style_matches(style, context)) {
            return false;
        }
    }

    if let Some(min_confidence) = rules.min_confidence {
        if context.confidence < min_confidence {
            return false;
        }
    }

    true
}

// Substring containment in either direction, so a "living_room" detection
// satisfies a "living" rule and vice versa.
fn room_matches(rule: &str, category: &str) -> bool {
    let rule = rule.to_lowercase();
    rule.contains(category) || category.contains(&rule)
}

fn style_matches(style: &str, context: &EnrichedContext) -> bool {
    let style = style.to_lowercase();
    let read = &context.analysis.current_style;
    read.primary.to_lowercase() == style
        || read
            .secondary
            .iter()
            .any(|secondary| secondary.to_lowercase() == style)
}

fn weighted_score(
    definition: &AffordanceDefinition,
    context: &EnrichedContext,
    prompt_lower: Option<&str>,
    preferences: Option<&UserPreferences>,
) -> f64 {
    let mut score = tables::CONTEXT_WEIGHT * context_match(definition, context);
    if let Some(prompt) = prompt_lower {
        score += tables::PROMPT_WEIGHT * prompt_relevance(definition, prompt);
    }
    score += tables::COMBINATION_WEIGHT * combination_bonus(definition);
    if let Some(preferences) = preferences {
        score += tables::PREFERENCE_WEIGHT * preference_bonus(definition, preferences);
    }
    score
}

/// Average of the indicators that applied; 0.5 when none did.
fn context_match(definition: &AffordanceDefinition, context: &EnrichedContext) -> f64 {
    let mut indicators: Vec<f64> = Vec::new();

    if let Some(VisibilityRules {
        required_space_types: Some(required),
        ..
    }) = &definition.visibility
    {
        indicators.push(if required.contains(&context.analysis.space_type) {
            1.0
        } else {
            0.0
        });
    }

    if let Some(room) = &context.analysis.room_type {
        indicators.push(if definition.id == room.category { 1.0 } else { 0.0 });
        if let Some(relevant) = tables::lookup(tables::FUNCTIONAL_RELEVANCE, &room.category) {
            if relevant.contains(&definition.id.as_str()) {
                indicators.push(tables::FUNCTIONAL_RELEVANCE_INDICATOR);
            }
        }
    }

    if matches!(
        definition.category,
        AffordanceCategory::Style | AffordanceCategory::Cultural
    ) {
        indicators.push(tables::STYLE_CATEGORY_INDICATOR);
    }

    if definition.id == "budget" {
        indicators.push(tables::BUDGET_INDICATOR);
    }

    if indicators.is_empty() {
        return tables::NEUTRAL_CONTEXT_MATCH;
    }
    indicators.iter().sum::<f64>() / indicators.len() as f64
}

fn prompt_relevance(definition: &AffordanceDefinition, prompt_lower: &str) -> f64 {
    let mut score = match tables::lookup(tables::AFFORDANCE_PROMPT_KEYWORDS, &definition.id) {
        Some(keywords) if !keywords.is_empty() => {
            let hits = keywords
                .iter()
                .filter(|keyword| prompt_lower.contains(*keyword))
                .count();
            hits as f64 / keywords.len() as f64
        }
        _ => 0.0,
    };

    if tables::TRANSFORM_BONUS_IDS.contains(&definition.id.as_str())
        && tables::TRANSFORM_TRIGGERS
            .iter()
            .any(|trigger| prompt_lower.contains(trigger))
    {
        score += tables::TRANSFORM_BONUS;
    }

    score.min(1.0)
}

fn combination_bonus(definition: &AffordanceDefinition) -> f64 {
    let mut bonus = 0.0;
    if tables::lookup(tables::COMPLEMENTARY_AFFORDANCES, &definition.id).is_some() {
        bonus += tables::COMPLEMENTARY_BONUS;
    }
    if tables::ESSENTIAL_IDS.contains(&definition.id.as_str()) {
        bonus += tables::ESSENTIAL_BONUS;
    }
    bonus
}

fn preference_bonus(definition: &AffordanceDefinition, preferences: &UserPreferences) -> f64 {
    let mut bonus = 0.0;
    if definition.category == AffordanceCategory::Style && !preferences.favorite_styles.is_empty() {
        bonus += tables::FAVORITE_STYLE_BONUS;
    }
    if preferences
        .previous_selections
        .iter()
        .any(|id| id == &definition.id)
    {
        bonus += tables::PREVIOUS_SELECTION_BONUS;
    }
    if definition.id == "budget" && preferences.budget_range.is_some() {
        bonus += tables::BUDGET_PREFERENCE_BONUS;
    }
    bonus.min(1.0)
}

// Runs after the descending score sort: neighbors whose scores sit within
// the tie window are reordered by the fixed priority list, unknown ids after
// all known ones. Only adjacent entries move, so pairs separated by a full
// window or more always keep their score order. Every swap removes one
// priority inversion, so the loop terminates.
fn settle_ties(scored: &mut [Scored]) {
    let mut swapped = true;
    while swapped {
        swapped = false;
        for index in 1..scored.len() {
            let close =
                (scored[index - 1].score - scored[index].score).abs() < tables::TIE_WINDOW;
            if close
                && priority_rank(&scored[index].definition.id)
                    < priority_rank(&scored[index - 1].definition.id)
            {
                scored.swap(index - 1, index);
                swapped = true;
            }
        }
    }
}

fn priority_rank(id: &str) -> usize {
    tables::PRIORITY_ORDER
        .iter()
        .position(|candidate| *candidate == id)
        .unwrap_or(usize::MAX)
}

fn apply_diversity(ranked: Vec<Scored>) -> Vec<Scored> {
    let mut result: Vec<Scored> = Vec::new();
    let mut kept: Vec<usize> = Vec::new();

    for category in tables::PRIORITY_CATEGORIES {
        let mut taken = 0;
        for (index, row) in ranked.iter().enumerate() {
            if row.definition.category != *category {
                continue;
            }
            if taken == tables::PRIORITY_CATEGORY_LIMIT {
                break;
            }
            kept.push(index);
            taken += 1;
        }
    }

    let mut other_counts: HashMap<AffordanceCategory, usize> = HashMap::new();
    for (index, row) in ranked.iter().enumerate() {
        if tables::PRIORITY_CATEGORIES.contains(&row.definition.category) {
            continue;
        }
        let count = other_counts.entry(row.definition.category).or_insert(0);
        if *count == tables::OTHER_CATEGORY_LIMIT {
            continue;
        }
        kept.push(index);
        *count += 1;
    }

    let mut ranked: Vec<Option<Scored>> = ranked.into_iter().map(Some).collect();
    for index in kept {
        if let Some(row) = ranked[index].take() {
            result.push(row);
        }
    }
    result
}

fn badge_for(
    definition: &AffordanceDefinition,
    score: f64,
    room_category: Option<&str>,
) -> Option<String> {
    if score > tables::RECOMMENDED_THRESHOLD {
        return Some("Recommended".to_string());
    }
    if room_category == Some(definition.id.as_str()) {
        return Some("Room Match".to_string());
    }
    if definition.category == AffordanceCategory::Style && score > tables::STYLE_MATCH_THRESHOLD {
        return Some("Style Match".to_string());
    }
    if tables::TRENDING_IDS.contains(&definition.id.as_str()) {
        return Some("Trending".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::Map;

    use restyle_contracts::catalog::ContextualOptions;
    use restyle_contracts::scene::{RoomType, SceneAnalysis, SpaceType};

    use crate::enhance;

    use super::*;

    fn kitchen_context() -> EnrichedContext {
        let mut analysis = SceneAnalysis::default();
        analysis.detected_elements.furniture =
            vec!["stove".to_string(), "kitchen_island".to_string()];
        enhance::enrich(
            analysis,
            Some("I want a modern kitchen on a budget"),
            Utc::now(),
        )
    }

    fn bare_definition(id: &str, category: AffordanceCategory) -> AffordanceDefinition {
        AffordanceDefinition {
            id: id.to_string(),
            label: id.to_string(),
            icon: "dot".to_string(),
            category,
            visibility: None,
            panel: Map::new(),
            options: ContextualOptions::default(),
        }
    }

    #[test]
    fn kitchen_prompt_ranks_kitchen_budget_style_near_top() {
        let filter = AffordanceFilter::new();
        let ranked = filter.rank(&kitchen_context(), &AffordanceCatalog::default(), None);

        let position = |id: &str| {
            ranked
                .iter()
                .position(|row| row.definition.id == id)
                .unwrap_or(usize::MAX)
        };
        assert!(position("kitchen") < 5, "kitchen at {}", position("kitchen"));
        assert!(position("budget") < 5, "budget at {}", position("budget"));
        assert!(position("style") < 5, "style at {}", position("style"));

        let kitchen = &ranked[position("kitchen")];
        assert_eq!(kitchen.badge.as_deref(), Some("Room Match"));
        assert_eq!(
            kitchen.contextual_data.room_category.as_deref(),
            Some("kitchen")
        );
    }

    #[test]
    fn ranking_is_deterministic() {
        let filter = AffordanceFilter::new();
        let context = kitchen_context();
        let catalog = AffordanceCatalog::default();
        let preferences = UserPreferences {
            favorite_styles: vec!["modern".to_string()],
            previous_selections: vec!["budget".to_string()],
            budget_range: Some((1_000.0, 20_000.0)),
        };

        let first = filter.rank(&context, &catalog, Some(&preferences));
        let second = filter.rank(&context, &catalog, Some(&preferences));
        assert_eq!(first, second);
    }

    #[test]
    fn diversity_caps_hold_and_output_is_bounded() {
        let filter = AffordanceFilter::new();
        let ranked = filter.rank(&kitchen_context(), &AffordanceCatalog::default(), None);
        assert!(ranked.len() <= tables::MAX_RESULTS);

        let mut counts: HashMap<AffordanceCategory, usize> = HashMap::new();
        for row in &ranked {
            *counts.entry(row.definition.category).or_insert(0) += 1;
        }
        for (category, count) in counts {
            let limit = if tables::PRIORITY_CATEGORIES.contains(&category) {
                tables::PRIORITY_CATEGORY_LIMIT
            } else {
                tables::OTHER_CATEGORY_LIMIT
            };
            assert!(count <= limit, "{category:?} appears {count} times");
        }
    }

    #[test]
    fn exterior_scene_excludes_interior_only_affordances() {
        let mut analysis = SceneAnalysis::default();
        analysis.space_type = SpaceType::Exterior;
        let context = enhance::enrich(analysis, Some("refresh the terrace"), Utc::now());

        let filter = AffordanceFilter::new();
        let ranked = filter.rank(&context, &AffordanceCatalog::default(), None);
        let ids: Vec<&str> = ranked.iter().map(|row| row.definition.id.as_str()).collect();
        assert!(!ids.contains(&"furniture"));
        assert!(!ids.contains(&"function"));
        assert!(!ids.contains(&"kitchen"));
        assert!(ids.contains(&"location"));
    }

    #[test]
    fn room_type_rules_match_by_substring_in_either_direction() {
        let mut definition = bare_definition("kitchen", AffordanceCategory::Function);
        definition.visibility = Some(VisibilityRules {
            required_room_types: Some(vec!["kitchen".to_string()]),
            ..VisibilityRules::default()
        });

        let mut context = kitchen_context();
        assert!(eligible(&definition, &context));

        context.analysis.room_type = Some(RoomType {
            category: "open_kitchen_dining".to_string(),
            confidence: 0.8,
            sub_type: None,
        });
        assert!(eligible(&definition, &context));

        context.analysis.room_type = None;
        assert!(!eligible(&definition, &context));
    }

    #[test]
    fn excluded_styles_remove_candidates() {
        let mut definition = bare_definition("heritage", AffordanceCategory::Cultural);
        definition.visibility = Some(VisibilityRules {
            excluded_styles: Some(vec!["contemporary".to_string()]),
            ..VisibilityRules::default()
        });
        // Default analysis reads as contemporary.
        let context = enhance::enrich(SceneAnalysis::default(), None, Utc::now());
        assert!(!eligible(&definition, &context));
    }

    #[test]
    fn min_confidence_gates_eligibility() {
        let mut definition = bare_definition("fantasy", AffordanceCategory::Style);
        definition.visibility = Some(VisibilityRules {
            min_confidence: Some(0.9),
            ..VisibilityRules::default()
        });
        let context = kitchen_context();
        assert!(context.confidence < 0.9);
        assert!(!eligible(&definition, &context));
    }

    #[test]
    fn close_scores_fall_back_to_priority_order() {
        let catalog = AffordanceCatalog::from_definitions(vec![
            bare_definition("materials", AffordanceCategory::Material),
            bare_definition("furniture", AffordanceCategory::Furniture),
        ]);
        let context = enhance::enrich(SceneAnalysis::default(), None, Utc::now());
        let ranked = AffordanceFilter::new().rank(&context, &catalog, None);
        // Both score identically; "furniture" precedes "materials" in the
        // priority list despite its later catalog position.
        assert_eq!(ranked[0].definition.id, "furniture");
        assert_eq!(ranked[1].definition.id, "materials");
    }

    #[test]
    fn score_gaps_beyond_the_window_keep_score_order() {
        let catalog = AffordanceCatalog::from_definitions(vec![
            bare_definition("colorPalette", AffordanceCategory::Color),
            bare_definition("furniture", AffordanceCategory::Furniture),
            bare_definition("materials", AffordanceCategory::Material),
        ]);
        let context = enhance::enrich(
            SceneAnalysis::default(),
            Some("sofa table wood marble material"),
            Utc::now(),
        );
        let ranked = AffordanceFilter::new().rank(&context, &catalog, None);
        let ids: Vec<&str> = ranked.iter().map(|row| row.definition.id.as_str()).collect();
        // "materials" outscores "colorPalette" by more than the tie window
        // and must stay ahead of it; "furniture" sits within the window of
        // "materials" and wins the tie on priority.
        assert_eq!(ids, vec!["furniture", "materials", "colorPalette"]);
    }

    #[test]
    fn recommended_badge_wins_over_room_match() {
        let mut context = kitchen_context();
        context.analysis.room_type = Some(RoomType {
            category: "budget".to_string(),
            confidence: 1.0,
            sub_type: None,
        });
        context.user_prompt = Some("budget cheap affordable cost price".to_string());
        let preferences = UserPreferences {
            favorite_styles: Vec::new(),
            previous_selections: vec!["budget".to_string()],
            budget_range: Some((0.0, 5_000.0)),
        };

        let catalog =
            AffordanceCatalog::from_definitions(vec![bare_definition("budget", AffordanceCategory::Budget)]);
        let ranked = AffordanceFilter::new().rank(&context, &catalog, Some(&preferences));
        assert!(ranked[0].score > tables::RECOMMENDED_THRESHOLD);
        assert_eq!(ranked[0].badge.as_deref(), Some("Recommended"));
    }

    #[test]
    fn trending_badge_applies_to_trending_ids() {
        let catalog = AffordanceCatalog::from_definitions(vec![
            bare_definition("cultural", AffordanceCategory::Cultural),
            bare_definition("fantasy", AffordanceCategory::Style),
        ]);
        let context = enhance::enrich(SceneAnalysis::default(), None, Utc::now());
        let ranked = AffordanceFilter::new().rank(&context, &catalog, None);
        for row in &ranked {
            assert_eq!(row.badge.as_deref(), Some("Trending"), "{}", row.definition.id);
        }
    }

    #[test]
    fn preferences_raise_budget_score() {
        let filter = AffordanceFilter::new();
        let context = kitchen_context();
        let catalog = AffordanceCatalog::default();

        let without = filter.rank(&context, &catalog, None);
        let with_prefs = filter.rank(
            &context,
            &catalog,
            Some(&UserPreferences {
                favorite_styles: Vec::new(),
                previous_selections: Vec::new(),
                budget_range: Some((2_000.0, 10_000.0)),
            }),
        );

        let score_of = |rows: &[RankedAffordance], id: &str| {
            rows.iter()
                .find(|row| row.definition.id == id)
                .map(|row| row.score)
                .unwrap_or_default()
        };
        assert!(score_of(&with_prefs, "budget") > score_of(&without, "budget"));
    }

    #[test]
    fn snapshot_carries_style_and_space() {
        let ranked = AffordanceFilter::new().rank(
            &kitchen_context(),
            &AffordanceCatalog::default(),
            None,
        );
        let row = ranked.first().expect("non-empty ranking");
        assert_eq!(row.contextual_data.primary_style, "contemporary");
        assert_eq!(row.contextual_data.space_type, SpaceType::Interior);
    }
}
