use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::scene::SpaceType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffordanceCategory {
    Style,
    Function,
    Budget,
    Location,
    Material,
    Furniture,
    Color,
    Cultural,
}

/// Hard inclusion/exclusion constraints evaluated before scoring. Every
/// field is optional; an absent field constrains nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRules {
    #[serde(default)]
    pub required_space_types: Option<Vec<SpaceType>>,
    #[serde(default)]
    pub required_room_types: Option<Vec<String>>,
    #[serde(default)]
    pub excluded_room_types: Option<Vec<String>>,
    #[serde(default)]
    pub required_styles: Option<Vec<String>>,
    #[serde(default)]
    pub excluded_styles: Option<Vec<String>>,
    #[serde(default)]
    pub min_confidence: Option<f64>,
}

/// Filter keys and data-source reference, passed through to presentation
/// untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualOptions {
    #[serde(default)]
    pub filter_keys: Vec<String>,
    #[serde(default)]
    pub data_source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordanceDefinition {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub category: AffordanceCategory,
    #[serde(default)]
    pub visibility: Option<VisibilityRules>,
    #[serde(default)]
    pub panel: Map<String, Value>,
    #[serde(default)]
    pub options: ContextualOptions,
}

/// Snapshot of the context fields a ranked affordance was matched against,
/// for downstream display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub room_category: Option<String>,
    pub primary_style: String,
    pub space_type: SpaceType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAffordance {
    #[serde(flatten)]
    pub definition: AffordanceDefinition,
    pub score: f64,
    pub badge: Option<String>,
    pub contextual_data: ContextSnapshot,
}

/// Insertion-ordered, read-only catalog of affordance definitions.
#[derive(Debug, Clone)]
pub struct AffordanceCatalog {
    entries: IndexMap<String, AffordanceDefinition>,
}

impl AffordanceCatalog {
    pub fn new(entries: Option<IndexMap<String, AffordanceDefinition>>) -> Self {
        Self {
            entries: entries.unwrap_or_else(default_affordances),
        }
    }

    pub fn from_definitions(definitions: Vec<AffordanceDefinition>) -> Self {
        let mut entries = IndexMap::new();
        for definition in definitions {
            entries.insert(definition.id.clone(), definition);
        }
        Self { entries }
    }

    /// Load externally maintained catalog configuration (a JSON array of
    /// definitions).
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading affordance catalog {}", path.display()))?;
        let definitions: Vec<AffordanceDefinition> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing affordance catalog {}", path.display()))?;
        Ok(Self::from_definitions(definitions))
    }

    pub fn get(&self, id: &str) -> Option<&AffordanceDefinition> {
        self.entries.get(id)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &AffordanceDefinition> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AffordanceCatalog {
    fn default() -> Self {
        Self::new(None)
    }
}

fn default_affordances() -> IndexMap<String, AffordanceDefinition> {
    let mut map = IndexMap::new();

    let mut insert = |id: &str,
                      label: &str,
                      icon: &str,
                      category: AffordanceCategory,
                      visibility: Option<VisibilityRules>,
                      panel_view: &str,
                      filter_keys: &[&str],
                      data_source: &str| {
        let mut panel = Map::new();
        panel.insert("view".to_string(), Value::String(panel_view.to_string()));
        panel.insert("height".to_string(), Value::String("half".to_string()));
        map.insert(
            id.to_string(),
            AffordanceDefinition {
                id: id.to_string(),
                label: label.to_string(),
                icon: icon.to_string(),
                category,
                visibility,
                panel,
                options: ContextualOptions {
                    filter_keys: filter_keys.iter().map(|key| (*key).to_string()).collect(),
                    data_source: data_source.to_string(),
                },
            },
        );
    };

    insert(
        "style",
        "Style",
        "palette",
        AffordanceCategory::Style,
        None,
        "style_picker",
        &["roomType", "currentStyle"],
        "style_library",
    );
    insert(
        "budget",
        "Budget",
        "wallet",
        AffordanceCategory::Budget,
        None,
        "budget_slider",
        &["budgetEstimate"],
        "budget_bands",
    );
    insert(
        "colorPalette",
        "Colors",
        "swatch",
        AffordanceCategory::Color,
        None,
        "color_grid",
        &["colors"],
        "palette_library",
    );
    insert(
        "furniture",
        "Furniture",
        "armchair",
        AffordanceCategory::Furniture,
        Some(VisibilityRules {
            required_space_types: Some(vec![SpaceType::Interior, SpaceType::Mixed]),
            ..VisibilityRules::default()
        }),
        "furniture_browser",
        &["roomType", "furniture"],
        "furniture_feed",
    );
    insert(
        "materials",
        "Materials",
        "layers",
        AffordanceCategory::Material,
        None,
        "material_grid",
        &["materials"],
        "material_library",
    );
    insert(
        "lighting",
        "Lighting",
        "lamp",
        AffordanceCategory::Function,
        None,
        "lighting_panel",
        &["environment"],
        "lighting_presets",
    );
    insert(
        "kitchen",
        "Kitchen",
        "chef-hat",
        AffordanceCategory::Function,
        Some(VisibilityRules {
            required_room_types: Some(vec!["kitchen".to_string()]),
            ..VisibilityRules::default()
        }),
        "kitchen_planner",
        &["roomType", "fixtures"],
        "kitchen_feed",
    );
    insert(
        "function",
        "Layout",
        "grid",
        AffordanceCategory::Function,
        Some(VisibilityRules {
            required_space_types: Some(vec![SpaceType::Interior]),
            ..VisibilityRules::default()
        }),
        "layout_panel",
        &["spatial"],
        "layout_presets",
    );
    insert(
        "location",
        "Outdoors",
        "map-pin",
        AffordanceCategory::Location,
        Some(VisibilityRules {
            required_space_types: Some(vec![SpaceType::Exterior, SpaceType::Mixed]),
            ..VisibilityRules::default()
        }),
        "location_panel",
        &["location"],
        "climate_presets",
    );
    insert(
        "cultural",
        "Cultural",
        "globe",
        AffordanceCategory::Cultural,
        None,
        "cultural_browser",
        &["currentStyle"],
        "cultural_library",
    );
    insert(
        "fantasy",
        "Fantasy",
        "sparkles",
        AffordanceCategory::Style,
        Some(VisibilityRules {
            min_confidence: Some(0.4),
            ..VisibilityRules::default()
        }),
        "fantasy_browser",
        &["currentStyle"],
        "fantasy_library",
    );

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_keeps_insertion_order_and_known_ids() {
        let catalog = AffordanceCatalog::default();
        let ids: Vec<&str> = catalog.definitions().map(|def| def.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"style"));
        assert!(ids.contains(&"budget"));
        assert!(ids.contains(&"colorPalette"));
        assert!(ids.contains(&"fantasy"));
        assert_eq!(catalog.len(), ids.len());
    }

    #[test]
    fn catalog_loads_from_json_file() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("catalog.json");
        std::fs::write(
            &path,
            serde_json::json!([
                {
                    "id": "style",
                    "label": "Style",
                    "icon": "palette",
                    "category": "style",
                },
                {
                    "id": "garden",
                    "label": "Garden",
                    "icon": "flower",
                    "category": "location",
                    "visibility": {"requiredSpaceTypes": ["exterior"], "minConfidence": 0.3},
                    "panel": {"view": "garden_panel"},
                    "options": {"filterKeys": ["location"], "dataSource": "garden_feed"},
                },
            ])
            .to_string(),
        )?;

        let catalog = AffordanceCatalog::from_json_file(&path)?;
        assert_eq!(catalog.len(), 2);
        let garden = catalog.get("garden").expect("garden entry");
        assert_eq!(garden.category, AffordanceCategory::Location);
        let rules = garden.visibility.as_ref().expect("rules");
        assert_eq!(rules.required_space_types, Some(vec![SpaceType::Exterior]));
        assert_eq!(rules.min_confidence, Some(0.3));
        assert_eq!(garden.options.data_source, "garden_feed");
        Ok(())
    }

    #[test]
    fn catalog_rejects_malformed_file() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("catalog.json");
        std::fs::write(&path, "not json")?;
        assert!(AffordanceCatalog::from_json_file(&path).is_err());
        Ok(())
    }
}
