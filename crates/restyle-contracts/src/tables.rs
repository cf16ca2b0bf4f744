//! Declarative keyword and score tables. Data only; the algorithms that
//! consume these live in the engine crate so tuning never touches logic.

use crate::catalog::AffordanceCategory;
use crate::context::Climate;
use crate::scene::{Lighting, Resolution};

pub const STYLE_KEYWORDS: &[(&str, &[&str])] = &[
    ("modern", &["modern", "sleek", "contemporary", "clean lines"]),
    ("traditional", &["traditional", "classic", "vintage", "antique"]),
    ("scandinavian", &["scandinavian", "nordic", "hygge"]),
    ("industrial", &["industrial", "loft", "exposed brick"]),
    ("bohemian", &["bohemian", "boho", "eclectic"]),
    ("rustic", &["rustic", "farmhouse", "country"]),
    ("minimalist", &["minimalist", "minimal", "pared back"]),
];

pub const FUNCTIONAL_KEYWORDS: &[(&str, &[&str])] = &[
    ("cooking", &["cook", "cooking", "kitchen", "meal", "bake"]),
    ("sleeping", &["sleep", "bed", "rest", "nap"]),
    ("bathroom", &["bath", "shower", "toilet", "bathroom"]),
    ("working", &["work", "office", "desk", "study"]),
    ("storage", &["storage", "organize", "closet", "shelving"]),
    ("entertaining", &["entertain", "guests", "party", "hosting"]),
];

/// Requirements that only make sense indoors; requesting one against an
/// exterior scene is a conflict.
pub const INTERIOR_ONLY_REQUIREMENTS: &[&str] = &["cooking", "sleeping", "bathroom"];

pub const INTENT_KEYWORDS: &[(&str, &[&str])] = &[
    ("renovation", &["renovate", "renovation", "remodel", "rebuild", "gut"]),
    ("decoration", &["decorate", "decoration", "furnish", "accessorize", "stage"]),
    ("transformation", &["transform", "transformation", "makeover", "convert", "reimagine"]),
];

pub const DEFAULT_INTENT: &str = "transformation";

pub const ROOM_FURNITURE: &[(&str, &[&str])] = &[
    (
        "living_room",
        &["sofa", "couch", "coffee_table", "tv_stand", "armchair", "media_console"],
    ),
    (
        "bedroom",
        &["bed", "nightstand", "dresser", "wardrobe", "headboard"],
    ),
    (
        "kitchen",
        &["stove", "kitchen_island", "refrigerator", "oven", "range_hood", "bar_stool"],
    ),
    ("bathroom", &["bathtub", "vanity", "shower_bench", "toilet"]),
    (
        "office",
        &["desk", "office_chair", "bookshelf", "monitor", "filing_cabinet"],
    ),
    (
        "dining_room",
        &["dining_table", "dining_chair", "buffet", "sideboard", "china_cabinet"],
    ),
];

pub const CULTURAL_INFLUENCES: &[(&str, &[&str])] = &[
    ("modern", &["scandinavian", "japanese", "german"]),
    ("contemporary", &["italian", "scandinavian"]),
    ("traditional", &["english", "french", "colonial"]),
    ("rustic", &["farmhouse", "tuscan", "provencal"]),
    ("bohemian", &["moroccan", "indian", "mexican"]),
    ("minimalist", &["japanese", "scandinavian"]),
    ("scandinavian", &["danish", "swedish"]),
    ("industrial", &["american", "german"]),
];

/// Base budget band per image resolution, in whole currency units.
pub const BUDGET_BANDS: &[(Resolution, f64, f64)] = &[
    (Resolution::High, 15_000.0, 50_000.0),
    (Resolution::Medium, 5_000.0, 15_000.0),
    (Resolution::Low, 1_000.0, 5_000.0),
];

pub const BUDGET_CONFIDENCE: f64 = 0.6;

/// The largest matching multiplier wins; 1.0 when nothing matches.
pub const MATERIAL_MULTIPLIERS: &[(&str, f64)] = &[
    ("luxury", 2.0),
    ("gold", 1.8),
    ("marble", 1.5),
    ("granite", 1.4),
    ("hardwood", 1.3),
    ("glass", 1.2),
    ("steel", 1.1),
    ("concrete", 0.9),
    ("laminate", 0.8),
];

/// Weather keyword plus (optional) lighting requirement mapping to a
/// climate, first match wins; anything else reads as temperate.
pub const CLIMATE_RULES: &[(&str, Option<Lighting>, Climate)] = &[
    ("tropical", None, Climate::Tropical),
    ("humid", None, Climate::Tropical),
    ("hot", None, Climate::Tropical),
    ("sunny", Some(Lighting::Natural), Climate::Tropical),
    ("overcast", None, Climate::Temperate),
    ("rainy", None, Climate::Temperate),
];

pub const DEFAULT_CLIMATE: Climate = Climate::Temperate;

/// Room category -> affordance ids considered functionally relevant there.
pub const FUNCTIONAL_RELEVANCE: &[(&str, &[&str])] = &[
    ("kitchen", &["kitchen", "materials", "lighting"]),
    ("bedroom", &["furniture", "colorPalette", "lighting"]),
    ("living_room", &["style", "furniture", "colorPalette"]),
    ("bathroom", &["materials", "lighting", "budget"]),
    ("office", &["furniture", "lighting", "function"]),
    ("dining_room", &["furniture", "lighting", "style"]),
];

pub const AFFORDANCE_PROMPT_KEYWORDS: &[(&str, &[&str])] = &[
    ("style", &["style", "look", "aesthetic", "design"]),
    ("budget", &["budget", "cheap", "affordable", "cost", "price"]),
    ("colorPalette", &["color", "colors", "palette", "paint", "tone"]),
    ("furniture", &["furniture", "sofa", "table", "chair"]),
    ("materials", &["material", "materials", "wood", "stone", "marble"]),
    ("lighting", &["light", "lighting", "lamp", "bright", "dark"]),
    ("kitchen", &["kitchen", "cook", "appliance"]),
    ("function", &["layout", "space", "functional", "practical"]),
    ("location", &["outdoor", "garden", "climate", "weather"]),
    ("cultural", &["cultural", "japanese", "moroccan", "scandinavian"]),
    ("fantasy", &["fantasy", "dream", "magical", "whimsical"]),
];

pub const TRANSFORM_TRIGGERS: &[&str] = &["transform", "change"];
pub const TRANSFORM_BONUS_IDS: &[&str] = &["style", "colorPalette", "furniture"];

pub const COMPLEMENTARY_AFFORDANCES: &[(&str, &[&str])] = &[
    ("style", &["colorPalette", "materials"]),
    ("budget", &["materials", "furniture"]),
    ("colorPalette", &["style", "lighting"]),
    ("furniture", &["colorPalette", "style"]),
    ("materials", &["style", "budget"]),
    ("kitchen", &["materials", "lighting"]),
    ("lighting", &["colorPalette"]),
];

pub const ESSENTIAL_IDS: &[&str] = &["style", "budget", "colorPalette"];
pub const TRENDING_IDS: &[&str] = &["fantasy", "cultural"];

/// Tie-break order: ids earlier in this list win ties; ids absent from it
/// sort after every id present.
pub const PRIORITY_ORDER: &[&str] = &[
    "style",
    "budget",
    "colorPalette",
    "furniture",
    "materials",
    "lighting",
    "kitchen",
    "cultural",
    "location",
    "function",
    "fantasy",
];

pub const PRIORITY_CATEGORIES: &[AffordanceCategory] = &[
    AffordanceCategory::Style,
    AffordanceCategory::Function,
    AffordanceCategory::Budget,
];

pub const PRIORITY_CATEGORY_LIMIT: usize = 2;
pub const OTHER_CATEGORY_LIMIT: usize = 1;
pub const MAX_RESULTS: usize = 8;

// Scoring weights and fixed indicator values.
pub const CONTEXT_WEIGHT: f64 = 0.4;
pub const PROMPT_WEIGHT: f64 = 0.3;
pub const COMBINATION_WEIGHT: f64 = 0.2;
pub const PREFERENCE_WEIGHT: f64 = 0.1;

pub const STYLE_CATEGORY_INDICATOR: f64 = 0.8;
pub const FUNCTIONAL_RELEVANCE_INDICATOR: f64 = 0.9;
pub const BUDGET_INDICATOR: f64 = 0.7;
pub const NEUTRAL_CONTEXT_MATCH: f64 = 0.5;

pub const TRANSFORM_BONUS: f64 = 0.3;
pub const COMPLEMENTARY_BONUS: f64 = 0.2;
pub const ESSENTIAL_BONUS: f64 = 0.3;

pub const FAVORITE_STYLE_BONUS: f64 = 0.5;
pub const PREVIOUS_SELECTION_BONUS: f64 = 0.3;
pub const BUDGET_PREFERENCE_BONUS: f64 = 0.4;

pub const TIE_WINDOW: f64 = 0.1;

pub const RECOMMENDED_THRESHOLD: f64 = 0.8;
pub const STYLE_MATCH_THRESHOLD: f64 = 0.7;

pub fn lookup<'a>(table: &'a [(&str, &'a [&'a str])], key: &str) -> Option<&'a [&'a str]> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, values)| *values)
}
