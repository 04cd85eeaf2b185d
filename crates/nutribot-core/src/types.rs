//! Domain types shared by the recommendation and FAQ engines.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Dietary flags recognised in the recipe table.
///
/// The string form of each variant is the exact column header used by the
/// cleaned recipe CSV (`glutenFree`, `lowSodium`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DietaryTag {
    Vegetarian,
    Vegan,
    GlutenFree,
    DairyFree,
    PeanutFree,
    SoyFree,
    TreeNutFree,
    Kosher,
    Healthy,
    LowCal,
    LowFat,
    LowSodium,
    Dessert,
    Drink,
}

impl DietaryTag {
    pub const ALL: [DietaryTag; 14] = [
        DietaryTag::Vegetarian,
        DietaryTag::Vegan,
        DietaryTag::GlutenFree,
        DietaryTag::DairyFree,
        DietaryTag::PeanutFree,
        DietaryTag::SoyFree,
        DietaryTag::TreeNutFree,
        DietaryTag::Kosher,
        DietaryTag::Healthy,
        DietaryTag::LowCal,
        DietaryTag::LowFat,
        DietaryTag::LowSodium,
        DietaryTag::Dessert,
        DietaryTag::Drink,
    ];

    /// Column header for this tag.
    pub fn column(self) -> &'static str {
        match self {
            DietaryTag::Vegetarian => "vegetarian",
            DietaryTag::Vegan => "vegan",
            DietaryTag::GlutenFree => "glutenFree",
            DietaryTag::DairyFree => "dairyFree",
            DietaryTag::PeanutFree => "peanutFree",
            DietaryTag::SoyFree => "soyFree",
            DietaryTag::TreeNutFree => "treeNutFree",
            DietaryTag::Kosher => "kosher",
            DietaryTag::Healthy => "healthy",
            DietaryTag::LowCal => "lowCal",
            DietaryTag::LowFat => "lowFat",
            DietaryTag::LowSodium => "lowSodium",
            DietaryTag::Dessert => "dessert",
            DietaryTag::Drink => "drink",
        }
    }
}

impl fmt::Display for DietaryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for DietaryTag {
    type Err = String;

    /// Accepts the column header, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DietaryTag::ALL
            .into_iter()
            .find(|t| t.column().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown dietary tag '{wanted}'"))
    }
}

pub type TagSet = BTreeSet<DietaryTag>;

/// Position of a recipe in its collection.
///
/// The same key addresses row `id.0` of the lexical index matrix, so ids are
/// only meaningful for the collection they were issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub usize);

impl RecipeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub title: String,
    pub rating: Option<f64>,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub sodium: f64,
    pub tags: TagSet,
}

impl RecipeRecord {
    pub fn has_tag(&self, tag: DietaryTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn summary(&self) -> RecipeSummary {
        RecipeSummary {
            title: self.title.clone(),
            rating: self.rating,
            calories: self.calories,
            protein: self.protein,
            fat: self.fat,
            sodium: self.sodium,
        }
    }
}

/// Immutable, ordered recipe table loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct RecipeCollection {
    records: Vec<RecipeRecord>,
    tag_columns: TagSet,
}

impl RecipeCollection {
    pub fn new(records: Vec<RecipeRecord>, tag_columns: TagSet) -> Self {
        Self { records, tag_columns }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecipeId) -> Option<&RecipeRecord> {
        self.records.get(id.0)
    }

    /// All ids in source order.
    pub fn ids(&self) -> impl Iterator<Item = RecipeId> + '_ {
        (0..self.records.len()).map(RecipeId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RecipeId, &RecipeRecord)> + '_ {
        self.records.iter().enumerate().map(|(i, r)| (RecipeId(i), r))
    }

    pub fn records(&self) -> &[RecipeRecord] {
        &self.records
    }

    /// Whether the source table carried a column for `tag`.
    pub fn has_tag_column(&self, tag: DietaryTag) -> bool {
        self.tag_columns.contains(&tag)
    }
}

/// The projection returned to callers of the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub sodium: f64,
}

/// One row of the nutrition FAQ. `question` is stored lower-cased and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

impl FaqEntry {
    pub fn new(question: &str, answer: &str) -> Self {
        Self { question: normalize_question(question), answer: answer.trim().to_string() }
    }
}

/// Normalisation applied to FAQ questions and incoming chat queries alike.
pub fn normalize_question(text: &str) -> String {
    text.trim().to_lowercase()
}
