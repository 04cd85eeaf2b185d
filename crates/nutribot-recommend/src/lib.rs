//! nutribot-recommend
//!
//! Filters the recipe table by calorie band, protein band and dietary tags,
//! then ranks the survivors by keyword similarity or rating.
pub mod band;
pub mod engine;
pub mod query;
pub mod strategy;

pub use band::{Band, CalorieBand, ProteinBand};
pub use engine::{build_recipe_index, filter, recommend, RecommendationEngine};
pub use query::{PreferenceQuery, PreferenceQueryBuilder};
pub use strategy::{KeywordMatch, KeywordSimilarity, RankContext, RankError, RankingStrategy, RatingOrder};
