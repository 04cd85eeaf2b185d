#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! nutribot-core
//!
//! Shared data model, error taxonomy, configuration and tabular loaders for
//! the recipe recommender and the nutrition FAQ matcher.

pub mod config;
pub mod error;
pub mod loader;
pub mod similarity;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::Embedder;
pub use types::{
    DietaryTag, FaqEntry, RecipeCollection, RecipeId, RecipeRecord, RecipeSummary, TagSet,
};
