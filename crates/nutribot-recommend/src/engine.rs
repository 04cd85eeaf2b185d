use std::path::Path;

use tracing::{debug, info, warn};

use nutribot_core::error::Result;
use nutribot_core::loader::load_recipes;
use nutribot_core::types::{DietaryTag, RecipeCollection, RecipeId, RecipeSummary};
use nutribot_text::LexicalIndex;

use crate::band::Band;
use crate::query::PreferenceQuery;
use crate::strategy::{KeywordMatch, KeywordSimilarity, RankContext, RankError, RankingStrategy, RatingOrder};

/// Filter pipeline followed by an ordered chain of ranking strategies.
pub struct RecommendationEngine {
    strategies: Vec<Box<dyn RankingStrategy>>,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::with_strategies(vec![Box::new(KeywordSimilarity), Box::new(KeywordMatch), Box::new(RatingOrder)])
    }
}

impl RecommendationEngine {
    pub fn with_strategies(strategies: Vec<Box<dyn RankingStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn recommend(
        &self,
        query: &PreferenceQuery,
        collection: &RecipeCollection,
        index: Option<&LexicalIndex>,
        max_results: usize,
    ) -> Vec<RecipeSummary> {
        let Some(index) = index else {
            warn!("No lexical index, returning no recommendations");
            return Vec::new();
        };
        let survivors = filter(query, collection);
        if survivors.is_empty() {
            debug!("No recipes left after filtering");
            return Vec::new();
        }

        let ctx = RankContext { collection, index, keywords: &query.keywords };
        let ranked = self.rank(&survivors, &ctx);
        ranked
            .into_iter()
            .take(max_results)
            .filter_map(|id| collection.get(id).map(|r| r.summary()))
            .collect()
    }

    fn rank(&self, ids: &[RecipeId], ctx: &RankContext<'_>) -> Vec<RecipeId> {
        for strategy in &self.strategies {
            match strategy.rank(ids, ctx) {
                Ok(ranked) => {
                    debug!(strategy = strategy.name(), results = ranked.len(), "Ranked recipes");
                    return ranked;
                }
                Err(RankError::NotApplicable(reason)) => debug!(strategy = strategy.name(), reason, "Skipping strategy"),
                Err(RankError::Failed(e)) => warn!(strategy = strategy.name(), error = %e, "Ranking strategy failed, falling back"),
            }
        }
        warn!("No ranking strategy succeeded, keeping collection order");
        ids.to_vec()
    }
}

/// Calorie band, protein band, then every requested tag the collection has a column for.
pub fn filter(query: &PreferenceQuery, collection: &RecipeCollection) -> Vec<RecipeId> {
    let tags: Vec<DietaryTag> = query
        .dietary_tags
        .iter()
        .copied()
        .filter(|t| {
            let known = collection.has_tag_column(*t);
            if !known {
                debug!(tag = %t, "Tag column not present, ignoring");
            }
            known
        })
        .collect();

    let calories: Vec<RecipeId> =
        collection.iter().filter(|(_, r)| query.calorie_band.contains(r.calories)).map(|(id, _)| id).collect();
    let protein: Vec<RecipeId> = calories
        .iter()
        .copied()
        .filter(|id| collection.get(*id).is_some_and(|r| query.protein_band.contains(r.protein)))
        .collect();
    let tagged: Vec<RecipeId> = protein
        .iter()
        .copied()
        .filter(|id| collection.get(*id).is_some_and(|r| tags.iter().all(|t| r.has_tag(*t))))
        .collect();
    debug!(
        total = collection.len(),
        after_calories = calories.len(),
        after_protein = protein.len(),
        after_tags = tagged.len(),
        "Filtered recipes"
    );
    tagged
}

/// Rank recipes for `query` with the default strategy chain. Without an index
/// the result is empty.
pub fn recommend(
    query: &PreferenceQuery,
    collection: &RecipeCollection,
    index: Option<&LexicalIndex>,
    max_results: usize,
) -> Vec<RecipeSummary> {
    RecommendationEngine::default().recommend(query, collection, index, max_results)
}

/// Load the recipe table and fit the lexical index over it.
pub fn build_recipe_index(path: &Path) -> Result<(RecipeCollection, LexicalIndex)> {
    let collection = load_recipes(path)?;
    let index = LexicalIndex::build(&collection)?;
    info!(recipes = collection.len(), terms = index.vocabulary().len(), "Recipe index ready");
    Ok((collection, index))
}
