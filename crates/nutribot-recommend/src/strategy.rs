//! Ranking strategies. The engine tries them in order and keeps the first
//! ordering that succeeds.

use std::cmp::Ordering;

use thiserror::Error;

use nutribot_core::types::{RecipeCollection, RecipeId};
use nutribot_text::LexicalIndex;

pub struct RankContext<'a> {
    pub collection: &'a RecipeCollection,
    pub index: &'a LexicalIndex,
    pub keywords: &'a str,
}

impl RankContext<'_> {
    /// Whitespace-only keywords still count; they simply match nothing.
    fn keywords(&self) -> Option<&str> {
        (!self.keywords.is_empty()).then_some(self.keywords)
    }
}

#[derive(Debug, Error)]
pub enum RankError {
    /// The strategy does not apply to this request; not worth a warning.
    #[error("not applicable: {0}")]
    NotApplicable(&'static str),
    #[error(transparent)]
    Failed(#[from] nutribot_core::Error),
}

pub trait RankingStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    /// Reorder (and possibly narrow) `ids`.
    fn rank(&self, ids: &[RecipeId], ctx: &RankContext<'_>) -> Result<Vec<RecipeId>, RankError>;
}

/// Cosine similarity of the keywords against the TF-IDF rows.
pub struct KeywordSimilarity;

impl RankingStrategy for KeywordSimilarity {
    fn name(&self) -> &'static str {
        "keyword-similarity"
    }

    fn rank(&self, ids: &[RecipeId], ctx: &RankContext<'_>) -> Result<Vec<RecipeId>, RankError> {
        let keywords = ctx.keywords().ok_or(RankError::NotApplicable("no keywords"))?;
        let index = ctx.index;
        if index.n_rows() != ctx.collection.len() {
            return Err(nutribot_core::Error::Alignment { id: ctx.collection.len(), rows: index.n_rows() }.into());
        }
        let query = index.transform(keywords);
        let sims = index.similarities(&query, ids)?;
        let mut scored: Vec<(RecipeId, f32)> = ids.iter().copied().zip(sims).collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        Ok(scored.into_iter().map(|(id, _)| id).collect())
    }
}

/// Whole-word, case-insensitive title match on any keyword token, then rating order.
///
/// Only reached when the index could not serve this request.
pub struct KeywordMatch;

impl RankingStrategy for KeywordMatch {
    fn name(&self) -> &'static str {
        "keyword-match"
    }

    fn rank(&self, ids: &[RecipeId], ctx: &RankContext<'_>) -> Result<Vec<RecipeId>, RankError> {
        let keywords = ctx.keywords().ok_or(RankError::NotApplicable("no keywords"))?;
        let tokens: Vec<String> = keywords.split_whitespace().map(str::to_lowercase).collect();
        let matched: Vec<RecipeId> = ids
            .iter()
            .copied()
            .filter(|&id| {
                ctx.collection.get(id).is_some_and(|r| {
                    let title = r.title.to_lowercase();
                    tokens.iter().any(|t| contains_word(&title, t))
                })
            })
            .collect();
        RatingOrder.rank(&matched, ctx)
    }
}

/// Rating descending; unrated recipes keep their order at the end.
pub struct RatingOrder;

impl RankingStrategy for RatingOrder {
    fn name(&self) -> &'static str {
        "rating"
    }

    fn rank(&self, ids: &[RecipeId], ctx: &RankContext<'_>) -> Result<Vec<RecipeId>, RankError> {
        let rating = |id: &RecipeId| ctx.collection.get(*id).and_then(|r| r.rating);
        let mut out = ids.to_vec();
        out.sort_by(|a, b| match (rating(a), rating(b)) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Ok(out)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `needle` occurs in `haystack` with no word character on either side.
pub(crate) fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, m)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + m.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}
