//! CSV loaders for the cleaned recipe table and the nutrition FAQ.
//!
//! Both loaders read headers first, validate the columns they need and then
//! coerce row by row. Rows that cannot be coerced are dropped and counted;
//! structural problems (missing file, missing column) are returned as errors.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{DietaryTag, FaqEntry, RecipeCollection, RecipeRecord, TagSet};

pub const REQUIRED_RECIPE_COLUMNS: [&str; 5] = ["title", "calories", "protein", "fat", "sodium"];
pub const FAQ_QUESTION_COLUMN: &str = "Question Keywords";
pub const FAQ_ANSWER_COLUMN: &str = "Answer";

struct RecipeColumns {
    title: usize,
    calories: usize,
    protein: usize,
    fat: usize,
    sodium: usize,
    rating: Option<usize>,
    tags: Vec<(DietaryTag, usize)>,
}

impl RecipeColumns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let missing: Vec<String> = REQUIRED_RECIPE_COLUMNS
            .iter()
            .filter(|&&c| position(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }
        let required = |name: &str| {
            position(name).ok_or_else(|| Error::MissingColumns(vec![name.to_string()]))
        };
        Ok(Self {
            title: required("title")?,
            calories: required("calories")?,
            protein: required("protein")?,
            fat: required("fat")?,
            sodium: required("sodium")?,
            rating: position("rating"),
            tags: DietaryTag::ALL
                .into_iter()
                .filter_map(|t| position(t.column()).map(|i| (t, i)))
                .collect(),
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub dropped_non_numeric: usize,
    pub dropped_out_of_range: usize,
}

/// Load the cleaned recipe table from a CSV file.
pub fn load_recipes(path: &Path) -> Result<RecipeCollection> {
    let file = File::open(path).map_err(|e| Error::load(path.display(), e))?;
    let (collection, stats) = load_recipes_from_reader(file, &path.display().to_string())?;
    info!(
        path = %path.display(),
        loaded = stats.rows_loaded,
        dropped = stats.rows_read - stats.rows_loaded,
        "Loaded recipe table"
    );
    Ok(collection)
}

/// Load recipes from any reader. `source` names the input in error messages.
pub fn load_recipes_from_reader<R: Read>(
    reader: R,
    source: &str,
) -> Result<(RecipeCollection, LoadStats)> {
    let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
    let headers = reader.headers().map_err(|e| Error::load(source, e))?.clone();
    let columns = RecipeColumns::from_headers(&headers)?;

    let mut stats = LoadStats::default();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| Error::load(source, e))?;
        stats.rows_read += 1;
        let numbers = (
            coerce_f64(row.get(columns.calories)),
            coerce_f64(row.get(columns.protein)),
            coerce_f64(row.get(columns.fat)),
            coerce_f64(row.get(columns.sodium)),
        );
        let (Some(calories), Some(protein), Some(fat), Some(sodium)) = numbers else {
            stats.dropped_non_numeric += 1;
            continue;
        };
        if calories <= 0.0 || protein < 0.0 {
            stats.dropped_out_of_range += 1;
            continue;
        }
        let tags: TagSet = columns
            .tags
            .iter()
            .filter(|(_, i)| coerce_flag(row.get(*i)))
            .map(|(t, _)| *t)
            .collect();
        records.push(RecipeRecord {
            title: row.get(columns.title).unwrap_or("").trim().to_string(),
            rating: columns.rating.and_then(|i| coerce_f64(row.get(i))),
            calories,
            protein,
            fat,
            sodium,
            tags,
        });
    }
    stats.rows_loaded = records.len();
    debug!(
        non_numeric = stats.dropped_non_numeric,
        out_of_range = stats.dropped_out_of_range,
        "Recipe rows dropped during coercion"
    );
    let tag_columns = columns.tags.iter().map(|(t, _)| *t).collect();
    Ok((RecipeCollection::new(records, tag_columns), stats))
}

/// Load FAQ question/answer pairs from a CSV file.
pub fn load_faq(path: &Path) -> Result<Vec<FaqEntry>> {
    let file = File::open(path).map_err(|e| Error::load(path.display(), e))?;
    let entries = load_faq_from_reader(file, &path.display().to_string())?;
    info!(path = %path.display(), entries = entries.len(), "Loaded FAQ table");
    Ok(entries)
}

pub fn load_faq_from_reader<R: Read>(reader: R, source: &str) -> Result<Vec<FaqEntry>> {
    let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
    let headers = reader.headers().map_err(|e| Error::load(source, e))?.clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let columns = (position(FAQ_QUESTION_COLUMN), position(FAQ_ANSWER_COLUMN));
    let (question_col, answer_col) = match columns {
        (Some(q), Some(a)) => (q, a),
        (q, a) => {
            let mut missing = Vec::new();
            if q.is_none() {
                missing.push(FAQ_QUESTION_COLUMN.to_string());
            }
            if a.is_none() {
                missing.push(FAQ_ANSWER_COLUMN.to_string());
            }
            return Err(Error::MissingColumns(missing));
        }
    };

    let mut entries = Vec::new();
    let mut dropped = 0usize;
    for row in reader.records() {
        let row = row.map_err(|e| Error::load(source, e))?;
        let question = row.get(question_col).unwrap_or("");
        let answer = row.get(answer_col).unwrap_or("");
        if question.trim().is_empty() || answer.trim().is_empty() {
            dropped += 1;
            continue;
        }
        entries.push(FaqEntry::new(question, answer));
    }
    if dropped > 0 {
        debug!(dropped, "FAQ rows without question or answer dropped");
    }
    Ok(entries)
}

fn coerce_f64(cell: Option<&str>) -> Option<f64> {
    let v: f64 = cell?.trim().parse().ok()?;
    if v.is_nan() { None } else { Some(v) }
}

/// Tag cells are 0/1 after cleaning; anything non-numeric counts as false.
fn coerce_flag(cell: Option<&str>) -> bool {
    coerce_f64(cell).is_some_and(|v| v != 0.0)
}
