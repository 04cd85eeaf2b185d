use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use nutribot_core::types::DietaryTag;

use crate::band::{Band, CalorieBand, ProteinBand};

/// What the user asked for. Built directly or through [`PreferenceQueryBuilder`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceQuery {
    pub calorie_band: CalorieBand,
    pub protein_band: ProteinBand,
    pub dietary_tags: BTreeSet<DietaryTag>,
    pub keywords: String,
}

impl PreferenceQuery {
    pub fn builder() -> PreferenceQueryBuilder {
        PreferenceQueryBuilder::default()
    }
}

/// Accepts raw UI labels. Unknown bands become `Any` and unknown tags are dropped, both with a warning.
#[derive(Debug, Default)]
pub struct PreferenceQueryBuilder {
    query: PreferenceQuery,
}

impl PreferenceQueryBuilder {
    pub fn calorie_band(mut self, band: CalorieBand) -> Self {
        self.query.calorie_band = band;
        self
    }

    pub fn calorie_label(self, label: &str) -> Self {
        self.calorie_band(CalorieBand::parse_lenient(label))
    }

    pub fn protein_band(mut self, band: ProteinBand) -> Self {
        self.query.protein_band = band;
        self
    }

    pub fn protein_label(self, label: &str) -> Self {
        self.protein_band(ProteinBand::parse_lenient(label))
    }

    pub fn tag(mut self, tag: DietaryTag) -> Self {
        self.query.dietary_tags.insert(tag);
        self
    }

    pub fn tag_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            match name.as_ref().parse::<DietaryTag>() {
                Ok(tag) => {
                    self.query.dietary_tags.insert(tag);
                }
                Err(e) => warn!(error = %e, "Ignoring dietary tag"),
            }
        }
        self
    }

    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.query.keywords = keywords.into();
        self
    }

    pub fn build(self) -> PreferenceQuery {
        self.query
    }
}
