use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("Source is missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("Cannot build index from an empty corpus: {0}")]
    EmptyCorpus(String),

    #[error("Recipe id {id} is outside the index ({rows} rows)")]
    Alignment { id: usize, rows: usize },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Unknown {kind} band: {label}")]
    InvalidBand { kind: &'static str, label: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn load(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::Load { path: path.to_string(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
