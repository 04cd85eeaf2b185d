//! nutribot-text
//!
//! TF-IDF lexical index over recipe titles. Tokenisation goes through a
//! tantivy `TextAnalyzer`; weighting and the sparse matrix are computed here.
pub mod analyzer;
pub mod index;

pub use analyzer::TitleAnalyzer;
pub use index::{LexicalIndex, SparseVector};
