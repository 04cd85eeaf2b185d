use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, info};

use nutribot_core::error::{Error, Result};
use nutribot_core::types::{RecipeCollection, RecipeId};

use crate::analyzer::TitleAnalyzer;

/// Sparse row vector, entries sorted by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
	pub entries: Vec<(usize, f32)>,
}

impl SparseVector {
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	fn from_counts(counts: BTreeMap<usize, u32>, idf: &[f32]) -> Self {
		let mut entries: Vec<(usize, f32)> = counts.into_iter().map(|(col, n)| (col, n as f32 * idf[col])).collect();
		let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
		if norm > 0.0 {
			for (_, w) in &mut entries {
				*w /= norm;
			}
		}
		Self { entries }
	}
}

/// Compressed sparse rows.
#[derive(Debug, Clone, PartialEq)]
struct CsrMatrix {
	indptr: Vec<usize>,
	indices: Vec<usize>,
	data: Vec<f32>,
}

impl CsrMatrix {
	fn from_rows(rows: Vec<SparseVector>) -> Self {
		let mut indptr = Vec::with_capacity(rows.len() + 1);
		let mut indices = Vec::new();
		let mut data = Vec::new();
		indptr.push(0);
		for row in rows {
			for (c, w) in row.entries {
				indices.push(c);
				data.push(w);
			}
			indptr.push(indices.len());
		}
		Self { indptr, indices, data }
	}

	fn n_rows(&self) -> usize {
		self.indptr.len() - 1
	}

	fn row_dot(&self, row: usize, v: &SparseVector) -> f32 {
		let (start, end) = (self.indptr[row], self.indptr[row + 1]);
		let (cols, vals) = (&self.indices[start..end], &self.data[start..end]);
		let (mut i, mut j, mut acc) = (0, 0, 0.0f32);
		while i < cols.len() && j < v.entries.len() {
			let (qc, qw) = v.entries[j];
			match cols[i].cmp(&qc) {
				std::cmp::Ordering::Less => i += 1,
				std::cmp::Ordering::Greater => j += 1,
				std::cmp::Ordering::Equal => {
					acc += vals[i] * qw;
					i += 1;
					j += 1;
				}
			}
		}
		acc
	}
}

/// TF-IDF model fitted over recipe titles. Row `i` belongs to `RecipeId(i)`.
///
/// Vocabulary and idf weights are frozen once built.
#[derive(Clone)]
pub struct LexicalIndex {
	analyzer: TitleAnalyzer,
	vocabulary: BTreeMap<String, usize>,
	idf: Vec<f32>,
	matrix: CsrMatrix,
}

impl fmt::Debug for LexicalIndex {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LexicalIndex").field("rows", &self.n_rows()).field("terms", &self.vocabulary.len()).finish()
	}
}

impl LexicalIndex {
	pub fn build(collection: &RecipeCollection) -> Result<Self> {
		if collection.is_empty() {
			return Err(Error::EmptyCorpus("recipe collection has no rows".into()));
		}
		let analyzer = TitleAnalyzer::default();
		let docs: Vec<Vec<String>> = collection.records().iter().map(|r| analyzer.tokens(&r.title.to_lowercase())).collect();

		let terms: BTreeSet<&str> = docs.iter().flatten().map(String::as_str).collect();
		if terms.is_empty() {
			return Err(Error::EmptyCorpus("no indexable terms in recipe titles".into()));
		}
		let vocabulary: BTreeMap<String, usize> = terms.into_iter().enumerate().map(|(i, t)| (t.to_string(), i)).collect();

		let mut df = vec![0usize; vocabulary.len()];
		let counted: Vec<BTreeMap<usize, u32>> = docs
			.iter()
			.map(|tokens| {
				let mut counts = BTreeMap::new();
				for t in tokens {
					if let Some(&col) = vocabulary.get(t) {
						*counts.entry(col).or_insert(0) += 1;
					}
				}
				for &col in counts.keys() {
					df[col] += 1;
				}
				counts
			})
			.collect();

		let n = docs.len() as f32;
		let idf: Vec<f32> = df.iter().map(|&d| ((1.0 + n) / (1.0 + d as f32)).ln() + 1.0).collect();
		let rows = counted.into_iter().map(|c| SparseVector::from_counts(c, &idf)).collect();
		let matrix = CsrMatrix::from_rows(rows);
		info!(rows = matrix.n_rows(), terms = vocabulary.len(), nnz = matrix.data.len(), "Built lexical index");
		Ok(Self { analyzer, vocabulary, idf, matrix })
	}

	/// Vectorise `text` with the fitted vocabulary. Unknown terms are ignored.
	pub fn transform(&self, text: &str) -> SparseVector {
		let mut counts = BTreeMap::new();
		for t in self.analyzer.tokens(&text.to_lowercase()) {
			if let Some(&col) = self.vocabulary.get(&t) {
				*counts.entry(col).or_insert(0u32) += 1;
			}
		}
		SparseVector::from_counts(counts, &self.idf)
	}

	/// Cosine similarity between `query` and the rows named by `ids`, in `ids` order.
	pub fn similarities(&self, query: &SparseVector, ids: &[RecipeId]) -> Result<Vec<f32>> {
		let rows = self.n_rows();
		if let Some(bad) = ids.iter().find(|id| id.index() >= rows) {
			return Err(Error::Alignment { id: bad.index(), rows });
		}
		if query.is_empty() {
			debug!("Query has no in-vocabulary terms");
		}
		Ok(ids.iter().map(|id| self.matrix.row_dot(id.index(), query)).collect())
	}

	pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
		&self.vocabulary
	}

	pub fn n_rows(&self) -> usize {
		self.matrix.n_rows()
	}

	/// Stored weights of one row, sorted by column.
	pub fn row(&self, id: RecipeId) -> Option<SparseVector> {
		if id.index() >= self.n_rows() {
			return None;
		}
		let (s, e) = (self.matrix.indptr[id.index()], self.matrix.indptr[id.index() + 1]);
		Some(SparseVector { entries: self.matrix.indices[s..e].iter().copied().zip(self.matrix.data[s..e].iter().copied()).collect() })
	}
}
