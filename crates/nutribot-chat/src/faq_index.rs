use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use nutribot_core::error::{Error, Result};
use nutribot_core::loader::load_faq;
use nutribot_core::similarity::{argmax, cosine_similarity};
use nutribot_core::traits::Embedder;
use nutribot_core::types::FaqEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
	pub batch_size: usize,
	pub show_progress: bool,
}

impl Default for BuildOptions {
	fn default() -> Self {
		Self { batch_size: 32, show_progress: false }
	}
}

/// FAQ entries and their question embeddings; position `i` in one is position `i` in the other.
#[derive(Debug, Clone, Default)]
pub struct FaqIndex {
	entries: Vec<FaqEntry>,
	embeddings: Vec<Vec<f32>>,
}

impl FaqIndex {
	/// Embed every question. Nothing is returned unless all batches succeed.
	pub fn build(entries: Vec<FaqEntry>, embedder: &dyn Embedder, options: &BuildOptions) -> Result<Self> {
		let batch_size = options.batch_size.max(1);
		let pb = options.show_progress.then(|| {
			let pb = ProgressBar::new(entries.len() as u64);
			let style = ProgressStyle::default_bar()
				.template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} questions {msg}")
				.map(|s| s.progress_chars("#>-"))
				.unwrap_or_else(|_| ProgressStyle::default_bar());
			pb.set_style(style);
			pb
		});

		let mut embeddings = Vec::with_capacity(entries.len());
		for batch in entries.chunks(batch_size) {
			let questions: Vec<String> = batch.iter().map(|e| e.question.clone()).collect();
			let vectors = embedder.embed_batch(&questions).map_err(|e| Error::Embedding(format!("{e:#}")))?;
			if vectors.len() != questions.len() {
				return Err(Error::Embedding(format!("expected {} vectors, got {}", questions.len(), vectors.len())));
			}
			if let Some(v) = vectors.iter().find(|v| v.len() != embedder.dim()) {
				return Err(Error::Embedding(format!("expected dim {}, got {}", embedder.dim(), v.len())));
			}
			embeddings.extend(vectors);
			if let Some(pb) = &pb {
				pb.inc(batch.len() as u64);
			}
			debug!(done = embeddings.len(), total = entries.len(), "Embedded FAQ batch");
		}
		if let Some(pb) = pb {
			pb.finish_with_message("done");
		}
		info!(entries = entries.len(), dim = embedder.dim(), "Built FAQ index");
		Ok(Self { entries, embeddings })
	}

	/// Assemble an index from precomputed vectors.
	pub fn from_parts(entries: Vec<FaqEntry>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
		if entries.len() != embeddings.len() {
			return Err(Error::Embedding(format!("{} entries but {} embeddings", entries.len(), embeddings.len())));
		}
		Ok(Self { entries, embeddings })
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn entries(&self) -> &[FaqEntry] {
		&self.entries
	}

	pub fn embeddings(&self) -> &[Vec<f32>] {
		&self.embeddings
	}

	pub fn entry(&self, position: usize) -> Option<&FaqEntry> {
		self.entries.get(position)
	}

	/// Cosine similarity of `query` against every question, in index order.
	pub fn scores(&self, query: &[f32]) -> Vec<f32> {
		self.embeddings.iter().map(|e| cosine_similarity(query, e)).collect()
	}

	/// Highest-scoring position; the earliest wins ties.
	pub fn best_match(&self, query: &[f32]) -> Option<(usize, f32)> {
		argmax(&self.scores(query))
	}
}

/// Load the FAQ table at `path` and embed it.
pub fn build_faq_index(path: &Path, embedder: &dyn Embedder) -> Result<FaqIndex> {
	build_faq_index_with(path, embedder, &BuildOptions::default())
}

pub fn build_faq_index_with(path: &Path, embedder: &dyn Embedder, options: &BuildOptions) -> Result<FaqIndex> {
	let entries = load_faq(path)?;
	FaqIndex::build(entries, embedder, options)
}
