//! Lazily built, process-wide FAQ knowledge base.
//!
//! The first caller loads the embedding model and embeds the FAQ table while
//! holding the build guard; later callers get the published `Arc` without
//! locking. A failed build publishes nothing, so the next call retries.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use nutribot_core::config::Config;
use nutribot_core::error::{Error, Result};
use nutribot_core::loader::load_faq;
use nutribot_core::traits::Embedder;
use nutribot_embed::get_default_embedder;

use crate::faq_index::{BuildOptions, FaqIndex};

pub type EmbedderFactory = Box<dyn Fn() -> anyhow::Result<Arc<dyn Embedder>> + Send + Sync>;

/// A built index together with the model that embedded it.
#[derive(Clone)]
pub struct Ready {
	pub index: Arc<FaqIndex>,
	pub embedder: Arc<dyn Embedder>,
}

pub struct FaqService {
	source: PathBuf,
	options: BuildOptions,
	factory: EmbedderFactory,
	// Build-once guard; also caches the model across failed builds.
	model: Mutex<Option<Arc<dyn Embedder>>>,
	ready: RwLock<Option<Ready>>,
}

impl FaqService {
	pub fn new(source: impl Into<PathBuf>, factory: EmbedderFactory) -> Self {
		Self { source: source.into(), options: BuildOptions::default(), factory, model: Mutex::new(None), ready: RwLock::new(None) }
	}

	pub fn with_options(mut self, options: BuildOptions) -> Self {
		self.options = options;
		self
	}

	/// Service for the FAQ file and embedding model named in `config`.
	pub fn from_config(config: &Config) -> anyhow::Result<Self> {
		let settings = config.settings()?;
		let model_dir = config.resolve(&settings.embedding.model_dir);
		let max_len = settings.embedding.max_len;
		let factory: EmbedderFactory = Box::new(move || get_default_embedder(&model_dir, max_len));
		Ok(Self::new(config.resolve(&settings.data.faq_csv), factory).with_options(BuildOptions {
			batch_size: settings.embedding.batch_size,
			show_progress: settings.embedding.show_progress,
		}))
	}

	/// Return the published index, building it on first use.
	pub fn get(&self) -> Result<Ready> {
		if let Some(ready) = self.ready.read().clone() {
			return Ok(ready);
		}
		let mut model = self.model.lock();
		if let Some(ready) = self.ready.read().clone() {
			return Ok(ready);
		}

		let entries = load_faq(&self.source)?;
		let embedder = match model.as_ref() {
			Some(e) => e.clone(),
			None => {
				let e = (self.factory)().map_err(|e| {
					warn!(error = %e, "Failed to load embedding model");
					Error::Embedding(format!("{e:#}"))
				})?;
				*model = Some(e.clone());
				e
			}
		};
		let index = Arc::new(FaqIndex::build(entries, embedder.as_ref(), &self.options)?);
		let ready = Ready { index, embedder };
		*self.ready.write() = Some(ready.clone());
		info!(source = %self.source.display(), entries = ready.index.len(), "FAQ knowledge base ready");
		Ok(ready)
	}

	pub fn index(&self) -> Result<Arc<FaqIndex>> {
		Ok(self.get()?.index)
	}

	pub fn is_built(&self) -> bool {
		self.ready.read().is_some()
	}

	/// Drop the cached index and model; the next call rebuilds both.
	pub fn teardown(&self) {
		let mut model = self.model.lock();
		*self.ready.write() = None;
		*model = None;
		info!("FAQ knowledge base released");
	}
}
