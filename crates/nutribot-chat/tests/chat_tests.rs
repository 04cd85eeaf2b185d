use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use nutribot_chat::{answer, build_faq_index, Answer, BuildOptions, EmbedderFactory, FaqIndex, FaqService};
use nutribot_core::traits::Embedder;
use nutribot_core::types::FaqEntry;
use nutribot_core::Error;

/// Bag of words over a fixed vocabulary; other words are ignored.
struct VocabEmbedder;

const VOCAB: [&str; 8] = ["calories", "apple", "protein", "fiber", "vitamin", "water", "sugar", "banana"];

impl Embedder for VocabEmbedder {
	fn dim(&self) -> usize {
		VOCAB.len()
	}
	fn max_len(&self) -> usize {
		64
	}
	fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
		Ok(texts
			.iter()
			.map(|t| {
				let mut v = vec![0.0; VOCAB.len()];
				for w in t.split(|c: char| !c.is_alphanumeric()) {
					if let Some(i) = VOCAB.iter().position(|x| *x == w) {
						v[i] += 1.0;
					}
				}
				v
			})
			.collect())
	}
}

struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
	fn dim(&self) -> usize {
		4
	}
	fn max_len(&self) -> usize {
		4
	}
	fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
		anyhow::bail!("model exploded")
	}
}

const FAQ: &str = "Question Keywords,Answer\nCalories in an Apple,~95 kcal\nprotein sources,\"Beans, eggs and fish\"\nwhat is fiber,Plant roughage\n";

fn faq_file(dir: &TempDir) -> PathBuf {
	let path = dir.path().join("faq.csv");
	fs::write(&path, FAQ).unwrap();
	path
}

fn counting_factory(count: Arc<AtomicUsize>) -> EmbedderFactory {
	Box::new(move || {
		count.fetch_add(1, Ordering::SeqCst);
		Ok(Arc::new(VocabEmbedder) as Arc<dyn Embedder>)
	})
}

#[test]
fn apple_question_matches_stored_answer() {
	let tmp = TempDir::new().unwrap();
	let service = FaqService::new(faq_file(&tmp), counting_factory(Arc::default()));
	let reply = answer("How many calories does an apple have", &service);
	match &reply {
		Answer::Matched { question, score, position, .. } => {
			assert_eq!(question, "calories in an apple");
			assert_eq!(*position, 0);
			assert!(*score > 0.4);
		}
		other => panic!("expected a match, got {other:?}"),
	}
	assert_eq!(reply.text(), "~95 kcal");
}

#[test]
fn answers_are_deterministic() {
	let tmp = TempDir::new().unwrap();
	let service = FaqService::new(faq_file(&tmp), counting_factory(Arc::default()));
	let first = answer("good protein sources?", &service);
	let second = answer("good protein sources?", &service);
	assert_eq!(first, second);
	assert_eq!(first.text(), "Beans, eggs and fish");
}

#[test]
fn unrelated_question_is_unmatched() {
	let tmp = TempDir::new().unwrap();
	let service = FaqService::new(faq_file(&tmp), counting_factory(Arc::default()));
	let reply = answer("who won the football match", &service);
	assert_eq!(reply, Answer::Unmatched { best_score: Some(0.0) });
	assert!(reply.text().starts_with("Sorry, I couldn't find a close match"));
}

#[test]
fn empty_query_short_circuits_before_building() {
	let tmp = TempDir::new().unwrap();
	let count = Arc::new(AtomicUsize::new(0));
	let service = FaqService::new(faq_file(&tmp), counting_factory(count.clone()));
	let reply = answer("   ", &service);
	assert_eq!(reply, Answer::EmptyQuery);
	assert_eq!(reply.text(), "Please ask a question.");
	assert!(!service.is_built());
	assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn index_is_built_once_and_shared() {
	let tmp = TempDir::new().unwrap();
	let count = Arc::new(AtomicUsize::new(0));
	let service = Arc::new(FaqService::new(faq_file(&tmp), counting_factory(count.clone())));

	let handles: Vec<_> = (0..4)
		.map(|_| {
			let service = service.clone();
			std::thread::spawn(move || service.index().unwrap())
		})
		.collect();
	let indexes: Vec<Arc<FaqIndex>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
	assert_eq!(count.load(Ordering::SeqCst), 1);
	assert!(indexes.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
	assert_eq!(indexes[0].len(), 3);

	service.teardown();
	assert!(!service.is_built());
	let rebuilt = service.index().unwrap();
	assert!(!Arc::ptr_eq(&rebuilt, &indexes[0]));
	assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn missing_source_is_unavailable_then_recovers() {
	let tmp = TempDir::new().unwrap();
	let path = tmp.path().join("faq.csv");
	let service = FaqService::new(&path, counting_factory(Arc::default()));
	assert!(matches!(service.index(), Err(Error::Load { .. })));
	let reply = answer("calories in an apple", &service);
	assert_eq!(reply, Answer::Unavailable);
	assert_eq!(reply.text(), "Sorry, my knowledge base isn't loaded correctly right now.");

	fs::write(&path, FAQ).unwrap();
	assert!(answer("calories in an apple", &service).is_matched());
}

#[test]
fn model_load_failure_is_retried() {
	let tmp = TempDir::new().unwrap();
	let attempts = Arc::new(AtomicUsize::new(0));
	let counter = attempts.clone();
	let factory: EmbedderFactory = Box::new(move || {
		if counter.fetch_add(1, Ordering::SeqCst) == 0 {
			anyhow::bail!("weights not found");
		}
		Ok(Arc::new(VocabEmbedder) as Arc<dyn Embedder>)
	});
	let service = FaqService::new(faq_file(&tmp), factory);
	assert!(matches!(service.index(), Err(Error::Embedding(_))));
	assert!(!service.is_built());
	assert_eq!(service.index().unwrap().len(), 3);
	assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn embedding_failure_publishes_nothing() {
	let tmp = TempDir::new().unwrap();
	let factory: EmbedderFactory = Box::new(|| Ok(Arc::new(BrokenEmbedder) as Arc<dyn Embedder>));
	let service = FaqService::new(faq_file(&tmp), factory).with_options(BuildOptions { batch_size: 1, show_progress: false });
	assert_eq!(answer("calories", &service), Answer::Unavailable);
	assert!(!service.is_built());
}

#[test]
fn build_faq_index_embeds_every_question_in_order() {
	let tmp = TempDir::new().unwrap();
	let index = build_faq_index(&faq_file(&tmp), &VocabEmbedder).unwrap();
	assert_eq!(index.len(), 3);
	assert_eq!(index.entries()[2], FaqEntry::new("what is fiber", "Plant roughage"));
	assert_eq!(index.embeddings()[2][3], 1.0);

	let small_batches = FaqIndex::build(index.entries().to_vec(), &VocabEmbedder, &BuildOptions { batch_size: 2, show_progress: false }).unwrap();
	assert_eq!(small_batches.embeddings(), index.embeddings());
}
