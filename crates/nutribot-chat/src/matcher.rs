use serde::Serialize;
use tracing::{debug, info, warn};

use nutribot_core::types::normalize_question;

use crate::faq_index::FaqIndex;
use crate::service::FaqService;

/// Minimum cosine similarity for a stored answer to be returned.
pub const SIMILARITY_THRESHOLD: f32 = 0.4;

const EMPTY_QUERY_TEXT: &str = "Please ask a question.";
const UNAVAILABLE_TEXT: &str = "Sorry, my knowledge base isn't loaded correctly right now.";
const UNMATCHED_TEXT: &str = "Sorry, I couldn't find a close match for that question in my knowledge base. Please try rephrasing or asking about general nutrition topics.";
const FAILED_TEXT: &str = "Sorry, I encountered an error trying to find an answer.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Answer {
	EmptyQuery,
	Unavailable,
	Matched { question: String, answer: String, score: f32, position: usize },
	Unmatched { best_score: Option<f32> },
	Failed,
}

impl Answer {
	/// The reply shown to the user.
	pub fn text(&self) -> &str {
		match self {
			Answer::EmptyQuery => EMPTY_QUERY_TEXT,
			Answer::Unavailable => UNAVAILABLE_TEXT,
			Answer::Matched { answer, .. } => answer,
			Answer::Unmatched { .. } => UNMATCHED_TEXT,
			Answer::Failed => FAILED_TEXT,
		}
	}

	pub fn is_matched(&self) -> bool {
		matches!(self, Answer::Matched { .. })
	}
}

pub fn is_match(score: f32) -> bool {
	score >= SIMILARITY_THRESHOLD
}

/// Answer `query` from the FAQ knowledge base, building it on first use.
pub fn answer(query: &str, service: &FaqService) -> Answer {
	if query.trim().is_empty() {
		return Answer::EmptyQuery;
	}
	let ready = match service.get() {
		Ok(ready) => ready,
		Err(e) => {
			warn!(error = %e, "FAQ knowledge base unavailable");
			return Answer::Unavailable;
		}
	};
	let normalized = normalize_question(query);
	match ready.embedder.embed_text(&normalized) {
		Ok(vector) => select_best(&vector, &ready.index),
		Err(e) => {
			warn!(error = %e, "Failed to embed query");
			Answer::Failed
		}
	}
}

/// Match an already embedded query against `index`.
pub fn select_best(query: &[f32], index: &FaqIndex) -> Answer {
	let Some((position, score)) = index.best_match(query) else {
		debug!("FAQ index has no comparable entries");
		return Answer::Unmatched { best_score: None };
	};
	match index.entry(position) {
		Some(entry) if is_match(score) => {
			info!(question = %entry.question, score, "Matched FAQ entry");
			Answer::Matched { question: entry.question.clone(), answer: entry.answer.clone(), score, position }
		}
		_ => {
			info!(score, "No FAQ entry above threshold");
			Answer::Unmatched { best_score: Some(score) }
		}
	}
}
