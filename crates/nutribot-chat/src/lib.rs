//! nutribot-chat
//!
//! Semantic FAQ index, the lazily built knowledge-base service and the chat
//! matcher that answers nutrition questions from it.
pub mod faq_index;
pub mod matcher;
pub mod service;

pub use faq_index::{build_faq_index, build_faq_index_with, BuildOptions, FaqIndex};
pub use matcher::{answer, is_match, select_best, Answer, SIMILARITY_THRESHOLD};
pub use service::{EmbedderFactory, FaqService, Ready};
