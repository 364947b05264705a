//! Turning a resume document into the values a form pass needs
//!
//! Text and links come from the document through a [`DocumentExtractor`]; a
//! [`LanguageModel`] structures the text into a [`ResumeRecord`], and the
//! document's own links override whatever the model guessed.

pub mod extract;
pub mod links;
pub mod llm;
pub mod record;

pub use extract::{DocumentExtractor, LinkResolver, PdfExtractor};
pub use links::{CategorizedLinks, LinkCategory, categorize_link, categorize_links, extract_links_from_text, find_urls};
pub use llm::{GeminiModel, LanguageModel, MAX_RESUME_CHARS, ResumeParser, build_prompt, parse_model_response};
pub use record::{IMPORTANT_FIELDS, ResumeRecord};
