use super::extract::DocumentExtractor;
use super::links::CategorizedLinks;
use super::record::ResumeRecord;
use crate::error::{FillError, Result};
use regex::Regex;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

/// Number of resume characters sent to the model
pub const MAX_RESUME_CHARS: usize = 3000;

/// Text generation backend
pub trait LanguageModel {
    fn generate(&self, prompt: &str) -> Result<String>;
}

const SCHEMA: &str = r#"{
    "name": "Full Name",
    "email": "email address",
    "phone": "phone number",
    "address": "full address or location",
    "skills": ["skill1", "skill2"],
    "experience": ["job description"],
    "education": ["degree and institution"],
    "linkedin": "linkedin url from extracted links",
    "github": "github url from extracted links",
    "portfolio": "portfolio url from extracted links",
    "google_drive": "google drive url if found",
    "dropbox": "dropbox url if found"
}"#;

/// Prompt asking for a [`ResumeRecord`] as bare JSON
pub fn build_prompt(resume_text: &str, links: &CategorizedLinks) -> String {
    let excerpt: String = resume_text.chars().take(MAX_RESUME_CHARS).collect();
    let links_json = serde_json::to_string_pretty(links).unwrap_or_else(|_| "{}".to_string());

    format!(
        "Extract information from this resume and return ONLY valid JSON without any markdown formatting or extra text.\n\
         Resume Text:\n{excerpt}\n\
         Extracted Links from PDF:\n{links_json}\n\
         Return only this JSON structure with actual values:\n{SCHEMA}\n\
         IMPORTANT:\n\
         - Return ONLY the JSON, no other text\n\
         - Use the extracted links provided above, they are actual clickable URLs\n\
         - Use \"N/A\" for missing info, empty arrays [] for missing lists\n\
         - Do not wrap in markdown code blocks\n"
    )
}

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*```(?:json)?\s*$").expect("code fence pattern is valid"));

/// Read model output as a record, never failing
///
/// Tries the whole text (code fences removed), then the outermost `{...}`
/// block, then gives up and returns [`ResumeRecord::sentinel`].
pub fn parse_model_response(raw: &str) -> ResumeRecord {
    let cleaned = CODE_FENCE.replace_all(raw.trim(), "");
    let cleaned = cleaned.trim();

    if let Ok(record) = serde_json::from_str::<ResumeRecord>(cleaned) {
        return record;
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            match serde_json::from_str::<ResumeRecord>(&cleaned[start..=end]) {
                Ok(record) => return record,
                Err(e) => log::warn!("JSON block in model response did not parse: {}", e),
            }
        }
    }

    log::warn!("Could not parse model response as JSON, returning an empty record");
    ResumeRecord::sentinel(cleaned)
}

/// Google Gemini over its `generateContent` REST endpoint
pub struct GeminiModel {
    client: Client,
    api_key: String,
    models: Vec<String>,
    endpoint: String,
}

impl GeminiModel {
    pub const DEFAULT_ENDPOINT: &'static str = "https://generativelanguage.googleapis.com/v1beta/models";

    /// Models tried in order until one answers
    pub const DEFAULT_MODELS: &'static [&'static str] = &["gemini-1.5-pro-latest", "gemini-1.5-flash-latest", "gemini-1.0-pro"];

    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| FillError::Model(format!("Could not build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            models: Self::DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Builder method: model names to try, in order
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Builder method: alternative API base URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    fn generate_with(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.endpoint, model);
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|e| FillError::Model(format!("{}: {}", model, e)))?;

        let status = response.status();
        let payload: Value = response.json().map_err(|e| FillError::Model(format!("{}: {}", model, e)))?;
        if !status.is_success() {
            let message = payload["error"]["message"].as_str().unwrap_or("no error message");
            return Err(FillError::Model(format!("{} returned {}: {}", model, status, message)));
        }

        response_text(&payload).ok_or_else(|| FillError::Model(format!("{} returned no text", model)))
    }
}

/// Concatenated text parts of the first candidate
fn response_text(payload: &Value) -> Option<String> {
    let parts = payload["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|part| part["text"].as_str()).collect();
    (!text.is_empty()).then_some(text)
}

impl LanguageModel for GeminiModel {
    fn generate(&self, prompt: &str) -> Result<String> {
        let mut last_error = FillError::Model("no models configured".to_string());
        for model in &self.models {
            match self.generate_with(model, prompt) {
                Ok(text) => {
                    log::info!("Resume parsed with {}", model);
                    return Ok(text);
                }
                Err(e) => {
                    log::warn!("{}", e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

/// Turns a resume document into a [`ResumeRecord`]
pub struct ResumeParser<E, M> {
    extractor: E,
    model: M,
}

impl<E: DocumentExtractor, M: LanguageModel> ResumeParser<E, M> {
    pub fn new(extractor: E, model: M) -> Self {
        Self { extractor, model }
    }

    /// Extract text and links, ask the model, and overlay the document's own links
    pub fn parse(&self, path: &Path) -> Result<ResumeRecord> {
        let text = self.extractor.extract_text(path)?;
        let links = self.extractor.links_in(&text);
        log::info!("Found {} link(s) in {}", links.len(), path.display());

        let raw = self.model.generate(&build_prompt(&text, &links))?;
        let mut record = parse_model_response(&raw);
        record.merge_links(&links);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::LinkCategory;
    use std::cell::{Cell, RefCell};

    struct CannedModel {
        reply: String,
        prompts: RefCell<Vec<String>>,
    }

    impl LanguageModel for CannedModel {
        fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct TextDocument {
        text: &'static str,
        reads: Cell<usize>,
    }

    impl TextDocument {
        fn new(text: &'static str) -> Self {
            Self { text, reads: Cell::new(0) }
        }
    }

    impl DocumentExtractor for TextDocument {
        fn extract_text(&self, _path: &Path) -> Result<String> {
            self.reads.set(self.reads.get() + 1);
            Ok(self.text.to_string())
        }

        fn links_in(&self, _text: &str) -> CategorizedLinks {
            let mut links = CategorizedLinks::new();
            links.insert(LinkCategory::Github, "https://github.com/jane".into());
            links
        }
    }

    #[test]
    fn test_prompt_truncates_on_char_boundary() {
        let text = "é".repeat(MAX_RESUME_CHARS + 10);
        let prompt = build_prompt(&text, &CategorizedLinks::new());

        assert_eq!(prompt.matches('é').count(), MAX_RESUME_CHARS);
        assert!(prompt.contains("\"google_drive\""));
        assert!(prompt.contains("Return ONLY the JSON"));
    }

    #[test]
    fn test_parse_fenced_response() {
        let record = parse_model_response("```json\n{\"name\": \"Jane Doe\", \"skills\": [\"Rust\"]}\n```");
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.skills.len(), 1);
        assert!(!record.is_sentinel());
    }

    #[test]
    fn test_parse_embedded_object() {
        let record = parse_model_response("Here you go: {\"email\": \"jane@x.com\"} Hope that helps!");
        assert_eq!(record.email, "jane@x.com");
    }

    #[test]
    fn test_unparseable_response_is_sentinel() {
        let record = parse_model_response("I cannot read this resume.");
        assert!(record.is_sentinel());
        assert_eq!(record.raw_response.as_deref(), Some("I cannot read this resume."));
        assert_eq!(record.name, "N/A");
    }

    #[test]
    fn test_response_text() {
        let payload = json!({"candidates": [{"content": {"parts": [{"text": "{\"name\":"}, {"text": "\"Jane\"}"}]}}]});
        assert_eq!(response_text(&payload).as_deref(), Some("{\"name\":\"Jane\"}"));
        assert_eq!(response_text(&json!({"candidates": []})), None);
    }

    #[test]
    fn test_parser_merges_document_links() {
        let model = CannedModel {
            reply: r#"{"name": "Jane Doe", "github": "N/A"}"#.into(),
            prompts: RefCell::new(Vec::new()),
        };
        let parser = ResumeParser::new(TextDocument::new("Jane Doe, Rust engineer"), model);

        let record = parser.parse(Path::new("resume.pdf")).unwrap();

        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.github, "https://github.com/jane");
        let prompts = parser.model.prompts.borrow();
        assert!(prompts[0].contains("Jane Doe, Rust engineer"));
        assert!(prompts[0].contains("https://github.com/jane"));
        assert_eq!(parser.extractor.reads.get(), 1);
    }
}
