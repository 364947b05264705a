use super::links::{CategorizedLinks, categorize_links, extract_links_from_text, find_urls};
use crate::error::{FillError, Result};
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::path::Path;
use std::time::Duration;

/// Reads text and links out of a resume document
pub trait DocumentExtractor {
    fn extract_text(&self, path: &Path) -> Result<String>;

    /// Links found in text already extracted from the document
    fn links_in(&self, text: &str) -> CategorizedLinks;

    fn extract_links(&self, path: &Path) -> Result<CategorizedLinks> {
        Ok(self.links_in(&self.extract_text(path)?))
    }
}

/// Follows redirects to find where a link really points
///
/// Shortened or tracking links in resumes are resolved with a HEAD request.
/// Any failure falls back to the original URL.
pub struct LinkResolver {
    client: Client,
}

impl LinkResolver {
    pub const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Self::TIMEOUT)
            .redirect(Policy::limited(10))
            .build()
            .map_err(|e| FillError::Extraction(format!("Could not build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn resolve(&self, url: &str) -> String {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return url.to_string();
        }
        match self.client.head(url).send() {
            Ok(response) => {
                let resolved = response.url().to_string();
                if resolved != url {
                    log::debug!("Resolved {} to {}", url, resolved);
                }
                resolved
            }
            Err(e) => {
                log::debug!("Could not resolve {}: {}", url, e);
                url.to_string()
            }
        }
    }
}

/// PDF resumes, read with `pdf-extract`
#[derive(Default)]
pub struct PdfExtractor {
    resolver: Option<LinkResolver>,
}

impl PdfExtractor {
    /// Extractor that keeps links as written
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: resolve links through redirects before categorizing them
    pub fn with_resolver(mut self, resolver: LinkResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

impl DocumentExtractor for PdfExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| FillError::Extraction(format!("{}: {}", path.display(), e)))?;
        log::debug!("Extracted {} characters from {}", text.len(), path.display());
        Ok(text)
    }

    fn links_in(&self, text: &str) -> CategorizedLinks {
        let urls = find_urls(text);
        if urls.is_empty() {
            log::debug!("No URLs in document text, falling back to pattern matching");
            return extract_links_from_text(text);
        }

        let resolved: Vec<String> = match &self.resolver {
            Some(resolver) => urls.iter().map(|url| resolver.resolve(url)).collect(),
            None => urls,
        };
        categorize_links(resolved)
    }
}
