use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Kind of link found in a resume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkCategory {
    Linkedin,
    Github,
    GoogleDrive,
    Dropbox,
    Portfolio,
    Email,
}

impl LinkCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkCategory::Linkedin => "linkedin",
            LinkCategory::Github => "github",
            LinkCategory::GoogleDrive => "google_drive",
            LinkCategory::Dropbox => "dropbox",
            LinkCategory::Portfolio => "portfolio",
            LinkCategory::Email => "email",
        }
    }
}

impl fmt::Display for LinkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One link per category, in the order categories were first seen
pub type CategorizedLinks = IndexMap<LinkCategory, String>;

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(?:https?://|mailto:)[^\s<>"'()\[\]{}]+"#).expect("URL pattern is valid"));

static GLUED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\S)(https?://)").expect("glued URL pattern is valid"));

static LINKEDIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:[a-z]{2,3}\.)?linkedin\.com/(?:in|profile)/[A-Za-z0-9_%-]+/?")
        .expect("LinkedIn pattern is valid")
});

static GITHUB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.)?github\.com/[A-Za-z0-9_-]+(?:/[A-Za-z0-9_.-]+)?/?")
        .expect("GitHub pattern is valid")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email pattern is valid")
});

/// Category of a single URL, if it has one
///
/// LinkedIn links only count when they point at a profile (`/in/` or `/profile/`).
pub fn categorize_link(url: &str) -> Option<LinkCategory> {
    let lower = url.trim().to_lowercase();
    if lower.starts_with("mailto:") {
        return Some(LinkCategory::Email);
    }
    if lower.contains("linkedin.com") {
        return (lower.contains("/in/") || lower.contains("/profile/")).then_some(LinkCategory::Linkedin);
    }
    if lower.contains("github.com") {
        return Some(LinkCategory::Github);
    }
    if lower.contains("drive.google.com") {
        return Some(LinkCategory::GoogleDrive);
    }
    if lower.contains("dropbox.com") {
        return Some(LinkCategory::Dropbox);
    }
    None
}

/// Categorize a list of URLs
///
/// A later link of the same category replaces an earlier one. The first
/// uncategorized link becomes the portfolio, unless a portfolio is already set.
pub fn categorize_links<I, S>(urls: I) -> CategorizedLinks
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut links = CategorizedLinks::new();
    for url in urls {
        let url = url.as_ref().trim();
        if url.is_empty() {
            continue;
        }
        match categorize_link(url) {
            Some(LinkCategory::Email) => {
                let address = url.get("mailto:".len()..).unwrap_or_default();
                links.insert(LinkCategory::Email, address.to_string());
            }
            Some(category) => {
                links.insert(category, url.to_string());
            }
            None => {
                if !links.contains_key(&LinkCategory::Portfolio) {
                    links.insert(LinkCategory::Portfolio, url.to_string());
                }
            }
        }
    }
    links
}

/// Every `http(s)://` and `mailto:` URL in `text`, deduplicated in order of appearance
pub fn find_urls(text: &str) -> Vec<String> {
    let separated = GLUED_URL.replace_all(text, "$1 $2");
    let mut urls: Vec<String> = Vec::new();
    for found in URL.find_iter(&separated) {
        let url = found.as_str().trim_end_matches(['.', ',', ';', ':']).to_string();
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

/// Fallback for documents without link annotations: LinkedIn, GitHub and email from the plain text
pub fn extract_links_from_text(text: &str) -> CategorizedLinks {
    let separated = GLUED_URL.replace_all(text, "$1 $2");
    let mut links = CategorizedLinks::new();

    if let Some(found) = LINKEDIN.find(&separated) {
        links.insert(LinkCategory::Linkedin, with_scheme(found.as_str()));
    }
    if let Some(found) = GITHUB.find(&separated) {
        links.insert(LinkCategory::Github, with_scheme(found.as_str()));
    }
    if let Some(found) = EMAIL.find(&separated) {
        links.insert(LinkCategory::Email, found.as_str().to_string());
    }

    links
}

fn with_scheme(url: &str) -> String {
    let lower = url.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}
