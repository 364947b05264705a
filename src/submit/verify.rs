//! Post-click classification of whether a submission went through
//!
//! The page is first reduced to a [`PageObservation`]; [`classify`] then
//! applies an ordered rule list to it, strongest signal first.

use crate::browser::BrowserControl;
use crate::dom::{Query, effective_type};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// URL fragments that indicate a confirmation page
pub const SUCCESS_URL_KEYWORDS: &[&str] = &["success", "complete", "thank", "confirmation", "submitted"];

/// Phrases that indicate a confirmation message in the page content or title
pub const SUCCESS_PHRASES: &[&str] = &[
    "thank you",
    "thanks for applying",
    "application received",
    "received your application",
    "successfully submitted",
    "application submitted",
    "submission received",
    "congratulations",
    "we will be in touch",
    "we'll be in touch",
    "hear from us",
    "form submitted",
    "well done",
    "received",
];

/// The label of the known target form's submit button
pub const SUBMIT_MARKER: &str = "submit application";

/// Why a submission counts as successful
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", content = "detail", rename_all = "snake_case")]
pub enum SuccessSignal {
    /// The "Submit Application" button was visible before the click and is gone
    SubmitButtonGone,
    UrlKeyword(String),
    ContentPhrase(String),
    TitlePhrase(String),
    SuccessElement(String),
}

impl fmt::Display for SuccessSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuccessSignal::SubmitButtonGone => write!(f, "submit button disappeared"),
            SuccessSignal::UrlKeyword(keyword) => write!(f, "URL contains '{}'", keyword),
            SuccessSignal::ContentPhrase(phrase) => write!(f, "page says '{}'", phrase),
            SuccessSignal::TitlePhrase(phrase) => write!(f, "title says '{}'", phrase),
            SuccessSignal::SuccessElement(text) => write!(f, "success element '{}'", text),
        }
    }
}

/// Why a submission probably went through without a confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikelyReason {
    UrlChanged,
    FormsGone,
}

impl fmt::Display for LikelyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LikelyReason::UrlChanged => write!(f, "URL changed"),
            LikelyReason::FormsGone => write!(f, "no forms remain on the page"),
        }
    }
}

/// Classified result of a submission attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success(Vec<SuccessSignal>),
    LikelySuccess(LikelyReason),
    /// Something was activated but nothing confirms it; needs manual follow-up
    Ambiguous,
    Failure(String),
}

impl SubmissionOutcome {
    /// Success or likely success
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success(_) | SubmissionOutcome::LikelySuccess(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, SubmissionOutcome::Ambiguous)
    }
}

impl fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionOutcome::Success(signals) => {
                let reasons: Vec<String> = signals.iter().map(ToString::to_string).collect();
                write!(f, "Success ({})", reasons.join(", "))
            }
            SubmissionOutcome::LikelySuccess(reason) => write!(f, "Likely success ({})", reason),
            SubmissionOutcome::Ambiguous => {
                write!(f, "Ambiguous: the form was activated but no confirmation was found, please check manually")
            }
            SubmissionOutcome::Failure(reason) => write!(f, "Failure: {}", reason),
        }
    }
}

/// What verification looks at after a click
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageObservation {
    pub url: String,

    /// Lower-cased page source
    pub content: String,

    /// Lower-cased title
    pub title: String,

    /// A visible "Submit Application" submit button is present
    pub marker_visible: bool,

    pub form_count: usize,

    /// Texts of visible elements that look like confirmation messages
    pub success_elements: Vec<String>,
}

/// Whether a visible submit button labelled "Submit Application" is on the page
pub fn marker_visible(page: &dyn BrowserControl) -> bool {
    let queries = [
        Query::tag("button").text_contains_ci(SUBMIT_MARKER),
        Query::tag("input").attr_eq("type", "submit").attr_contains_ci("value", SUBMIT_MARKER),
    ];
    queries.iter().any(|query| {
        page.find(query).unwrap_or_default().iter().any(|element| {
            let type_attr = page.attribute(element, "type").ok().flatten();
            let is_submit = page
                .tag_name(element)
                .map(|tag| effective_type(&tag, type_attr.as_deref()).as_deref() == Some("submit"))
                .unwrap_or(false);
            is_submit && page.is_visible(element).unwrap_or(false)
        })
    })
}

fn success_elements(page: &dyn BrowserControl) -> Vec<String> {
    let queries = [
        Query::any().attr_contains_ci("class", "success"),
        Query::any().attr_contains_ci("class", "confirmation"),
        Query::any().attr_contains_ci("class", "thank"),
        Query::any().own_text_contains("Thank you"),
        Query::any().own_text_contains("Success"),
        Query::any().own_text_contains("submitted"),
    ];

    let mut found = Vec::new();
    for query in &queries {
        for element in page.find(query).unwrap_or_default() {
            if !page.is_visible(&element).unwrap_or(false) {
                continue;
            }
            let text = page.text(&element).unwrap_or_default();
            let label = if text.is_empty() { query.to_string() } else { text };
            if !found.contains(&label) {
                found.push(label);
            }
        }
    }
    found
}

/// Read everything [`classify`] needs from the page
pub fn observe(page: &dyn BrowserControl) -> Result<PageObservation> {
    Ok(PageObservation {
        url: page.current_url()?,
        content: page.page_source()?.to_lowercase(),
        title: page.title()?.to_lowercase(),
        marker_visible: marker_visible(page),
        form_count: page.find(&Query::tag("form"))?.len(),
        success_elements: success_elements(page),
    })
}

/// Apply the rule list to an observation taken after a click
///
/// 1. the "Submit Application" button was visible before and is gone now
/// 2. success keyword in a changed URL, success phrase in content or title,
///    or confirmation-looking elements
/// 3. URL changed at all, or no form left: likely success
/// 4. otherwise ambiguous
pub fn classify(before_url: &str, marker_before: bool, after: &PageObservation) -> SubmissionOutcome {
    if marker_before && !after.marker_visible {
        return SubmissionOutcome::Success(vec![SuccessSignal::SubmitButtonGone]);
    }

    let url_changed = after.url != before_url;
    let mut signals = Vec::new();

    if url_changed {
        let url = after.url.to_lowercase();
        if let Some(keyword) = SUCCESS_URL_KEYWORDS.iter().find(|k| url.contains(*k)) {
            signals.push(SuccessSignal::UrlKeyword(keyword.to_string()));
        }
    }
    if let Some(phrase) = SUCCESS_PHRASES.iter().find(|p| after.content.contains(*p)) {
        signals.push(SuccessSignal::ContentPhrase(phrase.to_string()));
    }
    if let Some(phrase) = SUCCESS_PHRASES.iter().find(|p| after.title.contains(*p)) {
        signals.push(SuccessSignal::TitlePhrase(phrase.to_string()));
    }
    signals.extend(after.success_elements.iter().cloned().map(SuccessSignal::SuccessElement));

    if !signals.is_empty() {
        return SubmissionOutcome::Success(signals);
    }
    if url_changed {
        return SubmissionOutcome::LikelySuccess(LikelyReason::UrlChanged);
    }
    if after.form_count == 0 {
        return SubmissionOutcome::LikelySuccess(LikelyReason::FormsGone);
    }
    SubmissionOutcome::Ambiguous
}
