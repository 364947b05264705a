use crate::browser::BrowserControl;
use crate::dom::{ElementRef, Query, effective_type};
use indexmap::IndexSet;
use serde::Serialize;
use std::cmp::Ordering;

/// A control that may submit the form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitCandidate {
    #[serde(skip)]
    pub element: ElementRef,

    /// e.g. `BUTTON (apply-btn) - Submit Application`
    pub description: String,

    pub score: f32,
}

/// Score of a visible, enabled control of the given effective type
pub fn score_for(effective_type: Option<&str>) -> f32 {
    match effective_type {
        Some("submit") => 2.0,
        Some("button") => 1.5,
        _ => 1.0,
    }
}

fn discovery_queries() -> Vec<Query> {
    vec![
        Query::tag("button").attr_eq("type", "submit"),
        Query::tag("input").attr_eq("type", "submit"),
        Query::tag("button").text_contains_ci("submit"),
        Query::tag("input").attr_eq("type", "button").attr_contains_ci("value", "submit"),
    ]
}

/// Visible, enabled submit-like controls in discovery order
pub fn discover(page: &dyn BrowserControl) -> Vec<SubmitCandidate> {
    let mut seen = IndexSet::new();
    for query in discovery_queries() {
        match page.find(&query) {
            Ok(found) => seen.extend(found),
            Err(e) => log::debug!("Submit query {} failed: {}", query, e),
        }
    }

    seen.into_iter()
        .filter(|element| page.is_interactable(element))
        .filter_map(|element| match describe(page, &element) {
            Ok((description, kind)) => Some(SubmitCandidate { element, description, score: score_for(kind.as_deref()) }),
            Err(e) => {
                log::debug!("Dropping submit candidate {}: {}", element, e);
                None
            }
        })
        .collect()
}

/// Highest score first, discovery order among equals, at most `max`
pub fn rank(mut candidates: Vec<SubmitCandidate>, max: usize) -> Vec<SubmitCandidate> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    candidates.truncate(max);
    candidates
}

fn describe(page: &dyn BrowserControl, element: &ElementRef) -> crate::error::Result<(String, Option<String>)> {
    let tag = page.tag_name(element)?;
    let type_attr = page.attribute(element, "type")?;
    let kind = effective_type(&tag, type_attr.as_deref());

    let identifier = match page.attribute(element, "id")?.filter(|v| !v.is_empty()) {
        Some(id) => id,
        None => match page.attribute(element, "name")?.filter(|v| !v.is_empty()) {
            Some(name) => name,
            None => kind.clone().unwrap_or_default(),
        },
    };

    let text = match page.text(element)? {
        text if !text.is_empty() => text,
        _ => page.attribute(element, "value")?.unwrap_or_default(),
    };

    Ok((format!("{} ({}) - {}", tag.to_uppercase(), identifier, text), kind))
}
