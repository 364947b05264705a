use crate::browser::BrowserControl;
use crate::dom::Query;
use indexmap::IndexSet;

/// Class fragments that mark an element as an error message
const ERROR_CLASSES: &[&str] = &["error", "invalid", "danger"];

/// Visible error messages currently shown on the page
///
/// Purely informational: the result never blocks submission.
pub fn scan_validation_messages(page: &dyn BrowserControl) -> Vec<String> {
    let mut queries: Vec<Query> = ERROR_CLASSES.iter().map(|class| Query::any().attr_contains("class", *class)).collect();
    queries.push(Query::tag("span").attr_contains("style", "color: red"));

    let mut messages = IndexSet::new();
    for query in &queries {
        let found = match page.find(query) {
            Ok(found) => found,
            Err(e) => {
                log::debug!("Validation query {} failed: {}", query, e);
                continue;
            }
        };
        for element in found {
            if !page.is_visible(&element).unwrap_or(false) {
                continue;
            }
            if let Ok(text) = page.text(&element) {
                let text = text.trim();
                if !text.is_empty() {
                    messages.insert(text.to_string());
                }
            }
        }
    }

    messages.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{FakeElement, FakePage};

    #[test]
    fn test_collects_visible_error_text_once() {
        let page = FakePage::new("about:blank")
            .with(FakeElement::new("div").class("field-error").with_text("Email is required"))
            .with(FakeElement::new("p").class("is-invalid error").with_text("Email is required"))
            .with(FakeElement::new("span").attr("style", "color: red").with_text("Phone looks wrong"))
            .with(FakeElement::new("div").class("alert-danger").with_text("   "))
            .with(FakeElement::new("div").class("error").with_text("Hidden problem").hidden());

        let messages = scan_validation_messages(&page);
        assert_eq!(messages, vec!["Email is required", "Phone looks wrong"]);
    }

    #[test]
    fn test_clean_page_has_no_messages() {
        let page = FakePage::new("about:blank").with(FakeElement::input("text").name("name"));
        assert!(scan_validation_messages(&page).is_empty());
    }
}
