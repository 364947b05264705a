use crate::dom::element::ElementSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an attribute is compared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrOp {
    /// Attribute equals the value
    Equals(String),
    /// Attribute contains the value as a substring
    Contains(String),
    /// Attribute is present with any value
    Present,
    /// Attribute is absent
    Absent,
}

/// One attribute condition of a [`Query`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrFilter {
    pub name: String,
    pub op: AttrOp,
    #[serde(default)]
    pub ignore_case: bool,
}

impl AttrFilter {
    fn matches(&self, snapshot: &ElementSnapshot) -> bool {
        let actual = snapshot.get_attribute(&self.name);
        match (&self.op, actual) {
            (AttrOp::Present, found) => found.is_some(),
            (AttrOp::Absent, found) => found.is_none(),
            (_, None) => false,
            (AttrOp::Equals(expected), Some(actual)) => {
                if self.ignore_case {
                    actual.eq_ignore_ascii_case(expected)
                } else {
                    actual == expected
                }
            }
            (AttrOp::Contains(needle), Some(actual)) => contains(actual, needle, self.ignore_case),
        }
    }

    fn to_css(&self) -> String {
        let flag = if self.ignore_case { " i" } else { "" };
        match &self.op {
            AttrOp::Equals(value) => format!("[{}=\"{}\"{}]", self.name, escape_css(value), flag),
            AttrOp::Contains(value) => format!("[{}*=\"{}\"{}]", self.name, escape_css(value), flag),
            AttrOp::Present => format!("[{}]", self.name),
            AttrOp::Absent => format!(":not([{}])", self.name),
        }
    }
}

/// Which text of an element a [`TextFilter`] looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextScope {
    /// Only the element's own text nodes
    Own,
    /// The rendered text including descendants
    Rendered,
}

/// Substring condition on element text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFilter {
    pub needle: String,
    pub scope: TextScope,
    #[serde(default)]
    pub ignore_case: bool,
}

impl TextFilter {
    fn matches(&self, snapshot: &ElementSnapshot) -> bool {
        let haystack = match self.scope {
            TextScope::Own => &snapshot.own_text,
            TextScope::Rendered => &snapshot.rendered_text,
        };
        contains(haystack, &self.needle, self.ignore_case)
    }
}

/// A pure element predicate
///
/// A query is a tag set (empty for any element), attribute conditions that
/// must all hold, and an optional text condition. The same value is evaluated
/// in Rust against an [`ElementSnapshot`] and rendered to CSS for a live page,
/// where the text condition is applied by the page script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Query {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub filters: Vec<AttrFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextFilter>,
}

impl Query {
    /// Match any element
    pub fn any() -> Self {
        Self::default()
    }

    /// Match elements with the given tag
    pub fn tag(tag: &str) -> Self {
        Self { tags: vec![tag.to_ascii_lowercase()], ..Default::default() }
    }

    /// Match elements with any of the given tags
    pub fn tags(tags: &[&str]) -> Self {
        Self { tags: tags.iter().map(|t| t.to_ascii_lowercase()).collect(), ..Default::default() }
    }

    fn with_filter(mut self, name: &str, op: AttrOp, ignore_case: bool) -> Self {
        self.filters.push(AttrFilter { name: name.to_string(), op, ignore_case });
        self
    }

    pub fn attr_eq(self, name: &str, value: impl Into<String>) -> Self {
        self.with_filter(name, AttrOp::Equals(value.into()), false)
    }

    pub fn attr_contains(self, name: &str, value: impl Into<String>) -> Self {
        self.with_filter(name, AttrOp::Contains(value.into()), false)
    }

    pub fn attr_contains_ci(self, name: &str, value: impl Into<String>) -> Self {
        self.with_filter(name, AttrOp::Contains(value.into()), true)
    }

    pub fn has_attr(self, name: &str) -> Self {
        self.with_filter(name, AttrOp::Present, false)
    }

    pub fn lacks_attr(self, name: &str) -> Self {
        self.with_filter(name, AttrOp::Absent, false)
    }

    /// Own text contains `needle` (case-sensitive)
    pub fn own_text_contains(mut self, needle: impl Into<String>) -> Self {
        self.text = Some(TextFilter { needle: needle.into(), scope: TextScope::Own, ignore_case: false });
        self
    }

    /// Rendered text contains `needle`, ignoring case
    pub fn text_contains_ci(mut self, needle: impl Into<String>) -> Self {
        self.text = Some(TextFilter { needle: needle.into(), scope: TextScope::Rendered, ignore_case: true });
        self
    }

    /// Evaluate the query against a snapshot
    pub fn matches(&self, snapshot: &ElementSnapshot) -> bool {
        let tag_ok = self.tags.is_empty() || self.tags.iter().any(|t| snapshot.is_tag(t));
        tag_ok
            && self.filters.iter().all(|f| f.matches(snapshot))
            && self.text.as_ref().is_none_or(|t| t.matches(snapshot))
    }

    /// Render the tag and attribute part as a CSS selector list
    ///
    /// The text condition has no CSS equivalent and is not included.
    pub fn to_css(&self) -> String {
        let filters: String = self.filters.iter().map(AttrFilter::to_css).collect();
        if self.tags.is_empty() {
            return format!("*{}", filters);
        }
        self.tags
            .iter()
            .map(|tag| format!("{}{}", tag, filters))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_css())?;
        if let Some(text) = &self.text {
            write!(f, " ~ \"{}\"", text.needle)?;
        }
        Ok(())
    }
}

fn contains(haystack: &str, needle: &str, ignore_case: bool) -> bool {
    if ignore_case {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    } else {
        haystack.contains(needle)
    }
}

/// Escape `value` for a double-quoted CSS string; control characters become hex escapes
fn escape_css(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '"' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\0' => escaped.push('\u{FFFD}'),
            c if c.is_control() => escaped.push_str(&format!("\\{:x} ", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_input() -> ElementSnapshot {
        ElementSnapshot::new("input")
            .with_attribute("type", "email")
            .with_attribute("name", "applicant_email")
            .with_attribute("placeholder", "Email address")
    }

    #[test]
    fn test_tag_and_attribute_match() {
        let snapshot = email_input();
        assert!(Query::tag("input").attr_eq("type", "email").matches(&snapshot));
        assert!(!Query::tag("textarea").attr_eq("type", "email").matches(&snapshot));
        assert!(Query::tags(&["textarea", "input"]).matches(&snapshot));
        assert!(Query::any().attr_contains("placeholder", "Email").matches(&snapshot));
        assert!(!Query::any().attr_contains("placeholder", "email").matches(&snapshot));
        assert!(Query::any().attr_contains_ci("placeholder", "EMAIL").matches(&snapshot));
    }

    #[test]
    fn test_presence_filters() {
        let typeless = ElementSnapshot::new("input").with_attribute("name", "city");
        assert!(Query::tag("input").lacks_attr("type").matches(&typeless));
        assert!(!Query::tag("input").lacks_attr("type").matches(&email_input()));
        assert!(Query::tag("input").has_attr("name").matches(&typeless));
    }

    #[test]
    fn test_text_filters() {
        let button = ElementSnapshot::new("button").with_text("Submit Application");
        assert!(Query::tag("button").text_contains_ci("submit application").matches(&button));
        assert!(Query::tag("button").own_text_contains("Submit").matches(&button));
        assert!(!Query::tag("button").own_text_contains("submit").matches(&button));

        let mut nested = ElementSnapshot::new("button");
        nested.rendered_text = "Submit".into();
        assert!(Query::tag("button").text_contains_ci("submit").matches(&nested));
        assert!(!Query::tag("button").own_text_contains("Submit").matches(&nested));
    }

    #[test]
    fn test_to_css() {
        assert_eq!(Query::tag("input").attr_eq("type", "email").to_css(), "input[type=\"email\"]");
        assert_eq!(
            Query::tags(&["input", "textarea"]).attr_eq("name", "skills").to_css(),
            "input[name=\"skills\"], textarea[name=\"skills\"]"
        );
        assert_eq!(Query::any().attr_contains("class", "error").to_css(), "*[class*=\"error\"]");
        assert_eq!(
            Query::tag("input").attr_eq("type", "button").attr_contains_ci("value", "submit").to_css(),
            "input[type=\"button\"][value*=\"submit\" i]"
        );
        assert_eq!(Query::tag("input").lacks_attr("type").to_css(), "input:not([type])");
    }

    #[test]
    fn test_to_css_escapes_quotes() {
        let query = Query::tag("input").attr_contains("placeholder", "Say \"hi\"");
        assert_eq!(query.to_css(), "input[placeholder*=\"Say \\\"hi\\\"\"]");
    }

    #[test]
    fn test_to_css_escapes_control_characters() {
        let query = Query::tag("input").attr_contains("aria-label", "Cover\nletter\t(optional)");
        assert_eq!(query.to_css(), "input[aria-label*=\"Cover\\a letter\\9 (optional)\"]");
        assert_eq!(escape_css("a\0b"), "a\u{FFFD}b");
    }
}
