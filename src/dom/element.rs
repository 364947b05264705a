use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a node on the live page
///
/// A reference is a capability token issued by one [`BrowserControl`](crate::browser::BrowserControl)
/// session. It stays valid only while the node it names remains attached;
/// after a re-render or navigation any operation on it yields
/// [`FillError::StaleElement`](crate::error::FillError::StaleElement).
/// Never keep one across a wait that may change the page: re-acquire it by
/// name or id instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementRef(u64);

impl ElementRef {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ref#{}", self.0)
    }
}

/// Static view of an element's markup used to evaluate [`Query`](crate::dom::Query) predicates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ElementSnapshot {
    /// Lower-case HTML tag name (e.g. "input", "select", "button")
    pub tag_name: String,

    /// Element attributes in document order
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Text directly owned by the element (its own text nodes)
    #[serde(default)]
    pub own_text: String,

    /// Rendered text including descendants
    #[serde(default)]
    pub rendered_text: String,
}

impl ElementSnapshot {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self { tag_name: tag_name.into().to_ascii_lowercase(), ..Default::default() }
    }

    /// Builder method: add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder method: set own and rendered text together
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.rendered_text = text.clone();
        self.own_text = text;
        self
    }

    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.get_attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    }

    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id")
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// The `type` the browser would report, which differs from the attribute for
    /// typeless inputs (`text`) and typeless buttons (`submit`)
    pub fn effective_type(&self) -> Option<String> {
        effective_type(&self.tag_name, self.get_attribute("type"))
    }
}

/// Resolve the `type` property of a control from its tag and `type` attribute
pub fn effective_type(tag_name: &str, type_attr: Option<&str>) -> Option<String> {
    match type_attr.map(str::trim).filter(|t| !t.is_empty()) {
        Some(explicit) => Some(explicit.to_ascii_lowercase()),
        None if tag_name.eq_ignore_ascii_case("input") => Some("text".to_string()),
        None if tag_name.eq_ignore_ascii_case("button") => Some("submit".to_string()),
        None => None,
    }
}
