//! Semantic fields and the static table of strategies used to locate them

use crate::dom::Query;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A resume field the resolver knows how to place on a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticField {
    Name,
    Email,
    Phone,
    Skills,
    Experience,
    Education,
    Linkedin,
    Github,
    Portfolio,
    Address,
}

impl SemanticField {
    pub const ALL: [SemanticField; 10] = [
        SemanticField::Name,
        SemanticField::Email,
        SemanticField::Phone,
        SemanticField::Skills,
        SemanticField::Experience,
        SemanticField::Education,
        SemanticField::Linkedin,
        SemanticField::Github,
        SemanticField::Portfolio,
        SemanticField::Address,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticField::Name => "name",
            SemanticField::Email => "email",
            SemanticField::Phone => "phone",
            SemanticField::Skills => "skills",
            SemanticField::Experience => "experience",
            SemanticField::Education => "education",
            SemanticField::Linkedin => "linkedin",
            SemanticField::Github => "github",
            SemanticField::Portfolio => "portfolio",
            SemanticField::Address => "address",
        }
    }

    /// Field for a known-values key, case-insensitively
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.into_iter().find(|f| f.as_str().eq_ignore_ascii_case(key))
    }

    /// Strategies for this field, most specific first
    pub fn strategies(&self) -> &'static [Strategy] {
        FIELD_SPECS
            .iter()
            .find(|spec| spec.field == *self)
            .map(|spec| spec.strategies)
            .unwrap_or(&[])
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One way of locating a field's element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `name` or `id` attribute equals `key`
    NameOrId { tags: &'static [&'static str], key: &'static str },
    /// `<input type="...">`
    InputType(&'static str),
    /// Placeholder contains any needle, ignoring case
    Placeholder { tags: &'static [&'static str], needles: &'static [&'static str] },
    /// `name` attribute contains any needle, ignoring case
    NameContains { tags: &'static [&'static str], needles: &'static [&'static str] },
    /// Only the first `<input type="...">` of the page
    FirstOfType(&'static str),
}

impl Strategy {
    /// Queries whose union is this strategy's candidate set, in priority order
    pub fn queries(&self) -> Vec<Query> {
        match self {
            Strategy::NameOrId { tags, key } => {
                vec![Query::tags(tags).attr_eq("name", *key), Query::tags(tags).attr_eq("id", *key)]
            }
            Strategy::InputType(input_type) => vec![Query::tag("input").attr_eq("type", *input_type)],
            Strategy::Placeholder { tags, needles } => needles
                .iter()
                .map(|needle| Query::tags(tags).attr_contains_ci("placeholder", *needle))
                .collect(),
            Strategy::NameContains { tags, needles } => needles
                .iter()
                .map(|needle| Query::tags(tags).attr_contains_ci("name", *needle))
                .collect(),
            Strategy::FirstOfType(input_type) => vec![Query::tag("input").attr_eq("type", *input_type)],
        }
    }

    /// Whether only the first match in document order may be used
    pub fn first_only(&self) -> bool {
        matches!(self, Strategy::FirstOfType(_))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::NameOrId { key, .. } => write!(f, "name/id = {}", key),
            Strategy::InputType(input_type) => write!(f, "type = {}", input_type),
            Strategy::Placeholder { needles, .. } => write!(f, "placeholder ~ {}", needles.join("|")),
            Strategy::NameContains { needles, .. } => write!(f, "name ~ {}", needles.join("|")),
            Strategy::FirstOfType(input_type) => write!(f, "first {} input", input_type),
        }
    }
}

/// Static strategy list of one field
#[derive(Debug)]
pub struct FieldSpec {
    pub field: SemanticField,
    pub strategies: &'static [Strategy],
}

const INPUT: &[&str] = &["input"];
const TEXT_CONTROLS: &[&str] = &["input", "textarea"];
const LONG_TEXT: &[&str] = &["textarea", "input"];

pub static FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        field: SemanticField::Name,
        strategies: &[
            Strategy::NameOrId { tags: INPUT, key: "name" },
            Strategy::NameOrId { tags: INPUT, key: "full_name" },
            Strategy::NameOrId { tags: INPUT, key: "fullname" },
            Strategy::Placeholder { tags: INPUT, needles: &["full name", "your name"] },
            Strategy::FirstOfType("text"),
        ],
    },
    FieldSpec {
        field: SemanticField::Email,
        strategies: &[
            Strategy::NameOrId { tags: INPUT, key: "email" },
            Strategy::InputType("email"),
            Strategy::Placeholder { tags: INPUT, needles: &["email"] },
        ],
    },
    FieldSpec {
        field: SemanticField::Phone,
        strategies: &[
            Strategy::NameOrId { tags: INPUT, key: "phone" },
            Strategy::InputType("tel"),
            Strategy::Placeholder { tags: INPUT, needles: &["phone"] },
        ],
    },
    FieldSpec {
        field: SemanticField::Skills,
        strategies: &[
            Strategy::NameOrId { tags: TEXT_CONTROLS, key: "skills" },
            Strategy::Placeholder { tags: TEXT_CONTROLS, needles: &["skill"] },
        ],
    },
    FieldSpec {
        field: SemanticField::Experience,
        strategies: &[
            Strategy::NameOrId { tags: LONG_TEXT, key: "experience" },
            Strategy::Placeholder { tags: LONG_TEXT, needles: &["experience"] },
        ],
    },
    FieldSpec {
        field: SemanticField::Education,
        strategies: &[
            Strategy::NameOrId { tags: LONG_TEXT, key: "education" },
            Strategy::Placeholder { tags: LONG_TEXT, needles: &["education"] },
        ],
    },
    FieldSpec {
        field: SemanticField::Linkedin,
        strategies: &[
            Strategy::NameOrId { tags: INPUT, key: "linkedin" },
            Strategy::Placeholder { tags: INPUT, needles: &["linkedin"] },
            Strategy::NameContains { tags: INPUT, needles: &["linkedin"] },
        ],
    },
    FieldSpec {
        field: SemanticField::Github,
        strategies: &[
            Strategy::NameOrId { tags: INPUT, key: "github" },
            Strategy::Placeholder { tags: INPUT, needles: &["github"] },
            Strategy::NameContains { tags: INPUT, needles: &["github"] },
        ],
    },
    FieldSpec {
        field: SemanticField::Portfolio,
        strategies: &[
            Strategy::NameOrId { tags: INPUT, key: "portfolio" },
            Strategy::NameOrId { tags: INPUT, key: "website" },
            Strategy::Placeholder { tags: INPUT, needles: &["portfolio", "website"] },
        ],
    },
    FieldSpec {
        field: SemanticField::Address,
        strategies: &[
            Strategy::NameOrId { tags: TEXT_CONTROLS, key: "address" },
        ],
    },
];

/// A known value for a field, as found in a resume record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<Value>),
    Empty,
    Other(Value),
}

impl FieldValue {
    /// The string to write, or `None` for absent, empty, "N/A" and empty-list values
    ///
    /// Lists are flattened to a comma-joined string.
    pub fn fill_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(text) => (!is_blank(text)).then(|| text.clone()),
            FieldValue::List(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) if is_blank(s) => None,
                        Value::String(s) => Some(s.clone()),
                        Value::Null => None,
                        other => Some(other.to_string()),
                    })
                    .collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            }
            FieldValue::Empty => None,
            FieldValue::Other(Value::Null) => None,
            FieldValue::Other(other) => Some(other.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::Text(text)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items.into_iter().map(Value::String).collect())
    }
}

/// Known values keyed by field name, in the caller's order
pub type KnownValues = IndexMap<String, FieldValue>;

/// Placeholder text the extractor uses for a missing value
pub const NOT_AVAILABLE: &str = "N/A";

fn is_blank(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text.eq_ignore_ascii_case(NOT_AVAILABLE)
}
