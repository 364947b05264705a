use super::links::{CategorizedLinks, LinkCategory};
use crate::form::{FieldValue, KnownValues, NOT_AVAILABLE};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Structured resume data, as produced by the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub name: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub email: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub phone: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub address: String,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub skills: Vec<Value>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub experience: Vec<Value>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub education: Vec<Value>,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub linkedin: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub github: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub portfolio: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub google_drive: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub dropbox: String,

    /// The unparsed model output, kept when it could not be read as a record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

/// Fields worth asking the user about when the resume lacks them
pub const IMPORTANT_FIELDS: &[&str] = &["name", "email", "phone", "linkedin", "github", "skills", "address"];

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

fn text_or_not_available<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => not_available(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

fn list_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(Value::String(text)) if text.trim().is_empty() || text == NOT_AVAILABLE => Vec::new(),
        Some(other) => vec![other],
    })
}

impl Default for ResumeRecord {
    fn default() -> Self {
        Self {
            name: not_available(),
            email: not_available(),
            phone: not_available(),
            address: not_available(),
            skills: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            linkedin: not_available(),
            github: not_available(),
            portfolio: not_available(),
            google_drive: not_available(),
            dropbox: not_available(),
            raw_response: None,
        }
    }
}

impl ResumeRecord {
    /// The all-"N/A" record returned when the model output cannot be parsed
    pub fn sentinel(raw: impl Into<String>) -> Self {
        Self { raw_response: Some(raw.into()), ..Default::default() }
    }

    /// Whether this record came from unparseable model output
    pub fn is_sentinel(&self) -> bool {
        self.raw_response.is_some()
    }

    /// Overwrite link fields with links read from the document itself
    pub fn merge_links(&mut self, links: &CategorizedLinks) {
        for (category, url) in links {
            let slot = match category {
                LinkCategory::Linkedin => &mut self.linkedin,
                LinkCategory::Github => &mut self.github,
                LinkCategory::GoogleDrive => &mut self.google_drive,
                LinkCategory::Dropbox => &mut self.dropbox,
                LinkCategory::Portfolio => &mut self.portfolio,
                LinkCategory::Email => &mut self.email,
            };
            *slot = url.clone();
        }
    }

    /// Names of [`IMPORTANT_FIELDS`] that are "N/A", blank or an empty list
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let values = self.known_values();
        IMPORTANT_FIELDS
            .iter()
            .copied()
            .filter(|field| values.get(*field).and_then(FieldValue::fill_text).is_none())
            .collect()
    }

    /// Set a field by name; `skills` takes a comma-separated list
    pub fn set_field(&mut self, field: &str, value: &str) -> bool {
        let value = value.trim().to_string();
        let slot = match field {
            "name" => &mut self.name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "address" => &mut self.address,
            "linkedin" => &mut self.linkedin,
            "github" => &mut self.github,
            "portfolio" => &mut self.portfolio,
            "google_drive" => &mut self.google_drive,
            "dropbox" => &mut self.dropbox,
            "skills" => {
                self.skills = value
                    .split(',')
                    .map(str::trim)
                    .filter(|skill| !skill.is_empty())
                    .map(|skill| Value::String(skill.to_string()))
                    .collect();
                return true;
            }
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Values for the form's semantic fields, keyed by field name
    pub fn known_values(&self) -> KnownValues {
        let mut values = KnownValues::new();
        values.insert("name".into(), FieldValue::from(self.name.as_str()));
        values.insert("email".into(), FieldValue::from(self.email.as_str()));
        values.insert("phone".into(), FieldValue::from(self.phone.as_str()));
        values.insert("skills".into(), FieldValue::List(self.skills.clone()));
        values.insert("experience".into(), FieldValue::List(self.experience.clone()));
        values.insert("education".into(), FieldValue::List(self.education.clone()));
        values.insert("linkedin".into(), FieldValue::from(self.linkedin.as_str()));
        values.insert("github".into(), FieldValue::from(self.github.as_str()));
        values.insert("portfolio".into(), FieldValue::from(self.portfolio.as_str()));
        values.insert("address".into(), FieldValue::from(self.address.as_str()));
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sentinel() {
        let record = ResumeRecord::sentinel("not json");
        assert_eq!(record.name, "N/A");
        assert!(record.skills.is_empty());
        assert!(record.is_sentinel());
        assert_eq!(serde_json::to_value(&record).unwrap()["raw_response"], "not json");
    }

    #[test]
    fn test_lenient_deserialization() {
        let record: ResumeRecord = serde_json::from_value(json!({
            "name": "Jane Doe",
            "phone": null,
            "skills": "Rust",
            "education": "N/A",
            "experience": [{"title": "Engineer", "company": "Acme"}]
        }))
        .unwrap();

        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.phone, "N/A");
        assert_eq!(record.email, "N/A");
        assert_eq!(record.skills, vec![json!("Rust")]);
        assert!(record.education.is_empty());
        assert_eq!(record.experience.len(), 1);
        assert!(!record.is_sentinel());
    }

    #[test]
    fn test_merge_links_overrides() {
        let mut record = ResumeRecord { github: "github.com/guess".into(), ..Default::default() };
        let mut links = CategorizedLinks::new();
        links.insert(LinkCategory::Github, "https://github.com/jane".into());
        links.insert(LinkCategory::Portfolio, "https://jane.dev".into());

        record.merge_links(&links);

        assert_eq!(record.github, "https://github.com/jane");
        assert_eq!(record.portfolio, "https://jane.dev");
        assert_eq!(record.linkedin, "N/A");
    }

    #[test]
    fn test_known_values_and_missing_fields() {
        let mut record = ResumeRecord { name: "Jane Doe".into(), email: "jane@x.com".into(), ..Default::default() };
        assert!(record.set_field("skills", "Rust, Go ,"));
        assert!(!record.set_field("salary", "lots"));

        let values = record.known_values();
        assert_eq!(values["skills"].fill_text().as_deref(), Some("Rust, Go"));
        assert_eq!(values["phone"].fill_text(), None);
        assert_eq!(record.missing_fields(), vec!["phone", "linkedin", "github", "address"]);
    }
}
