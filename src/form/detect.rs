use crate::browser::BrowserControl;
use crate::dom::{ElementRef, Query};
use crate::error::Result;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of control an [`UnfilledField`] describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Url,
    Number,
    Textarea,
    Select,
    Checkbox,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Tel => "tel",
            FieldKind::Url => "url",
            FieldKind::Number => "number",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Checkbox => "checkbox",
        }
    }

    /// Whether values are written through the fill chain
    pub fn is_textual(&self) -> bool {
        !matches!(self, FieldKind::Select | FieldKind::Checkbox)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A control left empty after the known values were placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnfilledField {
    /// Handle captured at detection time; never used for writing
    #[serde(skip)]
    pub element: Option<ElementRef>,

    /// `name` attribute, else `id`, else a positional placeholder
    pub name: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub placeholder: Option<String>,

    #[serde(rename = "type")]
    pub kind: FieldKind,

    #[serde(default)]
    pub required: bool,

    /// Option labels; only ever non-empty for selects
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl UnfilledField {
    /// Label for prompting a person
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("no label found")
    }
}

const TEXT_LIKE: &[(&str, FieldKind)] = &[
    ("text", FieldKind::Text),
    ("email", FieldKind::Email),
    ("tel", FieldKind::Tel),
    ("url", FieldKind::Url),
    ("number", FieldKind::Number),
];

/// Scans the rendered form for empty, visible, enabled controls
///
/// Scan order is text-like inputs and textareas, then selects, then
/// checkboxes. The result keeps that order; it is not the visual order of
/// the form.
pub struct FieldDetector<'a> {
    page: &'a dyn BrowserControl,
}

impl<'a> FieldDetector<'a> {
    pub fn new(page: &'a dyn BrowserControl) -> Self {
        Self { page }
    }

    pub fn detect(&self) -> Vec<UnfilledField> {
        let mut fields = Vec::new();
        let mut seen = IndexSet::new();

        let mut text_queries: Vec<(Query, FieldKind)> = TEXT_LIKE
            .iter()
            .map(|(input_type, kind)| (Query::tag("input").attr_eq("type", *input_type), *kind))
            .collect();
        text_queries.push((Query::tag("input").lacks_attr("type"), FieldKind::Text));
        text_queries.push((Query::tag("textarea"), FieldKind::Textarea));

        for (query, kind) in &text_queries {
            for element in self.candidates(query, &mut seen) {
                match self.text_field(&element, *kind, fields.len() + 1) {
                    Ok(Some(field)) => fields.push(field),
                    Ok(None) => {}
                    Err(e) => log::debug!("Skipping {} while scanning text fields: {}", element, e),
                }
            }
        }

        for element in self.candidates(&Query::tag("select"), &mut seen) {
            match self.select_field(&element, fields.len() + 1) {
                Ok(Some(field)) => fields.push(field),
                Ok(None) => {}
                Err(e) => log::debug!("Skipping {} while scanning selects: {}", element, e),
            }
        }

        for element in self.candidates(&Query::tag("input").attr_eq("type", "checkbox"), &mut seen) {
            match self.checkbox_field(&element, fields.len() + 1) {
                Ok(Some(field)) => fields.push(field),
                Ok(None) => {}
                Err(e) => log::debug!("Skipping {} while scanning checkboxes: {}", element, e),
            }
        }

        log::info!("Detected {} unfilled field(s)", fields.len());
        fields
    }

    /// Unseen, interactable matches of `query`
    fn candidates(&self, query: &Query, seen: &mut IndexSet<ElementRef>) -> Vec<ElementRef> {
        let found = match self.page.find(query) {
            Ok(found) => found,
            Err(e) => {
                log::debug!("Query {} failed: {}", query, e);
                return Vec::new();
            }
        };
        found
            .into_iter()
            .filter(|element| seen.insert(*element))
            .filter(|element| self.page.is_interactable(element))
            .collect()
    }

    fn text_field(&self, element: &ElementRef, kind: FieldKind, position: usize) -> Result<Option<UnfilledField>> {
        if !self.page.value(element)?.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(self.describe(element, kind, "field", position)?))
    }

    fn select_field(&self, element: &ElementRef, position: usize) -> Result<Option<UnfilledField>> {
        if !self.page.value(element)?.trim().is_empty() {
            return Ok(None);
        }
        let options = self.page.option_labels(element)?;
        if options.is_empty() {
            return Ok(None);
        }
        let mut field = self.describe(element, FieldKind::Select, "select", position)?;
        field.options = options;
        Ok(Some(field))
    }

    fn checkbox_field(&self, element: &ElementRef, position: usize) -> Result<Option<UnfilledField>> {
        if self.page.is_checked(element)? {
            return Ok(None);
        }
        Ok(Some(self.describe(element, FieldKind::Checkbox, "checkbox", position)?))
    }

    fn describe(&self, element: &ElementRef, kind: FieldKind, prefix: &str, position: usize) -> Result<UnfilledField> {
        let name_attr = non_empty(self.page.attribute(element, "name")?);
        let id = non_empty(self.page.attribute(element, "id")?);
        let name = name_attr
            .or_else(|| id.clone())
            .unwrap_or_else(|| format!("{}_{}", prefix, position));

        let required = self.page.attribute(element, "required")?.is_some()
            || self
                .page
                .attribute(element, "aria-required")?
                .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(UnfilledField {
            element: Some(*element),
            name,
            label: self.label_for(element, id.as_deref()),
            placeholder: non_empty(self.page.attribute(element, "placeholder")?),
            kind,
            required,
            options: Vec::new(),
        })
    }

    /// Explicit `<label for>` first, then the nearest preceding sibling label
    fn label_for(&self, element: &ElementRef, id: Option<&str>) -> Option<String> {
        if let Some(id) = id {
            let explicit = self
                .page
                .find_first(&Query::tag("label").attr_eq("for", id))
                .ok()
                .flatten()
                .and_then(|label| self.page.text(&label).ok())
                .filter(|text| !text.trim().is_empty());
            if explicit.is_some() {
                return explicit;
            }
        }
        self.page.preceding_label(element).ok().flatten().filter(|text| !text.trim().is_empty())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{FakeElement, FakePage};

    #[test]
    fn test_scan_order_and_kinds() {
        let page = FakePage::new("about:blank")
            .with(FakeElement::checkbox().name("terms"))
            .with(FakeElement::select(&["Yes", "No"]).with_prompt_option("Select...").name("relocate"))
            .with(FakeElement::textarea().name("cover_letter"))
            .with(FakeElement::input("email").name("email"))
            .with(FakeElement::new("input").name("city"));

        let fields = FieldDetector::new(&page).detect();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["email", "city", "cover_letter", "relocate", "terms"]);
        assert_eq!(fields[1].kind, FieldKind::Text);
        assert_eq!(fields[2].kind, FieldKind::Textarea);
        assert_eq!(fields[3].kind, FieldKind::Select);
        assert_eq!(fields[3].options, vec!["Select...", "Yes", "No"]);
        assert_eq!(fields[4].kind, FieldKind::Checkbox);
    }

    #[test]
    fn test_hidden_disabled_filled_and_checked_are_skipped() {
        let page = FakePage::new("about:blank")
            .with(FakeElement::input("text").name("hidden_one").hidden())
            .with(FakeElement::input("text").name("disabled_one").disabled())
            .with(FakeElement::input("text").name("filled").with_value("x"))
            .with(FakeElement::input("hidden").name("token"))
            .with(FakeElement::checkbox().name("agreed").checked())
            .with(FakeElement::select(&["A", "B"]).name("preselected"))
            .with(FakeElement::select(&[]).name("empty_select"));

        assert!(FieldDetector::new(&page).detect().is_empty());
    }

    #[test]
    fn test_fallback_names_are_unique_and_increasing() {
        let page = FakePage::new("about:blank")
            .with(FakeElement::input("text"))
            .with(FakeElement::input("text").name("named"))
            .with(FakeElement::textarea())
            .with(FakeElement::select(&["One"]).with_prompt_option(""))
            .with(FakeElement::select(&["Pick one", "Two"]).with_prompt_option("--"))
            .with(FakeElement::checkbox());

        let fields = FieldDetector::new(&page).detect();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["field_1", "named", "field_3", "select_4", "select_5", "checkbox_6"]);

        let positions: Vec<usize> = fields
            .iter()
            .filter_map(|f| f.name.rsplit('_').next().and_then(|n| n.parse().ok()))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_label_resolution() {
        let page = FakePage::new("about:blank")
            .with(FakeElement::label("ref", "Referral code"))
            .with(FakeElement::input("text").id("ref").required())
            .with(FakeElement::input("text").name("salary").after_label("Expected salary"))
            .with(FakeElement::input("text").name("misc").placeholder("Anything else?"));

        let fields = FieldDetector::new(&page).detect();
        assert_eq!(fields[0].name, "ref");
        assert_eq!(fields[0].label.as_deref(), Some("Referral code"));
        assert!(fields[0].required);
        assert_eq!(fields[1].label.as_deref(), Some("Expected salary"));
        assert!(!fields[1].required);
        assert_eq!(fields[2].display_label(), "no label found");
        assert_eq!(fields[2].placeholder.as_deref(), Some("Anything else?"));
    }

    #[test]
    fn test_select_options_invariant() {
        let page = FakePage::new("about:blank")
            .with(FakeElement::select(&["   "]).with_prompt_option(""))
            .with(FakeElement::select(&["Remote"]).with_prompt_option("Choose"));

        let fields = FieldDetector::new(&page).detect();
        assert_eq!(fields.len(), 1);
        assert!(fields.iter().all(|f| f.kind != FieldKind::Select || !f.options.is_empty()));
        assert!(fields.iter().all(|f| f.kind == FieldKind::Select || f.options.is_empty()));
    }

    #[test]
    fn test_serialized_shape() {
        let field = UnfilledField {
            element: Some(ElementRef::new(3)),
            name: "referral_code".into(),
            label: None,
            placeholder: None,
            kind: FieldKind::Text,
            required: true,
            options: Vec::new(),
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["required"], true);
        assert!(json.get("element").is_none());
    }
}
