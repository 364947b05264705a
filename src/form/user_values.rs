use crate::browser::BrowserControl;
use crate::config::{Timing, pause};
use crate::dom::{ElementRef, Query};
use crate::error::{FillError, Result};
use crate::form::detect::{FieldKind, UnfilledField};
use crate::form::fill::{FillChain, FillOutcome};
use crate::report::PassLog;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A value supplied from outside for a detected field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserValue {
    Flag(bool),
    Text(String),
}

impl UserValue {
    pub fn as_text(&self) -> String {
        match self {
            UserValue::Flag(flag) => flag.to_string(),
            UserValue::Text(text) => text.clone(),
        }
    }

    /// Desired checkbox state; strings like "yes" or "true" count as checked
    pub fn wants_checked(&self) -> bool {
        match self {
            UserValue::Flag(flag) => *flag,
            UserValue::Text(text) => {
                matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "y" | "on" | "1" | "checked")
            }
        }
    }
}

impl From<&str> for UserValue {
    fn from(text: &str) -> Self {
        UserValue::Text(text.to_string())
    }
}

impl From<bool> for UserValue {
    fn from(flag: bool) -> Self {
        UserValue::Flag(flag)
    }
}

/// A user value together with the detector's description of its field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSuppliedValue {
    pub value: UserValue,
    pub field_info: UnfilledField,
}

impl UserSuppliedValue {
    pub fn new(value: impl Into<UserValue>, field_info: UnfilledField) -> Self {
        Self { value: value.into(), field_info }
    }
}

/// User values keyed by their position in one detection pass
pub type UserValues = IndexMap<usize, UserSuppliedValue>;

/// Writes user-supplied values into the fields the detector reported
///
/// Every element is re-acquired by name or id right before writing; the
/// handle captured during detection is never used.
pub struct UserValueFiller<'a> {
    page: &'a dyn BrowserControl,
    timing: &'a Timing,
    chain: FillChain,
}

impl<'a> UserValueFiller<'a> {
    pub fn new(page: &'a dyn BrowserControl, timing: &'a Timing) -> Self {
        Self { page, timing, chain: FillChain::standard() }
    }

    /// Apply every value; returns the names of the fields that were filled
    ///
    /// A failure on one field is logged and the remaining fields are still processed.
    pub fn apply(&self, values: &UserValues, log: &mut PassLog) -> Vec<String> {
        let mut filled = Vec::new();

        for (index, supplied) in values {
            let info = &supplied.field_info;
            match self.apply_one(supplied) {
                Ok(true) => {
                    log.ok(format!("Filled {} '{}' from user input", info.kind, info.name));
                    filled.push(info.name.clone());
                }
                Ok(false) => log::debug!("No value supplied for #{} '{}'", index, info.name),
                Err(e) => log.warn(format!("Could not fill {} '{}': {}", info.kind, info.name, e)),
            }
        }

        filled
    }

    fn apply_one(&self, supplied: &UserSuppliedValue) -> Result<bool> {
        let info = &supplied.field_info;
        match info.kind {
            FieldKind::Select => {
                let label = supplied.value.as_text();
                if label.trim().is_empty() {
                    return Ok(false);
                }
                self.fill_select(info, label.trim())?;
            }
            FieldKind::Checkbox => self.fill_checkbox(info, supplied.value.wants_checked())?,
            _ => {
                let text = supplied.value.as_text();
                if text.is_empty() {
                    return Ok(false);
                }
                self.fill_text(info, &text)?;
            }
        }
        Ok(true)
    }

    fn fill_select(&self, info: &UnfilledField, label: &str) -> Result<()> {
        let element = self
            .by_name_or_id(&Query::tag("select"), &info.name)
            .or_else(|| self.first_interactable(&Query::tag("select")))
            .ok_or_else(|| FillError::ElementNotFound(format!("select '{}'", info.name)))?;

        self.page.select_option(&element, label)?;

        let selected = self.page.selected_option(&element)?;
        if selected.as_deref() != Some(label) {
            return Err(FillError::WriteRejected(format!(
                "'{}' still shows {:?} after selecting '{}'",
                info.name, selected, label
            )));
        }
        Ok(())
    }

    fn fill_checkbox(&self, info: &UnfilledField, desired: bool) -> Result<()> {
        let checkboxes = Query::tag("input").attr_eq("type", "checkbox");
        let element = self
            .by_name_or_id(&checkboxes, &info.name)
            .or_else(|| self.first_interactable(&checkboxes))
            .ok_or_else(|| FillError::ElementNotFound(format!("checkbox '{}'", info.name)))?;

        if self.page.is_checked(&element)? == desired {
            return Ok(());
        }

        if let Err(e) = self.page.click(&element) {
            log::debug!("Native click on checkbox '{}' failed, clicking from script: {}", info.name, e);
            self.page.script_click(&element)?;
        }

        if self.page.is_checked(&element)? != desired {
            return Err(FillError::WriteRejected(format!("checkbox '{}' did not toggle", info.name)));
        }
        Ok(())
    }

    fn fill_text(&self, info: &UnfilledField, text: &str) -> Result<()> {
        let element = self
            .locate_text(info)
            .ok_or_else(|| FillError::ElementNotFound(format!("text field '{}'", info.name)))?;

        let outcome = self.write(&element, text);
        if outcome.succeeded() {
            return Ok(());
        }

        if outcome.stale {
            log::debug!("'{}' went stale while writing, re-resolving", info.name);
            let fresh = self
                .locate_text(info)
                .ok_or_else(|| FillError::StaleElement(format!("text field '{}' vanished", info.name)))?;
            let retry = self.write(&fresh, text);
            if retry.succeeded() {
                return Ok(());
            }
            return Err(FillError::WriteRejected(failure_summary(&retry)));
        }

        Err(FillError::WriteRejected(failure_summary(&outcome)))
    }

    fn write(&self, element: &ElementRef, text: &str) -> FillOutcome {
        if let Err(e) = self.page.scroll_into_view(element) {
            log::debug!("Could not scroll {} into view: {}", element, e);
        }
        pause(self.timing.scroll_settle);
        self.chain.write(self.page, element, text, self.timing)
    }

    /// Name, id, placeholder, then label, taking the first query that matches anything
    fn locate_text(&self, info: &UnfilledField) -> Option<ElementRef> {
        let controls = ["input", "textarea"];
        let mut queries = vec![
            Query::tags(&controls).attr_eq("name", info.name.as_str()),
            Query::tags(&controls).attr_eq("id", info.name.as_str()),
        ];
        if let Some(placeholder) = &info.placeholder {
            queries.push(Query::tags(&controls).attr_contains("placeholder", placeholder.as_str()));
        }
        if let Some(label) = &info.label {
            queries.push(Query::tags(&controls).attr_contains("aria-label", label.as_str()));
            queries.push(Query::tags(&controls).attr_contains("placeholder", label.as_str()));
        }

        queries.iter().find_map(|query| match self.page.find_first(query) {
            Ok(found) => found,
            Err(e) => {
                log::debug!("Query {} failed: {}", query, e);
                None
            }
        })
    }

    fn by_name_or_id(&self, base: &Query, name: &str) -> Option<ElementRef> {
        [base.clone().attr_eq("name", name), base.clone().attr_eq("id", name)]
            .iter()
            .find_map(|query| self.page.find_first(query).ok().flatten())
    }

    fn first_interactable(&self, query: &Query) -> Option<ElementRef> {
        self.page
            .find(query)
            .ok()?
            .into_iter()
            .find(|element| self.page.is_interactable(element))
    }
}

fn failure_summary(outcome: &FillOutcome) -> String {
    outcome
        .failures
        .iter()
        .map(|(technique, error)| format!("{}: {}", technique, error))
        .collect::<Vec<_>>()
        .join("; ")
}
