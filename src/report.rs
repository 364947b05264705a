//! Chronological pass log and the report a pass returns

use crate::form::UnfilledField;
use crate::submit::{SubmissionOutcome, SubmissionReport};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Ordered, tagged log of one pass
///
/// Every entry is mirrored to the `log` facade at a matching level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassLog {
    entries: Vec<String>,
}

impl PassLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A step boundary
    pub fn step(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.entries.push(format!("[STEP] {}", message));
    }

    pub fn ok(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.entries.push(format!("[OK] {}", message));
    }

    /// A swallowed failure
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.entries.push(format!("[WARN] {}", message));
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}", message);
        self.entries.push(format!("[FAIL] {}", message));
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|entry| entry.contains(needle))
    }
}

/// How a pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    /// Every step ran, including submission
    Completed,
    /// Stopped before submission because unfilled fields have no values
    AwaitingInput,
    /// The browser session failed
    Failed,
}

/// Result of one form-filling pass
#[derive(Debug, Clone, Serialize)]
pub struct FillReport {
    pub form_url: String,
    pub status: PassStatus,
    pub filled_field_names: Vec<String>,
    pub unfilled_fields: Vec<UnfilledField>,
    pub validation_warnings: Vec<String>,
    pub submission: Option<SubmissionReport>,
    pub error: Option<String>,
    pub log: PassLog,
}

impl FillReport {
    pub(crate) fn new(form_url: &str) -> Self {
        Self {
            form_url: form_url.to_string(),
            status: PassStatus::Completed,
            filled_field_names: Vec::new(),
            unfilled_fields: Vec::new(),
            validation_warnings: Vec::new(),
            submission: None,
            error: None,
            log: PassLog::new(),
        }
    }

    pub fn submission_outcome(&self) -> Option<&SubmissionOutcome> {
        self.submission.as_ref().map(|s| &s.outcome)
    }

    /// Human-readable completion text
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Form: {}", self.form_url);
        let status = match self.status {
            PassStatus::Completed => "completed",
            PassStatus::AwaitingInput => "waiting for values for unfilled fields",
            PassStatus::Failed => "failed",
        };
        let _ = writeln!(out, "Status: {}", status);

        if self.filled_field_names.is_empty() {
            let _ = writeln!(out, "Filled fields: none");
        } else {
            let _ = writeln!(
                out,
                "Filled fields ({}): {}",
                self.filled_field_names.len(),
                self.filled_field_names.join(", ")
            );
        }

        if !self.unfilled_fields.is_empty() {
            let _ = writeln!(out, "Unfilled fields ({}):", self.unfilled_fields.len());
            for field in &self.unfilled_fields {
                let required = if field.required { ", required" } else { "" };
                let _ = writeln!(out, "  - {} [{}{}]: {}", field.name, field.kind, required, field.display_label());
            }
        }

        if !self.validation_warnings.is_empty() {
            let _ = writeln!(out, "Validation warnings:");
            for warning in &self.validation_warnings {
                let _ = writeln!(out, "  - {}", warning);
            }
        }

        if let Some(outcome) = self.submission_outcome() {
            let _ = writeln!(out, "Submission: {}", outcome);
        }
        if let Some(error) = &self.error {
            let _ = writeln!(out, "Error: {}", error);
        }
        out
    }
}
