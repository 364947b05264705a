use crate::browser::{BrowserControl, BrowserTarget, ChromePage, ReadyState, normalize_url};
use crate::config::{FillerConfig, pause, poll_until};
use crate::error::{FillError, Result};
use crate::form::{
    FieldDetector, FieldResolver, KnownValues, UnfilledField, UserValueFiller, UserValues, scan_validation_messages,
};
use crate::report::{FillReport, PassLog, PassStatus};
use crate::submit::SubmissionEngine;
use serde::{Deserialize, Serialize};

/// Where values for unfilled fields come from
pub trait ValueSource {
    /// Values for some or all of `fields`, keyed by their position in `fields`
    fn values_for(&mut self, fields: &[UnfilledField]) -> UserValues;
}

impl ValueSource for UserValues {
    fn values_for(&mut self, _fields: &[UnfilledField]) -> UserValues {
        self.clone()
    }
}

/// Supplies nothing; unfilled fields stay empty
#[derive(Debug, Default, Clone, Copy)]
pub struct NoValues;

impl ValueSource for NoValues {
    fn values_for(&mut self, _fields: &[UnfilledField]) -> UserValues {
        UserValues::new()
    }
}

/// Input of one pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FillRequest {
    pub form_url: String,

    /// Resume values keyed by field name ("name", "email", ...)
    #[serde(default)]
    pub known_field_values: KnownValues,

    /// Values for fields a previous scan reported as unfilled
    #[serde(default)]
    pub user_field_values: Option<UserValues>,
}

impl FillRequest {
    pub fn new(form_url: impl Into<String>) -> Self {
        Self { form_url: form_url.into(), ..Default::default() }
    }

    /// Builder method: known resume values
    pub fn known_values(mut self, values: KnownValues) -> Self {
        self.known_field_values = values;
        self
    }

    /// Builder method: values for previously detected fields
    pub fn user_values(mut self, values: UserValues) -> Self {
        self.user_field_values = Some(values);
        self
    }
}

/// Runs form-filling passes
///
/// A pass navigates to the form, places the known values, detects what is
/// left, fills it from a [`ValueSource`], scans for validation messages and
/// submits. Failures inside a step are logged and the pass continues; only
/// a failing browser session ends it early, as a [`PassStatus::Failed`] report.
pub struct FormFiller {
    config: FillerConfig,
}

impl Default for FormFiller {
    fn default() -> Self {
        Self::new(FillerConfig::default())
    }
}

impl FormFiller {
    pub fn new(config: FillerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FillerConfig {
        &self.config
    }

    /// Open a browser, run one pass with the request's own values, and close the browser
    pub fn run(&self, target: &BrowserTarget, request: &FillRequest) -> FillReport {
        self.run_with_source(target, request, &mut NoValues)
    }

    /// Like [`FormFiller::run`], asking `source` for values the request does not carry
    pub fn run_with_source(&self, target: &BrowserTarget, request: &FillRequest, source: &mut dyn ValueSource) -> FillReport {
        let page = match ChromePage::open(target) {
            Ok(page) => page,
            Err(e) => {
                let mut report = FillReport::new(&request.form_url);
                report.log.fail(format!("Could not start browser: {}", e));
                report.status = PassStatus::Failed;
                report.error = Some(e.to_string());
                return report;
            }
        };

        let mut report = self.fill(&page, request, source);
        if let Err(e) = page.close() {
            report.log.warn(format!("Could not close browser: {}", e));
        }
        report
    }

    /// Run one pass on an already open page
    pub fn fill(&self, page: &dyn BrowserControl, request: &FillRequest, source: &mut dyn ValueSource) -> FillReport {
        let mut report = FillReport::new(&request.form_url);

        if let Err(e) = self.pass(page, request, source, &mut report) {
            report.log.fail(format!("Pass aborted: {}", e));
            report.status = PassStatus::Failed;
            report.error = Some(e.to_string());
        }

        report
    }

    /// Open a browser, place the known values, and report what is left unfilled without submitting
    pub fn scan_with(&self, target: &BrowserTarget, request: &FillRequest) -> Result<Vec<UnfilledField>> {
        let page = ChromePage::open(target)?;
        let fields = self.scan(&page, request);
        page.close()?;
        fields
    }

    /// Place the known values and report what is left unfilled, without submitting
    pub fn scan(&self, page: &dyn BrowserControl, request: &FillRequest) -> Result<Vec<UnfilledField>> {
        let mut log = PassLog::new();
        self.open_form(page, &request.form_url, &mut log)?;
        FieldResolver::new(page, &self.config.timing).resolve_all(&request.known_field_values, &mut log);
        Ok(FieldDetector::new(page).detect())
    }

    fn pass(
        &self,
        page: &dyn BrowserControl,
        request: &FillRequest,
        source: &mut dyn ValueSource,
        report: &mut FillReport,
    ) -> Result<()> {
        let timing = &self.config.timing;
        self.open_form(page, &request.form_url, &mut report.log)?;

        report.log.step("Filling known fields");
        report.filled_field_names =
            FieldResolver::new(page, timing).resolve_all(&request.known_field_values, &mut report.log);

        report.log.step("Scanning for unfilled fields");
        let mut unfilled = FieldDetector::new(page).detect();

        if !unfilled.is_empty() {
            report.log.step(format!("{} field(s) still need values", unfilled.len()));
            let values = match &request.user_field_values {
                Some(values) => values.clone(),
                None => source.values_for(&unfilled),
            };

            if values.is_empty() && self.config.pause_when_unfilled {
                report.log.warn("No values for the unfilled fields, stopping before submission");
                report.unfilled_fields = unfilled;
                report.status = PassStatus::AwaitingInput;
                return Ok(());
            }

            if !values.is_empty() {
                let user_filled = UserValueFiller::new(page, timing).apply(&values, &mut report.log);
                unfilled.retain(|field| !user_filled.contains(&field.name));
                report.filled_field_names.extend(user_filled);
            }
        }
        report.unfilled_fields = unfilled;

        report.log.step("Checking for validation messages");
        report.validation_warnings = scan_validation_messages(page);
        for warning in &report.validation_warnings {
            report.log.warn(format!("Validation message: {}", warning));
        }

        report.log.step("Submitting");
        let submission = SubmissionEngine::new(page, &self.config).submit(&mut report.log);
        report.submission = Some(submission);

        report.log.ok(format!("Pass finished with {} field(s) filled", report.filled_field_names.len()));
        Ok(())
    }

    /// Navigate and wait for the document to settle
    fn open_form(&self, page: &dyn BrowserControl, form_url: &str, log: &mut PassLog) -> Result<()> {
        let timing = &self.config.timing;
        let url = normalize_url(form_url);

        log.step(format!("Opening {}", url));
        page.navigate(&url)?;
        pause(timing.page_settle);

        let ready = poll_until(timing.ready_timeout, timing.poll_interval, || {
            matches!(page.ready_state(), Ok(ReadyState::Complete)).then_some(())
        })
        .ok_or_else(|| FillError::Timeout(format!("page not ready after {:?}", timing.ready_timeout)));
        if let Err(e) = ready {
            log.warn(format!("{}, continuing anyway", e));
        }
        Ok(())
    }
}
