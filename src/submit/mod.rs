//! Finding and activating the form's submit control, then verifying the result
//!
//! The engine is a small state machine:
//!
//! ```text
//! Idle -> CandidatesFound -> Attempting(0) -> Attempting(1) -> ... -> FallbackFormSubmit -> Terminal
//!                 \__________________________ (no candidates) ______/
//! ```
//!
//! Any attempt classified as success or likely success ends the run early.

pub mod candidates;
pub mod click;
pub mod verify;

pub use candidates::{SubmitCandidate, discover, rank};
pub use click::{ClickChain, ClickOutcome, ClickStrategy};
pub use verify::{LikelyReason, PageObservation, SubmissionOutcome, SuccessSignal, classify, observe};

use crate::browser::BrowserControl;
use crate::config::{FillerConfig, pause};
use crate::dom::{ElementRef, Query};
use crate::report::PassLog;
use serde::Serialize;

/// One activation and its classified result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    /// Description of the activated control
    pub target: String,

    /// Click strategy (or `native_submit`) that completed, if any did
    pub method: Option<String>,

    /// Errors of the strategies that failed, in order
    pub failures: Vec<String>,

    /// Verification result; absent when nothing could be activated
    pub outcome: Option<SubmissionOutcome>,
}

/// Everything the submission step did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReport {
    pub candidates: Vec<SubmitCandidate>,
    pub attempts: Vec<AttemptRecord>,
    pub used_form_fallback: bool,
    pub outcome: SubmissionOutcome,
}

enum EngineState {
    Idle,
    CandidatesFound(Vec<SubmitCandidate>),
    Attempting(usize),
    FallbackFormSubmit,
    Terminal(SubmissionOutcome),
}

/// Discovers, ranks and activates submit controls until one is verified
pub struct SubmissionEngine<'a> {
    page: &'a dyn BrowserControl,
    config: &'a FillerConfig,
    clicks: ClickChain,
}

impl<'a> SubmissionEngine<'a> {
    pub fn new(page: &'a dyn BrowserControl, config: &'a FillerConfig) -> Self {
        Self { page, config, clicks: ClickChain::standard() }
    }

    /// Builder method: use a different click chain
    pub fn with_clicks(mut self, clicks: ClickChain) -> Self {
        self.clicks = clicks;
        self
    }

    pub fn submit(&self, log: &mut PassLog) -> SubmissionReport {
        let mut candidates = Vec::new();
        let mut attempts = Vec::new();
        let mut used_form_fallback = false;
        let mut saw_ambiguous = false;
        let mut state = EngineState::Idle;

        let outcome = loop {
            state = match state {
                EngineState::Idle => {
                    pause(self.config.timing.pre_submit_settle);
                    let found = rank(discover(self.page), self.config.max_submit_candidates);
                    if found.is_empty() {
                        log.warn("No submit button found, trying native form submission");
                        EngineState::FallbackFormSubmit
                    } else {
                        EngineState::CandidatesFound(found)
                    }
                }
                EngineState::CandidatesFound(found) => {
                    log.step(format!("Found {} submit candidate(s)", found.len()));
                    for candidate in &found {
                        log::info!("  {} (score {})", candidate.description, candidate.score);
                    }
                    candidates = found;
                    EngineState::Attempting(0)
                }
                EngineState::Attempting(index) => match candidates.get(index) {
                    None => EngineState::FallbackFormSubmit,
                    Some(candidate) => {
                        let record = self.attempt_candidate(candidate, log);
                        let result = record.outcome.clone();
                        attempts.push(record);
                        match result {
                            Some(outcome) if outcome.is_success() => EngineState::Terminal(outcome),
                            Some(outcome) => {
                                saw_ambiguous |= outcome.is_ambiguous();
                                EngineState::Attempting(index + 1)
                            }
                            None => EngineState::Attempting(index + 1),
                        }
                    }
                },
                EngineState::FallbackFormSubmit => {
                    used_form_fallback = true;
                    self.submit_forms(&mut attempts, &mut saw_ambiguous, log)
                }
                EngineState::Terminal(outcome) => break outcome,
            };
        };

        match &outcome {
            SubmissionOutcome::Success(_) | SubmissionOutcome::LikelySuccess(_) => log.ok(format!("Submission: {}", outcome)),
            SubmissionOutcome::Ambiguous => log.warn(format!("Submission: {}", outcome)),
            SubmissionOutcome::Failure(_) => log.fail(format!("Submission: {}", outcome)),
        }

        SubmissionReport { candidates, attempts, used_form_fallback, outcome }
    }

    fn attempt_candidate(&self, candidate: &SubmitCandidate, log: &mut PassLog) -> AttemptRecord {
        log.step(format!("Clicking {}", candidate.description));
        let before = self.before_click();

        let clicked = self.clicks.click(self.page, &candidate.element, &self.config.timing);
        let failures = clicked.failures.iter().map(|(name, e)| format!("{}: {}", name, e)).collect();

        let Some(strategy) = clicked.strategy else {
            log.warn(format!("Every click strategy failed on {}", candidate.description));
            return AttemptRecord { target: candidate.description.clone(), method: None, failures, outcome: None };
        };

        let outcome = self.verify(&before);
        log::info!("{} via {}: {}", candidate.description, strategy, outcome);
        AttemptRecord {
            target: candidate.description.clone(),
            method: Some(strategy.to_string()),
            failures,
            outcome: Some(outcome),
        }
    }

    /// Invoke native submission on every form, bypassing button discovery
    fn submit_forms(&self, attempts: &mut Vec<AttemptRecord>, saw_ambiguous: &mut bool, log: &mut PassLog) -> EngineState {
        let forms = match self.page.find(&Query::tag("form")) {
            Ok(forms) => forms,
            Err(e) => {
                log.warn(format!("Could not look for forms: {}", e));
                Vec::new()
            }
        };

        for form in forms {
            let target = self.describe_form(&form);
            log.step(format!("Submitting {} natively", target));
            let before = self.before_click();

            if let Err(e) = self.page.submit_form(&form) {
                log.warn(format!("Native submission of {} failed: {}", target, e));
                attempts.push(AttemptRecord { target, method: None, failures: vec![e.to_string()], outcome: None });
                continue;
            }

            let outcome = self.verify(&before);
            attempts.push(AttemptRecord {
                target,
                method: Some("native_submit".to_string()),
                failures: Vec::new(),
                outcome: Some(outcome.clone()),
            });
            if outcome.is_success() {
                return EngineState::Terminal(outcome);
            }
            *saw_ambiguous |= outcome.is_ambiguous();
        }

        if *saw_ambiguous {
            EngineState::Terminal(SubmissionOutcome::Ambiguous)
        } else {
            EngineState::Terminal(SubmissionOutcome::Failure("No submit control or form could be activated".into()))
        }
    }

    /// URL and marker state captured right before an activation
    fn before_click(&self) -> (String, bool) {
        let url = self.page.current_url().unwrap_or_default();
        (url, verify::marker_visible(self.page))
    }

    fn verify(&self, before: &(String, bool)) -> SubmissionOutcome {
        pause(self.config.timing.verify_delay);
        match observe(self.page) {
            Ok(after) => classify(&before.0, before.1, &after),
            Err(e) => {
                log::warn!("Could not observe the page after submission: {}", e);
                SubmissionOutcome::Ambiguous
            }
        }
    }

    fn describe_form(&self, form: &ElementRef) -> String {
        let identifier = ["id", "name", "action"]
            .iter()
            .find_map(|attr| self.page.attribute(form, attr).ok().flatten().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| form.to_string());
        format!("FORM ({})", identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{ClickEffect, FakeElement, FakePage, Interaction};
    use crate::config::Timing;

    fn config() -> FillerConfig {
        FillerConfig::new().timing(Timing::instant())
    }

    #[test]
    fn test_vanishing_marker_is_success() {
        let page = FakePage::new("https://jobs.example.com/apply")
            .with(FakeElement::form())
            .with(FakeElement::button("Submit Application").on_activate(ClickEffect::RemoveSelf));
        let config = config();
        let mut log = PassLog::new();

        let report = SubmissionEngine::new(&page, &config).submit(&mut log);

        assert_eq!(report.outcome, SubmissionOutcome::Success(vec![SuccessSignal::SubmitButtonGone]));
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(report.attempts[0].method.as_deref(), Some("standard_click"));
        assert!(!report.used_form_fallback);
    }

    #[test]
    fn test_highest_score_is_tried_first() {
        let page = FakePage::new("https://jobs.example.com/apply")
            .with(FakeElement::form())
            .with(FakeElement::input("button").attr("value", "Submit draft"))
            .with(FakeElement::input("submit").attr("value", "Send").on_activate(ClickEffect::RemoveForms));
        let config = config();
        let mut log = PassLog::new();

        let report = SubmissionEngine::new(&page, &config).submit(&mut log);

        assert_eq!(report.attempts.len(), 1);
        assert_eq!(report.attempts[0].target, "INPUT (submit) - Send");
        assert_eq!(report.outcome, SubmissionOutcome::LikelySuccess(LikelyReason::FormsGone));
    }

    #[test]
    fn test_candidate_bound_is_respected() {
        let page = FakePage::new("https://jobs.example.com/apply")
            .with(FakeElement::form())
            .with(FakeElement::button("Submit one"))
            .with(FakeElement::button("Submit two"))
            .with(FakeElement::button("Submit three"));
        let config = config().max_submit_candidates(2);
        let mut log = PassLog::new();

        let report = SubmissionEngine::new(&page, &config).submit(&mut log);

        assert_eq!(report.candidates.len(), 2);
        assert_eq!(report.attempts.iter().filter(|a| a.target.starts_with("BUTTON")).count(), 2);
        assert!(report.used_form_fallback);
        assert_eq!(report.outcome, SubmissionOutcome::Ambiguous);
    }

    #[test]
    fn test_form_fallback_without_candidates() {
        let page = FakePage::new("https://jobs.example.com/apply")
            .with(FakeElement::form().id("application").on_activate(ClickEffect::Navigate("https://jobs.example.com/done".into())))
            .with(FakeElement::new("a").with_text("Apply"));
        let config = config();
        let mut log = PassLog::new();

        let report = SubmissionEngine::new(&page, &config).submit(&mut log);

        assert!(report.used_form_fallback);
        assert_eq!(page.calls("submit_form"), 1);
        assert_eq!(report.attempts[0].target, "FORM (application)");
        assert_eq!(report.outcome, SubmissionOutcome::LikelySuccess(LikelyReason::UrlChanged));
    }

    #[test]
    fn test_nothing_to_activate_is_failure() {
        let page = FakePage::new("https://jobs.example.com/apply").with(
            FakeElement::button("Submit")
                .failing(Interaction::NativeClick)
                .failing(Interaction::ScriptClick)
                .failing(Interaction::PointerClick)
                .failing(Interaction::Events)
                .failing(Interaction::Keys),
        );
        let config = config();
        let mut log = PassLog::new();

        let report = SubmissionEngine::new(&page, &config).submit(&mut log);

        assert!(matches!(report.outcome, SubmissionOutcome::Failure(_)));
        assert_eq!(report.attempts[0].failures.len(), 5);
        assert!(log.contains("Every click strategy failed"));
    }
}
