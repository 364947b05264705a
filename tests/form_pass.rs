//! End-to-end form passes against the in-memory page

use formfill::browser::{BrowserControl, ClickEffect, FakeElement, FakePage, Interaction};
use formfill::config::{FillerConfig, Timing};
use formfill::dom::Query;
use formfill::form::{
    FieldDetector, FieldKind, FieldResolver, FieldValue, FillChain, KnownValues, UserSuppliedValue, UserValueFiller,
    UserValues,
};
use formfill::orchestrator::{FillRequest, FormFiller, NoValues, ValueSource};
use formfill::report::{PassLog, PassStatus};
use formfill::resume::ResumeRecord;
use formfill::submit::{LikelyReason, SubmissionEngine, SubmissionOutcome, SuccessSignal};
use formfill::{UnfilledField, UserValue};
use serde_json::json;

const FORM_URL: &str = "https://jobs.example.com/apply";

fn filler() -> FormFiller {
    FormFiller::new(FillerConfig::new().timing(Timing::instant()))
}

fn jane() -> KnownValues {
    serde_json::from_value(json!({"name": "Jane Doe", "email": "jane@x.com"})).unwrap()
}

fn application_form() -> FakePage {
    FakePage::new(FORM_URL)
        .with(FakeElement::form())
        .with(FakeElement::input("text").id("name"))
        .with(FakeElement::input("email"))
        .with(FakeElement::button("Submit Application").on_activate(ClickEffect::RemoveSelf))
}

#[test]
fn test_unavailable_values_are_never_written() {
    let page = FakePage::new(FORM_URL)
        .with(FakeElement::input("text").name("name"))
        .with(FakeElement::input("email").name("email"))
        .with(FakeElement::textarea().name("skills"))
        .with(FakeElement::input("url").name("github"));
    let known: KnownValues = serde_json::from_value(json!({
        "name": "N/A",
        "email": "",
        "skills": [],
        "github": null
    }))
    .unwrap();
    let timing = Timing::instant();
    let mut log = PassLog::new();

    let filled = FieldResolver::new(&page, &timing).resolve_all(&known, &mut log);

    assert!(filled.is_empty());
    assert_eq!(page.calls("type"), 0);
    assert_eq!(page.calls("set_value"), 0);
    assert_eq!(page.calls("clear"), 0);
}

#[test]
fn test_accepting_element_only_needs_native_typing() {
    let page = FakePage::new(FORM_URL);
    let element = page.add(FakeElement::input("text").name("name"));

    let outcome = FillChain::standard().write(&page, &element, "Jane Doe", &Timing::instant());

    assert_eq!(outcome.technique, Some("native_typing"));
    assert!(outcome.failures.is_empty());
    assert_eq!(page.calls("set_value"), 0);
    assert_eq!(page.calls("dispatch:input"), 0);
    assert_eq!(page.calls("click"), 0);
    assert_eq!(page.value(&element).unwrap(), "Jane Doe");
}

#[test]
fn test_detector_skips_hidden_disabled_and_optionless() {
    let page = FakePage::new(FORM_URL)
        .with(FakeElement::input("text").name("hidden_one").hidden())
        .with(FakeElement::input("text").name("disabled_one").disabled())
        .with(FakeElement::select(&[]).name("empty_select"))
        .with(FakeElement::select(&["Yes", "No"]).with_prompt_option("Choose...").name("relocate"))
        .with(FakeElement::checkbox().name("hidden_box").hidden());

    let fields = FieldDetector::new(&page).detect();

    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "relocate");
    assert_eq!(fields[0].kind, FieldKind::Select);
    assert_eq!(fields[0].options, vec!["Choose...", "Yes", "No"]);
    assert!(fields.iter().all(|f| f.kind != FieldKind::Select || !f.options.is_empty()));
}

#[test]
fn test_fallback_names_are_unique_and_increasing() {
    let page = FakePage::new(FORM_URL)
        .with(FakeElement::input("text"))
        .with(FakeElement::input("text"))
        .with(FakeElement::textarea())
        .with(FakeElement::select(&["A", "B"]).with_prompt_option(""))
        .with(FakeElement::checkbox())
        .with(FakeElement::checkbox());

    let names: Vec<String> = FieldDetector::new(&page).detect().into_iter().map(|f| f.name).collect();

    assert_eq!(names, vec!["field_1", "field_2", "field_3", "select_4", "checkbox_5", "checkbox_6"]);
    let positions: Vec<usize> =
        names.iter().map(|n| n.rsplit('_').next().unwrap().parse().unwrap()).collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_vanished_submit_button_wins_without_other_signals() {
    let page = FakePage::new(FORM_URL)
        .with(FakeElement::form())
        .with(FakeElement::button("Submit Application").on_activate(ClickEffect::RemoveSelf));
    let config = FillerConfig::new().timing(Timing::instant());
    let mut log = PassLog::new();

    let report = SubmissionEngine::new(&page, &config).submit(&mut log);

    assert_eq!(page.current_url().unwrap(), FORM_URL);
    assert_eq!(report.outcome, SubmissionOutcome::Success(vec![SuccessSignal::SubmitButtonGone]));
}

#[test]
fn test_complete_application() {
    let page = application_form();
    let mut source = NoValues;

    let report = filler().fill(&page, &FillRequest::new(FORM_URL).known_values(jane()), &mut source);

    assert_eq!(report.status, PassStatus::Completed);
    assert_eq!(report.filled_field_names, vec!["name", "email"]);
    assert!(report.unfilled_fields.is_empty());
    assert_eq!(report.submission_outcome(), Some(&SubmissionOutcome::Success(vec![SuccessSignal::SubmitButtonGone])));
    assert!(report.log.contains("Filled name"));
}

#[test]
fn test_referral_code_needs_user_value() {
    let page = application_form().with(FakeElement::input("text").name("referral_code").required());
    let timing = Timing::instant();
    let mut log = PassLog::new();

    let filled = FieldResolver::new(&page, &timing).resolve_all(&jane(), &mut log);
    assert_eq!(filled, vec!["name", "email"]);

    let unfilled = FieldDetector::new(&page).detect();
    assert_eq!(unfilled.len(), 1);
    assert_eq!(unfilled[0].name, "referral_code");
    assert_eq!(unfilled[0].kind, FieldKind::Text);
    assert!(unfilled[0].required);

    let mut values = UserValues::new();
    values.insert(0, UserSuppliedValue::new("REF123", unfilled[0].clone()));
    let user_filled = UserValueFiller::new(&page, &timing).apply(&values, &mut log);

    assert_eq!(user_filled, vec!["referral_code"]);
    assert_eq!(page.by_name("referral_code").unwrap().value, "REF123");
    assert!(FieldDetector::new(&page).detect().is_empty());
}

#[test]
fn test_referral_code_through_the_orchestrator() {
    let page = application_form().with(FakeElement::input("text").name("referral_code").required());

    struct Answer;
    impl ValueSource for Answer {
        fn values_for(&mut self, fields: &[UnfilledField]) -> UserValues {
            let mut values = UserValues::new();
            values.insert(0, UserSuppliedValue::new("REF123", fields[0].clone()));
            values
        }
    }

    let report = filler().fill(&page, &FillRequest::new(FORM_URL).known_values(jane()), &mut Answer);

    assert_eq!(report.filled_field_names, vec!["name", "email", "referral_code"]);
    assert!(report.unfilled_fields.is_empty());
    assert!(report.submission_outcome().unwrap().is_success());
}

#[test]
fn test_request_values_take_precedence_over_source() {
    let page = application_form().with(FakeElement::input("text").name("referral_code"));
    let field_info: UnfilledField =
        serde_json::from_value(json!({"name": "referral_code", "type": "text", "required": false})).unwrap();
    let mut supplied = UserValues::new();
    supplied.insert(0, UserSuppliedValue::new("FROM-REQUEST", field_info));
    let request = FillRequest::new(FORM_URL).known_values(jane()).user_values(supplied);

    struct Unreachable;
    impl ValueSource for Unreachable {
        fn values_for(&mut self, _fields: &[UnfilledField]) -> UserValues {
            panic!("the request already carries values");
        }
    }

    let report = filler().fill(&page, &request, &mut Unreachable);

    assert_eq!(page.by_name("referral_code").unwrap().value, "FROM-REQUEST");
    assert!(report.unfilled_fields.is_empty());
}

#[test]
fn test_select_by_label_is_idempotent() {
    let page = FakePage::new(FORM_URL);
    let element = page.add(FakeElement::select(&["Yes", "No"]).with_prompt_option("Choose...").name("relocate"));
    let timing = Timing::instant();

    let field = FieldDetector::new(&page).detect().remove(0);
    let mut values = UserValues::new();
    values.insert(0, UserSuppliedValue::new("No", field));

    for _ in 0..2 {
        let mut log = PassLog::new();
        assert_eq!(UserValueFiller::new(&page, &timing).apply(&values, &mut log), vec!["relocate"]);
        assert_eq!(page.selected_option(&element).unwrap().as_deref(), Some("No"));
    }
}

#[test]
fn test_checkbox_from_user_value() {
    let page = FakePage::new(FORM_URL).with(FakeElement::checkbox().name("terms").required());
    let timing = Timing::instant();

    let field = FieldDetector::new(&page).detect().remove(0);
    assert_eq!(field.kind, FieldKind::Checkbox);
    let mut values = UserValues::new();
    values.insert(0, UserSuppliedValue::new(UserValue::Flag(true), field));

    let mut log = PassLog::new();
    UserValueFiller::new(&page, &timing).apply(&values, &mut log);

    assert!(page.by_name("terms").unwrap().checked);
    assert!(FieldDetector::new(&page).detect().is_empty());
}

#[test]
fn test_form_is_submitted_natively_when_no_control_exists() {
    let page = FakePage::new(FORM_URL)
        .with(FakeElement::form().id("application"))
        .with(FakeElement::input("text").name("name"));
    let config = FillerConfig::new().timing(Timing::instant());
    let mut log = PassLog::new();

    let report = SubmissionEngine::new(&page, &config).submit(&mut log);

    assert!(report.candidates.is_empty());
    assert!(report.used_form_fallback);
    assert_eq!(page.calls("submit_form"), 1);
    assert_eq!(report.outcome, SubmissionOutcome::Ambiguous);
}

#[test]
fn test_unclickable_button_falls_back_to_form_submission() {
    let page = FakePage::new(FORM_URL)
        .with(FakeElement::form().on_activate(ClickEffect::Navigate("https://jobs.example.com/next".into())))
        .with(
            FakeElement::button("Submit")
                .failing(Interaction::NativeClick)
                .failing(Interaction::ScriptClick)
                .failing(Interaction::PointerClick)
                .failing(Interaction::Events)
                .failing(Interaction::Keys),
        );
    let config = FillerConfig::new().timing(Timing::instant());
    let mut log = PassLog::new();

    let report = SubmissionEngine::new(&page, &config).submit(&mut log);

    assert!(report.used_form_fallback);
    assert_eq!(report.attempts.len(), 2);
    assert_eq!(report.attempts[1].method.as_deref(), Some("native_submit"));
    assert_eq!(report.outcome, SubmissionOutcome::LikelySuccess(LikelyReason::UrlChanged));
}

#[test]
fn test_confirmation_message_is_success() {
    let page = FakePage::new(FORM_URL)
        .with(FakeElement::form())
        .with(FakeElement::input("submit").attr("value", "Send").on_activate(ClickEffect::ShowMessage(
            "Thank you for applying!".into(),
        )));
    let config = FillerConfig::new().timing(Timing::instant());
    let mut log = PassLog::new();

    let report = SubmissionEngine::new(&page, &config).submit(&mut log);

    assert!(report.outcome.is_success());
    assert!(!report.used_form_fallback);
}

#[test]
fn test_validation_messages_are_reported() {
    let page = application_form()
        .with(FakeElement::new("span").class("error-text").with_text("Phone number is invalid"))
        .with(FakeElement::new("span").class("error-text").with_text("Hidden error").hidden());
    let mut source = NoValues;

    let report = filler().fill(&page, &FillRequest::new(FORM_URL).known_values(jane()), &mut source);

    assert_eq!(report.validation_warnings, vec!["Phone number is invalid"]);
    assert!(report.log.contains("Validation message: Phone number is invalid"));
}

#[test]
fn test_rejected_native_typing_falls_through_to_script() {
    let page = FakePage::new(FORM_URL).with(FakeElement::input("email").name("email").ignoring_typing());
    let timing = Timing::instant();
    let mut log = PassLog::new();

    let filled = FieldResolver::new(&page, &timing).resolve_all(&jane(), &mut log);

    assert_eq!(filled, vec!["email"]);
    assert_eq!(page.by_name("email").unwrap().value, "jane@x.com");
    assert!(log.contains("Filled email (scripted_assignment)"));
}

#[test]
fn test_report_serializes() {
    let page = application_form();
    let mut source = NoValues;

    let report = filler().fill(&page, &FillRequest::new(FORM_URL).known_values(jane()), &mut source);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["status"], "completed");
    assert_eq!(json["filled_field_names"], json!(["name", "email"]));
    assert_eq!(json["submission"]["outcome"]["outcome"], "success");
    assert!(json["log"].as_array().unwrap().iter().any(|e| e.as_str().unwrap().starts_with("[STEP]")));
}

#[test]
fn test_known_values_accept_lists() {
    let page = FakePage::new(FORM_URL).with(FakeElement::textarea().name("skills"));
    let mut known = KnownValues::new();
    known.insert("skills".into(), FieldValue::from(vec!["Rust".to_string(), "Go".to_string()]));
    let timing = Timing::instant();
    let mut log = PassLog::new();

    FieldResolver::new(&page, &timing).resolve_all(&known, &mut log);

    assert_eq!(page.by_name("skills").unwrap().value, "Rust, Go");
    assert!(page.find(&Query::tag("textarea")).unwrap().len() == 1);
}

#[test]
fn test_full_record_lands_in_matching_inputs_only() {
    let page = FakePage::new(FORM_URL)
        .with(FakeElement::form())
        .with(FakeElement::input("text").id("name").name("full_name"))
        .with(FakeElement::input("email").name("contact_email").placeholder("Email address"))
        .with(FakeElement::input("text").name("contact_phone").placeholder("Phone number"))
        .with(FakeElement::input("text").name("years").placeholder("Years of experience"))
        .with(FakeElement::textarea().name("skills"))
        .with(FakeElement::input("url").name("linkedin_url").placeholder("LinkedIn profile"))
        .with(FakeElement::input("url").name("github"))
        .with(FakeElement::input("url").name("website"))
        .with(FakeElement::textarea().name("address"))
        .with(FakeElement::button("Submit Application").on_activate(ClickEffect::RemoveSelf));
    let record: ResumeRecord = serde_json::from_value(json!({
        "name": "Jane Doe",
        "email": "jane@x.com",
        "phone": "555-0100",
        "address": "12 Main St, Springfield",
        "skills": ["Rust", "Go"],
        "experience": ["Acme Corp 2019-2023"],
        "education": ["BSc Computer Science"],
        "linkedin": "https://linkedin.com/in/jane",
        "github": "https://github.com/jane",
        "portfolio": "https://jane.dev"
    }))
    .unwrap();

    let report = filler().fill(&page, &FillRequest::new(FORM_URL).known_values(record.known_values()), &mut NoValues);

    assert_eq!(
        report.filled_field_names,
        vec!["name", "email", "phone", "skills", "experience", "linkedin", "github", "portfolio", "address"]
    );
    assert_eq!(page.by_name("full_name").unwrap().value, "Jane Doe");
    assert_eq!(page.by_name("contact_email").unwrap().value, "jane@x.com");
    assert_eq!(page.by_name("contact_phone").unwrap().value, "555-0100");
    assert_eq!(page.by_name("years").unwrap().value, "Acme Corp 2019-2023");
    assert_eq!(page.by_name("skills").unwrap().value, "Rust, Go");
    assert_eq!(page.by_name("linkedin_url").unwrap().value, "https://linkedin.com/in/jane");
    assert_eq!(page.by_name("github").unwrap().value, "https://github.com/jane");
    assert_eq!(page.by_name("website").unwrap().value, "https://jane.dev");
    assert_eq!(page.by_name("address").unwrap().value, "12 Main St, Springfield");
    assert!(report.log.contains("Could not find field for education"));
}
