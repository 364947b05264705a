use formfill::browser::{BrowserControl, BrowserTarget, ChromePage, LaunchOptions};
use formfill::config::FillerConfig;
use formfill::dom::Query;
use formfill::form::{FieldKind, KnownValues};
use formfill::orchestrator::{FillRequest, FormFiller, NoValues};
use formfill::report::PassStatus;
use formfill::submit::{SubmissionOutcome, SuccessSignal};
use serde_json::json;
use std::io::Write;

const APPLICATION_FORM: &str = r#"<!DOCTYPE html>
<html>
<head><title>Apply</title></head>
<body>
  <form id="application" onsubmit="event.preventDefault()">
    <label for="name">Full name</label>
    <input type="text" id="name">
    <input type="email" placeholder="Email">
    <label for="referral">Referral code</label>
    <input type="text" id="referral" name="referral_code" required>
    <select name="relocate">
      <option value="">Choose...</option>
      <option>Yes</option>
      <option>No</option>
    </select>
    <button type="submit" onclick="event.preventDefault(); this.remove()">Submit Application</button>
  </form>
</body>
</html>"#;

fn form_file(html: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".html").tempfile().expect("Failed to create temp file");
    file.write_all(html.as_bytes()).expect("Failed to write form");
    file
}

fn known() -> KnownValues {
    serde_json::from_value(json!({"name": "Jane Doe", "email": "jane@x.com", "phone": "N/A"})).unwrap()
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_full_pass_against_chrome() {
    let file = form_file(APPLICATION_FORM);
    let url = format!("file://{}", file.path().display());
    let target = BrowserTarget::Launch(LaunchOptions::new().headless(true));

    let report = FormFiller::default().run(&target, &FillRequest::new(url).known_values(known()));

    assert_eq!(report.status, PassStatus::Completed, "{}", report.summary());
    assert_eq!(report.filled_field_names, vec!["name", "email"]);

    let names: Vec<&str> = report.unfilled_fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["referral_code", "relocate"]);
    assert_eq!(report.unfilled_fields[0].label.as_deref(), Some("Referral code"));
    assert!(report.unfilled_fields[0].required);
    assert_eq!(report.unfilled_fields[1].kind, FieldKind::Select);
    assert_eq!(report.unfilled_fields[1].options, vec!["Choose...", "Yes", "No"]);

    assert_eq!(report.submission_outcome(), Some(&SubmissionOutcome::Success(vec![SuccessSignal::SubmitButtonGone])));
}

#[test]
#[ignore]
fn test_scan_does_not_submit() {
    let file = form_file(APPLICATION_FORM);
    let page = ChromePage::launch(&LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    let request = FillRequest::new(format!("file://{}", file.path().display())).known_values(known());

    let fields = FormFiller::default().scan(&page, &request).expect("Failed to scan");

    assert_eq!(fields.len(), 2);
    let buttons = page.find(&Query::tag("button")).expect("find");
    assert_eq!(buttons.len(), 1);
}

#[test]
#[ignore]
fn test_select_round_trip() {
    let page = ChromePage::launch(&LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    page.navigate("data:text/html,<select name='q'><option>Yes</option><option>No</option></select>")
        .expect("Failed to navigate");
    let select = page.find_first(&Query::tag("select")).expect("find").expect("select present");

    for _ in 0..2 {
        page.select_option(&select, "No").expect("Failed to select");
        assert_eq!(page.selected_option(&select).expect("read back").as_deref(), Some("No"));
    }
}

#[test]
#[ignore]
fn test_pause_when_unfilled_against_chrome() {
    let file = form_file(APPLICATION_FORM);
    let page = ChromePage::launch(&LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    let request = FillRequest::new(format!("file://{}", file.path().display())).known_values(known());
    let filler = FormFiller::new(FillerConfig::new().pause_when_unfilled(true));

    let report = filler.fill(&page, &request, &mut NoValues);

    assert_eq!(report.status, PassStatus::AwaitingInput);
    assert!(report.submission.is_none());
    assert_eq!(page.find(&Query::tag("button")).expect("find").len(), 1);
}
