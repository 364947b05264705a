//! # formfill
//!
//! Fills job application forms from resume data by driving Chrome over the
//! DevTools Protocol (CDP).
//!
//! ## Features
//!
//! - **Field resolution**: resume values are placed through per-field selector
//!   strategies, without knowing the form's markup in advance
//! - **Fallback chains**: every write and every click walks an ordered list of
//!   techniques until one is verified
//! - **Unfilled-field detection**: whatever stays empty is reported with its
//!   label, type and options so the caller can supply values
//! - **Submission verification**: the result of a submit is classified as
//!   success, likely success, ambiguous or failure
//! - **Resume ingestion**: PDF text and links, structured by a language model
//! - **MCP Server**: `fill_form` and `scan_form` tools for AI agents
//!
//! ## Usage
//!
//! ```rust,no_run
//! use formfill::{BrowserTarget, FillRequest, FormFiller, KnownValues};
//!
//! let mut known = KnownValues::new();
//! known.insert("name".into(), "Jane Doe".into());
//! known.insert("email".into(), "jane@example.com".into());
//!
//! let request = FillRequest::new("https://jobs.example.com/apply").known_values(known);
//! let report = FormFiller::default().run(&BrowserTarget::default(), &request);
//! println!("{}", report.summary());
//! ```
//!
//! ### From a resume
//!
//! ```rust,no_run
//! use formfill::resume::{GeminiModel, PdfExtractor, ResumeParser};
//! use std::path::Path;
//!
//! # fn main() -> formfill::Result<()> {
//! let parser = ResumeParser::new(PdfExtractor::new(), GeminiModel::new("api-key")?);
//! let record = parser.parse(Path::new("resume.pdf"))?;
//! let known = record.known_values();
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: the browser boundary, Chrome sessions and an in-memory fake page
//! - [`dom`]: element handles and locator queries
//! - [`form`]: field resolution, fill chains, detection and user values
//! - [`submit`]: submit discovery, click chains and verification
//! - [`orchestrator`]: one pass end to end
//! - [`resume`]: resume text, links and structured records
//! - [`report`]: pass log and report
//! - [`mcp`]: **Model Context Protocol server** (requires `mcp-handler` feature)

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod form;
pub mod orchestrator;
pub mod report;
pub mod resume;
pub mod submit;

#[cfg(feature = "mcp-handler")]
pub mod mcp;

pub use browser::{BrowserControl, BrowserTarget, ChromePage, ConnectionOptions, FakeElement, FakePage, LaunchOptions};
pub use config::{FillerConfig, Timing};
pub use dom::{ElementRef, Query};
pub use error::{FillError, Result};
pub use form::{FieldValue, KnownValues, UnfilledField, UserSuppliedValue, UserValue, UserValues};
pub use orchestrator::{FillRequest, FormFiller, NoValues, ValueSource};
pub use report::{FillReport, PassLog, PassStatus};
pub use resume::ResumeRecord;
pub use submit::{SubmissionOutcome, SubmissionReport};

#[cfg(feature = "mcp-handler")]
pub use mcp::FormFillServer;
#[cfg(feature = "mcp-handler")]
pub use rmcp::ServiceExt;
