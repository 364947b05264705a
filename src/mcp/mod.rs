//! MCP (Model Context Protocol) server for form filling
//!
//! Tools run a whole pass in a blocking task, since the browser driver is synchronous.

pub mod handler;
pub use handler::FormFillServer;

use crate::form::{KnownValues, UserValues};
use crate::orchestrator::{FillRequest, FormFiller};
use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    tool, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// fill_form parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FillFormParams {
    /// URL of the application form
    pub form_url: String,

    /// Resume values keyed by field name: name, email, phone, skills, experience,
    /// education, linkedin, github, portfolio, address
    #[serde(default)]
    pub known_field_values: Map<String, Value>,

    /// Values for fields reported by scan_form, keyed by their index in that result.
    /// Each entry is {"value": string or bool, "field_info": {...}}
    #[serde(default)]
    pub user_field_values: Option<Map<String, Value>>,

    /// Stop before submitting when fields remain unfilled and no values were given (default: false)
    #[serde(default)]
    pub pause_when_unfilled: bool,
}

/// scan_form parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScanFormParams {
    /// URL of the application form
    pub form_url: String,

    /// Resume values to place before scanning
    #[serde(default)]
    pub known_field_values: Map<String, Value>,
}

fn known_values(values: Map<String, Value>) -> Result<KnownValues, McpError> {
    serde_json::from_value(Value::Object(values))
        .map_err(|e| McpError::invalid_params(format!("Invalid known_field_values: {}", e), None))
}

fn user_values(values: Map<String, Value>) -> Result<UserValues, McpError> {
    serde_json::from_value(Value::Object(values))
        .map_err(|e| McpError::invalid_params(format!("Invalid user_field_values: {}", e), None))
}

fn to_json_text<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

#[tool_router]
impl FormFillServer {
    /// Run a full pass and report the outcome
    #[tool(description = "Fill a job application form with resume values and submit it. Returns the pass report \
                          with filled fields, unfilled fields, validation warnings, the submission outcome and a log")]
    async fn fill_form(&self, params: Parameters<FillFormParams>) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let mut request = FillRequest::new(params.form_url).known_values(known_values(params.known_field_values)?);
        if let Some(values) = params.user_field_values {
            request = request.user_values(user_values(values)?);
        }

        let target = self.target.clone();
        let config = self.config.clone().pause_when_unfilled(params.pause_when_unfilled);
        let report = tokio::task::spawn_blocking(move || FormFiller::new(config).run(&target, &request))
            .await
            .map_err(|e| McpError::internal_error(format!("Form pass panicked: {}", e), None))?;

        let text = to_json_text(&report)?;
        if report.error.is_some() {
            Ok(CallToolResult::error(vec![Content::text(text)]))
        } else {
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
    }

    /// Place known values and list what is left, without submitting
    #[tool(description = "Open a form, place the known resume values, and list the fields that are still empty. \
                          Does not submit")]
    async fn scan_form(&self, params: Parameters<ScanFormParams>) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let request = FillRequest::new(params.form_url).known_values(known_values(params.known_field_values)?);

        let target = self.target.clone();
        let config = self.config.clone();
        let fields = tokio::task::spawn_blocking(move || FormFiller::new(config).scan_with(&target, &request))
            .await
            .map_err(|e| McpError::internal_error(format!("Form scan panicked: {}", e), None))?
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(CallToolResult::success(vec![Content::text(to_json_text(&fields)?)]))
    }
}
