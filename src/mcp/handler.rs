use crate::browser::BrowserTarget;
use crate::config::FillerConfig;
use rmcp::{
    ServerHandler,
    handler::server::router::tool::ToolRouter,
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool_handler,
};

/// MCP server exposing form-filling passes as tools
///
/// Every tool call opens its own browser from the configured target and
/// closes it when the pass is over.
#[derive(Clone)]
pub struct FormFillServer {
    pub(crate) target: BrowserTarget,
    pub(crate) config: FillerConfig,
    tool_router: ToolRouter<Self>,
}

impl FormFillServer {
    pub fn new(target: BrowserTarget) -> Self {
        Self::with_config(target, FillerConfig::default())
    }

    pub fn with_config(target: BrowserTarget, config: FillerConfig) -> Self {
        Self { target, config, tool_router: Self::tool_router() }
    }

    pub fn target(&self) -> &BrowserTarget {
        &self.target
    }
}

#[tool_handler]
impl ServerHandler for FormFillServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Fills job application forms from resume values. Call scan_form to see which fields \
                 a form still needs, then fill_form with known_field_values and, for the reported \
                 fields, user_field_values keyed by their position in the scan result."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}
