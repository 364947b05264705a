//! Browser control boundary and its implementations
//!
//! [`BrowserControl`] is everything the form logic needs from a rendered page.
//! [`ChromePage`] drives a real Chrome/Chromium over CDP; [`FakePage`] is an
//! in-memory page for exercising form logic without a browser.

pub mod config;
pub mod fake;
pub mod session;
pub mod url;

pub use config::{BrowserTarget, ConnectionOptions, LaunchOptions};
pub use fake::{ClickEffect, FakeElement, FakePage, Interaction};
pub use session::ChromePage;
pub use url::normalize_url;

use crate::dom::{ElementRef, Query};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// `document.readyState` of the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    pub fn parse(state: &str) -> Self {
        match state {
            "complete" => ReadyState::Complete,
            "interactive" => ReadyState::Interactive,
            _ => ReadyState::Loading,
        }
    }
}

/// Synthetic DOM events the form logic dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Input,
    Change,
    MouseDown,
    MouseUp,
    Click,
}

impl DomEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
            DomEvent::MouseDown => "mousedown",
            DomEvent::MouseUp => "mouseup",
            DomEvent::Click => "click",
        }
    }

    pub fn is_mouse(&self) -> bool {
        matches!(self, DomEvent::MouseDown | DomEvent::MouseUp | DomEvent::Click)
    }
}

/// Operations on one rendered page owned by one automation session
///
/// Element references returned by [`BrowserControl::find`] are only valid
/// within the session that produced them and only while the node stays
/// attached.
pub trait BrowserControl {
    /// Navigate the page to `url` and wait for the navigation to commit
    fn navigate(&self, url: &str) -> Result<()>;

    fn ready_state(&self) -> Result<ReadyState>;

    /// All elements matching `query`, in document order
    fn find(&self, query: &Query) -> Result<Vec<ElementRef>>;

    fn is_visible(&self, element: &ElementRef) -> Result<bool>;

    fn is_enabled(&self, element: &ElementRef) -> Result<bool>;

    fn is_checked(&self, element: &ElementRef) -> Result<bool>;

    fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>>;

    /// Lower-case tag name
    fn tag_name(&self, element: &ElementRef) -> Result<String>;

    /// Rendered text, trimmed
    fn text(&self, element: &ElementRef) -> Result<String>;

    /// Current `value` property (empty when the element has none)
    fn value(&self, element: &ElementRef) -> Result<String>;

    fn scroll_into_view(&self, element: &ElementRef) -> Result<()>;

    /// Clear the element's value
    fn clear(&self, element: &ElementRef) -> Result<()>;

    /// Focus the element and type `text` with native key input
    fn type_text(&self, element: &ElementRef, text: &str) -> Result<()>;

    /// Assign the `value` property from script, without events
    fn set_value(&self, element: &ElementRef, value: &str) -> Result<()>;

    fn dispatch_event(&self, element: &ElementRef, event: DomEvent) -> Result<()>;

    /// Native click through the input pipeline
    fn click(&self, element: &ElementRef) -> Result<()>;

    /// `element.click()` from script
    fn script_click(&self, element: &ElementRef) -> Result<()>;

    /// Move the pointer over the element's midpoint, then press and release there
    fn pointer_click(&self, element: &ElementRef) -> Result<()>;

    /// Focus the element and press a named key (e.g. "Enter")
    fn press_key(&self, element: &ElementRef, key: &str) -> Result<()>;

    /// Non-empty option labels of a `<select>`, in order
    fn option_labels(&self, element: &ElementRef) -> Result<Vec<String>>;

    /// Select the option whose visible label equals `label`
    ///
    /// Fails with [`FillError::WriteRejected`](crate::error::FillError::WriteRejected) when no option matches.
    fn select_option(&self, element: &ElementRef, label: &str) -> Result<()>;

    /// Visible label of the selected option of a `<select>`
    fn selected_option(&self, element: &ElementRef) -> Result<Option<String>>;

    /// Text of the nearest preceding sibling `<label>`, if any
    fn preceding_label(&self, element: &ElementRef) -> Result<Option<String>>;

    /// Invoke the native submission of a `<form>`, bypassing its submit controls
    fn submit_form(&self, form: &ElementRef) -> Result<()>;

    fn current_url(&self) -> Result<String>;

    fn page_source(&self) -> Result<String>;

    fn title(&self) -> Result<String>;

    /// Release the session; further calls may fail
    fn close(&self) -> Result<()>;

    /// Visible and enabled; any failure to tell counts as not interactable
    fn is_interactable(&self, element: &ElementRef) -> bool {
        self.is_visible(element).unwrap_or(false) && self.is_enabled(element).unwrap_or(false)
    }

    /// First element matching `query`, if any
    fn find_first(&self, query: &Query) -> Result<Option<ElementRef>> {
        Ok(self.find(query)?.into_iter().next())
    }
}
