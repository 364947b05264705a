use crate::browser::config::{BrowserTarget, ConnectionOptions, LaunchOptions};
use crate::browser::{BrowserControl, DomEvent, ReadyState};
use crate::dom::{ElementRef, Query};
use crate::error::{FillError, Result};
use headless_chrome::{Browser, Element, Tab};
use serde::Deserialize;
use serde_json::{Value, json};
use std::ffi::OsStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Attribute used to stamp matched nodes so they can be re-acquired by selector
const REF_ATTRIBUTE: &str = "data-formfill-ref";

const FIND_SCRIPT: &str = r#"
(function(css, filter, attr, next) {
    const ownText = el => Array.from(el.childNodes)
        .filter(n => n.nodeType === Node.TEXT_NODE)
        .map(n => n.textContent)
        .join('');
    const refs = [];
    for (const el of document.querySelectorAll(css)) {
        if (filter) {
            let hay = filter.scope === 'own' ? ownText(el) : (el.innerText || el.textContent || '');
            let needle = filter.needle;
            if (filter.ignore_case) {
                hay = hay.toLowerCase();
                needle = needle.toLowerCase();
            }
            if (!hay.includes(needle)) continue;
        }
        let id = el.getAttribute(attr);
        if (!id) {
            id = String(next++);
            el.setAttribute(attr, id);
        }
        refs.push(Number(id));
    }
    return JSON.stringify({ refs: refs, next: next });
})
"#;

const IS_VISIBLE_FN: &str = r#"function() {
    if (!this.isConnected) return false;
    const style = window.getComputedStyle(this);
    if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') return false;
    const rect = this.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
}"#;

const SELECT_OPTION_FN: &str = r#"function(label) {
    const options = Array.from(this.options || []);
    const index = options.findIndex(o => o.text.trim() === label);
    if (index < 0) return false;
    this.selectedIndex = index;
    this.dispatchEvent(new Event('input', { bubbles: true }));
    this.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
}"#;

const PRECEDING_LABEL_FN: &str = r#"function() {
    let prev = this.previousElementSibling;
    while (prev) {
        if (prev.tagName.toLowerCase() === 'label') {
            return prev.textContent.trim();
        }
        prev = prev.previousElementSibling;
    }
    return null;
}"#;

#[derive(Deserialize)]
struct FoundRefs {
    refs: Vec<u64>,
    next: u64,
}

/// One Chrome/Chromium tab driven over CDP
///
/// The page owns its browser: dropping it closes the tab and, for launched
/// browsers, terminates the process.
pub struct ChromePage {
    /// Kept alive for the lifetime of the tab
    _browser: Browser,

    tab: Arc<Tab>,

    /// Next id handed out when stamping nodes; monotonic across navigations so
    /// references from a previous document never alias new nodes
    next_ref: AtomicU64,

    closed: AtomicBool,
}

impl ChromePage {
    /// Launch or connect, depending on the target
    pub fn open(target: &BrowserTarget) -> Result<Self> {
        match target {
            BrowserTarget::Launch(options) => Self::launch(options),
            BrowserTarget::Connect(options) => Self::connect(options),
        }
    }

    /// Launch a new browser instance with the given options
    pub fn launch(options: &LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Hide the automation banner and the navigator.webdriver hint some application forms check
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));
        launch_opts.args.push(OsStr::new("--disable-dev-shm-usage"));

        // One pass can take minutes on slow forms
        launch_opts.idle_browser_timeout = Duration::from_secs(15 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.path = options.chrome_path.clone();
        launch_opts.user_data_dir = options.user_data_dir.clone();
        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts)
            .map_err(|e| FillError::SessionFailure(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| FillError::SessionFailure(format!("Failed to create tab: {}", e)))?;

        log::debug!("Launched browser (headless: {})", options.headless);
        Ok(Self::from_parts(browser, tab))
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: &ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect(options.ws_url.clone())
            .map_err(|e| FillError::SessionFailure(format!("Failed to connect to {}: {}", options.ws_url, e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| FillError::SessionFailure(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(options.timeout));

        log::debug!("Connected to browser at {}", options.ws_url);
        Ok(Self::from_parts(browser, tab))
    }

    fn from_parts(browser: Browser, tab: Arc<Tab>) -> Self {
        Self { _browser: browser, tab, next_ref: AtomicU64::new(1), closed: AtomicBool::new(false) }
    }

    /// The underlying tab
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    fn selector_for(element: &ElementRef) -> String {
        format!("[{}=\"{}\"]", REF_ATTRIBUTE, element.id())
    }

    /// Re-acquire the live node behind a reference
    fn node(&self, element: &ElementRef) -> Result<Element<'_>> {
        self.tab
            .find_element(&Self::selector_for(element))
            .map_err(|_| FillError::StaleElement(format!("{} is no longer attached", element)))
    }

    fn call(&self, element: &ElementRef, function: &str, args: Vec<Value>) -> Result<Value> {
        let node = self.node(element)?;
        let object = node
            .call_js_fn(function, args, false)
            .map_err(|e| FillError::ScriptFailed(format!("Script on {} failed: {}", element, e)))?;
        Ok(object.value.unwrap_or(Value::Null))
    }

    fn call_bool(&self, element: &ElementRef, function: &str) -> Result<bool> {
        match self.call(element, function, Vec::new())? {
            Value::Bool(flag) => Ok(flag),
            other => Err(FillError::ScriptFailed(format!("Expected boolean from {}, got {}", element, other))),
        }
    }

    fn call_string(&self, element: &ElementRef, function: &str, args: Vec<Value>) -> Result<Option<String>> {
        match self.call(element, function, args)? {
            Value::String(text) => Ok(Some(text)),
            Value::Null => Ok(None),
            other => Ok(Some(other.to_string())),
        }
    }

    fn evaluate(&self, expression: &str) -> Result<Value> {
        let object = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| FillError::ScriptFailed(format!("Failed to evaluate page script: {}", e)))?;
        Ok(object.value.unwrap_or(Value::Null))
    }
}

impl BrowserControl for ChromePage {
    fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| FillError::SessionFailure(format!("Failed to navigate to {}: {}", url, e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| FillError::SessionFailure(format!("Navigation to {} did not complete: {}", url, e)))?;
        Ok(())
    }

    fn ready_state(&self) -> Result<ReadyState> {
        let state = self.evaluate("document.readyState")?;
        Ok(ReadyState::parse(state.as_str().unwrap_or("loading")))
    }

    fn find(&self, query: &Query) -> Result<Vec<ElementRef>> {
        let start = self.next_ref.load(Ordering::SeqCst);
        let expression = format!(
            "{}({}, {}, {}, {})",
            FIND_SCRIPT,
            serde_json::to_string(&query.to_css())?,
            serde_json::to_string(&query.text)?,
            serde_json::to_string(REF_ATTRIBUTE)?,
            start
        );

        let json_value = self.evaluate(&expression)?;
        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| FillError::ScriptFailed(format!("Query {} returned no result: {}", query, e)))?;
        let found: FoundRefs = serde_json::from_str(&json_str)?;

        self.next_ref.fetch_max(found.next, Ordering::SeqCst);
        Ok(found.refs.into_iter().map(ElementRef::new).collect())
    }

    fn is_visible(&self, element: &ElementRef) -> Result<bool> {
        self.call_bool(element, IS_VISIBLE_FN)
    }

    fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
        self.call_bool(element, "function() { return !this.disabled; }")
    }

    fn is_checked(&self, element: &ElementRef) -> Result<bool> {
        self.call_bool(element, "function() { return !!this.checked; }")
    }

    fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        self.call_string(element, "function(name) { return this.getAttribute(name); }", vec![json!(name)])
    }

    fn tag_name(&self, element: &ElementRef) -> Result<String> {
        Ok(self
            .call_string(element, "function() { return this.tagName.toLowerCase(); }", Vec::new())?
            .unwrap_or_default())
    }

    fn text(&self, element: &ElementRef) -> Result<String> {
        Ok(self
            .call_string(element, "function() { return (this.innerText || this.textContent || '').trim(); }", Vec::new())?
            .unwrap_or_default())
    }

    fn value(&self, element: &ElementRef) -> Result<String> {
        Ok(self
            .call_string(element, "function() { return this.value == null ? '' : String(this.value); }", Vec::new())?
            .unwrap_or_default())
    }

    fn scroll_into_view(&self, element: &ElementRef) -> Result<()> {
        self.call(element, "function() { this.scrollIntoView({ block: 'center' }); }", Vec::new())?;
        Ok(())
    }

    fn clear(&self, element: &ElementRef) -> Result<()> {
        self.call(
            element,
            "function() { this.focus(); this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }",
            Vec::new(),
        )?;
        Ok(())
    }

    fn type_text(&self, element: &ElementRef, text: &str) -> Result<()> {
        let node = self.node(element)?;
        node.type_into(text)
            .map_err(|e| FillError::WriteRejected(format!("Typing into {} failed: {}", element, e)))?;
        Ok(())
    }

    fn set_value(&self, element: &ElementRef, value: &str) -> Result<()> {
        self.call(element, "function(value) { this.value = value; }", vec![json!(value)])?;
        Ok(())
    }

    fn dispatch_event(&self, element: &ElementRef, event: DomEvent) -> Result<()> {
        let function = if event.is_mouse() {
            "function(kind) { this.dispatchEvent(new MouseEvent(kind, { bubbles: true, cancelable: true, view: window })); }"
        } else {
            "function(kind) { this.dispatchEvent(new Event(kind, { bubbles: true })); }"
        };
        self.call(element, function, vec![json!(event.as_str())])?;
        Ok(())
    }

    fn click(&self, element: &ElementRef) -> Result<()> {
        let node = self.node(element)?;
        node.click()
            .map_err(|e| FillError::ScriptFailed(format!("Click on {} failed: {}", element, e)))?;
        Ok(())
    }

    fn script_click(&self, element: &ElementRef) -> Result<()> {
        self.call(element, "function() { this.click(); }", Vec::new())?;
        Ok(())
    }

    fn pointer_click(&self, element: &ElementRef) -> Result<()> {
        let node = self.node(element)?;
        let point = node
            .get_midpoint()
            .map_err(|e| FillError::ScriptFailed(format!("No midpoint for {}: {}", element, e)))?;
        self.tab
            .move_mouse_to_point(point)
            .map_err(|e| FillError::ScriptFailed(format!("Pointer move to {} failed: {}", element, e)))?;
        self.tab
            .click_point(point)
            .map_err(|e| FillError::ScriptFailed(format!("Pointer click on {} failed: {}", element, e)))?;
        Ok(())
    }

    fn press_key(&self, element: &ElementRef, key: &str) -> Result<()> {
        let node = self.node(element)?;
        node.focus()
            .map_err(|e| FillError::ScriptFailed(format!("Focus on {} failed: {}", element, e)))?;
        self.tab
            .press_key(key)
            .map_err(|e| FillError::ScriptFailed(format!("Key {} on {} failed: {}", key, element, e)))?;
        Ok(())
    }

    fn option_labels(&self, element: &ElementRef) -> Result<Vec<String>> {
        let labels = self.call_string(
            element,
            "function() { return JSON.stringify(Array.from(this.options || []).map(o => o.text.trim()).filter(t => t.length > 0)); }",
            Vec::new(),
        )?;
        match labels {
            Some(json_str) => Ok(serde_json::from_str(&json_str)?),
            None => Ok(Vec::new()),
        }
    }

    fn select_option(&self, element: &ElementRef, label: &str) -> Result<()> {
        match self.call(element, SELECT_OPTION_FN, vec![json!(label)])? {
            Value::Bool(true) => Ok(()),
            _ => Err(FillError::WriteRejected(format!("No option labelled '{}' in {}", label, element))),
        }
    }

    fn selected_option(&self, element: &ElementRef) -> Result<Option<String>> {
        self.call_string(
            element,
            "function() { const o = this.options && this.options[this.selectedIndex]; return o ? o.text.trim() : null; }",
            Vec::new(),
        )
    }

    fn preceding_label(&self, element: &ElementRef) -> Result<Option<String>> {
        Ok(self
            .call_string(element, PRECEDING_LABEL_FN, Vec::new())?
            .filter(|label| !label.is_empty()))
    }

    fn submit_form(&self, form: &ElementRef) -> Result<()> {
        // Call through the prototype: a control named "submit" shadows form.submit
        self.call(form, "function() { HTMLFormElement.prototype.submit.call(this); }", Vec::new())?;
        Ok(())
    }

    fn current_url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    fn page_source(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| FillError::ScriptFailed(format!("Failed to read page source: {}", e)))
    }

    fn title(&self) -> Result<String> {
        self.tab
            .get_title()
            .map_err(|e| FillError::ScriptFailed(format!("Failed to read page title: {}", e)))
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.tab
            .close(true)
            .map_err(|e| FillError::SessionFailure(format!("Failed to close tab: {}", e)))?;
        log::debug!("Browser tab closed");
        Ok(())
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            if let Err(e) = self.close() {
                log::debug!("Ignoring close failure during drop: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_for_ref() {
        assert_eq!(ChromePage::selector_for(&ElementRef::new(7)), "[data-formfill-ref=\"7\"]");
    }

    #[test]
    fn test_find_script_is_a_function_expression() {
        assert!(FIND_SCRIPT.trim_start().starts_with("(function(css, filter, attr, next)"));
        assert!(FIND_SCRIPT.trim_end().ends_with(')'));
    }

    // Integration tests (require Chrome to be installed)
    #[test]
    #[ignore] // run with: cargo test -- --ignored
    fn test_launch_browser() {
        let page = ChromePage::launch(&LaunchOptions::new().headless(true));
        assert!(page.is_ok());
    }

    #[test]
    #[ignore]
    fn test_stamped_refs_survive_requery() {
        let page = ChromePage::launch(&LaunchOptions::new().headless(true)).expect("Failed to launch browser");
        page.navigate("data:text/html,<input name='a'><input name='b'>").expect("Failed to navigate");

        let first = page.find(&Query::tag("input")).expect("find");
        let second = page.find(&Query::tag("input")).expect("find again");
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    #[ignore]
    fn test_refs_go_stale_after_navigation() {
        let page = ChromePage::launch(&LaunchOptions::new().headless(true)).expect("Failed to launch browser");
        page.navigate("data:text/html,<input name='a'>").expect("Failed to navigate");
        let old = page.find(&Query::tag("input")).expect("find");

        page.navigate("data:text/html,<input name='b'>").expect("Failed to navigate");
        let err = page.value(&old[0]).expect_err("reference should be stale");
        assert!(err.is_stale());

        let fresh = page.find(&Query::tag("input")).expect("find");
        assert_ne!(old[0], fresh[0]);
    }
}
