//! In-memory page for exercising form logic without a browser
//!
//! Elements live in a flat list in document order; an [`ElementRef`] is the
//! element's position in that list. Detached elements keep their slot so that
//! old references go stale instead of aliasing new nodes.

use crate::browser::{BrowserControl, DomEvent, ReadyState};
use crate::dom::{ElementRef, ElementSnapshot, Query, effective_type};
use crate::error::{FillError, Result};
use indexmap::IndexMap;
use std::cell::RefCell;

/// A class of interaction a [`FakeElement`] can be told to reject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Native clear-and-type input
    NativeInput,
    /// Script value assignment and form submission
    Script,
    NativeClick,
    ScriptClick,
    PointerClick,
    /// Synthetic event dispatch
    Events,
    /// Key presses
    Keys,
    /// Option selection on a `<select>`
    Select,
}

/// What happens to the page when an element is activated
///
/// Activation is a click of any kind, an Enter key press on a button, or a
/// native submission of a form.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickEffect {
    /// The activated element disappears
    RemoveSelf,
    /// The page moves to another URL; every current element is detached
    Navigate(String),
    SetTitle(String),
    /// A visible message element is appended
    ShowMessage(String),
    /// Every `<form>` element is detached
    RemoveForms,
}

/// One element of a [`FakePage`]
#[derive(Debug, Clone)]
pub struct FakeElement {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub text: String,
    pub value: String,
    pub checked: bool,
    pub visible: bool,
    pub enabled: bool,
    /// `(label, value)` pairs of a `<select>`
    pub options: Vec<(String, String)>,
    pub selected: Option<usize>,
    pub preceding_label: Option<String>,
    failing: Vec<Interaction>,
    ignores_typing: bool,
    rerenders_on_write: bool,
    effects: Vec<ClickEffect>,
    attached: bool,
}

impl FakeElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: IndexMap::new(),
            text: String::new(),
            value: String::new(),
            checked: false,
            visible: true,
            enabled: true,
            options: Vec::new(),
            selected: None,
            preceding_label: None,
            failing: Vec::new(),
            ignores_typing: false,
            rerenders_on_write: false,
            effects: Vec::new(),
            attached: true,
        }
    }

    /// `<input type="...">`
    pub fn input(input_type: &str) -> Self {
        Self::new("input").attr("type", input_type)
    }

    pub fn textarea() -> Self {
        Self::new("textarea")
    }

    /// `<select>` whose options use their label as value; the first option starts selected
    pub fn select(labels: &[&str]) -> Self {
        let mut element = Self::new("select");
        element.options = labels.iter().map(|l| (l.to_string(), l.to_string())).collect();
        element.selected = (!element.options.is_empty()).then_some(0);
        element
    }

    /// Insert an empty-valued prompt option ("Choose one...") at the top and select it
    pub fn with_prompt_option(mut self, label: &str) -> Self {
        self.options.insert(0, (label.to_string(), String::new()));
        self.selected = Some(0);
        self
    }

    pub fn checkbox() -> Self {
        Self::input("checkbox")
    }

    /// Typeless `<button>`, which browsers treat as a submit button
    pub fn button(text: &str) -> Self {
        Self::new("button").with_text(text)
    }

    pub fn form() -> Self {
        Self::new("form")
    }

    /// `<label for="...">`
    pub fn label(for_id: &str, text: &str) -> Self {
        Self::new("label").attr("for", for_id).with_text(text)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn name(self, name: &str) -> Self {
        self.attr("name", name)
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn placeholder(self, placeholder: &str) -> Self {
        self.attr("placeholder", placeholder)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn required(self) -> Self {
        self.attr("required", "")
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Sibling `<label>` text found by walking backwards from the element
    pub fn after_label(mut self, text: &str) -> Self {
        self.preceding_label = Some(text.to_string());
        self
    }

    /// Reject every interaction of the given class with an error
    pub fn failing(mut self, interaction: Interaction) -> Self {
        self.failing.push(interaction);
        self
    }

    /// Accept native typing without changing the value, like a framework-controlled input
    pub fn ignoring_typing(mut self) -> Self {
        self.ignores_typing = true;
        self
    }

    /// Replace the node with a fresh copy on the first value write, which then fails as stale
    pub fn rerendering_on_write(mut self) -> Self {
        self.rerenders_on_write = true;
        self
    }

    pub fn on_activate(mut self, effect: ClickEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn snapshot(&self) -> ElementSnapshot {
        ElementSnapshot {
            tag_name: self.tag.clone(),
            attributes: self.attributes.clone(),
            own_text: self.text.clone(),
            rendered_text: self.text.clone(),
        }
    }

    fn is_checkbox(&self) -> bool {
        self.tag == "input" && self.attributes.get("type").is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
    }

    fn is_button_like(&self) -> bool {
        match self.tag.as_str() {
            "button" => true,
            "input" => matches!(
                effective_type(&self.tag, self.attributes.get("type").map(String::as_str)).as_deref(),
                Some("submit" | "button")
            ),
            _ => false,
        }
    }

    fn reject_if_failing(&self, interaction: Interaction, element: &ElementRef) -> Result<()> {
        if !self.failing.contains(&interaction) {
            return Ok(());
        }
        let message = format!("{:?} rejected by {}", interaction, element);
        Err(match interaction {
            Interaction::NativeInput | Interaction::Select => FillError::WriteRejected(message),
            _ => FillError::ScriptFailed(message),
        })
    }

    fn render(&self) -> String {
        let attrs: String = self.attributes.iter().map(|(k, v)| format!(" {}=\"{}\"", k, v)).collect();
        format!("<{tag}{attrs}>{text}</{tag}>", tag = self.tag, attrs = attrs, text = self.text)
    }
}

struct FakeState {
    url: String,
    title: String,
    ready: ReadyState,
    elements: Vec<FakeElement>,
    journal: Vec<String>,
    closed: bool,
}

/// Deterministic in-memory [`BrowserControl`]
///
/// Every operation is recorded in a journal (`"<op> ref#N"`) so tests can
/// assert which techniques ran and in which order.
pub struct FakePage {
    state: RefCell<FakeState>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        Self {
            state: RefCell::new(FakeState {
                url: url.to_string(),
                title: String::new(),
                ready: ReadyState::Complete,
                elements: Vec::new(),
                journal: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Builder method: page title
    pub fn with_title(self, title: &str) -> Self {
        self.state.borrow_mut().title = title.to_string();
        self
    }

    /// Builder method: append an element
    pub fn with(self, element: FakeElement) -> Self {
        self.add(element);
        self
    }

    /// Append an element and return its reference
    pub fn add(&self, element: FakeElement) -> ElementRef {
        let mut state = self.state.borrow_mut();
        state.elements.push(element);
        ElementRef::new((state.elements.len() - 1) as u64)
    }

    pub fn set_ready_state(&self, ready: ReadyState) {
        self.state.borrow_mut().ready = ready;
    }

    /// Detach an element, as a re-render would
    pub fn detach(&self, element: &ElementRef) {
        if let Some(found) = self.state.borrow_mut().elements.get_mut(element.id() as usize) {
            found.attached = false;
        }
    }

    /// Every recorded operation, oldest first
    pub fn journal(&self) -> Vec<String> {
        self.state.borrow().journal.clone()
    }

    /// Recorded operations whose name is `op`
    pub fn calls(&self, op: &str) -> usize {
        let prefix = format!("{} ", op);
        self.state.borrow().journal.iter().filter(|entry| entry.starts_with(&prefix)).count()
    }

    /// Copy of the element behind a reference, attached or not
    pub fn element(&self, element: &ElementRef) -> Option<FakeElement> {
        self.state.borrow().elements.get(element.id() as usize).cloned()
    }

    /// First attached element with the given `name` attribute
    pub fn by_name(&self, name: &str) -> Option<FakeElement> {
        self.state
            .borrow()
            .elements
            .iter()
            .find(|e| e.attached && e.attributes.get("name").is_some_and(|n| n == name))
            .cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    fn record(state: &mut FakeState, op: &str, element: &ElementRef) {
        state.journal.push(format!("{} {}", op, element));
    }

    fn read<T>(&self, op: &str, element: &ElementRef, f: impl FnOnce(&FakeElement) -> Result<T>) -> Result<T> {
        self.write(op, element, |found| f(found))
    }

    fn write<T>(&self, op: &str, element: &ElementRef, f: impl FnOnce(&mut FakeElement) -> Result<T>) -> Result<T> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(FillError::SessionFailure("Page is closed".into()));
        }
        Self::record(&mut state, op, element);
        match state.elements.get_mut(element.id() as usize) {
            Some(found) if found.attached => f(found),
            _ => Err(FillError::StaleElement(format!("{} is no longer attached", element))),
        }
    }

    /// Detach a re-rendering element, append its fresh copy, and report the old handle as stale
    fn rerender_if_needed(&self, element: &ElementRef) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let index = element.id() as usize;
        let Some(found) = state.elements.get_mut(index) else {
            return Ok(());
        };
        if !found.rerenders_on_write {
            return Ok(());
        }
        found.attached = false;
        let mut fresh = found.clone();
        fresh.rerenders_on_write = false;
        fresh.attached = true;
        fresh.value.clear();
        state.elements.push(fresh);
        Err(FillError::StaleElement(format!("{} was re-rendered", element)))
    }

    /// Toggle checkboxes and fire the element's effects
    fn activate(&self, element: &ElementRef) {
        let mut state = self.state.borrow_mut();
        let index = element.id() as usize;
        let Some(found) = state.elements.get_mut(index) else {
            return;
        };
        if found.is_checkbox() {
            found.checked = !found.checked;
        }
        let effects = found.effects.clone();
        for effect in effects {
            match effect {
                ClickEffect::RemoveSelf => state.elements[index].attached = false,
                ClickEffect::Navigate(url) => {
                    state.url = url;
                    state.elements.iter_mut().for_each(|e| e.attached = false);
                }
                ClickEffect::SetTitle(title) => state.title = title,
                ClickEffect::ShowMessage(text) => state.elements.push(FakeElement::new("div").with_text(&text)),
                ClickEffect::RemoveForms => state
                    .elements
                    .iter_mut()
                    .filter(|e| e.tag == "form")
                    .for_each(|e| e.attached = false),
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state.borrow().closed {
            return Err(FillError::SessionFailure("Page is closed".into()));
        }
        Ok(())
    }
}

impl BrowserControl for FakePage {
    fn navigate(&self, url: &str) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.state.borrow_mut();
        state.journal.push(format!("navigate {}", url));
        state.url = url.to_string();
        Ok(())
    }

    fn ready_state(&self) -> Result<ReadyState> {
        self.ensure_open()?;
        Ok(self.state.borrow().ready)
    }

    fn find(&self, query: &Query) -> Result<Vec<ElementRef>> {
        self.ensure_open()?;
        let state = self.state.borrow();
        Ok(state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.attached && query.matches(&e.snapshot()))
            .map(|(i, _)| ElementRef::new(i as u64))
            .collect())
    }

    fn is_visible(&self, element: &ElementRef) -> Result<bool> {
        self.read("is_visible", element, |e| Ok(e.visible))
    }

    fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
        self.read("is_enabled", element, |e| Ok(e.enabled))
    }

    fn is_checked(&self, element: &ElementRef) -> Result<bool> {
        self.read("is_checked", element, |e| Ok(e.checked))
    }

    fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        self.read("attribute", element, |e| Ok(e.attributes.get(name).cloned()))
    }

    fn tag_name(&self, element: &ElementRef) -> Result<String> {
        self.read("tag_name", element, |e| Ok(e.tag.clone()))
    }

    fn text(&self, element: &ElementRef) -> Result<String> {
        self.read("text", element, |e| Ok(e.text.trim().to_string()))
    }

    fn value(&self, element: &ElementRef) -> Result<String> {
        self.read("value", element, |e| {
            if e.tag == "select" {
                return Ok(e.selected.and_then(|i| e.options.get(i)).map(|(_, v)| v.clone()).unwrap_or_default());
            }
            Ok(e.value.clone())
        })
    }

    fn scroll_into_view(&self, element: &ElementRef) -> Result<()> {
        self.read("scroll", element, |_| Ok(()))
    }

    fn clear(&self, element: &ElementRef) -> Result<()> {
        self.write("clear", element, |e| {
            e.value.clear();
            Ok(())
        })
    }

    fn type_text(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.read("type", element, |e| e.reject_if_failing(Interaction::NativeInput, element))?;
        self.rerender_if_needed(element)?;
        self.write("typed", element, |e| {
            if !e.ignores_typing && e.enabled {
                e.value.push_str(text);
            }
            Ok(())
        })
    }

    fn set_value(&self, element: &ElementRef, value: &str) -> Result<()> {
        self.read("set_value", element, |e| e.reject_if_failing(Interaction::Script, element))?;
        self.rerender_if_needed(element)?;
        self.write("assigned", element, |e| {
            e.value = value.to_string();
            Ok(())
        })
    }

    fn dispatch_event(&self, element: &ElementRef, event: DomEvent) -> Result<()> {
        self.read(&format!("dispatch:{}", event.as_str()), element, |e| {
            e.reject_if_failing(Interaction::Events, element)
        })?;
        if event == DomEvent::Click {
            self.activate(element);
        }
        Ok(())
    }

    fn click(&self, element: &ElementRef) -> Result<()> {
        self.read("click", element, |e| {
            e.reject_if_failing(Interaction::NativeClick, element)?;
            if !e.visible {
                return Err(FillError::ScriptFailed(format!("{} is not interactable", element)));
            }
            Ok(())
        })?;
        self.activate(element);
        Ok(())
    }

    fn script_click(&self, element: &ElementRef) -> Result<()> {
        self.read("script_click", element, |e| e.reject_if_failing(Interaction::ScriptClick, element))?;
        self.activate(element);
        Ok(())
    }

    fn pointer_click(&self, element: &ElementRef) -> Result<()> {
        self.read("pointer_click", element, |e| {
            e.reject_if_failing(Interaction::PointerClick, element)?;
            if !e.visible {
                return Err(FillError::ScriptFailed(format!("{} has no box to point at", element)));
            }
            Ok(())
        })?;
        self.activate(element);
        Ok(())
    }

    fn press_key(&self, element: &ElementRef, key: &str) -> Result<()> {
        let activates = self.read(&format!("key:{}", key), element, |e| {
            e.reject_if_failing(Interaction::Keys, element)?;
            Ok(key == "Enter" && e.is_button_like())
        })?;
        if activates {
            self.activate(element);
        }
        Ok(())
    }

    fn option_labels(&self, element: &ElementRef) -> Result<Vec<String>> {
        self.read("option_labels", element, |e| {
            Ok(e.options
                .iter()
                .map(|(label, _)| label.trim().to_string())
                .filter(|label| !label.is_empty())
                .collect())
        })
    }

    fn select_option(&self, element: &ElementRef, label: &str) -> Result<()> {
        self.write("select", element, |e| {
            e.reject_if_failing(Interaction::Select, element)?;
            match e.options.iter().position(|(l, _)| l.trim() == label) {
                Some(index) => {
                    e.selected = Some(index);
                    Ok(())
                }
                None => Err(FillError::WriteRejected(format!("No option labelled '{}' in {}", label, element))),
            }
        })
    }

    fn selected_option(&self, element: &ElementRef) -> Result<Option<String>> {
        self.read("selected_option", element, |e| {
            Ok(e.selected.and_then(|i| e.options.get(i)).map(|(label, _)| label.trim().to_string()))
        })
    }

    fn preceding_label(&self, element: &ElementRef) -> Result<Option<String>> {
        self.read("preceding_label", element, |e| Ok(e.preceding_label.clone()))
    }

    fn submit_form(&self, form: &ElementRef) -> Result<()> {
        self.read("submit_form", form, |e| {
            e.reject_if_failing(Interaction::Script, form)?;
            if e.tag != "form" {
                return Err(FillError::ScriptFailed(format!("{} is not a form", form)));
            }
            Ok(())
        })?;
        self.activate(form);
        Ok(())
    }

    fn current_url(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.state.borrow().url.clone())
    }

    fn page_source(&self) -> Result<String> {
        self.ensure_open()?;
        let state = self.state.borrow();
        let body: String = state.elements.iter().filter(|e| e.attached).map(FakeElement::render).collect();
        Ok(format!("<html><head><title>{}</title></head><body>{}</body></html>", state.title, body))
    }

    fn title(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.state.borrow().title.clone())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.closed = true;
        state.journal.push("close".to_string());
        Ok(())
    }
}
