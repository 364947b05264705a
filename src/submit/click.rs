//! Click strategies and the chain that tries them in order

use crate::browser::{BrowserControl, DomEvent};
use crate::config::{Timing, pause};
use crate::dom::ElementRef;
use crate::error::Result;

/// One way of activating a control
pub trait ClickStrategy {
    fn name(&self) -> &'static str;

    fn attempt(&self, page: &dyn BrowserControl, element: &ElementRef) -> Result<()>;
}

#[derive(Default)]
pub struct StandardClick;

impl ClickStrategy for StandardClick {
    fn name(&self) -> &'static str {
        "standard_click"
    }

    fn attempt(&self, page: &dyn BrowserControl, element: &ElementRef) -> Result<()> {
        page.click(element)
    }
}

#[derive(Default)]
pub struct ScriptClick;

impl ClickStrategy for ScriptClick {
    fn name(&self) -> &'static str {
        "script_click"
    }

    fn attempt(&self, page: &dyn BrowserControl, element: &ElementRef) -> Result<()> {
        page.script_click(element)
    }
}

/// Move the pointer onto the control and press there
#[derive(Default)]
pub struct PointerClick;

impl ClickStrategy for PointerClick {
    fn name(&self) -> &'static str {
        "pointer_click"
    }

    fn attempt(&self, page: &dyn BrowserControl, element: &ElementRef) -> Result<()> {
        page.pointer_click(element)
    }
}

/// Dispatch mousedown, mouseup and click events from script
#[derive(Default)]
pub struct SyntheticEvents;

impl ClickStrategy for SyntheticEvents {
    fn name(&self) -> &'static str {
        "synthetic_events"
    }

    fn attempt(&self, page: &dyn BrowserControl, element: &ElementRef) -> Result<()> {
        for event in [DomEvent::MouseDown, DomEvent::MouseUp, DomEvent::Click] {
            page.dispatch_event(element, event)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct EnterKey;

impl ClickStrategy for EnterKey {
    fn name(&self) -> &'static str {
        "enter_key"
    }

    fn attempt(&self, page: &dyn BrowserControl, element: &ElementRef) -> Result<()> {
        page.press_key(element, "Enter")
    }
}

/// Result of running a [`ClickChain`] on one control
///
/// An accepted strategy only means some interaction happened, not that the
/// form was submitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickOutcome {
    pub strategy: Option<&'static str>,
    pub failures: Vec<(&'static str, String)>,
}

impl ClickOutcome {
    pub fn clicked(&self) -> bool {
        self.strategy.is_some()
    }
}

pub struct ClickChain {
    strategies: Vec<Box<dyn ClickStrategy>>,
}

impl Default for ClickChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl ClickChain {
    pub fn new(strategies: Vec<Box<dyn ClickStrategy>>) -> Self {
        Self { strategies }
    }

    /// Standard, script, pointer, synthetic events, then Enter
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(StandardClick),
            Box::new(ScriptClick),
            Box::new(PointerClick),
            Box::new(SyntheticEvents),
            Box::new(EnterKey),
        ])
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Try each strategy until one completes, scrolling the control into view first
    pub fn click(&self, page: &dyn BrowserControl, element: &ElementRef, timing: &Timing) -> ClickOutcome {
        let mut outcome = ClickOutcome::default();

        for strategy in &self.strategies {
            if let Err(e) = page.scroll_into_view(element) {
                log::debug!("Could not scroll {} into view: {}", element, e);
            }
            pause(timing.scroll_settle);

            match strategy.attempt(page, element) {
                Ok(()) => {
                    log::debug!("Clicked {} using {}", element, strategy.name());
                    outcome.strategy = Some(strategy.name());
                    return outcome;
                }
                Err(e) => {
                    log::debug!("{} failed on {}: {}", strategy.name(), element, e);
                    outcome.failures.push((strategy.name(), e.to_string()));
                }
            }
        }

        outcome
    }
}
