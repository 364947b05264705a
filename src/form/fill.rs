//! Fill techniques and the chain that tries them in order

use crate::browser::{BrowserControl, DomEvent};
use crate::config::{Timing, pause};
use crate::dom::ElementRef;
use crate::error::{FillError, Result};
use rand::Rng;
use std::time::Duration;

/// One way of writing a value into an element
pub trait FillTechnique {
    fn name(&self) -> &'static str;

    /// Write `value`; returning `Ok` means the technique is accepted
    fn attempt(&self, page: &dyn BrowserControl, element: &ElementRef, value: &str, timing: &Timing) -> Result<()>;
}

/// Clear, type natively, then read the value back
#[derive(Default)]
pub struct NativeTyping;

impl FillTechnique for NativeTyping {
    fn name(&self) -> &'static str {
        "native_typing"
    }

    fn attempt(&self, page: &dyn BrowserControl, element: &ElementRef, value: &str, timing: &Timing) -> Result<()> {
        page.clear(element)?;
        page.type_text(element, value)?;
        pause(timing.fill_settle);

        let actual = page.value(element)?;
        if actual != value {
            return Err(FillError::WriteRejected(format!(
                "{} holds '{}' after typing '{}'",
                element, actual, value
            )));
        }
        Ok(())
    }
}

/// Assign the value from script and announce it with input and change events
#[derive(Default)]
pub struct ScriptedAssignment;

impl FillTechnique for ScriptedAssignment {
    fn name(&self) -> &'static str {
        "scripted_assignment"
    }

    fn attempt(&self, page: &dyn BrowserControl, element: &ElementRef, value: &str, _timing: &Timing) -> Result<()> {
        page.set_value(element, value)?;
        page.dispatch_event(element, DomEvent::Input)?;
        page.dispatch_event(element, DomEvent::Change)?;
        Ok(())
    }
}

/// Click, clear, then type one character at a time with a jittered delay
#[derive(Default)]
pub struct KeystrokeEmulation;

impl KeystrokeEmulation {
    fn keystroke_delay(timing: &Timing) -> Duration {
        let jitter_ms = timing.keystroke_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return timing.keystroke_delay;
        }
        timing.keystroke_delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

impl FillTechnique for KeystrokeEmulation {
    fn name(&self) -> &'static str {
        "keystroke_emulation"
    }

    fn attempt(&self, page: &dyn BrowserControl, element: &ElementRef, value: &str, timing: &Timing) -> Result<()> {
        page.click(element)?;
        page.clear(element)?;
        let mut buffer = [0u8; 4];
        for ch in value.chars() {
            page.type_text(element, ch.encode_utf8(&mut buffer))?;
            pause(Self::keystroke_delay(timing));
        }
        Ok(())
    }
}

/// Result of running a [`FillChain`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillOutcome {
    /// Name of the accepted technique
    pub technique: Option<&'static str>,

    /// Technique name and error of every failed attempt, in order
    pub failures: Vec<(&'static str, String)>,

    /// The element went stale; the caller must re-acquire it before writing again
    pub stale: bool,
}

impl FillOutcome {
    pub fn succeeded(&self) -> bool {
        self.technique.is_some()
    }
}

/// Ordered fill techniques; the first that succeeds wins and none is retried
pub struct FillChain {
    techniques: Vec<Box<dyn FillTechnique>>,
}

impl Default for FillChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl FillChain {
    pub fn new(techniques: Vec<Box<dyn FillTechnique>>) -> Self {
        Self { techniques }
    }

    /// Native typing, then scripted assignment, then keystroke emulation
    pub fn standard() -> Self {
        Self::new(vec![Box::new(NativeTyping), Box::new(ScriptedAssignment), Box::new(KeystrokeEmulation)])
    }

    pub fn technique_names(&self) -> Vec<&'static str> {
        self.techniques.iter().map(|t| t.name()).collect()
    }

    /// Write `value` into `element`, never raising past the chain
    pub fn write(&self, page: &dyn BrowserControl, element: &ElementRef, value: &str, timing: &Timing) -> FillOutcome {
        let mut outcome = FillOutcome::default();

        for technique in &self.techniques {
            match technique.attempt(page, element, value, timing) {
                Ok(()) => {
                    log::debug!("Filled {} using {}", element, technique.name());
                    outcome.technique = Some(technique.name());
                    return outcome;
                }
                Err(e) => {
                    log::debug!("{} failed on {}: {}", technique.name(), element, e);
                    let stale = e.is_stale();
                    outcome.failures.push((technique.name(), e.to_string()));
                    if stale {
                        // Every further technique would hit the same detached node
                        outcome.stale = true;
                        break;
                    }
                }
            }
        }

        outcome
    }
}
