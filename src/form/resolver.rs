use crate::browser::BrowserControl;
use crate::config::{Timing, pause, poll_until};
use crate::dom::ElementRef;
use crate::form::fields::{KnownValues, NOT_AVAILABLE, SemanticField, Strategy};
use crate::form::fill::FillChain;
use crate::report::PassLog;

/// Places known values into the fields they belong to
///
/// Each field's strategies are tried in priority order. The first strategy
/// that yields a visible, enabled element decides the field: its element is
/// written through the [`FillChain`] and no later strategy is consulted,
/// whether or not the write succeeds. An element written for one field is
/// never offered to a later one.
pub struct FieldResolver<'a> {
    page: &'a dyn BrowserControl,
    timing: &'a Timing,
    chain: FillChain,
}

impl<'a> FieldResolver<'a> {
    pub fn new(page: &'a dyn BrowserControl, timing: &'a Timing) -> Self {
        Self { page, timing, chain: FillChain::standard() }
    }

    /// Builder method: use a different fill chain
    pub fn with_chain(mut self, chain: FillChain) -> Self {
        self.chain = chain;
        self
    }

    /// Resolve every known value whose key names a semantic field
    ///
    /// Returns the names of the filled fields in the order of `known`.
    pub fn resolve_all(&self, known: &KnownValues, log: &mut PassLog) -> Vec<String> {
        let mut filled = Vec::new();
        let mut claimed: Vec<ElementRef> = Vec::new();
        for (key, value) in known {
            let Some(field) = SemanticField::from_key(key) else {
                log::debug!("No field strategies for '{}', skipping", key);
                continue;
            };
            let Some(text) = value.fill_text() else {
                log::debug!("No value for {}, skipping", field);
                continue;
            };
            if let Some(element) = self.resolve_unclaimed(field, &text, &claimed, log) {
                claimed.push(element);
                filled.push(field.as_str().to_string());
            }
        }
        filled
    }

    /// Locate `field` and write `value` into it; `false` when nothing was written
    ///
    /// Blank values ("", "N/A") are skipped without touching the page.
    pub fn resolve(&self, field: SemanticField, value: &str, log: &mut PassLog) -> bool {
        self.resolve_unclaimed(field, value, &[], log).is_some()
    }

    /// Like [`resolve`](Self::resolve), ignoring elements in `claimed`; returns the written element
    fn resolve_unclaimed(
        &self,
        field: SemanticField,
        value: &str,
        claimed: &[ElementRef],
        log: &mut PassLog,
    ) -> Option<ElementRef> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(NOT_AVAILABLE) {
            return None;
        }

        for strategy in field.strategies() {
            let Some(element) = self.locate(strategy, claimed) else {
                continue;
            };

            log::debug!("{} matched {} via {}", field, element, strategy);
            if let Err(e) = self.page.scroll_into_view(&element) {
                log::debug!("Could not scroll {} into view: {}", element, e);
            }
            pause(self.timing.scroll_settle);

            let outcome = self.chain.write(self.page, &element, value, self.timing);
            return match outcome.technique {
                Some(technique) => {
                    log.ok(format!("Filled {} ({})", field, technique));
                    Some(element)
                }
                None => {
                    let reasons: Vec<String> = outcome.failures.iter().map(|(t, e)| format!("{}: {}", t, e)).collect();
                    log.warn(format!("Could not fill {}: {}", field, reasons.join("; ")));
                    None
                }
            };
        }

        log.warn(format!("Could not find field for {}", field));
        None
    }

    /// Poll until the strategy yields an interactable element or the wait runs out
    fn locate(&self, strategy: &Strategy, claimed: &[ElementRef]) -> Option<ElementRef> {
        let queries = strategy.queries();
        poll_until(self.timing.element_wait, self.timing.poll_interval, || {
            let mut candidates: Vec<ElementRef> = Vec::new();
            for query in &queries {
                match self.page.find(query) {
                    Ok(found) => {
                        for element in found {
                            if !candidates.contains(&element) {
                                candidates.push(element);
                            }
                        }
                    }
                    Err(e) => log::debug!("Query {} failed: {}", query, e),
                }
            }
            if strategy.first_only() {
                candidates.truncate(1);
            }
            candidates
                .into_iter()
                .find(|element| !claimed.contains(element) && self.page.is_interactable(element))
        })
    }
}
