//! Element references and element predicates
//!
//! This module provides the vocabulary the form logic uses to talk about
//! elements without holding on to live DOM nodes:
//! - ElementRef: opaque, session-scoped handle to a node
//! - ElementSnapshot: static view of an element's tag, attributes and text
//! - Query: pure predicate over snapshots, renderable to CSS for a live page

pub mod element;
pub mod query;

pub use element::{ElementRef, ElementSnapshot, effective_type};
pub use query::{AttrFilter, AttrOp, Query, TextFilter, TextScope};
