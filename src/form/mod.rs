//! Placing values into an unknown application form
//!
//! - [`FieldResolver`]: known resume values into the fields they belong to
//! - [`FillChain`]: ordered fallback techniques for one write
//! - [`FieldDetector`]: empty controls left over after resolution
//! - [`UserValueFiller`]: externally supplied values for the detected fields
//! - [`scan_validation_messages`]: visible error messages, for the report

pub mod detect;
pub mod fields;
pub mod fill;
pub mod resolver;
pub mod user_values;
pub mod validation;

pub use detect::{FieldDetector, FieldKind, UnfilledField};
pub use fields::{FIELD_SPECS, FieldSpec, FieldValue, KnownValues, NOT_AVAILABLE, SemanticField, Strategy};
pub use fill::{FillChain, FillOutcome, FillTechnique, KeystrokeEmulation, NativeTyping, ScriptedAssignment};
pub use resolver::FieldResolver;
pub use user_values::{UserSuppliedValue, UserValue, UserValueFiller, UserValues};
pub use validation::scan_validation_messages;
