//! Composite forms.
//!
//! See [`CompositeFormConfig`] for declaring one and [`CompositeForm`] for binding,
//! validating and saving it.

pub use vitrine_forms::*;
