//! Theme engine and template rendering.
//!
//! Provides Tera-based template rendering with per-content-type template
//! suggestion resolution.

mod engine;

pub use engine::{SharedThemeEngine, ThemeEngine};
