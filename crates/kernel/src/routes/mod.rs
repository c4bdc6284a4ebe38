//! HTTP route handlers.

pub mod content;
pub mod health;
pub mod helpers;
pub mod not_found;
pub mod uploads;
