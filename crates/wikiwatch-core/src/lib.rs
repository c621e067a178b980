//! Shared types for wikiwatch: errors, settings and the component model.

pub mod components;
pub mod error;
pub mod settings;

pub use components::{ComponentName, ComponentSet};
pub use error::{Result, WikiwatchError};
