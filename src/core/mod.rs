//! Core module - states, events, and fundamental systems.
//!
//! This module provides the foundation that all other plugins build upon.

mod events;
mod plugin;
mod states;

pub use events::*;
pub use plugin::CorePlugin;
pub use states::*;
