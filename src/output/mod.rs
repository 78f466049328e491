//! Output abstraction layer that routes to rich, plain, or JSON output.

pub mod components;
pub mod context;
pub mod theme;

pub use components::*;
pub use context::{OutputContext, OutputMode};
pub use theme::Theme;
