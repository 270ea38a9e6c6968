//! This crate extends the Pluggable AI library with a plugin used to standardize testing the library itself.
//! 
//! It also re-exports the mock host services from `pluggable_ai_core::testing`, 
//! so app-level tests only need this one crate.

mod helpers;
mod plugin;

pub use helpers::*;
pub use plugin::AiTestPlugin;
pub use pluggable_ai_core::testing::*;
