//! Common test utilities
//!
//! - CBSD and grant builders with realistic defaults
//! - Test context owning the store, the generator and a manual clock

pub mod context;

pub use cbsd::*;
pub use context::*;
