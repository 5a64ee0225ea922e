//! Domain Proxy Integration Tests
//!
//! End-to-end controller ticks against the in-memory store, with the SAS
//! side simulated by mutating the stored CBSDs between ticks.
//!
//! ## Test Categories
//!
//! - `registration`: registration, deregistration and deletion flows
//! - `grants`: spectrum inquiry, grant selection and heartbeats
//! - `lifecycle`: relinquishment, inactivity and idle grant cleanup
//! - `property`: property-based tests over whole ticks

pub mod common;
pub mod grants;
pub mod lifecycle;

// Re-export common test utilities
pub use common::*;
