//! Domain Proxy Database Interface Library
//!
//! Storage model for CBSD radios, grants and pending SAS requests, the
//! narrow capabilities the active mode controller runs against, and the
//! in-memory and MongoDB implementations of those capabilities.

pub mod types;
pub mod field_mask;
pub mod manager;
pub mod memory;
pub mod mongoc;


// Re-export the mongodb crate for consumers that need direct collection access
pub use mongodb;

// Re-export commonly used types
pub use types::*;
pub use field_mask::{CbsdField, FieldMask};
pub use manager::{AmcManager, Transactional};
pub use memory::MemoryStore;
pub use mongoc::{DbiError, DbiResult, MongoStore};
