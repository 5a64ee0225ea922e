//! Storage capabilities consumed by the active mode controller

use crate::field_mask::FieldMask;
use crate::mongoc::DbiResult;
use crate::types::{DbCbsd, DbGrant, DbRequest, DetailedCbsd};

/// Narrow storage interface used while executing a controller tick
pub trait AmcManager {
    /// Load every feasible CBSD with its grants
    ///
    /// A CBSD is feasible when it has no pending request and either
    /// carries a pending administrative action or is fully parameterised
    /// for registration.
    fn get_state(&mut self) -> DbiResult<Vec<DetailedCbsd>>;

    /// Queue a SAS request
    fn create_request(&mut self, request: &DbRequest) -> DbiResult<()>;

    fn delete_cbsd(&mut self, id: i64) -> DbiResult<()>;

    /// Write the columns of `cbsd` selected by `mask` to the row with `cbsd.id`
    fn update_cbsd(&mut self, cbsd: &DbCbsd, mask: &FieldMask) -> DbiResult<()>;

    fn delete_grant(&mut self, grant: &DbGrant) -> DbiResult<()>;
}

/// Store able to run a batch of manager calls atomically
pub trait Transactional {
    /// Run `f` in one transaction: its writes are kept only if it returns `Ok`
    fn in_transaction<T, F>(&mut self, f: F) -> DbiResult<T>
    where
        F: FnOnce(&mut dyn AmcManager) -> DbiResult<T>;
}
