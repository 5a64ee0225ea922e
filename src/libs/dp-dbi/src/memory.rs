//! In-memory store
//!
//! Backs snapshot runs and tests. Transactions snapshot the whole store
//! and restore it when the closure fails.

use std::collections::{BTreeMap, HashSet};

use crate::field_mask::FieldMask;
use crate::manager::{AmcManager, Transactional};
use crate::mongoc::{DbiError, DbiResult};
use crate::types::{DbCbsd, DbGrant, DbRequest, DetailedCbsd};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    cbsds: BTreeMap<i64, DetailedCbsd>,
    requests: Vec<DbRequest>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: Vec<DetailedCbsd>) -> Self {
        let mut store = Self::new();
        for cbsd in state {
            store.insert_cbsd(cbsd);
        }
        store
    }

    /// Insert or replace a CBSD, keyed by `cbsd.id`
    pub fn insert_cbsd(&mut self, cbsd: DetailedCbsd) {
        self.cbsds.insert(cbsd.cbsd.id, cbsd);
    }

    pub fn cbsd(&self, id: i64) -> Option<&DetailedCbsd> {
        self.cbsds.get(&id)
    }

    pub fn cbsd_mut(&mut self, id: i64) -> Option<&mut DetailedCbsd> {
        self.cbsds.get_mut(&id)
    }

    pub fn cbsd_count(&self) -> usize {
        self.cbsds.len()
    }

    /// Pending requests in insertion order
    pub fn requests(&self) -> &[DbRequest] {
        &self.requests
    }

    /// Drop all pending requests, as if the SAS-facing side consumed them
    pub fn take_requests(&mut self) -> Vec<DbRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl AmcManager for MemoryStore {
    fn get_state(&mut self) -> DbiResult<Vec<DetailedCbsd>> {
        let pending: HashSet<i64> = self.requests.iter().map(|r| r.cbsd_id).collect();
        let state: Vec<DetailedCbsd> = self
            .cbsds
            .values()
            .filter(|c| c.is_feasible(pending.contains(&c.cbsd.id)))
            .cloned()
            .collect();
        log::debug!(
            "Loaded {} feasible CBSDs out of {}",
            state.len(),
            self.cbsds.len()
        );
        Ok(state)
    }

    fn create_request(&mut self, request: &DbRequest) -> DbiResult<()> {
        if !self.cbsds.contains_key(&request.cbsd_id) {
            return Err(DbiError::CbsdNotFound(request.cbsd_id));
        }
        self.requests.push(request.clone());
        Ok(())
    }

    fn delete_cbsd(&mut self, id: i64) -> DbiResult<()> {
        self.cbsds
            .remove(&id)
            .map(|_| ())
            .ok_or(DbiError::CbsdNotFound(id))
    }

    fn update_cbsd(&mut self, cbsd: &DbCbsd, mask: &FieldMask) -> DbiResult<()> {
        let stored = self
            .cbsds
            .get_mut(&cbsd.id)
            .ok_or(DbiError::CbsdNotFound(cbsd.id))?;
        mask.apply(cbsd, &mut stored.cbsd);
        Ok(())
    }

    fn delete_grant(&mut self, grant: &DbGrant) -> DbiResult<()> {
        let stored = self
            .cbsds
            .get_mut(&grant.cbsd_id)
            .ok_or(DbiError::CbsdNotFound(grant.cbsd_id))?;
        let before = stored.grants.len();
        stored.grants.retain(|g| g.grant.id != grant.id);
        if stored.grants.len() == before {
            return Err(DbiError::GrantNotFound(grant.id));
        }
        Ok(())
    }
}

impl Transactional for MemoryStore {
    fn in_transaction<T, F>(&mut self, f: F) -> DbiResult<T>
    where
        F: FnOnce(&mut dyn AmcManager) -> DbiResult<T>,
    {
        let snapshot = self.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                log::warn!("Transaction rolled back: {e}");
                *self = snapshot;
                Err(e)
            }
        }
    }
}
