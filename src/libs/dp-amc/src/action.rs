//! Controller actions
//!
//! Actions are plain values produced by the decision core and executed
//! later against an `AmcManager`, usually inside one transaction per tick.

use dp_dbi::{AmcManager, CbsdField, DbCbsd, DbGrant, DbRequest, DbiResult, FieldMask};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Queue a SAS request
    Request(DbRequest),
    /// Write the masked columns of `data`
    Update { data: DbCbsd, mask: FieldMask },
    /// Remove the CBSD row
    Delete { id: i64 },
    /// Remove a grant
    DeleteGrant(DbGrant),
}

impl Action {
    pub fn execute(&self, manager: &mut dyn AmcManager) -> DbiResult<()> {
        match self {
            Action::Request(request) => manager.create_request(request),
            Action::Update { data, mask } => manager.update_cbsd(data, mask),
            Action::Delete { id } => manager.delete_cbsd(*id),
            Action::DeleteGrant(grant) => manager.delete_grant(grant),
        }
    }

    pub fn ack_deregistration(id: i64) -> Self {
        Action::Update {
            data: DbCbsd {
                id,
                should_deregister: false,
                ..Default::default()
            },
            mask: FieldMask::include([CbsdField::ShouldDeregister]),
        }
    }

    pub fn ack_relinquishment(id: i64) -> Self {
        Action::Update {
            data: DbCbsd {
                id,
                should_relinquish: false,
                ..Default::default()
            },
            mask: FieldMask::include([CbsdField::ShouldRelinquish]),
        }
    }

    pub fn store_available_frequencies(id: i64, frequencies: Vec<u32>) -> Self {
        Action::Update {
            data: DbCbsd {
                id,
                available_frequencies: frequencies,
                ..Default::default()
            },
            mask: FieldMask::include([CbsdField::AvailableFrequencies]),
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self, Action::Request(_))
    }
}

impl From<DbRequest> for Action {
    fn from(request: DbRequest) -> Self {
        Action::Request(request)
    }
}
