//! Partial-update descriptors for CBSD rows

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::types::DbCbsd;

/// Writable CBSD column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CbsdField {
    CbsdId,
    LastSeen,
    IsDeleted,
    ShouldDeregister,
    ShouldRelinquish,
    Channels,
    AvailableFrequencies,
}

impl CbsdField {
    /// Column name, identical to the serialized `DbCbsd` field name
    pub fn column(&self) -> &'static str {
        match self {
            CbsdField::CbsdId => "cbsd_id",
            CbsdField::LastSeen => "last_seen",
            CbsdField::IsDeleted => "is_deleted",
            CbsdField::ShouldDeregister => "should_deregister",
            CbsdField::ShouldRelinquish => "should_relinquish",
            CbsdField::Channels => "channels",
            CbsdField::AvailableFrequencies => "available_frequencies",
        }
    }

    /// Copy this column from `src` into `dst`
    pub fn copy(&self, src: &DbCbsd, dst: &mut DbCbsd) {
        match self {
            CbsdField::CbsdId => dst.cbsd_id = src.cbsd_id.clone(),
            CbsdField::LastSeen => dst.last_seen = src.last_seen,
            CbsdField::IsDeleted => dst.is_deleted = src.is_deleted,
            CbsdField::ShouldDeregister => dst.should_deregister = src.should_deregister,
            CbsdField::ShouldRelinquish => dst.should_relinquish = src.should_relinquish,
            CbsdField::Channels => dst.channels = src.channels.clone(),
            CbsdField::AvailableFrequencies => {
                dst.available_frequencies = src.available_frequencies.clone()
            }
        }
    }
}

impl fmt::Display for CbsdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Set of columns an update is allowed to write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMask(BTreeSet<CbsdField>);

impl FieldMask {
    pub fn include<I: IntoIterator<Item = CbsdField>>(fields: I) -> Self {
        FieldMask(fields.into_iter().collect())
    }

    pub fn contains(&self, field: CbsdField) -> bool {
        self.0.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = CbsdField> + '_ {
        self.0.iter().copied()
    }

    /// Write the masked columns of `src` into `dst`, leaving the rest untouched
    pub fn apply(&self, src: &DbCbsd, dst: &mut DbCbsd) {
        for field in self.iter() {
            field.copy(src, dst);
        }
    }
}
