//! Grant processors producing SAS requests

use std::collections::HashMap;

use dp_dbi::{DbCbsd, DbRequest, DetailedGrant, GrantState};

use crate::eirp::EirpCalculator;
use crate::grants::GrantProcessor;
use crate::sas::{grant_request, heartbeat_request, relinquishment_request};

fn index_by_center(grants: &[DetailedGrant]) -> HashMap<i64, &DetailedGrant> {
    grants
        .iter()
        .map(|g| (g.grant.center_frequency_hz(), g))
        .collect()
}

/// Requests a new grant with the highest EIRP the channels allow
pub struct GrantRequestProcessor<'a> {
    cbsd: &'a DbCbsd,
    calc: EirpCalculator,
}

impl<'a> GrantRequestProcessor<'a> {
    pub fn new(cbsd: &'a DbCbsd) -> Self {
        GrantRequestProcessor {
            cbsd,
            calc: EirpCalculator::new(cbsd),
        }
    }
}

impl GrantProcessor<DbRequest> for GrantRequestProcessor<'_> {
    fn process(&mut self, frequency_hz: i64, bandwidth_hz: i64) -> Option<DbRequest> {
        let low = frequency_hz - bandwidth_hz / 2;
        let high = frequency_hz + bandwidth_hz / 2;
        let max_eirp = self
            .calc
            .calc_upper_bound_for_range(&self.cbsd.channels, low, high);
        Some(grant_request(self.cbsd, low, high, max_eirp))
    }
}

/// Relinquishes a held grant
pub struct RelinquishmentProcessor<'a> {
    cbsd: &'a DbCbsd,
    grants: HashMap<i64, &'a DetailedGrant>,
}

impl<'a> RelinquishmentProcessor<'a> {
    pub fn new(cbsd: &'a DbCbsd, grants: &'a [DetailedGrant]) -> Self {
        RelinquishmentProcessor {
            cbsd,
            grants: index_by_center(grants),
        }
    }
}

impl GrantProcessor<DbRequest> for RelinquishmentProcessor<'_> {
    fn process(&mut self, frequency_hz: i64, _bandwidth_hz: i64) -> Option<DbRequest> {
        let grant = self.grants.get(&frequency_hz)?;
        Some(relinquishment_request(self.cbsd, &grant.grant))
    }
}

/// Keeps a held grant alive
///
/// Unsync grants are relinquished. Granted ones always get a heartbeat,
/// the others only once their interval is due by `next_send_timestamp`.
pub struct HeartbeatProcessor<'a> {
    cbsd: &'a DbCbsd,
    grants: HashMap<i64, &'a DetailedGrant>,
    next_send_timestamp: i64,
}

impl<'a> HeartbeatProcessor<'a> {
    pub fn new(cbsd: &'a DbCbsd, grants: &'a [DetailedGrant], next_send_timestamp: i64) -> Self {
        HeartbeatProcessor {
            cbsd,
            grants: index_by_center(grants),
            next_send_timestamp,
        }
    }
}

fn should_send_now(grant: &DetailedGrant, next_send_timestamp: i64) -> bool {
    match grant.grant.last_heartbeat_request_time {
        Some(last) => {
            grant.grant.heartbeat_interval_sec.unwrap_or_default() + last.timestamp()
                <= next_send_timestamp
        }
        None => true,
    }
}

impl GrantProcessor<DbRequest> for HeartbeatProcessor<'_> {
    fn process(&mut self, frequency_hz: i64, _bandwidth_hz: i64) -> Option<DbRequest> {
        let grant = self.grants.get(&frequency_hz)?;
        match grant.state {
            GrantState::Unsync => Some(relinquishment_request(self.cbsd, &grant.grant)),
            GrantState::Granted => Some(heartbeat_request(self.cbsd, grant)),
            _ if should_send_now(grant, self.next_send_timestamp) => {
                Some(heartbeat_request(self.cbsd, grant))
            }
            _ => None,
        }
    }
}
