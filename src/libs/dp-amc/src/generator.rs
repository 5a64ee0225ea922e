//! Action generator
//!
//! Classifies every CBSD into exactly one scenario and produces the
//! actions for it. Branches are checked in priority order; the first
//! match wins.

use chrono::{DateTime, TimeDelta, Utc};
use dp_dbi::{CbsdState, DetailedCbsd};

use crate::action::Action;
use crate::eirp::EirpCalculator;
use crate::frequency::calc_available_frequencies;
use crate::grants::{process_grants, Processors};
use crate::idle::remove_idle_grants;
use crate::processors::{GrantRequestProcessor, HeartbeatProcessor, RelinquishmentProcessor};
use crate::rng::RandomIndex;
use crate::sas;

/// Per-CBSD scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CbsdGenerator {
    Nothing,
    Delete,
    AcknowledgeDeregistration,
    Registration,
    Deregistration,
    AcknowledgeRelinquishment,
    RelinquishAll,
    SpectrumInquiry,
    StoreAvailableFrequencies,
    Grants,
}

fn is_active(cbsd: &DetailedCbsd, now: DateTime<Utc>, inactivity_timeout: TimeDelta) -> bool {
    cbsd.cbsd
        .last_seen
        .is_some_and(|last_seen| now - last_seen <= inactivity_timeout)
}

fn select_generator(cbsd: &DetailedCbsd, active: bool) -> CbsdGenerator {
    let row = &cbsd.cbsd;
    if cbsd.cbsd_state == CbsdState::Unregistered {
        if row.is_deleted {
            CbsdGenerator::Delete
        } else if row.should_deregister {
            CbsdGenerator::AcknowledgeDeregistration
        } else if active && cbsd.desired_state == CbsdState::Registered {
            CbsdGenerator::Registration
        } else {
            CbsdGenerator::Nothing
        }
    } else if row.is_deleted || row.should_deregister || cbsd.desired_state == CbsdState::Unregistered {
        CbsdGenerator::Deregistration
    } else if row.should_relinquish {
        if cbsd.grants.is_empty() {
            CbsdGenerator::AcknowledgeRelinquishment
        } else {
            CbsdGenerator::RelinquishAll
        }
    } else if !active {
        CbsdGenerator::RelinquishAll
    } else if row.channels.is_empty() {
        CbsdGenerator::SpectrumInquiry
    } else if row.available_frequencies.is_empty() {
        CbsdGenerator::StoreAvailableFrequencies
    } else {
        CbsdGenerator::Grants
    }
}

/// Turns loaded CBSD state into actions
pub struct ActionGenerator {
    heartbeat_timeout: TimeDelta,
    inactivity_timeout: TimeDelta,
    rng: Box<dyn RandomIndex + Send>,
}

impl ActionGenerator {
    pub fn new(
        heartbeat_timeout: TimeDelta,
        inactivity_timeout: TimeDelta,
        rng: Box<dyn RandomIndex + Send>,
    ) -> Self {
        ActionGenerator {
            heartbeat_timeout,
            inactivity_timeout,
            rng,
        }
    }

    /// Actions for every CBSD, grouped per CBSD in input order
    pub fn generate_actions(&mut self, cbsds: Vec<DetailedCbsd>, now: DateTime<Utc>) -> Vec<Action> {
        let mut actions = Vec::new();
        for cbsd in cbsds {
            actions.extend(self.generate_for_cbsd(cbsd, now));
        }
        actions
    }

    fn generate_for_cbsd(&mut self, cbsd: DetailedCbsd, now: DateTime<Utc>) -> Vec<Action> {
        let active = is_active(&cbsd, now, self.inactivity_timeout);
        let generator = select_generator(&cbsd, active);
        log::debug!("CBSD {}: {:?}", cbsd.cbsd.id, generator);

        let row = &cbsd.cbsd;
        match generator {
            CbsdGenerator::Nothing => vec![],
            CbsdGenerator::Delete => vec![Action::Delete { id: row.id }],
            CbsdGenerator::AcknowledgeDeregistration => vec![Action::ack_deregistration(row.id)],
            CbsdGenerator::Registration => vec![sas::registration_request(row).into()],
            CbsdGenerator::Deregistration => vec![sas::deregistration_request(row).into()],
            CbsdGenerator::AcknowledgeRelinquishment => vec![Action::ack_relinquishment(row.id)],
            CbsdGenerator::RelinquishAll => sas::relinquish_all(row, &cbsd.grants)
                .into_iter()
                .map(Action::from)
                .collect(),
            CbsdGenerator::SpectrumInquiry => vec![sas::spectrum_inquiry_request(row).into()],
            CbsdGenerator::StoreAvailableFrequencies => {
                let frequencies = calc_available_frequencies(&row.channels, &EirpCalculator::new(row));
                vec![Action::store_available_frequencies(row.id, frequencies)]
            }
            CbsdGenerator::Grants => self.generate_grants(cbsd, now),
        }
    }

    fn generate_grants(&mut self, mut cbsd: DetailedCbsd, now: DateTime<Utc>) -> Vec<Action> {
        let mut actions = remove_idle_grants(&mut cbsd);
        let next_send_timestamp = (now + self.heartbeat_timeout).timestamp();
        let index = self.rng.next_index();

        let row = &cbsd.cbsd;
        let grants = &cbsd.grants;
        let mut keep = HeartbeatProcessor::new(row, grants, next_send_timestamp);
        let mut del = RelinquishmentProcessor::new(row, grants);
        let mut add = GrantRequestProcessor::new(row);
        let requests = process_grants(
            row,
            grants,
            Processors {
                keep: &mut keep,
                del: &mut del,
                add: &mut add,
            },
            index,
        );

        if requests.is_empty() && grants.is_empty() {
            actions.push(sas::spectrum_inquiry_request(row).into());
        }
        actions.extend(requests.into_iter().map(Action::from));
        actions
    }
}
