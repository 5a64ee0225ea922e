//! Test context
//!
//! Owns the in-memory store, an action generator with a fixed tie-break
//! index and a manual clock. The SAS side is simulated by the `respond_*`
//! helpers, which apply to the store what the SAS-facing component would
//! write after receiving a response.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use dp_amc::{run_tick, ActionGenerator, FixedIndex, TickReport};
use dp_dbi::{
    CbsdState, Channel, DbRequest, DetailedCbsd, DetailedGrant, GrantState, MemoryStore, RequestType,
};

use super::cbsd::MHZ;

pub const HEARTBEAT_TIMEOUT_SEC: i64 = 10;
pub const INACTIVITY_TIMEOUT_SEC: i64 = 4 * 60 * 60;
pub const START_TIMESTAMP: i64 = 1_700_000_000;

pub fn start_time() -> DateTime<Utc> {
    Utc.timestamp_opt(START_TIMESTAMP, 0).unwrap()
}

pub struct TestContext {
    pub store: MemoryStore,
    pub generator: ActionGenerator,
    pub now: DateTime<Utc>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let _ = env_logger::try_init();
        TestContext {
            store: MemoryStore::new(),
            generator: ActionGenerator::new(
                TimeDelta::seconds(HEARTBEAT_TIMEOUT_SEC),
                TimeDelta::seconds(INACTIVITY_TIMEOUT_SEC),
                Box::new(FixedIndex(0)),
            ),
            now: start_time(),
        }
    }

    pub fn with_cbsds(cbsds: Vec<DetailedCbsd>) -> Self {
        let mut ctx = Self::new();
        for cbsd in cbsds {
            ctx.store.insert_cbsd(cbsd);
        }
        ctx
    }

    /// Run one controller tick at the current time
    pub fn tick(&mut self) -> TickReport {
        run_tick(&mut self.store, &mut self.generator, self.now).expect("tick failed")
    }

    pub fn advance(&mut self, seconds: i64) {
        self.now += TimeDelta::seconds(seconds);
    }

    /// Consume the queued requests, as the SAS-facing side would
    pub fn take_requests(&mut self) -> Vec<DbRequest> {
        self.store.take_requests()
    }

    pub fn take_request_types(&mut self) -> Vec<RequestType> {
        self.take_requests().iter().map(|r| r.request_type).collect()
    }

    pub fn cbsd(&self, id: i64) -> &DetailedCbsd {
        self.store.cbsd(id).expect("cbsd not found")
    }

    fn cbsd_mut(&mut self, id: i64) -> &mut DetailedCbsd {
        self.store.cbsd_mut(id).expect("cbsd not found")
    }

    /// The radio reported in at the current time
    pub fn seen(&mut self, id: i64) {
        let now = self.now;
        self.cbsd_mut(id).cbsd.last_seen = Some(now);
    }

    pub fn respond_registration(&mut self, id: i64, cbsd_id: &str) {
        let cbsd = self.cbsd_mut(id);
        cbsd.cbsd_state = CbsdState::Registered;
        cbsd.cbsd.cbsd_id = Some(cbsd_id.to_string());
    }

    pub fn respond_deregistration(&mut self, id: i64) {
        let cbsd = self.cbsd_mut(id);
        cbsd.cbsd_state = CbsdState::Unregistered;
        cbsd.cbsd.cbsd_id = None;
        cbsd.cbsd.channels.clear();
        cbsd.cbsd.available_frequencies.clear();
        cbsd.grants.clear();
    }

    pub fn respond_spectrum_inquiry(&mut self, id: i64, channels: Vec<Channel>) {
        self.cbsd_mut(id).cbsd.channels = channels;
    }

    /// Store a grant for every queued grant request of `id`, in `state`
    pub fn respond_grants(&mut self, id: i64, requests: &[DbRequest], state: GrantState) {
        let mut next_id = self.cbsd(id).grants.iter().map(|g| g.grant.id).max().unwrap_or(0) + 1;
        for request in requests.iter().filter(|r| r.request_type == RequestType::Grant) {
            let range = &request.payload["operationParam"]["operationFrequencyRange"];
            let low = range["lowFrequency"].as_i64().unwrap();
            let high = range["highFrequency"].as_i64().unwrap();
            let mut grant = super::cbsd::grant(next_id, id, low, high, state);
            grant.grant.max_eirp = request.payload["operationParam"]["maxEirp"].as_f64();
            self.cbsd_mut(id).grants.push(grant);
            next_id += 1;
        }
    }

    pub fn respond_relinquishment(&mut self, id: i64, grant_id: i64) {
        self.cbsd_mut(id).grants.retain(|g| g.grant.id != grant_id);
    }

    /// Heartbeat response: grants become authorized, with the request time recorded
    pub fn respond_heartbeats(&mut self, id: i64) {
        let now = self.now;
        for grant in &mut self.cbsd_mut(id).grants {
            grant.state = GrantState::Authorized;
            grant.grant.last_heartbeat_request_time = Some(now);
        }
    }

    pub fn grant(&self, id: i64, grant_id: i64) -> &DetailedGrant {
        self.cbsd(id)
            .grants
            .iter()
            .find(|g| g.grant.id == grant_id)
            .expect("grant not found")
    }
}

/// The whole CBRS band at the given EIRP
pub fn whole_band(max_eirp: f64) -> Vec<Channel> {
    vec![Channel::new(3550 * MHZ, 3700 * MHZ, max_eirp)]
}

/// `(lowFrequency, highFrequency, maxEirp)` of each grant request
pub fn grant_ranges(requests: &[DbRequest]) -> Vec<(i64, i64, f64)> {
    requests
        .iter()
        .filter(|r| r.request_type == RequestType::Grant)
        .map(|r| {
            let param = &r.payload["operationParam"];
            let range = &param["operationFrequencyRange"];
            (
                range["lowFrequency"].as_i64().unwrap() / MHZ,
                range["highFrequency"].as_i64().unwrap() / MHZ,
                param["maxEirp"].as_f64().unwrap(),
            )
        })
        .collect()
}
