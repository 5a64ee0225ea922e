//! Database Interface Types
//!
//! Radio (CBSD), grant, channel and request records as stored by the
//! Domain Proxy, plus the enumerations the controller matches on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// Collection names
pub const DP_CBSDS_COLLECTION: &str = "cbsds";
pub const DP_REQUESTS_COLLECTION: &str = "requests";

// Request type names (SAS message names)
pub const DP_REGISTRATION_REQUEST: &str = "registrationRequest";
pub const DP_SPECTRUM_INQUIRY_REQUEST: &str = "spectrumInquiryRequest";
pub const DP_GRANT_REQUEST: &str = "grantRequest";
pub const DP_HEARTBEAT_REQUEST: &str = "heartbeatRequest";
pub const DP_RELINQUISHMENT_REQUEST: &str = "relinquishmentRequest";
pub const DP_DEREGISTRATION_REQUEST: &str = "deregistrationRequest";

/// CBSD registration state (both the SAS-observed and the desired one)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CbsdState {
    #[default]
    Unregistered,
    Registered,
}

impl CbsdState {
    pub fn name(&self) -> &'static str {
        match self {
            CbsdState::Unregistered => "unregistered",
            CbsdState::Registered => "registered",
        }
    }
}

/// Grant state, driven by SAS responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantState {
    #[default]
    Idle,
    Granted,
    Authorized,
    Unsync,
}

impl GrantState {
    pub fn name(&self) -> &'static str {
        match self {
            GrantState::Idle => "idle",
            GrantState::Granted => "granted",
            GrantState::Authorized => "authorized",
            GrantState::Unsync => "unsync",
        }
    }

    /// Name as carried in the heartbeat `operationState` field
    pub fn upper_name(&self) -> String {
        self.name().to_uppercase()
    }
}

/// Pending SAS request type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    #[serde(rename = "registrationRequest")]
    Registration,
    #[serde(rename = "spectrumInquiryRequest")]
    SpectrumInquiry,
    #[serde(rename = "grantRequest")]
    Grant,
    #[serde(rename = "heartbeatRequest")]
    Heartbeat,
    #[serde(rename = "relinquishmentRequest")]
    Relinquishment,
    #[serde(rename = "deregistrationRequest")]
    Deregistration,
}

impl RequestType {
    pub fn name(&self) -> &'static str {
        match self {
            RequestType::Registration => DP_REGISTRATION_REQUEST,
            RequestType::SpectrumInquiry => DP_SPECTRUM_INQUIRY_REQUEST,
            RequestType::Grant => DP_GRANT_REQUEST,
            RequestType::Heartbeat => DP_HEARTBEAT_REQUEST,
            RequestType::Relinquishment => DP_RELINQUISHMENT_REQUEST,
            RequestType::Deregistration => DP_DEREGISTRATION_REQUEST,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            DP_REGISTRATION_REQUEST => Some(RequestType::Registration),
            DP_SPECTRUM_INQUIRY_REQUEST => Some(RequestType::SpectrumInquiry),
            DP_GRANT_REQUEST => Some(RequestType::Grant),
            DP_HEARTBEAT_REQUEST => Some(RequestType::Heartbeat),
            DP_RELINQUISHMENT_REQUEST => Some(RequestType::Relinquishment),
            DP_DEREGISTRATION_REQUEST => Some(RequestType::Deregistration),
            _ => None,
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Channel returned by a spectrum inquiry
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub low_frequency_hz: i64,
    pub high_frequency_hz: i64,
    pub max_eirp: f64,
}

impl Channel {
    pub fn new(low_frequency_hz: i64, high_frequency_hz: i64, max_eirp: f64) -> Self {
        Channel {
            low_frequency_hz,
            high_frequency_hz,
            max_eirp,
        }
    }
}

/// CBSD row
///
/// Nullable columns are `Option`; readers take the zero value when a
/// column is unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DbCbsd {
    pub id: i64,
    pub network_id: Option<String>,
    /// SAS-assigned id, present after registration
    pub cbsd_id: Option<String>,
    pub user_id: Option<String>,
    pub fcc_id: Option<String>,
    pub cbsd_serial_number: Option<String>,
    pub cbsd_category: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,

    // Capabilities
    pub min_power: Option<f64>,
    pub max_power: Option<f64>,
    pub number_of_ports: Option<i64>,
    pub max_ibw_mhz: Option<i64>,

    // Installation params
    pub antenna_gain_dbi: Option<f64>,
    pub latitude_deg: Option<f64>,
    pub longitude_deg: Option<f64>,
    pub height_m: Option<f64>,
    pub height_type: Option<String>,
    pub indoor_deployment: Option<bool>,

    // Preferences
    pub preferred_bandwidth_mhz: Option<i64>,
    #[serde(default)]
    pub preferred_frequencies_mhz: Vec<i64>,

    pub single_step_enabled: Option<bool>,
    #[serde(default)]
    pub carrier_aggregation_enabled: bool,
    #[serde(default)]
    pub grant_redundancy: bool,

    // Administrative flags
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub should_deregister: bool,
    #[serde(default)]
    pub should_relinquish: bool,

    #[serde(default)]
    pub channels: Vec<Channel>,
    /// One mask per bandwidth tier (5/10/15/20 MHz); empty until computed
    #[serde(default)]
    pub available_frequencies: Vec<u32>,
}

impl DbCbsd {
    /// Whether every parameter needed to build a registration request is present
    pub fn has_registration_params(&self) -> bool {
        let common = self.user_id.is_some()
            && self.fcc_id.is_some()
            && self.cbsd_serial_number.is_some()
            && self.min_power.is_some()
            && self.max_power.is_some()
            && self.number_of_ports.is_some()
            && self.preferred_bandwidth_mhz.is_some();
        if !common {
            return false;
        }
        if !self.single_step_enabled.unwrap_or_default() {
            return true;
        }
        self.cbsd_category.is_some()
            && self.latitude_deg.is_some()
            && self.longitude_deg.is_some()
            && self.height_m.is_some()
            && self.height_type.is_some()
            && self.indoor_deployment.is_some()
            && self.antenna_gain_dbi.is_some()
    }

    /// Whether an operator action is waiting to be acknowledged
    pub fn has_pending_action(&self) -> bool {
        self.is_deleted || self.should_deregister || self.should_relinquish
    }
}

/// Grant row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DbGrant {
    pub id: i64,
    pub cbsd_id: i64,
    /// SAS-assigned grant id
    pub grant_id: Option<String>,
    pub low_frequency_hz: i64,
    pub high_frequency_hz: i64,
    pub max_eirp: Option<f64>,
    pub heartbeat_interval_sec: Option<i64>,
    pub last_heartbeat_request_time: Option<DateTime<Utc>>,
    pub grant_expire_time: Option<DateTime<Utc>>,
    pub transmit_expire_time: Option<DateTime<Utc>>,
}

impl DbGrant {
    pub fn bandwidth_hz(&self) -> i64 {
        self.high_frequency_hz - self.low_frequency_hz
    }

    pub fn center_frequency_hz(&self) -> i64 {
        (self.low_frequency_hz + self.high_frequency_hz) / 2
    }
}

/// Grant joined with its state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedGrant {
    pub grant: DbGrant,
    pub state: GrantState,
}

/// CBSD joined with its states and grants, as returned by `get_state`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedCbsd {
    pub cbsd: DbCbsd,
    pub cbsd_state: CbsdState,
    pub desired_state: CbsdState,
    #[serde(default)]
    pub grants: Vec<DetailedGrant>,
}

impl DetailedCbsd {
    /// Feasibility predicate applied by `get_state`
    pub fn is_feasible(&self, has_pending_request: bool) -> bool {
        if has_pending_request {
            return false;
        }
        self.cbsd.has_pending_action() || self.cbsd.has_registration_params()
    }
}

/// Pending SAS request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbRequest {
    pub cbsd_id: i64,
    pub request_type: RequestType,
    pub payload: serde_json::Value,
}
