//! SAS request builders
//!
//! Field names and casing follow the SAS-CBSD protocol; the payloads are
//! consumed verbatim by the SAS-facing component.

use dp_dbi::{DbCbsd, DbGrant, DbRequest, DetailedGrant, RequestType};
use serde_json::{json, Value};

use crate::frequency::{HIGHEST_HZ, LOWEST_HZ};

const RADIO_TECHNOLOGY: &str = "E_UTRA";

fn request(cbsd: &DbCbsd, request_type: RequestType, payload: Value) -> DbRequest {
    DbRequest {
        cbsd_id: cbsd.id,
        request_type,
        payload,
    }
}

fn sas_cbsd_id(cbsd: &DbCbsd) -> String {
    cbsd.cbsd_id.clone().unwrap_or_default()
}

fn sas_grant_id(grant: &DbGrant) -> String {
    grant.grant_id.clone().unwrap_or_default()
}

/// Registration, single-step when enabled on the CBSD
pub fn registration_request(cbsd: &DbCbsd) -> DbRequest {
    let mut payload = json!({
        "userId": cbsd.user_id.clone().unwrap_or_default(),
        "fccId": cbsd.fcc_id.clone().unwrap_or_default(),
        "cbsdSerialNumber": cbsd.cbsd_serial_number.clone().unwrap_or_default(),
    });
    if cbsd.single_step_enabled.unwrap_or_default() {
        payload["cbsdCategory"] = json!(cbsd.cbsd_category.clone().unwrap_or_default().to_uppercase());
        payload["airInterface"] = json!({ "radioTechnology": RADIO_TECHNOLOGY });
        payload["installationParam"] = json!({
            "latitude": cbsd.latitude_deg.unwrap_or_default(),
            "longitude": cbsd.longitude_deg.unwrap_or_default(),
            "height": cbsd.height_m.unwrap_or_default(),
            "heightType": cbsd.height_type.clone().unwrap_or_default().to_uppercase(),
            "indoorDeployment": cbsd.indoor_deployment.unwrap_or_default(),
            "antennaGain": cbsd.antenna_gain_dbi.unwrap_or_default(),
        });
        payload["measCapability"] = json!([]);
    }
    request(cbsd, RequestType::Registration, payload)
}

pub fn deregistration_request(cbsd: &DbCbsd) -> DbRequest {
    request(
        cbsd,
        RequestType::Deregistration,
        json!({ "cbsdId": sas_cbsd_id(cbsd) }),
    )
}

/// Inquiry over the whole CBRS band
pub fn spectrum_inquiry_request(cbsd: &DbCbsd) -> DbRequest {
    request(
        cbsd,
        RequestType::SpectrumInquiry,
        json!({
            "cbsdId": sas_cbsd_id(cbsd),
            "inquiredSpectrum": [{
                "lowFrequency": LOWEST_HZ,
                "highFrequency": HIGHEST_HZ,
            }],
        }),
    )
}

pub fn grant_request(cbsd: &DbCbsd, low_frequency_hz: i64, high_frequency_hz: i64, max_eirp: f64) -> DbRequest {
    request(
        cbsd,
        RequestType::Grant,
        json!({
            "cbsdId": sas_cbsd_id(cbsd),
            "operationParam": {
                "maxEirp": max_eirp,
                "operationFrequencyRange": {
                    "lowFrequency": low_frequency_hz,
                    "highFrequency": high_frequency_hz,
                },
            },
        }),
    )
}

pub fn heartbeat_request(cbsd: &DbCbsd, grant: &DetailedGrant) -> DbRequest {
    request(
        cbsd,
        RequestType::Heartbeat,
        json!({
            "cbsdId": sas_cbsd_id(cbsd),
            "grantId": sas_grant_id(&grant.grant),
            "operationState": grant.state.upper_name(),
        }),
    )
}

pub fn relinquishment_request(cbsd: &DbCbsd, grant: &DbGrant) -> DbRequest {
    request(
        cbsd,
        RequestType::Relinquishment,
        json!({
            "cbsdId": sas_cbsd_id(cbsd),
            "grantId": sas_grant_id(grant),
        }),
    )
}

/// One relinquishment per held grant
pub fn relinquish_all(cbsd: &DbCbsd, grants: &[DetailedGrant]) -> Vec<DbRequest> {
    grants
        .iter()
        .map(|g| relinquishment_request(cbsd, &g.grant))
        .collect()
}
