//! Spectrum inquiry, grant selection and heartbeat flows

use dp_dbi::{GrantState, RequestType};
use serde_json::json;

use crate::common::{
    grant, grant_ranges, start_time, whole_band, CbsdBuilder, TestContext, MHZ,
};

const WHOLE_BAND_MASKS: [u32; 4] = [0x3FFF_FFFE, 0x3FFF_FFFE, 0x1FFF_FFFC, 0x1FFF_FFFC];

fn ready_cbsd(id: i64) -> CbsdBuilder {
    CbsdBuilder::new(id)
        .seen_at(start_time())
        .registered("some_cbsd_id")
        .with_channel(3550, 3700, 37.0)
}

/// Full flow from registration to periodic heartbeats on two redundant grants
#[test]
fn test_redundant_grants_and_heartbeats() {
    let mut ctx = TestContext::with_cbsds(vec![CbsdBuilder::new(1).seen_at(start_time()).build()]);

    ctx.tick();
    ctx.take_requests();
    ctx.respond_registration(1, "some_cbsd_id");
    ctx.tick();
    ctx.take_requests();
    ctx.respond_spectrum_inquiry(1, whole_band(37.0));
    ctx.tick();

    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(
        grant_ranges(&requests),
        vec![(3570, 3590, 25.0), (3590, 3610, 25.0)]
    );
    ctx.respond_grants(1, &requests, GrantState::Granted);
    assert_eq!(ctx.grant(1, 1).grant.max_eirp, Some(25.0));

    // Granted grants get a heartbeat on every tick
    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].payload,
        json!({"cbsdId": "some_cbsd_id", "grantId": "grant_1", "operationState": "GRANTED"})
    );
    assert_eq!(requests[1].payload["grantId"], json!("grant_2"));
    ctx.respond_heartbeats(1);

    // Authorized grants wait for their 60 s interval, minus the heartbeat timeout
    ctx.tick();
    assert!(ctx.take_requests().is_empty());
    ctx.advance(49);
    ctx.tick();
    assert!(ctx.take_requests().is_empty());
    ctx.advance(1);
    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.request_type == RequestType::Heartbeat
        && r.payload["operationState"] == json!("AUTHORIZED")));
}

#[test]
fn test_single_grant_without_redundancy() {
    let mut ctx = TestContext::with_cbsds(vec![ready_cbsd(1)
        .without_redundancy()
        .with_available_frequencies(WHOLE_BAND_MASKS.to_vec())
        .build()]);

    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(grant_ranges(&requests), vec![(3590, 3610, 25.0)]);
}

/// Two 10 MHz carriers are picked when 20 MHz is not wanted
#[test]
fn test_carrier_aggregation_prefers_two_narrow_carriers() {
    let mut ctx = TestContext::with_cbsds(vec![ready_cbsd(1)
        .with_carrier_aggregation()
        .with_capabilities(0.0, 30.0, 15.0, 1)
        .with_preferences(15, vec![3600])
        .build()]);

    ctx.tick();
    assert!(ctx.take_requests().is_empty());

    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(
        grant_ranges(&requests),
        vec![(3585, 3595, 35.0), (3595, 3605, 35.0)]
    );
}

#[test]
fn test_carrier_aggregation_takes_wide_pair_first() {
    let mut ctx = TestContext::with_cbsds(vec![ready_cbsd(1)
        .with_carrier_aggregation()
        .with_capabilities(0.0, 30.0, 15.0, 1)
        .build()]);

    ctx.tick();
    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(
        grant_ranges(&requests),
        vec![(3570, 3590, 31.0), (3590, 3610, 31.0)]
    );
}

/// Grant EIRP is capped by the weakest channel under the grant
#[test]
fn test_grant_eirp_follows_channels() {
    let mut ctx = TestContext::with_cbsds(vec![CbsdBuilder::new(1)
        .seen_at(start_time())
        .registered("some_cbsd_id")
        .without_redundancy()
        .with_channel(3550, 3600, 20.0)
        .with_channel(3600, 3700, 30.0)
        .build()]);

    ctx.tick();
    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(grant_ranges(&requests), vec![(3590, 3610, 20.0)]);
}

/// Without usable spectrum the CBSD asks again
#[test]
fn test_no_usable_spectrum_triggers_inquiry() {
    let mut ctx = TestContext::with_cbsds(vec![CbsdBuilder::new(1)
        .seen_at(start_time())
        .registered("some_cbsd_id")
        .with_channel(3550, 3560, 0.0)
        .build()]);

    ctx.tick();
    assert_eq!(ctx.cbsd(1).cbsd.available_frequencies, vec![0, 0, 0, 0]);

    ctx.tick();
    assert_eq!(ctx.take_request_types(), vec![RequestType::SpectrumInquiry]);
}

/// Held grants keep their bandwidth even when a wider one is possible
#[test]
fn test_existing_grant_bandwidth_is_sticky() {
    let mut ctx = TestContext::with_cbsds(vec![ready_cbsd(1)
        .without_redundancy()
        .with_available_frequencies(WHOLE_BAND_MASKS.to_vec())
        .with_grant(grant(1, 1, 3595 * MHZ, 3605 * MHZ, GrantState::Granted))
        .build()]);

    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].request_type, RequestType::Heartbeat);
    assert_eq!(requests[0].payload["grantId"], json!("grant_1"));
}

#[test]
fn test_second_grant_is_added_next_to_existing_one() {
    let mut ctx = TestContext::with_cbsds(vec![ready_cbsd(1)
        .with_available_frequencies(WHOLE_BAND_MASKS.to_vec())
        .with_grant(grant(1, 1, 3590 * MHZ, 3610 * MHZ, GrantState::Granted))
        .build()]);

    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(
        requests.iter().map(|r| r.request_type).collect::<Vec<_>>(),
        vec![RequestType::Grant, RequestType::Heartbeat]
    );
    assert_eq!(grant_ranges(&requests), vec![(3570, 3590, 25.0)]);
}

#[test]
fn test_unsync_grant_is_relinquished() {
    let mut ctx = TestContext::with_cbsds(vec![ready_cbsd(1)
        .without_redundancy()
        .with_available_frequencies(WHOLE_BAND_MASKS.to_vec())
        .with_grant(grant(1, 1, 3590 * MHZ, 3610 * MHZ, GrantState::Unsync))
        .build()]);

    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].request_type, RequestType::Relinquishment);
    assert_eq!(
        requests[0].payload,
        json!({"cbsdId": "some_cbsd_id", "grantId": "grant_1"})
    );
}

/// Held grants wider than the preferred bandwidth are given back
#[test]
fn test_grant_wider_than_preference_is_relinquished() {
    let mut ctx = TestContext::with_cbsds(vec![ready_cbsd(1)
        .with_preferences(10, vec![3600])
        .with_available_frequencies(WHOLE_BAND_MASKS.to_vec())
        .with_grant(grant(1, 1, 3590 * MHZ, 3610 * MHZ, GrantState::Authorized))
        .build()]);

    ctx.tick();
    assert_eq!(ctx.take_request_types(), vec![RequestType::Relinquishment]);
    ctx.respond_relinquishment(1, 1);

    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(
        grant_ranges(&requests),
        vec![(3585, 3595, 28.0), (3595, 3605, 28.0)]
    );
}
