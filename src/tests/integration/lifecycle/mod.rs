//! Relinquishment, inactivity and idle grant cleanup

use dp_amc::Action;
use dp_dbi::{GrantState, RequestType};
use serde_json::json;

use crate::common::{
    grant, grant_ranges, start_time, CbsdBuilder, TestContext, INACTIVITY_TIMEOUT_SEC, MHZ,
};

const WHOLE_BAND_MASKS: [u32; 4] = [0x3FFF_FFFE, 0x3FFF_FFFE, 0x1FFF_FFFC, 0x1FFF_FFFC];

fn cbsd_with_grants(id: i64, lower: GrantState, upper: GrantState) -> CbsdBuilder {
    let mut lower = grant(1, id, 3570 * MHZ, 3590 * MHZ, lower);
    let mut upper = grant(2, id, 3590 * MHZ, 3610 * MHZ, upper);
    lower.grant.last_heartbeat_request_time = Some(start_time());
    upper.grant.last_heartbeat_request_time = Some(start_time());
    CbsdBuilder::new(id)
        .seen_at(start_time())
        .registered("some_cbsd_id")
        .with_channel(3550, 3700, 37.0)
        .with_available_frequencies(WHOLE_BAND_MASKS.to_vec())
        .with_grant(lower)
        .with_grant(upper)
}

#[test]
fn test_relinquish_all_then_acknowledge() {
    let mut ctx = TestContext::with_cbsds(vec![cbsd_with_grants(
        1,
        GrantState::Authorized,
        GrantState::Authorized,
    )
    .should_relinquish()
    .build()]);

    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests.iter().map(|r| r.payload["grantId"].clone()).collect::<Vec<_>>(),
        vec![json!("grant_1"), json!("grant_2")]
    );
    assert!(requests.iter().all(|r| r.request_type == RequestType::Relinquishment));
    ctx.respond_relinquishment(1, 1);
    ctx.respond_relinquishment(1, 2);

    let report = ctx.tick();
    assert_eq!(report.actions, vec![Action::ack_relinquishment(1)]);
    assert!(!ctx.cbsd(1).cbsd.should_relinquish);

    // Back to normal grant selection
    ctx.tick();
    let requests = ctx.take_requests();
    assert_eq!(
        grant_ranges(&requests),
        vec![(3570, 3590, 25.0), (3590, 3610, 25.0)]
    );
}

#[test]
fn test_inactive_cbsd_loses_its_grants() {
    let mut ctx = TestContext::with_cbsds(vec![cbsd_with_grants(
        1,
        GrantState::Authorized,
        GrantState::Authorized,
    )
    .build()]);

    ctx.advance(INACTIVITY_TIMEOUT_SEC);
    ctx.tick();
    assert!(ctx
        .take_request_types()
        .iter()
        .all(|t| *t == RequestType::Heartbeat));

    ctx.advance(1);
    ctx.tick();
    assert_eq!(
        ctx.take_request_types(),
        vec![RequestType::Relinquishment, RequestType::Relinquishment]
    );
    ctx.respond_relinquishment(1, 1);
    ctx.respond_relinquishment(1, 2);

    let report = ctx.tick();
    assert!(report.actions.is_empty());

    // Reporting in again resumes grant selection
    ctx.seen(1);
    ctx.tick();
    assert_eq!(grant_ranges(&ctx.take_requests()).len(), 2);
}

/// Idle grants free their frequency and are deleted before selection
#[test]
fn test_idle_grant_is_removed_before_selection() {
    let mut ctx = TestContext::with_cbsds(vec![cbsd_with_grants(
        1,
        GrantState::Authorized,
        GrantState::Idle,
    )
    .build()]);

    let report = ctx.tick();
    assert_eq!(report.actions.len(), 3);
    assert!(matches!(&report.actions[0], Action::Update { .. }));
    assert!(matches!(&report.actions[1], Action::DeleteGrant(g) if g.id == 2));

    let cbsd = ctx.cbsd(1);
    assert_eq!(cbsd.grants.len(), 1);
    assert_eq!(cbsd.grants[0].grant.id, 1);
    assert_eq!(cbsd.cbsd.available_frequencies[3], 0x1FFF_FFFC & !(1 << 10));
    assert_eq!(cbsd.cbsd.available_frequencies[..3], WHOLE_BAND_MASKS[..3]);

    // The freed position is not asked for again
    let requests = ctx.take_requests();
    assert_eq!(grant_ranges(&requests), vec![(3550, 3570, 25.0)]);
}

#[test]
fn test_deregistration_skips_relinquishment() {
    let mut ctx = TestContext::with_cbsds(vec![cbsd_with_grants(
        1,
        GrantState::Authorized,
        GrantState::Authorized,
    )
    .should_relinquish()
    .should_deregister()
    .build()]);

    ctx.tick();
    assert_eq!(ctx.take_request_types(), vec![RequestType::Deregistration]);
}

/// Every CBSD is handled in the same tick, in id order
#[test]
fn test_many_cbsds_in_one_tick() {
    let mut ctx = TestContext::with_cbsds(vec![
        CbsdBuilder::new(1).seen_at(start_time()).build(),
        cbsd_with_grants(2, GrantState::Granted, GrantState::Granted).build(),
        CbsdBuilder::new(3)
            .seen_at(start_time())
            .registered("other_cbsd_id")
            .should_deregister()
            .build(),
    ]);

    let report = ctx.tick();
    assert_eq!(report.cbsds, 3);
    let requests = ctx.take_requests();
    assert_eq!(
        requests.iter().map(|r| (r.cbsd_id, r.request_type)).collect::<Vec<_>>(),
        vec![
            (1, RequestType::Registration),
            (2, RequestType::Heartbeat),
            (2, RequestType::Heartbeat),
            (3, RequestType::Deregistration),
        ]
    );
}
