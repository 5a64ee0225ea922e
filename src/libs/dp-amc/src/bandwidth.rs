//! Bandwidth preference policy

use dp_dbi::DbCbsd;

use crate::eirp::MHZ;

/// How hard to try for a second grant of the same bandwidth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redundancy {
    No,
    BestEffort,
    MustHaveTwo,
}

/// One (bandwidth, redundancy) candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionData {
    pub bandwidth_hz: i64,
    pub redundancy: Redundancy,
}

impl SelectionData {
    const fn new(bandwidth_mhz: i64, redundancy: Redundancy) -> Self {
        SelectionData {
            bandwidth_hz: bandwidth_mhz * MHZ,
            redundancy,
        }
    }
}

/// Two 10 MHz carriers are preferred over a single wider one
const CARRIER_AGGREGATION_ORDER: [SelectionData; 5] = [
    SelectionData::new(20, Redundancy::BestEffort),
    SelectionData::new(10, Redundancy::MustHaveTwo),
    SelectionData::new(15, Redundancy::BestEffort),
    SelectionData::new(10, Redundancy::No),
    SelectionData::new(5, Redundancy::BestEffort),
];

const REDUNDANCY_ORDER: [SelectionData; 4] = [
    SelectionData::new(20, Redundancy::BestEffort),
    SelectionData::new(15, Redundancy::BestEffort),
    SelectionData::new(10, Redundancy::BestEffort),
    SelectionData::new(5, Redundancy::BestEffort),
];

const NO_REDUNDANCY_ORDER: [SelectionData; 4] = [
    SelectionData::new(20, Redundancy::No),
    SelectionData::new(15, Redundancy::No),
    SelectionData::new(10, Redundancy::No),
    SelectionData::new(5, Redundancy::No),
];

/// Ordered candidates to try when selecting grants
///
/// A CBSD already holding grants keeps their bandwidth. Candidates wider
/// than `max_bandwidth_hz` are dropped.
pub fn pick_bandwidth_selection_order(
    cbsd: &DbCbsd,
    max_bandwidth_hz: i64,
    old_bandwidth_hz: i64,
) -> Vec<SelectionData> {
    let sticky;
    let order: &[SelectionData] = if old_bandwidth_hz != 0 {
        let redundancy = if cbsd.grant_redundancy {
            Redundancy::BestEffort
        } else {
            Redundancy::No
        };
        sticky = [SelectionData {
            bandwidth_hz: old_bandwidth_hz,
            redundancy,
        }];
        &sticky
    } else if cbsd.carrier_aggregation_enabled {
        &CARRIER_AGGREGATION_ORDER
    } else if cbsd.grant_redundancy {
        &REDUNDANCY_ORDER
    } else {
        &NO_REDUNDANCY_ORDER
    };

    order
        .iter()
        .filter(|s| s.bandwidth_hz <= max_bandwidth_hz)
        .copied()
        .collect()
}
