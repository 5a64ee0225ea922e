//! Grant orchestration
//!
//! Works out which grants a CBSD should hold, diffs that against the
//! grants it holds now and hands every deleted, added and kept grant to
//! a caller-supplied processor.

use dp_dbi::{DbCbsd, DetailedGrant};

use crate::bandwidth::{pick_bandwidth_selection_order, Redundancy, SelectionData};
use crate::eirp::MHZ;
use crate::frequency::{bandwidth_to_tier, hz_to_mask, mask_to_hz, UNIT_HZ};
use crate::selection::{select_grants_with_redundancy, select_grants_without_redundancy};

/// Turns one grant (center frequency and bandwidth) into a result
pub trait GrantProcessor<T> {
    fn process(&mut self, frequency_hz: i64, bandwidth_hz: i64) -> Option<T>;
}

impl<T, F> GrantProcessor<T> for F
where
    F: FnMut(i64, i64) -> Option<T>,
{
    fn process(&mut self, frequency_hz: i64, bandwidth_hz: i64) -> Option<T> {
        self(frequency_hz, bandwidth_hz)
    }
}

pub struct Processors<'a, T> {
    pub keep: &'a mut dyn GrantProcessor<T>,
    pub del: &'a mut dyn GrantProcessor<T>,
    pub add: &'a mut dyn GrantProcessor<T>,
}

/// Split between current and wanted grants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrantDiff {
    pub keep: u32,
    pub del: u32,
    pub add: u32,
}

/// Diff two grant masks; masks of different bandwidths share no grant
pub fn diff_grants(old_bandwidth_hz: i64, old: u32, new_bandwidth_hz: i64, new: u32) -> GrantDiff {
    if old_bandwidth_hz != new_bandwidth_hz {
        return GrantDiff {
            keep: 0,
            del: old,
            add: new,
        };
    }
    GrantDiff {
        keep: old & new,
        del: old & !new,
        add: new & !old,
    }
}

/// Bandwidth of the held grants and their center mask
///
/// All grants of one CBSD share the bandwidth of the first one.
fn calculate_old_grants(grants: &[DetailedGrant]) -> (i64, u32) {
    let Some(first) = grants.first() else {
        return (0, 0);
    };
    let mask = grants
        .iter()
        .fold(0, |acc, g| acc | hz_to_mask(g.grant.center_frequency_hz()));
    (first.grant.bandwidth_hz(), mask)
}

fn select_grants_for_bandwidth(
    available: u32,
    grants: u32,
    pref: &[u32],
    selection: &SelectionData,
    max_ibw_hz: i64,
    index: usize,
) -> u32 {
    let bandwidth_hz = selection.bandwidth_hz;
    if selection.redundancy != Redundancy::No {
        let min_width = (bandwidth_hz / UNIT_HZ - 1).max(0) as u32;
        let max_width = ((max_ibw_hz - bandwidth_hz) / UNIT_HZ).max(min_width as i64) as u32;
        let mask = select_grants_with_redundancy(available, grants, pref, min_width, max_width, index);
        if mask.count_ones() > 1 {
            return mask;
        }
        if selection.redundancy == Redundancy::MustHaveTwo {
            return 0;
        }
    }
    select_grants_without_redundancy(available, grants, pref, index)
}

/// First candidate bandwidth yielding a non-empty selection
fn select_grants(cbsd: &DbCbsd, old_bandwidth_hz: i64, old_mask: u32, index: usize) -> (i64, u32) {
    let pref: Vec<u32> = cbsd
        .preferred_frequencies_mhz
        .iter()
        .map(|&f| hz_to_mask(f * MHZ))
        .filter(|&x| x != 0)
        .collect();
    let max_bandwidth_hz = cbsd.preferred_bandwidth_mhz.unwrap_or_default() * MHZ;
    let max_ibw_hz = cbsd.max_ibw_mhz.unwrap_or_default() * MHZ;

    for selection in pick_bandwidth_selection_order(cbsd, max_bandwidth_hz, old_bandwidth_hz) {
        let Some(available) = bandwidth_to_tier(selection.bandwidth_hz)
            .and_then(|tier| cbsd.available_frequencies.get(tier))
            .copied()
        else {
            continue;
        };
        let grants = if selection.bandwidth_hz == old_bandwidth_hz {
            old_mask
        } else {
            0
        };
        let mask = select_grants_for_bandwidth(available, grants, &pref, &selection, max_ibw_hz, index);
        if mask != 0 {
            log::debug!(
                "CBSD {}: selected {} MHz grants {:#034b} ({:?})",
                cbsd.id,
                selection.bandwidth_hz / MHZ,
                mask,
                selection.redundancy
            );
            return (selection.bandwidth_hz, mask);
        }
    }
    (0, 0)
}

fn process_mask<T>(mask: u32, bandwidth_hz: i64, processor: &mut dyn GrantProcessor<T>, out: &mut Vec<T>) {
    let mut rest = mask;
    while rest != 0 {
        let bit = rest & rest.wrapping_neg();
        rest &= rest - 1;
        if let Some(result) = processor.process(mask_to_hz(bit), bandwidth_hz) {
            out.push(result);
        }
    }
}

/// Select grants for `cbsd` and run the processors over the diff
///
/// Deleted grants are processed first, then added ones, then kept ones,
/// each set in increasing frequency order.
pub fn process_grants<T>(
    cbsd: &DbCbsd,
    grants: &[DetailedGrant],
    processors: Processors<'_, T>,
    index: usize,
) -> Vec<T> {
    let (old_bandwidth_hz, old_mask) = calculate_old_grants(grants);
    let (new_bandwidth_hz, new_mask) = select_grants(cbsd, old_bandwidth_hz, old_mask, index);
    let diff = diff_grants(old_bandwidth_hz, old_mask, new_bandwidth_hz, new_mask);

    let mut out = Vec::new();
    process_mask(diff.del, old_bandwidth_hz, processors.del, &mut out);
    process_mask(diff.add, new_bandwidth_hz, processors.add, &mut out);
    process_mask(diff.keep, old_bandwidth_hz, processors.keep, &mut out);
    out
}
