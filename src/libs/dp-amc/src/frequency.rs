//! Available-frequency masks
//!
//! The CBRS band is split into 5 MHz units. Bit `i` of a mask stands for
//! a grant centered at `LOWEST_HZ + i * UNIT_HZ`. A CBSD keeps one mask
//! per bandwidth tier (5, 10, 15 and 20 MHz).

use dp_dbi::{Channel, DbCbsd, DbGrant};

use crate::eirp::EirpCalculator;

pub const LOWEST_HZ: i64 = 3_550_000_000;
pub const HIGHEST_HZ: i64 = 3_700_000_000;
pub const UNIT_HZ: i64 = 5_000_000;

/// Number of bandwidth tiers, 5 MHz to 20 MHz
pub const BANDWIDTH_TIERS: usize = 4;

/// Single-bit mask for a center frequency, 0 when outside the mask range
pub fn hz_to_mask(frequency_hz: i64) -> u32 {
    if frequency_hz < LOWEST_HZ {
        return 0;
    }
    let bit = (frequency_hz - LOWEST_HZ) / UNIT_HZ;
    if bit >= 32 {
        return 0;
    }
    1 << bit
}

/// Center frequency of the lowest set bit
pub fn mask_to_hz(mask: u32) -> i64 {
    LOWEST_HZ + i64::from(mask.trailing_zeros()) * UNIT_HZ
}

/// Tier index of a bandwidth, `None` for unsupported bandwidths
pub fn bandwidth_to_tier(bandwidth_hz: i64) -> Option<usize> {
    if bandwidth_hz <= 0 || bandwidth_hz % UNIT_HZ != 0 {
        return None;
    }
    let tier = (bandwidth_hz / UNIT_HZ - 1) as usize;
    (tier < BANDWIDTH_TIERS).then_some(tier)
}

pub fn tier_to_bandwidth(tier: usize) -> i64 {
    (tier as i64 + 1) * UNIT_HZ
}

fn ceil_div(a: i64, b: i64) -> i64 {
    -(-a).div_euclid(b)
}

/// Centers at which a `bandwidth_hz` grant fits within `[begin_hz, end_hz)`
fn make_mask_for_range(begin_hz: i64, end_hz: i64, bandwidth_hz: i64) -> u32 {
    let low = ceil_div(begin_hz + bandwidth_hz / 2 - LOWEST_HZ, UNIT_HZ).max(0);
    let high = (end_hz - bandwidth_hz / 2 - LOWEST_HZ)
        .div_euclid(UNIT_HZ)
        .min(31);
    if low > high {
        return 0;
    }
    ((1u64 << (high + 1)) - (1u64 << low)) as u32
}

/// Compute the availability mask of every bandwidth tier
///
/// Channels allowing less than the radio's minimum EIRP for a tier are
/// ignored for that tier; the remaining ones are merged into contiguous
/// ranges before placing grant centers.
pub fn calc_available_frequencies(channels: &[Channel], calc: &EirpCalculator) -> Vec<u32> {
    let mut sorted = channels.to_vec();
    sorted.sort_by_key(|c| c.low_frequency_hz);

    (0..BANDWIDTH_TIERS)
        .map(|tier| {
            let bandwidth_hz = tier_to_bandwidth(tier);
            let min_eirp = calc.calc_lower_bound(bandwidth_hz);

            let mut mask = 0u32;
            let mut range: Option<(i64, i64)> = None;
            for channel in sorted.iter().filter(|c| c.max_eirp >= min_eirp) {
                range = match range {
                    Some((begin, end)) if channel.low_frequency_hz <= end => {
                        Some((begin, end.max(channel.high_frequency_hz)))
                    }
                    Some((begin, end)) => {
                        mask |= make_mask_for_range(begin, end, bandwidth_hz);
                        Some((channel.low_frequency_hz, channel.high_frequency_hz))
                    }
                    None => Some((channel.low_frequency_hz, channel.high_frequency_hz)),
                };
            }
            if let Some((begin, end)) = range {
                mask |= make_mask_for_range(begin, end, bandwidth_hz);
            }
            mask
        })
        .collect()
}

/// Clear the bit a grant occupies in its own bandwidth tier
///
/// Other tiers are left as they are until the next full recompute.
pub fn unset_grant_frequency(cbsd: &DbCbsd, grant: &DbGrant) -> Vec<u32> {
    let mut frequencies = cbsd.available_frequencies.clone();
    if frequencies.is_empty() || grant.low_frequency_hz == 0 || grant.high_frequency_hz == 0 {
        return frequencies;
    }
    let Some(tier) = bandwidth_to_tier(grant.bandwidth_hz()) else {
        return frequencies;
    };
    if let Some(mask) = frequencies.get_mut(tier) {
        *mask &= !hz_to_mask(grant.center_frequency_hz());
    }
    frequencies
}
