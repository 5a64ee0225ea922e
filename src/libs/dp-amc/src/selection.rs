//! Per-bandwidth grant selection
//!
//! Masks here are all in the same bandwidth tier. Widths are counted in
//! 5 MHz units: a pair of grants is valid when its distance `d` satisfies
//! `min_width < d <= max_width`.

fn shl(x: u32, n: u32) -> u32 {
    x.checked_shl(n).unwrap_or(0)
}

fn shr(x: u32, n: u32) -> u32 {
    x.checked_shr(n).unwrap_or(0)
}

/// Positions at distance `d` from the single bit `x` with `i < d <= j`, on both sides
pub fn ok_mask(x: u32, i: u32, j: u32) -> u32 {
    if x == 0 {
        return 0;
    }
    let m = x.wrapping_sub(1);
    shl(x, j + 1)
        .wrapping_sub(shl(x, i + 1))
        .wrapping_add(shr(m, i))
        .wrapping_sub(shr(m, j))
}

/// Positions closer than `i` units to any bit of `x`, excluding `x` itself
pub fn to_close_mask(x: u32, i: u32) -> u32 {
    (1..i).fold(0, |acc, k| acc | shl(x, k) | shr(x, k))
}

/// The `(i mod popcount)`-th set bit of `mask`, counting from the LSB
pub fn nth(mask: u32, i: usize) -> u32 {
    let count = mask.count_ones() as usize;
    if count == 0 {
        return 0;
    }
    let mut rest = mask;
    for _ in 0..i % count {
        rest &= rest - 1;
    }
    rest & rest.wrapping_neg()
}

/// Bit of `y` closest to the single bit `x`, the lower one on a tie
pub fn nearest(x: u32, y: u32) -> u32 {
    let below = y & x.wrapping_sub(1);
    let above = y & !(x | x.wrapping_sub(1));
    let left = if below == 0 {
        0
    } else {
        1 << (31 - below.leading_zeros())
    };
    let right = above & above.wrapping_neg();

    match (left, right) {
        (0, r) => r,
        (l, 0) => l,
        (l, r) => {
            let pos = x.trailing_zeros();
            if pos - l.trailing_zeros() <= r.trailing_zeros() - pos {
                l
            } else {
                r
            }
        }
    }
}

/// One bit of `mask`: the first fully contained preference, else the `index`-th bit
pub fn select_one_grant(mask: u32, pref: &[u32], index: usize) -> u32 {
    pref.iter()
        .copied()
        .find(|&x| x != 0 && mask & x == x)
        .unwrap_or_else(|| nth(mask, index))
}

/// Pair within `mask` where the first bit is taken from `anchors`
fn select_anchored_pair(
    mask: u32,
    anchors: u32,
    pref: &[u32],
    min_width: u32,
    max_width: u32,
    index: usize,
) -> u32 {
    let anchors = anchors & mask;
    for &x in pref {
        if x == 0 || anchors & x != x {
            continue;
        }
        let y = mask & ok_mask(x, min_width, max_width);
        if y != 0 {
            return x | nearest(x, y);
        }
    }

    let mut candidates = 0;
    let mut rest = anchors;
    while rest != 0 {
        let x = rest & rest.wrapping_neg();
        rest &= rest - 1;
        if mask & ok_mask(x, min_width, max_width) != 0 {
            candidates |= x;
        }
    }
    if candidates == 0 {
        return 0;
    }
    let x = nth(candidates, index);
    x | nearest(x, mask & ok_mask(x, min_width, max_width))
}

/// Two bits of `mask` at a valid distance, 0 when no such pair exists
pub fn select_two_grants(
    mask: u32,
    pref: &[u32],
    min_width: u32,
    max_width: u32,
    index: usize,
) -> u32 {
    select_anchored_pair(mask, mask, pref, min_width, max_width, index)
}

pub fn select_grants_without_redundancy(
    available: u32,
    grants: u32,
    pref: &[u32],
    index: usize,
) -> u32 {
    if grants != 0 {
        select_one_grant(grants, pref, index)
    } else {
        select_one_grant(available, pref, index)
    }
}

/// Try for a pair of grants, keeping existing ones where possible
///
/// A pair made only of existing grants wins. Otherwise a new partner is
/// searched among available positions that are not too close to existing
/// grants; existing grants are always part of that result. Failing both,
/// a single existing grant is kept.
pub fn select_grants_with_redundancy(
    available: u32,
    grants: u32,
    pref: &[u32],
    min_width: u32,
    max_width: u32,
    index: usize,
) -> u32 {
    let pair = select_two_grants(grants, pref, min_width, max_width, index);
    if pair != 0 {
        return pair;
    }

    let mask = (available & !to_close_mask(grants, min_width)) | grants;
    let anchors = if grants != 0 { grants } else { mask };
    let pair = select_anchored_pair(mask, anchors, pref, min_width, max_width, index);
    if pair != 0 {
        return pair | grants;
    }

    select_one_grant(grants, pref, index)
}
