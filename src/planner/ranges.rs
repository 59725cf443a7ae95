//! Integer range bookkeeping inside a pool.
//!
//! Used space (locked segments, reserved ranges) is reduced to a sorted,
//! merged list of inclusive `[start, end]` ranges clipped to the pool, and
//! free space is the complement. Free ranges decompose into aligned CIDR
//! blocks for gap reporting.

use ipnet::IpNet;

use crate::models::prefix::{self, Family};

/// An inclusive integer address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrRange {
    pub start: u128,
    pub end: u128,
}

impl AddrRange {
    /// Number of addresses in the range; saturates on the full /0 space.
    pub fn size(&self) -> u128 {
        (self.end - self.start).saturating_add(1)
    }
}

/// The inclusive bounds of a masked pool prefix.
pub fn pool_bounds(pool: &IpNet) -> AddrRange {
    let masked = pool.trunc();
    AddrRange {
        start: prefix::first_addr(&masked),
        end: prefix::last_addr(&masked),
    }
}

/// Clip one prefix to the pool bounds; `None` when entirely outside.
fn clip_to(bounds: AddrRange, net: &IpNet) -> Option<AddrRange> {
    let masked = net.trunc();
    let mut start = prefix::first_addr(&masked);
    let mut end = prefix::last_addr(&masked);
    if end < bounds.start || start > bounds.end {
        return None;
    }
    if start < bounds.start {
        start = bounds.start;
    }
    if end > bounds.end {
        end = bounds.end;
    }
    Some(AddrRange { start, end })
}

/// Build the sorted, merged used-range list for a pool from a set of
/// prefixes. Prefixes of the other family, or entirely outside the pool,
/// are ignored.
pub fn build_used_ranges(pool: &IpNet, used: &[IpNet]) -> Vec<AddrRange> {
    let family = Family::of(pool);
    let bounds = pool_bounds(pool);
    let mut ranges: Vec<AddrRange> = used
        .iter()
        .filter(|u| Family::of(u) == family)
        .filter_map(|u| clip_to(bounds, u))
        .collect();
    ranges.sort_by_key(|r| (r.start, r.end));
    merge_ranges(ranges)
}

/// Coalesce a sorted range list; adjacent ranges merge too.
pub fn merge_ranges(ranges: Vec<AddrRange>) -> Vec<AddrRange> {
    let mut out: Vec<AddrRange> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match out.last_mut() {
            Some(last) if last.end == u128::MAX || r.start <= last.end + 1 => {
                if r.end > last.end {
                    last.end = r.end;
                }
            }
            _ => out.push(r),
        }
    }
    out
}

/// Complement of the used ranges within the pool, in address order.
pub fn free_ranges(pool: &IpNet, used: &[AddrRange]) -> Vec<AddrRange> {
    let bounds = pool_bounds(pool);
    if used.is_empty() {
        return vec![bounds];
    }
    let mut gaps = Vec::new();
    let mut cur = bounds.start;
    for r in used {
        if r.start > cur {
            gaps.push(AddrRange {
                start: cur,
                end: r.start - 1,
            });
        }
        match r.end.checked_add(1) {
            Some(next) => {
                if next > cur {
                    cur = next;
                }
            }
            // Used range runs to the top of the address space.
            None => return gaps,
        }
        if cur > bounds.end {
            return gaps;
        }
    }
    if cur <= bounds.end {
        gaps.push(AddrRange {
            start: cur,
            end: bounds.end,
        });
    }
    gaps
}

/// Total address count across ranges; saturates on the full space.
pub fn sum_ranges(ranges: &[AddrRange]) -> u128 {
    ranges
        .iter()
        .fold(0u128, |acc, r| acc.saturating_add(r.size()))
}

fn block_size(bits: u8, len: u8) -> u128 {
    let host_bits = bits - len;
    if host_bits >= 128 {
        u128::MAX
    } else {
        1u128 << host_bits
    }
}

/// Decompose a free range into the minimal sequence of aligned CIDR
/// blocks: at each cursor position the largest prefix that starts there
/// (bounded by the cursor's trailing zeros) and fits the remainder.
pub fn range_to_blocks(range: AddrRange, family: Family) -> Vec<IpNet> {
    let bits = family.bits();
    let mut out = Vec::new();
    let mut start = range.start;
    while start <= range.end {
        let tz = if start == 0 {
            u32::from(bits)
        } else {
            start.trailing_zeros().min(u32::from(bits))
        };
        let mut len = (u32::from(bits) - tz) as u8;
        let remaining = (range.end - start).saturating_add(1);
        while len < bits && block_size(bits, len) > remaining {
            len += 1;
        }
        if let Some(net) = prefix::net_from_start(start, len, family) {
            out.push(net);
        }
        if len == 0 {
            break;
        }
        match start.checked_add(block_size(bits, len)) {
            Some(next) => start = next,
            None => break,
        }
    }
    out
}

/// Unit-aligned blocks of a fixed prefix length inside a free range, up to
/// `limit`. Used for IPv6 gap hints, where whole-range decomposition would
/// produce astronomically sized blocks.
pub fn range_unit_blocks(
    range: AddrRange,
    unit_len: u8,
    family: Family,
    limit: usize,
) -> Vec<IpNet> {
    let bits = family.bits();
    if unit_len == 0 || unit_len > bits || limit == 0 {
        return Vec::new();
    }
    let step = block_size(bits, unit_len);
    let mut out = Vec::new();
    let mut start = match prefix::align_up(range.start, step) {
        Some(v) => v,
        None => return out,
    };
    while out.len() < limit {
        let block_end = match start.checked_add(step - 1) {
            Some(v) => v,
            None => break,
        };
        if block_end > range.end {
            break;
        }
        match prefix::net_from_start(start, unit_len, family) {
            Some(net) => out.push(net),
            None => break,
        }
        start = match start.checked_add(step) {
            Some(v) => v,
            None => break,
        };
    }
    out
}
