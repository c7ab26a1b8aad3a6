//! Lanes - priority markers for pending work.
//!
//! Only [`Lanes::DEFAULT`] is produced today. The merge and selection helpers
//! exist so additional priorities can be layered on without touching fibers.

bitflags::bitflags! {
    /// Set of priority lanes. Lower bits are more urgent.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Lanes: u32 {
        const NO_LANES = 0;
        const SYNC = 1 << 0;
        const DEFAULT = 1 << 4;
        const IDLE = 1 << 29;
    }
}

/// Union of two lane sets.
#[inline]
pub fn merge_lanes(a: Lanes, b: Lanes) -> Lanes {
    a | b
}

/// Whether `set` contains any lane of `subset`.
#[inline]
pub fn includes_some_lane(set: Lanes, subset: Lanes) -> bool {
    set.intersects(subset)
}

/// Most urgent single lane in `lanes` (lowest set bit).
#[inline]
pub fn highest_priority_lane(lanes: Lanes) -> Lanes {
    let bits = lanes.bits();
    Lanes::from_bits_retain(bits & bits.wrapping_neg())
}
