//! Randomized crowd movement policy for simulation ticks.
//!
//! The delta range a location may draw depends on its state, and the
//! result is always clamped back into `[0, capacity + 1]`.

use std::ops::RangeInclusive;

use crowdwatch_types::Location;
use rand::Rng;

/// Delta range while entry is closed: only decreases or holds.
pub const CLOSED_DELTA: RangeInclusive<i64> = -3..=0;

/// Delta range at or above capacity: at most one net arrival.
pub const FULL_DELTA: RangeInclusive<i64> = -2..=1;

/// Delta range for an open location below capacity.
pub const OPEN_DELTA: RangeInclusive<i64> = -3..=5;

/// The range a location's next simulated delta is drawn from.
pub fn delta_range(location: &Location) -> RangeInclusive<i64> {
    if location.entry_closed {
        CLOSED_DELTA
    } else if location.current_count >= location.capacity {
        FULL_DELTA
    } else {
        OPEN_DELTA
    }
}

/// Draw a random delta for `location` from its [`delta_range`].
pub fn draw_delta<R: Rng + ?Sized>(location: &Location, rng: &mut R) -> i64 {
    rng.random_range(delta_range(location))
}

/// Apply `delta` to the location's count, clamped to `[0, capacity + 1]`.
pub fn clamped_count(location: &Location, delta: i64) -> u32 {
    let ceiling = location.hard_limit();
    let moved = i64::from(location.current_count)
        .saturating_add(delta)
        .clamp(0, i64::from(ceiling));
    u32::try_from(moved).unwrap_or(ceiling)
}
