//! Time-of-day crowd forecast heuristic.
//!
//! Not a model: each upcoming hour gets a fixed base load by time-of-day
//! bucket, nudged by bounded random jitter and clamped to `[0, 1]`.
//!
//! | Hours (local) | Base load |
//! |---------------|-----------|
//! | 11:00-14:59 | 0.8 (midday peak) |
//! | 17:00-19:59 | 0.6 (evening) |
//! | 22:00-06:59 | 0.1 (night trough) |
//! | otherwise | 0.3 |

use chrono::{DateTime, Duration, FixedOffset, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default number of hourly points in a forecast.
pub const DEFAULT_FORECAST_HOURS: u32 = 5;

/// Default jitter bound applied to the base load.
pub const DEFAULT_JITTER: f64 = 0.1;

/// One hourly forecast bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Local clock time of the bucket, `"%I:%M %p"`.
    pub time: String,
    /// Local hour of day (0-23).
    pub hour: u32,
    /// Predicted head count, always within `[0, capacity]`.
    pub predicted_count: u32,
    /// Capacity of the location.
    pub capacity: u32,
    /// Predicted load in whole percent (0-100).
    pub load_percentage: u32,
}

/// Base load factor for a local hour of day.
pub fn base_load(hour: u32) -> f64 {
    match hour {
        11..=14 => 0.8,
        17..=19 => 0.6,
        0..=6 | 22..=23 => 0.1,
        _ => 0.3,
    }
}

/// Forecast `hours` hourly buckets starting at `now`.
///
/// `jitter` bounds the uniform perturbation added to each base load; a
/// non-positive jitter makes the forecast fully deterministic.
pub fn forecast<R: Rng + ?Sized>(
    capacity: u32,
    now: DateTime<FixedOffset>,
    hours: u32,
    jitter: f64,
    rng: &mut R,
) -> Vec<ForecastPoint> {
    (0..hours)
        .filter_map(|offset| {
            let at = now.checked_add_signed(Duration::hours(i64::from(offset)))?;
            let hour = at.hour();
            let noise = if jitter > 0.0 {
                rng.random_range(-jitter..=jitter)
            } else {
                0.0
            };
            let load = (base_load(hour) + noise).clamp(0.0, 1.0);

            Some(ForecastPoint {
                time: at.format("%I:%M %p").to_string(),
                hour,
                predicted_count: scale(capacity, load),
                capacity,
                load_percentage: scale(100, load),
            })
        })
        .collect()
}

/// `floor(total * load)` for a load already clamped to `[0, 1]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(total: u32, load: f64) -> u32 {
    let scaled = (f64::from(total) * load).floor();
    // load is within [0, 1], so the product fits in [0, total].
    (scaled as u32).min(total)
}
