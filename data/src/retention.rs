use serde::{Deserialize, Serialize};

/// History cap for fixed-depth charts (tick streams).
pub const DEFAULT_MAX_POINTS: usize = 300;

/// Visible x-span in seconds for window-following charts (metric streams).
pub const DEFAULT_WINDOW_SECS: f64 = 200.0;

/// How much history to keep beyond the visible window, as a multiple of
/// the window size. The slack lets pans/redraws reuse buffered points
/// instead of re-fetching.
pub const RETAIN_WINDOW_MULTIPLIER: f64 = 2.0;

/// How much history a buffer keeps, decided after every ingest.
///
/// Tick charts are rendered with a fixed history depth regardless of
/// time span; metric charts as a moving time window regardless of
/// sample count. The two are not interchangeable, so the policy is
/// selected per stream and fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum Retention {
    FixedCapacity {
        max_points: usize,
    },
    WindowFollow {
        window_secs: f64,
        #[serde(default = "default_retain_multiplier")]
        retain_multiplier: f64,
    },
}

fn default_retain_multiplier() -> f64 {
    RETAIN_WINDOW_MULTIPLIER
}

impl Default for Retention {
    fn default() -> Self {
        Retention::FixedCapacity {
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

impl Retention {
    pub fn window_follow(window_secs: f64) -> Self {
        Retention::WindowFollow {
            window_secs,
            retain_multiplier: RETAIN_WINDOW_MULTIPLIER,
        }
    }

    /// How many leading points to drop after an append.
    pub fn trim_count(&self, timeline: &[f64]) -> usize {
        match *self {
            Retention::FixedCapacity { max_points } => timeline.len().saturating_sub(max_points),
            Retention::WindowFollow {
                window_secs,
                retain_multiplier,
            } => {
                let Some(&latest) = timeline.last() else {
                    return 0;
                };
                if !latest.is_finite() {
                    return 0;
                }
                find_trim_count(timeline, latest - window_secs * retain_multiplier)
            }
        }
    }

    /// The x-range the renderer should show. For a following window this
    /// is `[latest - window, latest]` no matter how much history is
    /// retained; for a fixed cap it is the full buffered span.
    pub fn visible_range(&self, timeline: &[f64]) -> Option<(f64, f64)> {
        let latest = *timeline.last()?;
        match *self {
            Retention::WindowFollow { window_secs, .. } => Some((latest - window_secs, latest)),
            Retention::FixedCapacity { .. } => Some((*timeline.first()?, latest)),
        }
    }

    pub fn visible_window_secs(&self) -> Option<f64> {
        match *self {
            Retention::WindowFollow { window_secs, .. } => Some(window_secs),
            Retention::FixedCapacity { .. } => None,
        }
    }
}

/// Count of leading timeline entries older than `cutoff`.
///
/// A non-decreasing timeline (the normal case) takes a binary search. A
/// timeline observed newest-first (`first > last`) falls back to a
/// linear scan from the front; feeds are never re-sorted.
fn find_trim_count(timeline: &[f64], cutoff: f64) -> usize {
    if timeline.len() > 1 && timeline[0] > timeline[timeline.len() - 1] {
        return timeline.iter().take_while(|&&ts| ts < cutoff).count();
    }

    timeline.partition_point(|&ts| ts < cutoff)
}

/// Pad a y-range by 20% of its spread so lines do not hug the plot
/// edges. A zero spread falls back to the magnitude of the value, then
/// to 1.0, so a flat series still gets a visible band.
pub fn padded_value_range(min: f64, max: f64) -> (f64, f64) {
    let spread = max - min;
    let base = if spread != 0.0 {
        spread
    } else if max != 0.0 {
        max.abs()
    } else {
        1.0
    };
    let pad = base * 0.2;

    (min - pad, max + pad)
}
