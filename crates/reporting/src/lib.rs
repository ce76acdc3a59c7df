//! Episode delivery reporting: per-record derived metrics and rollups
//! across a campaign, a podcast's campaigns, or a brand's campaigns.
//!
//! Nothing here keeps running totals: rollups are recomputed from the
//! stored records on every read.

pub mod performance;
pub mod rollup;

pub use performance::{EpisodeMetrics, PerformanceRecord, RecordMetrics};
pub use rollup::{CampaignRollupInput, Rollup, RollupReport, Totals};

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
pub fn percent(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

/// Round to two decimals. Applied only when presenting, never to stored values.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}
