//! Episode-level delivery records and their derived rates.

use chrono::{DateTime, NaiveDate, Utc};
use podsponsor_core::{MarketError, MarketResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{percent, round2};

/// Upper bound on any single counter in one episode report.
pub const MAX_EPISODE_COUNT: u64 = 1_000_000_000_000;

/// Upper bound on revenue attributed to one episode.
pub const MAX_EPISODE_REVENUE: f64 = 1.0e12;

/// Raw counters reported for one episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetrics {
    /// Number of times the ad was heard.
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub unique_listeners: u64,
    /// Clicks on the tracking link.
    #[serde(default)]
    pub click_throughs: u64,
    #[serde(default)]
    pub promo_code_uses: u64,
    #[serde(default)]
    pub conversions: u64,
    #[serde(default)]
    pub revenue_generated: f64,
}

impl EpisodeMetrics {
    /// Reject counter combinations that would push a rate past 100%.
    pub fn validate(&self) -> MarketResult<()> {
        if !self.revenue_generated.is_finite() || self.revenue_generated < 0.0 {
            return Err(MarketError::validation(
                "revenue_generated must be a non-negative number",
            ));
        }
        if self.revenue_generated > MAX_EPISODE_REVENUE {
            return Err(MarketError::validation(format!(
                "revenue_generated may not exceed {MAX_EPISODE_REVENUE}"
            )));
        }
        let counters = [
            ("impressions", self.impressions),
            ("unique_listeners", self.unique_listeners),
            ("click_throughs", self.click_throughs),
            ("promo_code_uses", self.promo_code_uses),
            ("conversions", self.conversions),
        ];
        if let Some((name, _)) = counters.iter().find(|(_, v)| *v > MAX_EPISODE_COUNT) {
            return Err(MarketError::validation(format!(
                "{name} may not exceed {MAX_EPISODE_COUNT}"
            )));
        }
        if self.click_throughs > self.impressions {
            return Err(MarketError::validation(
                "click_throughs cannot exceed impressions",
            ));
        }
        if self.conversions > self.click_throughs {
            return Err(MarketError::validation(
                "conversions cannot exceed click_throughs",
            ));
        }
        if self.unique_listeners > self.impressions {
            return Err(MarketError::validation(
                "unique_listeners cannot exceed impressions",
            ));
        }
        Ok(())
    }

    pub fn click_through_rate(&self) -> f64 {
        percent(self.click_throughs as f64, self.impressions as f64)
    }

    pub fn conversion_rate(&self) -> f64 {
        percent(self.conversions as f64, self.click_throughs as f64)
    }
}

/// One stored delivery report tied to a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub episode_title: Option<String>,
    pub episode_date: Option<NaiveDate>,
    pub episode_number: u32,
    #[serde(flatten)]
    pub metrics: EpisodeMetrics,
    pub attribution_days: u32,
    pub tracked_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl PerformanceRecord {
    pub fn click_through_rate(&self) -> f64 {
        self.metrics.click_through_rate()
    }

    pub fn conversion_rate(&self) -> f64 {
        self.metrics.conversion_rate()
    }

    /// Return on a single episode against the per-episode cost.
    ///
    /// 0 when the cost is 0.
    pub fn roi(&self, episode_cost: f64) -> f64 {
        percent(self.metrics.revenue_generated - episode_cost, episode_cost)
    }

    /// Rounded view of the derived rates, for presentation.
    pub fn derived(&self, episode_cost: f64) -> RecordMetrics {
        RecordMetrics {
            click_through_rate: round2(self.click_through_rate()),
            conversion_rate: round2(self.conversion_rate()),
            roi: round2(self.roi(episode_cost)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordMetrics {
    pub click_through_rate: f64,
    pub conversion_rate: f64,
    pub roi: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(metrics: EpisodeMetrics) -> PerformanceRecord {
        PerformanceRecord {
            id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            episode_title: Some("Ep. 12".to_string()),
            episode_date: None,
            episode_number: 12,
            metrics,
            attribution_days: 30,
            tracked_date: Utc::now().date_naive(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rates() {
        let r = record(EpisodeMetrics {
            impressions: 10_000,
            unique_listeners: 8_000,
            click_throughs: 250,
            promo_code_uses: 40,
            conversions: 50,
            revenue_generated: 1_500.0,
        });
        assert!((r.click_through_rate() - 2.5).abs() < 1e-9);
        assert!((r.conversion_rate() - 20.0).abs() < 1e-9);
        // (1500 - 300) / 300 * 100
        assert!((r.roi(300.0) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        let r = record(EpisodeMetrics {
            revenue_generated: 80.0,
            ..Default::default()
        });
        assert_eq!(r.click_through_rate(), 0.0);
        assert_eq!(r.conversion_rate(), 0.0);
        assert_eq!(r.roi(0.0), 0.0);
    }

    #[test]
    fn test_validation_keeps_rates_bounded() {
        let too_many_clicks = EpisodeMetrics {
            impressions: 10,
            click_throughs: 11,
            ..Default::default()
        };
        assert!(matches!(
            too_many_clicks.validate(),
            Err(MarketError::Validation(_))
        ));

        let too_many_conversions = EpisodeMetrics {
            impressions: 10,
            click_throughs: 2,
            conversions: 3,
            ..Default::default()
        };
        assert!(too_many_conversions.validate().is_err());

        let huge_audience = EpisodeMetrics {
            impressions: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            huge_audience.validate(),
            Err(MarketError::Validation(_))
        ));

        let huge_revenue = EpisodeMetrics {
            revenue_generated: f64::MAX,
            ..Default::default()
        };
        assert!(huge_revenue.validate().is_err());

        let at_limit = EpisodeMetrics {
            impressions: MAX_EPISODE_COUNT,
            revenue_generated: MAX_EPISODE_REVENUE,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());

        let negative_revenue = EpisodeMetrics {
            revenue_generated: -1.0,
            ..Default::default()
        };
        assert!(negative_revenue.validate().is_err());

        let full = EpisodeMetrics {
            impressions: 10,
            unique_listeners: 10,
            click_throughs: 10,
            conversions: 10,
            ..Default::default()
        };
        assert!(full.validate().is_ok());
        assert_eq!(full.click_through_rate(), 100.0);
        assert_eq!(full.conversion_rate(), 100.0);
    }

    #[test]
    fn test_derived_is_rounded() {
        let r = record(EpisodeMetrics {
            impressions: 3,
            click_throughs: 1,
            conversions: 1,
            ..Default::default()
        });
        let d = r.derived(0.0);
        assert_eq!(d.click_through_rate, 33.33);
        assert_eq!(d.conversion_rate, 100.0);
        assert_eq!(d.roi, 0.0);
    }

    #[test]
    fn test_record_serializes_flat() {
        let r = record(EpisodeMetrics {
            impressions: 5,
            ..Default::default()
        });
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["impressions"], 5);
        assert!(json.get("metrics").is_none());
    }
}
