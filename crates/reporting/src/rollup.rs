//! Aggregate delivery metrics over a set of campaigns.

use serde::{Deserialize, Serialize};

use crate::performance::PerformanceRecord;
use crate::{percent, round2};

/// What the rollup needs to know about one campaign in scope.
#[derive(Debug, Clone, Copy)]
pub struct CampaignRollupInput<'a> {
    /// Negotiated rate if set, else the proposed rate.
    pub rate_in_effect: f64,
    pub episodes_completed: u32,
    pub is_active: bool,
    pub is_completed: bool,
    pub records: &'a [PerformanceRecord],
}

impl CampaignRollupInput<'_> {
    /// What the advertiser owes for the episodes delivered so far.
    pub fn cost(&self) -> f64 {
        self.rate_in_effect * f64::from(self.episodes_completed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub impressions: u64,
    pub unique_listeners: u64,
    pub click_throughs: u64,
    pub promo_code_uses: u64,
    pub conversions: u64,
    pub revenue: f64,
}

impl Totals {
    fn add(&mut self, record: &PerformanceRecord) {
        let m = &record.metrics;
        self.impressions = self.impressions.saturating_add(m.impressions);
        self.unique_listeners = self.unique_listeners.saturating_add(m.unique_listeners);
        self.click_throughs = self.click_throughs.saturating_add(m.click_throughs);
        self.promo_code_uses = self.promo_code_uses.saturating_add(m.promo_code_uses);
        self.conversions = self.conversions.saturating_add(m.conversions);
        let revenue = self.revenue + m.revenue_generated;
        if revenue.is_finite() {
            self.revenue = revenue;
        } else {
            self.revenue = f64::MAX;
        }
    }
}

/// Unrounded rollup. Call [`Rollup::report`] at the presentation boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rollup {
    pub campaign_count: usize,
    pub active_campaigns: usize,
    pub completed_campaigns: usize,
    pub record_count: usize,
    pub totals: Totals,
    pub aggregate_cost: f64,
}

impl Rollup {
    pub fn compute<'a, I>(campaigns: I) -> Self
    where
        I: IntoIterator<Item = CampaignRollupInput<'a>>,
    {
        let mut rollup = Rollup::default();
        for campaign in campaigns {
            rollup.campaign_count += 1;
            if campaign.is_active {
                rollup.active_campaigns += 1;
            }
            if campaign.is_completed {
                rollup.completed_campaigns += 1;
            }
            rollup.aggregate_cost += campaign.cost();
            for record in campaign.records {
                rollup.totals.add(record);
                rollup.record_count += 1;
            }
        }
        rollup
    }

    pub fn click_through_rate(&self) -> f64 {
        percent(
            self.totals.click_throughs as f64,
            self.totals.impressions as f64,
        )
    }

    pub fn conversion_rate(&self) -> f64 {
        percent(
            self.totals.conversions as f64,
            self.totals.click_throughs as f64,
        )
    }

    pub fn roi(&self) -> f64 {
        percent(self.totals.revenue - self.aggregate_cost, self.aggregate_cost)
    }

    pub fn cost_per_conversion(&self) -> f64 {
        if self.totals.conversions == 0 {
            0.0
        } else {
            self.aggregate_cost / self.totals.conversions as f64
        }
    }

    pub fn average_campaign_cost(&self) -> f64 {
        if self.campaign_count == 0 {
            0.0
        } else {
            self.aggregate_cost / self.campaign_count as f64
        }
    }

    pub fn report(&self) -> RollupReport {
        RollupReport {
            campaign_count: self.campaign_count,
            active_campaigns: self.active_campaigns,
            completed_campaigns: self.completed_campaigns,
            record_count: self.record_count,
            totals: self.totals.clone(),
            aggregate_cost: round2(self.aggregate_cost),
            click_through_rate: round2(self.click_through_rate()),
            conversion_rate: round2(self.conversion_rate()),
            roi: round2(self.roi()),
            cost_per_conversion: round2(self.cost_per_conversion()),
            average_campaign_cost: round2(self.average_campaign_cost()),
        }
    }
}

/// Presentation form of a [`Rollup`]; money and percentages rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupReport {
    pub campaign_count: usize,
    pub active_campaigns: usize,
    pub completed_campaigns: usize,
    pub record_count: usize,
    pub totals: Totals,
    pub aggregate_cost: f64,
    pub click_through_rate: f64,
    pub conversion_rate: f64,
    pub roi: f64,
    pub cost_per_conversion: f64,
    pub average_campaign_cost: f64,
}
