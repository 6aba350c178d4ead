//! Headline KPIs and chart series for the dashboard overview.

use chrono::NaiveDate;
use marketing_intel_core::{Filters, JoinPolicy};
use serde::{Deserialize, Serialize};

use crate::aggregation::rollup_by;
use crate::campaign::MarketingDataset;
use crate::deriver::safe_ratio;
use crate::joiner::join_daily;

/// Business-wide totals for the selected dates plus spend for the full filter
/// selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverviewKpis {
    pub total_revenue: f64,
    pub filtered_spend: f64,
    pub gross_profit: f64,
    pub new_customers: u64,
    pub mer: f64,
    pub cac: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub total_revenue: f64,
    pub gross_profit: f64,
}

/// One bubble of the campaign efficiency scatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignPoint {
    pub campaign: String,
    pub tactic: String,
    pub spend: f64,
    pub attributed_revenue: f64,
    pub impressions: u64,
    pub roas: f64,
}

/// Business outcomes are only restricted by date; channel, state and tactic
/// filters narrow the spend side.
pub fn overview(dataset: &MarketingDataset, filters: &Filters) -> OverviewKpis {
    let filtered_spend: f64 = dataset
        .marketing()
        .iter()
        .filter(|r| filters.matches(r))
        .map(|r| r.spend)
        .sum();

    let in_range = dataset
        .business()
        .iter()
        .filter(|b| filters.date_range.contains(b.date));
    let (total_revenue, gross_profit, new_customers) =
        in_range.fold((0.0, 0.0, 0u64), |(rev, profit, customers), b| {
            (
                rev + b.total_revenue,
                profit + b.gross_profit,
                customers.saturating_add(b.new_customers),
            )
        });

    OverviewKpis {
        total_revenue,
        filtered_spend,
        gross_profit,
        new_customers,
        mer: safe_ratio(total_revenue, filtered_spend),
        cac: safe_ratio(filtered_spend, new_customers as f64),
    }
}

/// Daily revenue and profit, one point per joined date.
pub fn revenue_trend(dataset: &MarketingDataset, filters: &Filters, policy: JoinPolicy) -> Vec<TrendPoint> {
    let matching = dataset.marketing().iter().filter(|r| filters.matches(r));
    join_daily(matching, dataset.business(), filters.date_range, policy)
        .into_iter()
        .map(|row| TrendPoint {
            date: row.date,
            total_revenue: row.total_revenue,
            gross_profit: row.gross_profit,
        })
        .collect()
}

/// Spend, revenue and ROAS per (campaign, tactic) pair.
pub fn campaign_efficiency(dataset: &MarketingDataset, filters: &Filters) -> Vec<CampaignPoint> {
    let matching = dataset.marketing().iter().filter(|r| filters.matches(r));
    rollup_by(
        matching,
        |r| (r.campaign.clone(), r.tactic.clone()),
        |(campaign, tactic)| format!("{campaign} / {tactic}"),
    )
    .into_iter()
    .map(|((campaign, tactic), rollup)| CampaignPoint {
        campaign,
        tactic,
        spend: rollup.spend,
        attributed_revenue: rollup.attributed_revenue,
        impressions: rollup.impressions,
        roas: rollup.metrics.roas,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketing_intel_core::{BusinessRecord, Channel, DateRange, MarketingRecord};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn record(d: u32, channel: Channel, campaign: &str, tactic: &str, spend: f64, revenue: f64) -> MarketingRecord {
        MarketingRecord {
            date: day(d),
            channel,
            tactic: tactic.into(),
            state: "OH".into(),
            campaign: campaign.into(),
            impressions: 1_000,
            clicks: 10,
            spend,
            attributed_revenue: revenue,
        }
    }

    fn business(d: u32, revenue: f64, profit: f64, customers: u64) -> BusinessRecord {
        BusinessRecord {
            date: day(d),
            orders: customers * 2,
            new_orders: customers,
            new_customers: customers,
            total_revenue: revenue,
            gross_profit: profit,
            cogs: revenue - profit,
        }
    }

    fn dataset() -> MarketingDataset {
        MarketingDataset::new(
            vec![
                record(1, Channel::Facebook, "Back to School", "Retargeting", 200.0, 600.0),
                record(1, Channel::Google, "Back to School", "Search", 100.0, 150.0),
                record(2, Channel::Facebook, "Back to School", "Retargeting", 100.0, 200.0),
                record(3, Channel::TikTok, "Creators", "Prospecting", 100.0, 50.0),
            ],
            vec![
                business(1, 5_000.0, 1_500.0, 20),
                business(2, 4_000.0, -100.0, 10),
                business(5, 1_000.0, 300.0, 5),
            ],
        )
    }

    #[test]
    fn test_overview_uses_filtered_spend_and_dated_business() {
        let filters = Filters::new(DateRange::new(day(1), day(2))).with_channels([Channel::Facebook]);
        let kpis = overview(&dataset(), &filters);

        assert!((kpis.filtered_spend - 300.0).abs() < 1e-9);
        assert!((kpis.total_revenue - 9_000.0).abs() < 1e-9);
        assert!((kpis.gross_profit - 1_400.0).abs() < 1e-9);
        assert_eq!(kpis.new_customers, 30);
        assert!((kpis.mer - 30.0).abs() < 1e-9);
        assert!((kpis.cac - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_overview_with_no_spend_zeroes_ratios() {
        let filters = Filters::new(DateRange::new(day(5), day(5)));
        let kpis = overview(&dataset(), &filters);
        assert_eq!(kpis.filtered_spend, 0.0);
        assert!((kpis.total_revenue - 1_000.0).abs() < 1e-9);
        assert_eq!(kpis.mer, 0.0);
        assert_eq!(kpis.cac, 0.0);
    }

    #[test]
    fn test_overview_customer_sum_saturates() {
        let dataset = MarketingDataset::new(
            vec![record(1, Channel::Google, "Brand", "Search", 10.0, 30.0)],
            [1, 2]
                .into_iter()
                .map(|d| BusinessRecord {
                    new_customers: u64::MAX,
                    ..business(d, 100.0, 10.0, 1)
                })
                .collect(),
        );
        let kpis = overview(&dataset, &Filters::new(DateRange::new(day(1), day(2))));
        assert_eq!(kpis.new_customers, u64::MAX);
        assert!(kpis.cac.is_finite());
    }

    #[test]
    fn test_revenue_trend_covers_all_dates() {
        let filters = Filters::new(DateRange::new(day(1), day(31)));
        let trend = revenue_trend(&dataset(), &filters, JoinPolicy::FillMissing);
        let dates: Vec<_> = trend.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3), day(5)]);
        assert_eq!(trend[2].total_revenue, 0.0);
        assert!((trend[1].gross_profit + 100.0).abs() < 1e-9);

        let business_only = revenue_trend(&dataset(), &filters, JoinPolicy::BusinessDates);
        assert_eq!(business_only.len(), 3);
    }

    #[test]
    fn test_campaign_efficiency_groups_pairs() {
        let filters = Filters::new(DateRange::new(day(1), day(31)));
        let points = campaign_efficiency(&dataset(), &filters);
        assert_eq!(points.len(), 3);

        let retargeting = &points[0];
        assert_eq!(retargeting.campaign, "Back to School");
        assert_eq!(retargeting.tactic, "Retargeting");
        assert!((retargeting.spend - 300.0).abs() < 1e-9);
        assert_eq!(retargeting.impressions, 2_000);
        assert!((retargeting.roas - 800.0 / 300.0).abs() < 1e-9);

        assert_eq!(points[1].tactic, "Search");
        assert!((points[2].roas - 0.5).abs() < 1e-9);
    }
}
