//! Business joiner: aligns daily marketing totals with the business-outcomes
//! table on exact date equality.

use chrono::NaiveDate;
use marketing_intel_core::{BusinessRecord, DateRange, JoinPolicy, MarketingRecord};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::warn;

use crate::deriver::{DerivedMetrics, MetricInputs};

/// Marketing totals and business outcomes for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedDailyRow {
    pub date: NaiveDate,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub attributed_revenue: f64,
    pub orders: u64,
    pub new_orders: u64,
    pub new_customers: u64,
    pub total_revenue: f64,
    pub gross_profit: f64,
    pub cogs: f64,
    pub has_marketing: bool,
    pub has_business: bool,
    pub metrics: DerivedMetrics,
}

#[derive(Debug, Default)]
struct DailyMarketing {
    impressions: u64,
    clicks: u64,
    spend: f64,
    attributed_revenue: f64,
}

impl CombinedDailyRow {
    fn build(date: NaiveDate, marketing: Option<&DailyMarketing>, business: Option<&BusinessRecord>) -> Self {
        let mut row = Self {
            date,
            impressions: marketing.map_or(0, |m| m.impressions),
            clicks: marketing.map_or(0, |m| m.clicks),
            spend: marketing.map_or(0.0, |m| m.spend),
            attributed_revenue: marketing.map_or(0.0, |m| m.attributed_revenue),
            orders: business.map_or(0, |b| b.orders),
            new_orders: business.map_or(0, |b| b.new_orders),
            new_customers: business.map_or(0, |b| b.new_customers),
            total_revenue: business.map_or(0.0, |b| b.total_revenue),
            gross_profit: business.map_or(0.0, |b| b.gross_profit),
            cogs: business.map_or(0.0, |b| b.cogs),
            has_marketing: marketing.is_some(),
            has_business: business.is_some(),
            metrics: DerivedMetrics::default(),
        };
        row.metrics = DerivedMetrics::derive(&row);
        row
    }
}

impl MetricInputs for CombinedDailyRow {
    fn impressions(&self) -> u64 {
        self.impressions
    }
    fn clicks(&self) -> u64 {
        self.clicks
    }
    fn spend(&self) -> f64 {
        self.spend
    }
    fn attributed_revenue(&self) -> f64 {
        self.attributed_revenue
    }
    fn total_revenue(&self) -> f64 {
        self.total_revenue
    }
    fn new_customers(&self) -> u64 {
        self.new_customers
    }
}

/// Join marketing rows with business rows for every date inside `range`.
///
/// Output is sorted by date, one row per date.
pub fn join_daily<'a, I>(
    marketing: I,
    business: &[BusinessRecord],
    range: DateRange,
    policy: JoinPolicy,
) -> Vec<CombinedDailyRow>
where
    I: IntoIterator<Item = &'a MarketingRecord>,
{
    let mut daily: BTreeMap<NaiveDate, DailyMarketing> = BTreeMap::new();
    for record in marketing.into_iter().filter(|r| range.contains(r.date)) {
        let day = daily.entry(record.date).or_default();
        day.impressions = day.impressions.saturating_add(record.impressions);
        day.clicks = day.clicks.saturating_add(record.clicks);
        day.spend += record.spend;
        day.attributed_revenue += record.attributed_revenue;
    }

    let mut outcomes: BTreeMap<NaiveDate, &BusinessRecord> = BTreeMap::new();
    for record in business.iter().filter(|b| range.contains(b.date)) {
        match outcomes.entry(record.date) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(_) => {
                warn!(date = %record.date, "Duplicate business record ignored");
            }
        }
    }

    let dates: Vec<NaiveDate> = match policy {
        JoinPolicy::FillMissing => {
            let mut all: Vec<NaiveDate> = daily.keys().chain(outcomes.keys()).copied().collect();
            all.sort_unstable();
            all.dedup();
            all
        }
        JoinPolicy::BusinessDates => outcomes.keys().copied().collect(),
        JoinPolicy::MatchedOnly => daily
            .keys()
            .filter(|d| outcomes.contains_key(*d))
            .copied()
            .collect(),
    };

    dates
        .into_iter()
        .map(|date| CombinedDailyRow::build(date, daily.get(&date), outcomes.get(&date).copied()))
        .collect()
}
