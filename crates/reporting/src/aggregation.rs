//! Aggregation engine: filters the combined dataset and rolls it up by a
//! single dimension, deriving metrics from the summed totals.

use marketing_intel_core::{Filters, IntelError, JoinPolicy, MarketingRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use tracing::debug;

use crate::campaign::MarketingDataset;
use crate::deriver::{DerivedMetrics, MetricInputs};
use crate::joiner::{join_daily, CombinedDailyRow};

/// Dimension a rollup can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Date,
    Channel,
    Tactic,
    State,
    Campaign,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Date => "date",
            Dimension::Channel => "channel",
            Dimension::Tactic => "tactic",
            Dimension::State => "state",
            Dimension::Campaign => "campaign",
        }
    }

    fn key_of(&self, record: &MarketingRecord) -> String {
        match self {
            Dimension::Date => record.date.to_string(),
            Dimension::Channel => record.channel.to_string(),
            Dimension::Tactic => record.tactic.clone(),
            Dimension::State => record.state.clone(),
            Dimension::Campaign => record.campaign.clone(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = IntelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Dimension::Date),
            "channel" | "platform" => Ok(Dimension::Channel),
            "tactic" => Ok(Dimension::Tactic),
            "state" => Ok(Dimension::State),
            "campaign" => Ok(Dimension::Campaign),
            _ => Err(IntelError::UnknownDimension(s.to_string())),
        }
    }
}

/// Business outcomes summed over a date rollup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessTotals {
    pub orders: u64,
    pub new_orders: u64,
    pub new_customers: u64,
    pub total_revenue: f64,
    pub gross_profit: f64,
    pub cogs: f64,
}

impl BusinessTotals {
    fn add(&mut self, other: &BusinessTotals) {
        self.orders = self.orders.saturating_add(other.orders);
        self.new_orders = self.new_orders.saturating_add(other.new_orders);
        self.new_customers = self.new_customers.saturating_add(other.new_customers);
        self.total_revenue += other.total_revenue;
        self.gross_profit += other.gross_profit;
        self.cogs += other.cogs;
    }
}

/// Summed raw fields for one group plus metrics derived from those sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rollup {
    pub key: String,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub attributed_revenue: f64,
    /// Present only for date rollups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessTotals>,
    pub metrics: DerivedMetrics,
}

impl Rollup {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            impressions: 0,
            clicks: 0,
            spend: 0.0,
            attributed_revenue: 0.0,
            business: None,
            metrics: DerivedMetrics::default(),
        }
    }

    fn add_record(&mut self, record: &MarketingRecord) {
        self.impressions = self.impressions.saturating_add(record.impressions);
        self.clicks = self.clicks.saturating_add(record.clicks);
        self.spend += record.spend;
        self.attributed_revenue += record.attributed_revenue;
    }

    fn from_daily(row: &CombinedDailyRow) -> Self {
        let mut rollup = Self {
            key: row.date.to_string(),
            impressions: row.impressions,
            clicks: row.clicks,
            spend: row.spend,
            attributed_revenue: row.attributed_revenue,
            business: Some(BusinessTotals {
                orders: row.orders,
                new_orders: row.new_orders,
                new_customers: row.new_customers,
                total_revenue: row.total_revenue,
                gross_profit: row.gross_profit,
                cogs: row.cogs,
            }),
            metrics: DerivedMetrics::default(),
        };
        rollup.finish();
        rollup
    }

    /// Add another rollup's raw sums into this one.
    pub fn merge(&mut self, other: &Rollup) {
        self.impressions = self.impressions.saturating_add(other.impressions);
        self.clicks = self.clicks.saturating_add(other.clicks);
        self.spend += other.spend;
        self.attributed_revenue += other.attributed_revenue;
        if let Some(theirs) = &other.business {
            self.business.get_or_insert_with(BusinessTotals::default).add(theirs);
        }
        self.finish();
    }

    fn finish(&mut self) {
        self.metrics = DerivedMetrics::derive(self);
    }
}

impl MetricInputs for Rollup {
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
        self.business.map_or(0.0, |b| b.total_revenue)
    }
    fn new_customers(&self) -> u64 {
        self.business.map_or(0, |b| b.new_customers)
    }
}

/// Field a result can be ranked by. Sorting is always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Roas,
    Mer,
    Cac,
    Ctr,
    Cpc,
    Spend,
    AttributedRevenue,
    Impressions,
    Clicks,
}

impl SortKey {
    pub fn value(&self, rollup: &Rollup) -> f64 {
        match self {
            SortKey::Roas => rollup.metrics.roas,
            SortKey::Mer => rollup.metrics.mer,
            SortKey::Cac => rollup.metrics.cac,
            SortKey::Ctr => rollup.metrics.ctr,
            SortKey::Cpc => rollup.metrics.cpc,
            SortKey::Spend => rollup.spend,
            SortKey::AttributedRevenue => rollup.attributed_revenue,
            SortKey::Impressions => rollup.impressions as f64,
            SortKey::Clicks => rollup.clicks as f64,
        }
    }
}

impl FromStr for SortKey {
    type Err = IntelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "roas" => Ok(SortKey::Roas),
            "mer" => Ok(SortKey::Mer),
            "cac" => Ok(SortKey::Cac),
            "ctr" => Ok(SortKey::Ctr),
            "cpc" => Ok(SortKey::Cpc),
            "spend" => Ok(SortKey::Spend),
            "attributed_revenue" | "revenue" => Ok(SortKey::AttributedRevenue),
            "impressions" => Ok(SortKey::Impressions),
            "clicks" => Ok(SortKey::Clicks),
            _ => Err(IntelError::UnknownSortKey(s.to_string())),
        }
    }
}

/// Ordered mapping from group value to rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub dimension: Dimension,
    pub groups: Vec<Rollup>,
}

impl AggregationResult {
    pub fn empty(dimension: Dimension) -> Self {
        Self {
            dimension,
            groups: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Rollup> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.key.as_str())
    }

    /// Re-order groups by `key`, highest first. Ties keep their current order.
    pub fn sorted_by(mut self, key: SortKey) -> Self {
        self.groups.sort_by(|a, b| key.value(b).total_cmp(&key.value(a)));
        self
    }

    pub fn truncate(mut self, limit: usize) -> Self {
        self.groups.truncate(limit);
        self
    }

    /// Single rollup over every group, metrics derived from the grand sums.
    pub fn totals(&self) -> Rollup {
        let mut total = Rollup::new("total");
        for group in &self.groups {
            total.merge(group);
        }
        total
    }
}

/// Group `records` by an arbitrary key, preserving first-occurrence order.
pub(crate) fn rollup_by<'a, K, I, F, L>(records: I, key_fn: F, label: L) -> Vec<(K, Rollup)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = &'a MarketingRecord>,
    F: Fn(&MarketingRecord) -> K,
    L: Fn(&K) -> String,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Rollup)> = Vec::new();
    for record in records {
        let key = key_fn(record);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key.clone(), Rollup::new(label(&key))));
            groups.len() - 1
        });
        groups[slot].1.add_record(record);
    }
    for (_, rollup) in &mut groups {
        rollup.finish();
    }
    groups
}

/// Roll the filtered dataset up by `dimension`.
///
/// Filters are applied before grouping. Date rollups come from the business
/// join and carry business totals; other dimensions cover marketing fields only.
///
/// Channel, state and tactic filters narrow only the marketing side. Date
/// rollups therefore still list business dates in range when no marketing row
/// matches (with zeroed marketing sums) unless the join policy drops dates
/// lacking marketing activity.
pub fn aggregate(
    dataset: &MarketingDataset,
    filters: &Filters,
    dimension: Dimension,
    policy: JoinPolicy,
) -> AggregationResult {
    let matching = dataset.marketing().iter().filter(|r| filters.matches(r));

    let groups: Vec<Rollup> = match dimension {
        Dimension::Date => join_daily(matching, dataset.business(), filters.date_range, policy)
            .iter()
            .map(Rollup::from_daily)
            .collect(),
        _ => rollup_by(matching, |r| dimension.key_of(r), |k| k.clone())
            .into_iter()
            .map(|(_, rollup)| rollup)
            .collect(),
    };

    debug!(
        dimension = %dimension,
        range = %filters.date_range,
        restrictions = filters.restriction_count(),
        groups = groups.len(),
        "Aggregation computed"
    );

    AggregationResult { dimension, groups }
}
