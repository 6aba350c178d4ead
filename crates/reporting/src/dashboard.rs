//! Marketing dashboard: query facade over an immutable dataset snapshot.
//!
//! Every call takes explicit filters and recomputes from the loaded tables; the
//! dashboard itself holds no mutable state and can be shared across threads.

use marketing_intel_core::{AppConfig, Filters, JoinPolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::aggregation::{aggregate, AggregationResult, Dimension, SortKey};
use crate::campaign::{FilterOptions, MarketingDataset};
use crate::insights::{Insight, InsightEngine, InsightPolicy, InsightScope};
use crate::kpi::{self, CampaignPoint, OverviewKpis, TrendPoint};

/// Everything the dashboard page renders for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub filters: Filters,
    pub overview: OverviewKpis,
    pub revenue_trend: Vec<TrendPoint>,
    pub channel_performance: AggregationResult,
    pub tactic_performance: AggregationResult,
    pub top_states: AggregationResult,
    pub campaigns: Vec<CampaignPoint>,
    pub insights: Vec<Insight>,
}

pub struct MarketingDashboard {
    dataset: Arc<MarketingDataset>,
    join_policy: JoinPolicy,
    engine: InsightEngine,
    top_states: usize,
}

impl MarketingDashboard {
    pub fn new(dataset: MarketingDataset) -> Self {
        Self::with_config(Arc::new(dataset), &AppConfig::default())
    }

    pub fn with_config(dataset: Arc<MarketingDataset>, config: &AppConfig) -> Self {
        Self {
            dataset,
            join_policy: config.join.policy,
            engine: InsightEngine::new(InsightPolicy::from(&config.insights)),
            top_states: config.report.top_states,
        }
    }

    pub fn with_join_policy(mut self, policy: JoinPolicy) -> Self {
        self.join_policy = policy;
        self
    }

    pub fn with_insight_policy(mut self, policy: InsightPolicy) -> Self {
        self.engine = InsightEngine::new(policy);
        self
    }

    pub fn dataset(&self) -> &MarketingDataset {
        &self.dataset
    }

    pub fn join_policy(&self) -> JoinPolicy {
        self.join_policy
    }

    pub fn filter_options(&self) -> FilterOptions {
        self.dataset.filter_options()
    }

    /// Everything selected over the full data span; `None` for an empty dataset.
    pub fn default_filters(&self) -> Option<Filters> {
        self.dataset.date_bounds().map(Filters::new)
    }

    pub fn compute(&self, filters: &Filters, dimension: Dimension) -> AggregationResult {
        metrics::counter!("reporting.queries", "dimension" => dimension.as_str()).increment(1);
        aggregate(&self.dataset, filters, dimension, self.join_policy)
    }

    pub fn compute_sorted(&self, filters: &Filters, dimension: Dimension, sort: SortKey) -> AggregationResult {
        self.compute(filters, dimension).sorted_by(sort)
    }

    /// Channel insights followed by tactic insights.
    pub fn insights(&self, filters: &Filters) -> Vec<Insight> {
        let channels = self.compute(filters, Dimension::Channel);
        let tactics = self.compute(filters, Dimension::Tactic);
        let mut insights = self.engine.rank(InsightScope::Channel, &channels.groups);
        insights.extend(self.engine.rank(InsightScope::Tactic, &tactics.groups));
        insights
    }

    pub fn overview(&self, filters: &Filters) -> OverviewKpis {
        kpi::overview(&self.dataset, filters)
    }

    pub fn revenue_trend(&self, filters: &Filters) -> Vec<TrendPoint> {
        kpi::revenue_trend(&self.dataset, filters, self.join_policy)
    }

    pub fn campaign_efficiency(&self, filters: &Filters) -> Vec<CampaignPoint> {
        kpi::campaign_efficiency(&self.dataset, filters)
    }

    pub fn top_states(&self, filters: &Filters) -> AggregationResult {
        self.compute_sorted(filters, Dimension::State, SortKey::Spend)
            .truncate(self.top_states)
    }

    pub fn snapshot(&self, filters: &Filters) -> DashboardSnapshot {
        let insights = self.insights(filters);

        debug!(range = %filters.date_range, insights = insights.len(), "Dashboard snapshot built");

        DashboardSnapshot {
            filters: filters.clone(),
            overview: self.overview(filters),
            revenue_trend: self.revenue_trend(filters),
            channel_performance: self.compute_sorted(filters, Dimension::Channel, SortKey::Roas),
            tactic_performance: self.compute_sorted(filters, Dimension::Tactic, SortKey::Roas),
            top_states: self.top_states(filters),
            campaigns: self.campaign_efficiency(filters),
            insights,
        }
    }
}
