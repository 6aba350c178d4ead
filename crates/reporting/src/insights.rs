//! Insight engine: ranks channel or tactic rollups and picks the top
//! performer, an under-invested opportunity and an underperformer to review.

use marketing_intel_core::config::InsightConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::aggregation::Rollup;
use crate::deriver::safe_ratio;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    TopPerformer,
    Opportunity,
    Review,
}

/// Which kind of entity an insight is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightScope {
    Channel,
    Tactic,
}

impl fmt::Display for InsightScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightScope::Channel => f.write_str("channel"),
            InsightScope::Tactic => f.write_str("tactic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub scope: InsightScope,
    pub subject: String,
    pub roas: f64,
    pub spend: f64,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsightPolicy {
    pub min_spend_share: f64,
    pub min_spend_floor: f64,
    pub review_roas_ratio: f64,
}

impl Default for InsightPolicy {
    fn default() -> Self {
        Self::from(&InsightConfig::default())
    }
}

impl From<&InsightConfig> for InsightPolicy {
    fn from(config: &InsightConfig) -> Self {
        Self {
            min_spend_share: config.min_spend_share,
            min_spend_floor: config.min_spend_floor,
            review_roas_ratio: config.review_roas_ratio,
        }
    }
}

impl InsightPolicy {
    /// Every entity with non-zero spend is eligible.
    pub fn unthresholded() -> Self {
        Self {
            min_spend_share: 0.0,
            min_spend_floor: 0.0,
            ..Self::default()
        }
    }
}

pub struct InsightEngine {
    policy: InsightPolicy,
}

impl InsightEngine {
    pub fn new(policy: InsightPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &InsightPolicy {
        &self.policy
    }

    /// Spend an entity needs to compete for top performer and opportunity.
    pub fn spend_threshold(&self, rollups: &[Rollup]) -> f64 {
        let total: f64 = rollups.iter().map(|r| r.spend).sum();
        self.policy
            .min_spend_floor
            .max(self.policy.min_spend_share * total)
    }

    /// Rank one scope's rollups. Insights come back in category order, with
    /// categories lacking a candidate omitted.
    pub fn rank(&self, scope: InsightScope, rollups: &[Rollup]) -> Vec<Insight> {
        let threshold = self.spend_threshold(rollups);
        let total_spend: f64 = rollups.iter().map(|r| r.spend).sum();
        let total_revenue: f64 = rollups.iter().map(|r| r.attributed_revenue).sum();
        let average = safe_ratio(total_revenue, total_spend);

        let is_eligible = |r: &Rollup| r.spend > 0.0 && r.spend >= threshold;
        let eligible: Vec<&Rollup> = rollups.iter().filter(|r| is_eligible(r)).collect();

        let mut insights = Vec::new();

        let top = pick(eligible.iter().copied(), |c, cur| {
            c.metrics.roas > cur.metrics.roas
                || (c.metrics.roas == cur.metrics.roas && c.spend > cur.spend)
        });
        if let Some(top) = top {
            insights.push(Insight {
                category: InsightCategory::TopPerformer,
                scope,
                subject: top.key.clone(),
                roas: top.metrics.roas,
                spend: top.spend,
                rationale: format!(
                    "{} has the highest ROAS among {} eligible {}s: {:.2}x on ${:.2} spend (average {:.2}x).",
                    top.key,
                    eligible.len(),
                    scope,
                    top.metrics.roas,
                    top.spend,
                    average
                ),
            });
        }
        let is_top = |r: &Rollup| top.is_some_and(|t| t.key == r.key);

        let median = median_spend(&eligible);
        let opportunity = pick(
            eligible
                .iter()
                .copied()
                .filter(|r| !is_top(r) && r.metrics.roas > average && r.spend < median),
            |c, cur| {
                c.metrics.roas > cur.metrics.roas
                    || (c.metrics.roas == cur.metrics.roas && c.spend < cur.spend)
            },
        );
        if let Some(opp) = opportunity {
            insights.push(Insight {
                category: InsightCategory::Opportunity,
                scope,
                subject: opp.key.clone(),
                roas: opp.metrics.roas,
                spend: opp.spend,
                rationale: format!(
                    "{} returns {:.2}x ROAS, above the {:.2}x average, on ${:.2} spend, below the ${:.2} median; room to scale.",
                    opp.key, opp.metrics.roas, average, opp.spend, median
                ),
            });
        }

        // Below-threshold entities are reviewed only under the ROAS floor.
        let review_floor = average * self.policy.review_roas_ratio;
        let review = pick(
            rollups.iter().filter(|r| {
                !is_top(r)
                    && (is_eligible(r) || (r.spend > 0.0 && r.metrics.roas < review_floor))
            }),
            |c, cur| {
                c.metrics.roas < cur.metrics.roas
                    || (c.metrics.roas == cur.metrics.roas && c.spend > cur.spend)
            },
        );
        if let Some(rev) = review {
            insights.push(Insight {
                category: InsightCategory::Review,
                scope,
                subject: rev.key.clone(),
                roas: rev.metrics.roas,
                spend: rev.spend,
                rationale: format!(
                    "{} returns only {:.2}x ROAS on ${:.2} spend against a {:.2}x average; review this spend.",
                    rev.key, rev.metrics.roas, rev.spend, average
                ),
            });
        }

        debug!(
            scope = %scope,
            candidates = rollups.len(),
            eligible = eligible.len(),
            threshold,
            insights = insights.len(),
            "Insights ranked"
        );
        insights
    }
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new(InsightPolicy::default())
    }
}

/// First candidate wins unless a later one is strictly preferred.
fn pick<'r, I, P>(candidates: I, prefer: P) -> Option<&'r Rollup>
where
    I: Iterator<Item = &'r Rollup>,
    P: Fn(&Rollup, &Rollup) -> bool,
{
    candidates.fold(None, |best, c| match best {
        Some(cur) if !prefer(c, cur) => Some(cur),
        _ => Some(c),
    })
}

fn median_spend(rollups: &[&Rollup]) -> f64 {
    let mut spends: Vec<f64> = rollups.iter().map(|r| r.spend).collect();
    if spends.is_empty() {
        return 0.0;
    }
    spends.sort_by(f64::total_cmp);
    let mid = spends.len() / 2;
    if spends.len() % 2 == 0 {
        (spends[mid - 1] + spends[mid]) / 2.0
    } else {
        spends[mid]
    }
}
