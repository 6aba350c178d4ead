//! Campaign aggregator: unions the normalized channel tables into the single
//! marketing-activity table every downstream grouping reads from.

use chrono::NaiveDate;
use marketing_intel_core::{BusinessRecord, Channel, DateRange, IntelResult, MarketingRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use crate::normalizer::{normalize_business, normalize_channel, RawRecord};

/// Concatenate channel tables in the order given, keeping every row.
pub fn union_channels<I>(channels: I) -> Vec<MarketingRecord>
where
    I: IntoIterator<Item = Vec<MarketingRecord>>,
{
    channels.into_iter().flatten().collect()
}

/// Immutable snapshot of all loaded input tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketingDataset {
    marketing: Vec<MarketingRecord>,
    business: Vec<BusinessRecord>,
}

/// Selectable values for each filter dimension, with the overall date span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub channels: Vec<Channel>,
    pub states: Vec<String>,
    pub tactics: Vec<String>,
    pub date_bounds: Option<DateRange>,
}

impl MarketingDataset {
    pub fn new(marketing: Vec<MarketingRecord>, business: Vec<BusinessRecord>) -> Self {
        info!(
            marketing_rows = marketing.len(),
            business_rows = business.len(),
            "Marketing dataset built"
        );
        Self { marketing, business }
    }

    /// Normalize the four raw tables and union the channel rows
    /// (Facebook, Google, TikTok order). Fails on the first schema error.
    pub fn from_raw(
        facebook: &[RawRecord],
        google: &[RawRecord],
        tiktok: &[RawRecord],
        business: &[RawRecord],
    ) -> IntelResult<Self> {
        let marketing = union_channels([
            normalize_channel(Channel::Facebook, facebook)?,
            normalize_channel(Channel::Google, google)?,
            normalize_channel(Channel::TikTok, tiktok)?,
        ]);
        let business = normalize_business(business)?;
        metrics::counter!("reporting.rows_normalized")
            .increment((marketing.len() + business.len()) as u64);
        Ok(Self::new(marketing, business))
    }

    pub fn marketing(&self) -> &[MarketingRecord] {
        &self.marketing
    }

    pub fn business(&self) -> &[BusinessRecord] {
        &self.business
    }

    pub fn is_empty(&self) -> bool {
        self.marketing.is_empty() && self.business.is_empty()
    }

    /// Span of every date present in either table.
    pub fn date_bounds(&self) -> Option<DateRange> {
        DateRange::spanning(self.dates())
    }

    fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.marketing
            .iter()
            .map(|r| r.date)
            .chain(self.business.iter().map(|b| b.date))
    }

    pub fn filter_options(&self) -> FilterOptions {
        let channels: BTreeSet<Channel> = self.marketing.iter().map(|r| r.channel).collect();
        let states: BTreeSet<&str> = self.marketing.iter().map(|r| r.state.as_str()).collect();
        let tactics: BTreeSet<&str> = self.marketing.iter().map(|r| r.tactic.as_str()).collect();
        FilterOptions {
            channels: channels.into_iter().collect(),
            states: states.into_iter().map(String::from).collect(),
            tactics: tactics.into_iter().map(String::from).collect(),
            date_bounds: self.date_bounds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(channel: Channel, campaign: &str, day: u32) -> MarketingRecord {
        MarketingRecord {
            date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            channel,
            tactic: "Retargeting".into(),
            state: if day % 2 == 0 { "NY".into() } else { "CA".into() },
            campaign: campaign.into(),
            impressions: 100,
            clicks: 5,
            spend: 10.0,
            attributed_revenue: 30.0,
        }
    }

    #[test]
    fn test_union_preserves_order_and_duplicates() {
        let fb = vec![record(Channel::Facebook, "A", 1), record(Channel::Facebook, "A", 1)];
        let google = vec![record(Channel::Google, "B", 2)];
        let tiktok = vec![record(Channel::TikTok, "C", 3)];

        let all = union_channels([fb, google, tiktok]);
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], all[1]);
        assert_eq!(all[2].channel, Channel::Google);
        assert_eq!(all[3].campaign, "C");
    }

    #[test]
    fn test_filter_options_sorted_unique() {
        let dataset = MarketingDataset::new(
            vec![
                record(Channel::TikTok, "C", 4),
                record(Channel::Facebook, "A", 1),
                record(Channel::Facebook, "A", 3),
            ],
            vec![BusinessRecord {
                date: NaiveDate::from_ymd_opt(2025, 5, 9).unwrap(),
                orders: 1,
                new_orders: 1,
                new_customers: 1,
                total_revenue: 10.0,
                gross_profit: 2.0,
                cogs: 8.0,
            }],
        );
        let options = dataset.filter_options();
        assert_eq!(options.channels, vec![Channel::Facebook, Channel::TikTok]);
        assert_eq!(options.states, vec!["CA".to_string(), "NY".to_string()]);
        assert_eq!(options.tactics, vec!["Retargeting".to_string()]);
        let bounds = options.date_bounds.unwrap();
        assert_eq!(bounds.start, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        assert_eq!(bounds.end, NaiveDate::from_ymd_opt(2025, 5, 9).unwrap());
    }

    #[test]
    fn test_empty_dataset_has_no_bounds() {
        let dataset = MarketingDataset::default();
        assert!(dataset.is_empty());
        assert!(dataset.filter_options().date_bounds.is_none());
    }
}
