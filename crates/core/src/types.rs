use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::IntelError;

/// Advertising channel a marketing row was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    Facebook,
    Google,
    TikTok,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Facebook, Channel::Google, Channel::TikTok];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Facebook => "Facebook",
            Channel::Google => "Google",
            Channel::TikTok => "TikTok",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = IntelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facebook" => Ok(Channel::Facebook),
            "google" => Ok(Channel::Google),
            "tiktok" => Ok(Channel::TikTok),
            _ => Err(IntelError::UnknownChannel(s.to_string())),
        }
    }
}

/// One day of activity for a single channel/tactic/state/campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingRecord {
    pub date: NaiveDate,
    pub channel: Channel,
    pub tactic: String,
    pub state: String,
    pub campaign: String,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub attributed_revenue: f64,
}

/// Business outcomes for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub date: NaiveDate,
    pub orders: u64,
    pub new_orders: u64,
    pub new_customers: u64,
    pub total_revenue: f64,
    /// May be negative on loss-making days.
    pub gross_profit: f64,
    pub cogs: f64,
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Smallest range covering every given date, if any.
    pub fn spanning<I>(dates: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        dates.into_iter().fold(None, |acc, d| match acc {
            None => Some(Self::single(d)),
            Some(r) => Some(Self::new(r.start.min(d), r.end.max(d))),
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// How dates present in only one of the marketing/business tables are joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Keep every date from either side; the missing side is zeroed.
    #[default]
    FillMissing,
    /// Keep only dates with a business record; marketing-only dates are dropped.
    BusinessDates,
    /// Keep only dates present on both sides.
    MatchedOnly,
}

/// Immutable filter selection passed into every dashboard query.
///
/// `None` for a set means "no restriction"; an empty set matches nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub date_range: DateRange,
    #[serde(default)]
    pub channels: Option<BTreeSet<Channel>>,
    #[serde(default)]
    pub states: Option<BTreeSet<String>>,
    #[serde(default)]
    pub tactics: Option<BTreeSet<String>>,
}

impl Filters {
    pub fn new(date_range: DateRange) -> Self {
        Self {
            date_range,
            channels: None,
            states: None,
            tactics: None,
        }
    }

    pub fn with_channels<I: IntoIterator<Item = Channel>>(mut self, channels: I) -> Self {
        self.channels = Some(channels.into_iter().collect());
        self
    }

    pub fn with_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = Some(states.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_tactics<I, S>(mut self, tactics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tactics = Some(tactics.into_iter().map(Into::into).collect());
        self
    }

    pub fn matches(&self, record: &MarketingRecord) -> bool {
        self.date_range.contains(record.date)
            && self.channels.as_ref().is_none_or(|c| c.contains(&record.channel))
            && self.states.as_ref().is_none_or(|s| s.contains(&record.state))
            && self.tactics.as_ref().is_none_or(|t| t.contains(&record.tactic))
    }

    /// Number of dimension restrictions in effect, excluding the date range.
    pub fn restriction_count(&self) -> usize {
        [
            self.channels.is_some(),
            self.states.is_some(),
            self.tactics.is_some(),
        ]
        .into_iter()
        .filter(|b| *b)
        .count()
    }
}
