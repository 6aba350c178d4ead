//! Derived efficiency metrics: ROAS, MER, CAC, CTR and CPC with a single
//! zero-denominator policy.

use marketing_intel_core::MarketingRecord;
use serde::{Deserialize, Serialize};

/// Divide, yielding 0 when the denominator is not positive or the quotient is
/// not finite. Every ratio in the crate goes through here.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        let value = numerator / denominator;
        if value.is_finite() {
            return value;
        }
    }
    0.0
}

/// Raw numerator/denominator fields a row or rollup exposes for derivation.
pub trait MetricInputs {
    fn impressions(&self) -> u64;
    fn clicks(&self) -> u64;
    fn spend(&self) -> f64;
    fn attributed_revenue(&self) -> f64;
    /// Business revenue; 0 when the row has no business side.
    fn total_revenue(&self) -> f64 {
        0.0
    }
    fn new_customers(&self) -> u64 {
        0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// attributed_revenue / spend
    pub roas: f64,
    /// total_revenue / spend
    pub mer: f64,
    /// spend / new_customers
    pub cac: f64,
    /// clicks / impressions, as a ratio
    pub ctr: f64,
    /// spend / clicks
    pub cpc: f64,
}

impl DerivedMetrics {
    pub fn derive<T: MetricInputs + ?Sized>(row: &T) -> Self {
        let spend = row.spend();
        Self {
            roas: safe_ratio(row.attributed_revenue(), spend),
            mer: safe_ratio(row.total_revenue(), spend),
            cac: safe_ratio(spend, row.new_customers() as f64),
            ctr: safe_ratio(row.clicks() as f64, row.impressions() as f64),
            cpc: safe_ratio(spend, row.clicks() as f64),
        }
    }

    /// CTR expressed as a percentage, as dashboards usually display it.
    pub fn ctr_percent(&self) -> f64 {
        self.ctr * 100.0
    }
}

impl MetricInputs for MarketingRecord {
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use marketing_intel_core::Channel;

    struct Inputs {
        impressions: u64,
        clicks: u64,
        spend: f64,
        attributed_revenue: f64,
        total_revenue: f64,
        new_customers: u64,
    }

    impl MetricInputs for Inputs {
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

    #[test]
    fn test_safe_ratio() {
        assert!((safe_ratio(400.0, 100.0) - 4.0).abs() < f64::EPSILON);
        assert_eq!(safe_ratio(5.0, 0.0), 0.0);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
        assert_eq!(safe_ratio(5.0, -1.0), 0.0);
        assert_eq!(safe_ratio(f64::MAX, f64::MIN_POSITIVE), 0.0);
        assert_eq!(safe_ratio(1.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_derive_all_metrics() {
        let m = DerivedMetrics::derive(&Inputs {
            impressions: 10_000,
            clicks: 250,
            spend: 500.0,
            attributed_revenue: 1_500.0,
            total_revenue: 4_000.0,
            new_customers: 20,
        });
        assert!((m.roas - 3.0).abs() < 1e-9);
        assert!((m.mer - 8.0).abs() < 1e-9);
        assert!((m.cac - 25.0).abs() < 1e-9);
        assert!((m.ctr - 0.025).abs() < 1e-9);
        assert!((m.ctr_percent() - 2.5).abs() < 1e-9);
        assert!((m.cpc - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        let m = DerivedMetrics::derive(&Inputs {
            impressions: 0,
            clicks: 0,
            spend: 0.0,
            attributed_revenue: 0.0,
            total_revenue: 900.0,
            new_customers: 0,
        });
        assert_eq!(m, DerivedMetrics::default());
    }

    #[test]
    fn test_zero_spend_record_roas_is_zero() {
        let record = MarketingRecord {
            date: NaiveDate::from_ymd_opt(2025, 5, 16).unwrap(),
            channel: Channel::TikTok,
            tactic: "Prospecting".into(),
            state: "TX".into(),
            campaign: "Brand Awareness".into(),
            impressions: 0,
            clicks: 0,
            spend: 0.0,
            attributed_revenue: 0.0,
        };
        let m = DerivedMetrics::derive(&record);
        assert_eq!(m.roas, 0.0);
        assert!(m.roas.is_finite());
        // Marketing rows carry no business side.
        assert_eq!(m.mer, 0.0);
        assert_eq!(m.cac, 0.0);
    }

    #[test]
    fn test_metrics_independent_per_denominator() {
        let m = DerivedMetrics::derive(&Inputs {
            impressions: 1_000,
            clicks: 0,
            spend: 80.0,
            attributed_revenue: 160.0,
            total_revenue: 0.0,
            new_customers: 4,
        });
        assert!((m.roas - 2.0).abs() < 1e-9);
        assert_eq!(m.ctr, 0.0);
        assert_eq!(m.cpc, 0.0);
        assert!((m.cac - 20.0).abs() < 1e-9);
    }
}
