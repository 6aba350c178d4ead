//! Channel normalizer: validates raw tabular rows once at the boundary and
//! maps them into typed marketing and business records.

use chrono::NaiveDate;
use marketing_intel_core::{BusinessRecord, Channel, IntelError, IntelResult, MarketingRecord};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One untyped input row: column header to cell text.
pub type RawRecord = BTreeMap<String, String>;

pub const MARKETING_FIELDS: [&str; 8] = [
    "date",
    "tactic",
    "state",
    "campaign",
    "impressions",
    "clicks",
    "spend",
    "attributed_revenue",
];

pub const BUSINESS_FIELDS: [&str; 7] = [
    "date",
    "orders",
    "new_orders",
    "new_customers",
    "total_revenue",
    "gross_profit",
    "cogs",
];

const BUSINESS_SOURCE: &str = "Business";
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// `"Attributed Revenue"` → `attributed_revenue`; the singular `impression`
/// column some exports use is accepted as `impressions`.
pub fn canonical_marketing_header(header: &str) -> String {
    let key = snake_case(header);
    if key == "impression" {
        "impressions".to_string()
    } else {
        key
    }
}

/// `"# of New Orders"` → `new_orders`.
pub fn canonical_business_header(header: &str) -> String {
    snake_case(&header.trim().to_lowercase().replace("# of ", ""))
}

fn snake_case(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

/// Normalize one channel's rows, tagging each with `channel`.
pub fn normalize_channel(channel: Channel, rows: &[RawRecord]) -> IntelResult<Vec<MarketingRecord>> {
    let source = channel.as_str();
    let records = rows
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let row = RowReader::new(source, i + 1, raw, canonical_marketing_header);
            row.require_all(&MARKETING_FIELDS)?;
            Ok(MarketingRecord {
                date: row.date("date")?,
                channel,
                tactic: row.text("tactic")?,
                state: row.text("state")?,
                campaign: row.text("campaign")?,
                impressions: row.count("impressions")?,
                clicks: row.count("clicks")?,
                spend: row.amount("spend")?,
                attributed_revenue: row.amount("attributed_revenue")?,
            })
        })
        .collect::<IntelResult<Vec<_>>>()?;

    debug!(channel = %channel, rows = records.len(), "Normalized channel rows");
    Ok(records)
}

/// Normalize the daily business-outcomes rows.
pub fn normalize_business(rows: &[RawRecord]) -> IntelResult<Vec<BusinessRecord>> {
    let records = rows
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let row = RowReader::new(BUSINESS_SOURCE, i + 1, raw, canonical_business_header);
            row.require_all(&BUSINESS_FIELDS)?;
            Ok(BusinessRecord {
                date: row.date("date")?,
                orders: row.count("orders")?,
                new_orders: row.count("new_orders")?,
                new_customers: row.count("new_customers")?,
                total_revenue: row.amount("total_revenue")?,
                gross_profit: row.amount("gross_profit")?,
                cogs: row.amount("cogs")?,
            })
        })
        .collect::<IntelResult<Vec<_>>>()?;

    debug!(rows = records.len(), "Normalized business rows");
    Ok(records)
}

/// Typed field access over a single raw row with canonicalized headers.
struct RowReader<'a> {
    source: &'a str,
    row: usize,
    cells: HashMap<String, &'a str>,
}

impl<'a> RowReader<'a> {
    fn new(source: &'a str, row: usize, raw: &'a RawRecord, canonical: fn(&str) -> String) -> Self {
        let cells = raw
            .iter()
            .map(|(header, value)| (canonical(header), value.as_str()))
            .collect();
        Self { source, row, cells }
    }

    fn require_all(&self, fields: &[&str]) -> IntelResult<()> {
        for field in fields {
            self.cell(field)?;
        }
        Ok(())
    }

    fn cell(&self, field: &str) -> IntelResult<&'a str> {
        self.cells
            .get(field)
            .copied()
            .map(str::trim)
            .ok_or_else(|| IntelError::schema_mismatch(self.source, field, self.row))
    }

    fn invalid(&self, field: &str, value: &str) -> IntelError {
        IntelError::invalid_value(self.source, field, self.row, value)
    }

    fn text(&self, field: &str) -> IntelResult<String> {
        Ok(self.cell(field)?.to_string())
    }

    fn date(&self, field: &str) -> IntelResult<NaiveDate> {
        let value = self.cell(field)?;
        // Timestamps such as "2025-05-16 00:00:00" keep only the date part.
        let day = value.split_whitespace().next().unwrap_or_default();
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
            .ok_or_else(|| self.invalid(field, value))
    }

    fn count(&self, field: &str) -> IntelResult<u64> {
        let value = self.cell(field)?;
        let cleaned = clean_number(value);
        if cleaned.is_empty() {
            return Ok(0);
        }
        if let Ok(n) = cleaned.parse::<u64>() {
            return Ok(n);
        }
        // Exports sometimes render integer columns as "1200.0".
        match cleaned.parse::<f64>() {
            Ok(f) if f >= 0.0 && f < u64::MAX as f64 && f.fract() == 0.0 => Ok(f as u64),
            _ => Err(self.invalid(field, value)),
        }
    }

    fn amount(&self, field: &str) -> IntelResult<f64> {
        let value = self.cell(field)?;
        let cleaned = clean_number(value);
        if cleaned.is_empty() {
            return Ok(0.0);
        }
        match cleaned.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(f),
            _ => Err(self.invalid(field, value)),
        }
    }
}

fn clean_number(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect()
}
