//! CSV loading for the four input tables.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use marketing_intel_core::config::DataConfig;
use marketing_intel_reporting::{MarketingDataset, RawRecord};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Read a CSV with a header row into raw records. Cells are trimmed.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let mut records = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV row {}", line + 1))?;
        records.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        );
    }
    Ok(records)
}

pub fn read_file(path: &Path) -> Result<Vec<RawRecord>> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let records = read_records(file).with_context(|| format!("Failed to parse {}", path.display()))?;
    info!(path = %path.display(), rows = records.len(), "Loaded CSV");
    Ok(records)
}

/// Load and normalize the channel and business files named in `config`.
pub fn load_dataset(config: &DataConfig) -> Result<MarketingDataset> {
    let dir = Path::new(&config.dir);
    let facebook = read_file(&dir.join(&config.facebook_file))?;
    let google = read_file(&dir.join(&config.google_file))?;
    let tiktok = read_file(&dir.join(&config.tiktok_file))?;
    let business = read_file(&dir.join(&config.business_file))?;

    MarketingDataset::from_raw(&facebook, &google, &tiktok, &business)
        .context("Failed to normalize input tables")
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketing_intel_core::Channel;

    const FACEBOOK: &str = "\
date,tactic,state,campaign,impression,clicks,spend,attributed revenue
2025-05-16,ASC,NY,Summer Sale,12000,340,1250.5,4100.25
2025-05-17, Retargeting ,CA,Summer Sale,8000,120,600,900
";

    const BUSINESS: &str = "\
date,# of orders,# of new orders,new customers,total revenue,gross profit,COGS
2025-05-16,120,45,40,15000,4500,10500
";

    #[test]
    fn test_read_records_keeps_headers_and_trims() {
        let records = read_records(FACEBOOK.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("impression").map(String::as_str), Some("12000"));
        assert_eq!(records[1].get("tactic").map(String::as_str), Some("Retargeting"));
    }

    #[test]
    fn test_records_normalize_into_dataset() {
        let facebook = read_records(FACEBOOK.as_bytes()).unwrap();
        let business = read_records(BUSINESS.as_bytes()).unwrap();
        let dataset = MarketingDataset::from_raw(&facebook, &[], &[], &business).unwrap();

        assert_eq!(dataset.marketing().len(), 2);
        assert!(dataset.marketing().iter().all(|r| r.channel == Channel::Facebook));
        assert_eq!(dataset.business()[0].new_customers, 40);
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let ragged = "date,tactic\n2025-05-16,ASC,extra\n";
        assert!(read_records(ragged.as_bytes()).is_err());
    }
}
