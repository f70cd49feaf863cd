//! Load applicants from a customer dataset CSV
//!
//! Expected columns: `Driver Age`, `Previous Accidents`, `Annual Mileage (x1000 km)`
//! and optionally `Insurance Premium ($)`. Absent columns and empty cells fall back
//! to the neutral profile defaults.

use super::{ApplicantProfile, ApplicantRecord};
use crate::error::{PricingError, Result};
use csv::Reader;
use std::path::Path;

/// Raw CSV row matching the dataset columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Driver Age", default)]
    driver_age: Option<f64>,
    #[serde(rename = "Previous Accidents", default)]
    previous_accidents: Option<f64>,
    #[serde(rename = "Annual Mileage (x1000 km)", default)]
    annual_mileage: Option<f64>,
    #[serde(rename = "Insurance Premium ($)", default)]
    insurance_premium: Option<f64>,
}

impl CsvRow {
    fn into_record(self, customer_id: u64) -> ApplicantRecord {
        let profile = ApplicantProfile::from_optional(
            self.driver_age,
            self.previous_accidents,
            self.annual_mileage,
        );
        ApplicantRecord {
            customer_id,
            profile,
            reference_premium: self.insurance_premium,
        }
    }
}

fn row_error(err: csv::Error) -> PricingError {
    if err.is_io_error() {
        return PricingError::Csv(err);
    }
    match err.position() {
        Some(pos) => PricingError::InvalidRecord {
            row: pos.record(),
            reason: err.to_string(),
        },
        None => PricingError::Csv(err),
    }
}

fn read_records<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<ApplicantRecord>> {
    let mut records = Vec::new();

    for (idx, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.map_err(row_error)?;
        records.push(row.into_record(idx as u64 + 1));
    }

    Ok(records)
}

/// Load all applicants from a CSV file
pub fn load_applicants<P: AsRef<Path>>(path: P) -> Result<Vec<ApplicantRecord>> {
    let reader = Reader::from_path(path)?;
    read_records(reader)
}

/// Load applicants from any reader (e.g., string buffer, stdin)
pub fn load_applicants_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<ApplicantRecord>> {
    read_records(Reader::from_reader(reader))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = "\
Driver Age,Driver Experience,Previous Accidents,Annual Mileage (x1000 km),Car Manufacturing Year,Car Age,Insurance Premium ($)
56,32,3,19,2002,23,488.35
46,19,0,21,2025,0,486.15
32,11,4,17,2020,5,497.55
";

    #[test]
    fn test_load_from_reader() {
        let records = load_applicants_from_reader(DATASET.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.customer_id, 1);
        assert_eq!(first.profile, ApplicantProfile::new(56.0, 3.0, 19.0));
        assert_eq!(first.reference_premium, Some(488.35));

        assert_eq!(records[2].customer_id, 3);
        assert_eq!(records[2].profile.previous_accidents, 4.0);
    }

    #[test]
    fn test_missing_columns_and_cells_use_defaults() {
        let data = "Driver Age,Previous Accidents\n,2\n41,\n";
        let records = load_applicants_from_reader(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].profile, ApplicantProfile::new(30.0, 2.0, 10.0));
        assert_eq!(records[1].profile, ApplicantProfile::new(41.0, 0.0, 10.0));
        assert!(records[0].reference_premium.is_none());
    }

    #[test]
    fn test_non_numeric_field_is_rejected() {
        let data = "Driver Age,Previous Accidents,Annual Mileage (x1000 km)\n40,1,12\nforty,1,12\n";
        let err = load_applicants_from_reader(data.as_bytes()).unwrap_err();
        match err {
            PricingError::InvalidRecord { row, .. } => assert_eq!(row, 2),
            other => panic!("expected InvalidRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_path() {
        let path = std::env::temp_dir().join(format!(
            "premium_optimizer_loader_{}.csv",
            std::process::id()
        ));
        std::fs::write(&path, DATASET).unwrap();

        let records = load_applicants(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].profile.driver_age, 46.0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_applicants("does/not/exist.csv");
        assert!(result.is_err());
    }
}
