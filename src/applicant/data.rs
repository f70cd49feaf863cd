//! Applicant data structures matching the customer dataset format

use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};

/// Driver age used when a record does not carry one
pub const DEFAULT_DRIVER_AGE: f64 = 30.0;

/// Accident count used when a record does not carry one
pub const DEFAULT_PREVIOUS_ACCIDENTS: f64 = 0.0;

/// Annual mileage (thousands of km) used when a record does not carry one
pub const DEFAULT_ANNUAL_MILEAGE: f64 = 10.0;

fn default_driver_age() -> f64 {
    DEFAULT_DRIVER_AGE
}

fn default_previous_accidents() -> f64 {
    DEFAULT_PREVIOUS_ACCIDENTS
}

fn default_annual_mileage() -> f64 {
    DEFAULT_ANNUAL_MILEAGE
}

/// Attributes of a single applicant, immutable for the life of a pricing request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    /// Driver age in years
    #[serde(default = "default_driver_age")]
    pub driver_age: f64,

    /// Number of previous at-fault accidents
    #[serde(default = "default_previous_accidents")]
    pub previous_accidents: f64,

    /// Annual mileage in thousands of km
    #[serde(default = "default_annual_mileage")]
    pub annual_mileage_thousands_km: f64,
}

impl Default for ApplicantProfile {
    fn default() -> Self {
        Self {
            driver_age: DEFAULT_DRIVER_AGE,
            previous_accidents: DEFAULT_PREVIOUS_ACCIDENTS,
            annual_mileage_thousands_km: DEFAULT_ANNUAL_MILEAGE,
        }
    }
}

impl ApplicantProfile {
    /// Create a profile from all three attributes
    pub fn new(driver_age: f64, previous_accidents: f64, annual_mileage_thousands_km: f64) -> Self {
        Self {
            driver_age,
            previous_accidents,
            annual_mileage_thousands_km,
        }
    }

    /// Build a profile from optional fields, substituting the neutral defaults
    pub fn from_optional(
        driver_age: Option<f64>,
        previous_accidents: Option<f64>,
        annual_mileage_thousands_km: Option<f64>,
    ) -> Self {
        Self {
            driver_age: driver_age.unwrap_or(DEFAULT_DRIVER_AGE),
            previous_accidents: previous_accidents.unwrap_or(DEFAULT_PREVIOUS_ACCIDENTS),
            annual_mileage_thousands_km: annual_mileage_thousands_km
                .unwrap_or(DEFAULT_ANNUAL_MILEAGE),
        }
    }

    /// Reject profiles the engines must never see
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("driver_age", self.driver_age),
            ("previous_accidents", self.previous_accidents),
            ("annual_mileage_thousands_km", self.annual_mileage_thousands_km),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(PricingError::invalid(
                    field,
                    format!("must be a finite number, got {}", value),
                ));
            }
        }

        if self.driver_age <= 0.0 {
            return Err(PricingError::invalid(
                "driver_age",
                format!("must be positive, got {}", self.driver_age),
            ));
        }
        if self.previous_accidents < 0.0 {
            return Err(PricingError::invalid(
                "previous_accidents",
                format!("must be non-negative, got {}", self.previous_accidents),
            ));
        }
        if self.annual_mileage_thousands_km < 0.0 {
            return Err(PricingError::invalid(
                "annual_mileage_thousands_km",
                format!("must be non-negative, got {}", self.annual_mileage_thousands_km),
            ));
        }

        Ok(())
    }

    /// Feature vector in the order the risk classifier was trained on
    pub fn risk_features(&self) -> [f64; 3] {
        [
            self.driver_age,
            self.previous_accidents,
            self.annual_mileage_thousands_km,
        ]
    }
}

/// A customer row from the dataset: the profile plus bookkeeping columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    /// 1-based position of the customer in the source dataset
    pub customer_id: u64,

    pub profile: ApplicantProfile,

    /// Premium the customer currently pays, used for profit accounting
    #[serde(default)]
    pub reference_premium: Option<f64>,
}

impl ApplicantRecord {
    pub fn new(customer_id: u64, profile: ApplicantProfile) -> Self {
        Self {
            customer_id,
            profile,
            reference_premium: None,
        }
    }

    pub fn with_reference_premium(mut self, premium: f64) -> Self {
        self.reference_premium = Some(premium);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let profile = ApplicantProfile::from_optional(Some(45.0), None, None);
        assert_eq!(profile.driver_age, 45.0);
        assert_eq!(profile.previous_accidents, 0.0);
        assert_eq!(profile.annual_mileage_thousands_km, 10.0);

        let parsed: ApplicantProfile =
            serde_json::from_str(r#"{"previous_accidents": 2}"#).unwrap();
        assert_eq!(parsed.driver_age, 30.0);
        assert_eq!(parsed.previous_accidents, 2.0);
        assert_eq!(parsed.annual_mileage_thousands_km, 10.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ApplicantProfile::new(45.0, 1.0, 12.0).validate().is_ok());

        let err = ApplicantProfile::new(45.0, -1.0, 12.0).validate().unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput { field: "previous_accidents", .. }));

        let err = ApplicantProfile::new(45.0, 0.0, -3.0).validate().unwrap_err();
        assert!(matches!(
            err,
            PricingError::InvalidInput {
                field: "annual_mileage_thousands_km",
                ..
            }
        ));

        let err = ApplicantProfile::new(0.0, 0.0, 3.0).validate().unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput { field: "driver_age", .. }));

        let err = ApplicantProfile::new(f64::NAN, 0.0, 3.0).validate().unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput { field: "driver_age", .. }));
    }

    #[test]
    fn test_risk_feature_order() {
        let profile = ApplicantProfile::new(52.0, 3.0, 18.5);
        assert_eq!(profile.risk_features(), [52.0, 3.0, 18.5]);
    }
}
