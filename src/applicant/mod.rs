//! Applicant profiles and customer dataset loading

mod data;
pub mod loader;

pub use data::{
    ApplicantProfile, ApplicantRecord, DEFAULT_ANNUAL_MILEAGE, DEFAULT_DRIVER_AGE,
    DEFAULT_PREVIOUS_ACCIDENTS,
};
pub use loader::{load_applicants, load_applicants_from_reader};
