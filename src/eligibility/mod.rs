//! Eligibility pre-check

mod model;
mod service;

pub use model::{EligibilityCheck, EligibilityQuery, EligibilityRequest, EligibilityStatus, EmploymentType};
pub use service::EligibilityService;
