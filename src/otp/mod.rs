//! One-time passcodes bound to an email or phone and a purpose

mod model;
mod service;

pub use model::{hash_code, OtpChallenge, OtpIdentifier, OtpPurpose};
pub use service::{IssuedOtp, OtpService};
