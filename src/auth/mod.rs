//! Authentication module for LoanDesk
//!
//! - OTP challenges for login and application verification
//! - JWT access tokens and short-lived verification tokens

mod jwt;
mod model;
mod service;

pub use jwt::{
    generate_access_token, generate_verification_token, get_user_id_from_claims, verify_token, Claims,
    JwtError, TokenType,
};
pub use model::{SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse};
pub use service::{AuthService, VERIFICATION_TOKEN_TTL_SECONDS};
