//! OTP issuance and verification

use std::sync::Arc;

use rand::Rng;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::model::{hash_code, OtpChallenge, OtpIdentifier, OtpPurpose};
use crate::error::{ApiError, ApiResult};
use crate::notify::{templates, Notifier, NotifyError};
use crate::store::OtpRepository;

/// Result of issuing a challenge
///
/// `code` is the plaintext code; it leaves the service only through the
/// notifier or the degraded-mode fallback.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub delivered: bool,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct OtpService {
    repo: Arc<dyn OtpRepository>,
    notifier: Arc<dyn Notifier>,
    ttl: Duration,
}

fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

impl OtpService {
    pub fn new(repo: Arc<dyn OtpRepository>, notifier: Arc<dyn Notifier>, ttl_seconds: i64) -> Self {
        Self {
            repo,
            notifier,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    pub async fn issue(&self, identifier: &OtpIdentifier, purpose: OtpPurpose) -> ApiResult<IssuedOtp> {
        self.issue_at(identifier, purpose, Utc::now()).await
    }

    /// Issue a fresh challenge as of `now`, superseding older ones
    pub async fn issue_at(
        &self,
        identifier: &OtpIdentifier,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> ApiResult<IssuedOtp> {
        let key = identifier.key();
        let code = generate_code();
        let challenge = OtpChallenge {
            id: Uuid::new_v4(),
            identifier_key: key.clone(),
            email: identifier.email.clone(),
            phone: identifier.phone.clone(),
            purpose,
            code_hash: hash_code(&key, purpose, &code),
            expires_at: now + self.ttl,
            consumed_at: None,
            created_at: now,
        };
        self.repo.replace_challenge(&challenge).await?;

        let delivery = match &identifier.email {
            Some(email) => {
                let message = templates::otp_code(email, &code, purpose, self.ttl.num_minutes());
                self.notifier.send(message).await
            }
            None => Err(NotifyError::NoChannel("phone".to_string())),
        };
        let delivered = match delivery {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(purpose = purpose.as_str(), error = %e, "OTP delivery failed");
                false
            }
        };

        tracing::info!(purpose = purpose.as_str(), delivered, "OTP issued");
        Ok(IssuedOtp {
            code,
            delivered,
            expires_at: challenge.expires_at,
        })
    }

    pub async fn verify(&self, identifier: &OtpIdentifier, purpose: OtpPurpose, code: &str) -> ApiResult<()> {
        self.verify_at(identifier, purpose, code, Utc::now()).await
    }

    /// Consume a matching live challenge; any failure is `InvalidOtp`
    pub async fn verify_at(
        &self,
        identifier: &OtpIdentifier,
        purpose: OtpPurpose,
        code: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<()> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ApiError::InvalidOtp);
        }
        let key = identifier.key();
        let consumed = self
            .repo
            .consume_challenge(&key, purpose, &hash_code(&key, purpose, code), now)
            .await?;
        if consumed {
            tracing::info!(purpose = purpose.as_str(), "OTP verified");
            Ok(())
        } else {
            tracing::debug!(purpose = purpose.as_str(), "OTP verification failed");
            Err(ApiError::InvalidOtp)
        }
    }

    /// Drop expired and consumed challenges
    pub async fn purge_expired(&self) -> ApiResult<u64> {
        Ok(self.repo.purge_challenges(Utc::now()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
