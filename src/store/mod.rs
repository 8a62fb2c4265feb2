//! Storage seam: repository traits and their backends
//!
//! `PgStore` is the production backend. `MemoryStore` keeps everything in
//! process and backs `STORE_BACKEND=memory` and the test suite.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::types::chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::application::{Application, ApplicationStatus, StatusChange};
use crate::catalog::{CategoryWithCount, LoanCategory, LoanFilter, LoanProduct};
use crate::eligibility::{EligibilityCheck, EligibilityQuery};
use crate::forms::{FieldScope, FormFieldDefinition};
use crate::models::User;
use crate::otp::{OtpChallenge, OtpPurpose};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Uniqueness or reference constraint violated
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.code().as_deref() {
                // unique_violation
                Some("23505") => {
                    return StoreError::Conflict(format!(
                        "Duplicate value violates {}",
                        db.constraint().unwrap_or("a unique constraint")
                    ))
                }
                // foreign_key_violation
                Some("23503") => {
                    return StoreError::Conflict("Record is still referenced".to_string())
                }
                _ => {}
            }
        }
        StoreError::Database(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Loans matching `filter`, by display order then name
    async fn list_loans(&self, filter: LoanFilter) -> StoreResult<Vec<LoanProduct>>;
    async fn get_loan(&self, id: Uuid) -> StoreResult<Option<LoanProduct>>;
    async fn get_loan_by_slug(&self, slug: &str) -> StoreResult<Option<LoanProduct>>;
    /// Fails with `Conflict` on a duplicate slug
    async fn insert_loan(&self, loan: &LoanProduct) -> StoreResult<()>;
    async fn update_loan(&self, loan: &LoanProduct) -> StoreResult<()>;
    async fn delete_loan(&self, id: Uuid) -> StoreResult<bool>;

    /// Categories sorted by name, with their loan counts
    async fn list_categories(&self) -> StoreResult<Vec<CategoryWithCount>>;
    async fn get_category(&self, id: Uuid) -> StoreResult<Option<LoanCategory>>;
    /// Fails with `Conflict` on a duplicate name or slug
    async fn insert_category(&self, category: &LoanCategory) -> StoreResult<()>;
    async fn update_category(&self, category: &LoanCategory) -> StoreResult<()>;
    async fn delete_category(&self, id: Uuid) -> StoreResult<bool>;
    async fn count_loans_in_category(&self, id: Uuid) -> StoreResult<i64>;
}

#[async_trait]
pub trait FormFieldRepository: Send + Sync {
    /// All fields of a scope, active or not
    async fn list_fields(&self, scope: FieldScope) -> StoreResult<Vec<FormFieldDefinition>>;
    async fn get_field(&self, id: Uuid) -> StoreResult<Option<FormFieldDefinition>>;
    /// Assigns `seq`; fails with `Conflict` on a duplicate (scope, name)
    async fn insert_field(&self, field: &FormFieldDefinition) -> StoreResult<FormFieldDefinition>;
    async fn update_field(&self, field: &FormFieldDefinition) -> StoreResult<()>;
    async fn delete_field(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Next value of the application number sequence; never repeats
    async fn next_application_seq(&self) -> StoreResult<u64>;
    async fn insert_application(&self, app: &Application) -> StoreResult<()>;
    async fn get_application(&self, id: Uuid) -> StoreResult<Option<Application>>;
    /// Newest first; all applications when `owner` is `None`
    async fn list_applications(&self, owner: Option<Uuid>) -> StoreResult<Vec<Application>>;
    /// Overwrite the editable sections of an application
    async fn update_application(&self, app: &Application) -> StoreResult<()>;
    /// Apply `change` only if the current status is one of `from`
    ///
    /// Returns the updated application, or `None` when the status did not
    /// match (or the application is gone).
    async fn transition(
        &self,
        id: Uuid,
        from: &[ApplicationStatus],
        change: &StatusChange,
    ) -> StoreResult<Option<Application>>;
    async fn count_for_loan(&self, loan_id: Uuid) -> StoreResult<i64>;
}

#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Store a challenge, consuming older live ones for the same key and purpose
    async fn replace_challenge(&self, challenge: &OtpChallenge) -> StoreResult<()>;
    /// Consume a live matching challenge; `true` if one was consumed
    async fn consume_challenge(
        &self,
        identifier_key: &str,
        purpose: OtpPurpose,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool>;
    /// Delete expired or consumed challenges; returns how many
    async fn purge_challenges(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Fails with `Conflict` on a duplicate email
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn update_user(&self, user: &User) -> StoreResult<()>;
}

#[async_trait]
pub trait EligibilityRepository: Send + Sync {
    async fn insert_check(&self, check: &EligibilityCheck) -> StoreResult<()>;
    async fn get_check(&self, id: Uuid) -> StoreResult<Option<EligibilityCheck>>;
    /// Newest first, with the total count before paging
    async fn list_checks(
        &self,
        query: &EligibilityQuery,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<EligibilityCheck>, i64)>;
}

/// Store health, reported by `/health`
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn is_healthy(&self) -> bool;
    fn backend(&self) -> &'static str;
}

/// All repositories of one backend
#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn CatalogRepository>,
    pub forms: Arc<dyn FormFieldRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub otps: Arc<dyn OtpRepository>,
    pub users: Arc<dyn UserRepository>,
    pub eligibility: Arc<dyn EligibilityRepository>,
    pub health: Arc<dyn HealthCheck>,
}

impl Repositories {
    fn from_store<T>(store: Arc<T>) -> Self
    where
        T: CatalogRepository
            + FormFieldRepository
            + ApplicationRepository
            + OtpRepository
            + UserRepository
            + EligibilityRepository
            + HealthCheck
            + 'static,
    {
        Self {
            catalog: store.clone(),
            forms: store.clone(),
            applications: store.clone(),
            otps: store.clone(),
            users: store.clone(),
            eligibility: store.clone(),
            health: store,
        }
    }

    pub fn memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)))
    }
}
