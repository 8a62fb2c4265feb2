//! In-process store

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use sqlx::types::chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ApplicationRepository, CatalogRepository, EligibilityRepository, FormFieldRepository,
    HealthCheck, OtpRepository, StoreError, StoreResult, UserRepository,
};
use crate::application::{Application, ApplicationStatus, StatusChange};
use crate::catalog::{CategoryWithCount, LoanCategory, LoanFilter, LoanProduct};
use crate::eligibility::{EligibilityCheck, EligibilityQuery};
use crate::forms::{FieldScope, FormFieldDefinition};
use crate::models::User;
use crate::otp::{OtpChallenge, OtpPurpose};

#[derive(Default)]
struct Tables {
    loans: HashMap<Uuid, LoanProduct>,
    categories: HashMap<Uuid, LoanCategory>,
    fields: HashMap<Uuid, FormFieldDefinition>,
    applications: HashMap<Uuid, Application>,
    challenges: Vec<OtpChallenge>,
    users: HashMap<Uuid, User>,
    eligibility: HashMap<Uuid, EligibilityCheck>,
}

/// Store backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    application_seq: AtomicU64,
    field_seq: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict(what: &str) -> StoreError {
    StoreError::Conflict(format!("Duplicate {what}"))
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_loans(&self, filter: LoanFilter) -> StoreResult<Vec<LoanProduct>> {
        let tables = self.tables.read().await;
        let mut loans: Vec<LoanProduct> = tables
            .loans
            .values()
            .filter(|l| !filter.active_only || l.is_active)
            .filter(|l| filter.loan_type.map_or(true, |t| l.loan_type == t))
            .filter(|l| filter.category_id.map_or(true, |c| l.category_id == Some(c)))
            .cloned()
            .collect();
        loans.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(loans)
    }

    async fn get_loan(&self, id: Uuid) -> StoreResult<Option<LoanProduct>> {
        Ok(self.tables.read().await.loans.get(&id).cloned())
    }

    async fn get_loan_by_slug(&self, slug: &str) -> StoreResult<Option<LoanProduct>> {
        let tables = self.tables.read().await;
        Ok(tables.loans.values().find(|l| l.slug == slug).cloned())
    }

    async fn insert_loan(&self, loan: &LoanProduct) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.loans.values().any(|l| l.slug == loan.slug) {
            return Err(conflict("loan slug"));
        }
        tables.loans.insert(loan.id, loan.clone());
        Ok(())
    }

    async fn update_loan(&self, loan: &LoanProduct) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .loans
            .values()
            .any(|l| l.slug == loan.slug && l.id != loan.id)
        {
            return Err(conflict("loan slug"));
        }
        tables.loans.insert(loan.id, loan.clone());
        Ok(())
    }

    async fn delete_loan(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.applications.values().any(|a| a.loan_id == id) {
            return Err(StoreError::Conflict("Record is still referenced".into()));
        }
        let removed = tables.loans.remove(&id).is_some();
        if removed {
            tables.fields.retain(|_, f| f.scope != FieldScope::LoanId(id));
        }
        Ok(removed)
    }

    async fn list_categories(&self) -> StoreResult<Vec<CategoryWithCount>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<CategoryWithCount> = tables
            .categories
            .values()
            .map(|c| CategoryWithCount {
                category: c.clone(),
                loan_count: tables
                    .loans
                    .values()
                    .filter(|l| l.category_id == Some(c.id))
                    .count() as i64,
            })
            .collect();
        categories.sort_by(|a, b| a.category.name.cmp(&b.category.name));
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> StoreResult<Option<LoanCategory>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn insert_category(&self, category: &LoanCategory) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .categories
            .values()
            .any(|c| c.name == category.name || c.slug == category.slug)
        {
            return Err(conflict("category name"));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &LoanCategory) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| {
            c.id != category.id && (c.name == category.name || c.slug == category.slug)
        }) {
            return Err(conflict("category name"));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.loans.values().any(|l| l.category_id == Some(id)) {
            return Err(StoreError::Conflict("Record is still referenced".into()));
        }
        let removed = tables.categories.remove(&id).is_some();
        if removed {
            tables.fields.retain(|_, f| f.scope != FieldScope::CategoryId(id));
        }
        Ok(removed)
    }

    async fn count_loans_in_category(&self, id: Uuid) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .loans
            .values()
            .filter(|l| l.category_id == Some(id))
            .count() as i64)
    }
}

#[async_trait]
impl FormFieldRepository for MemoryStore {
    async fn list_fields(&self, scope: FieldScope) -> StoreResult<Vec<FormFieldDefinition>> {
        let tables = self.tables.read().await;
        let mut fields: Vec<_> = tables
            .fields
            .values()
            .filter(|f| f.scope == scope)
            .cloned()
            .collect();
        fields.sort_by_key(|f| f.seq);
        Ok(fields)
    }

    async fn get_field(&self, id: Uuid) -> StoreResult<Option<FormFieldDefinition>> {
        Ok(self.tables.read().await.fields.get(&id).cloned())
    }

    async fn insert_field(&self, field: &FormFieldDefinition) -> StoreResult<FormFieldDefinition> {
        let mut tables = self.tables.write().await;
        if tables
            .fields
            .values()
            .any(|f| f.scope == field.scope && f.name == field.name)
        {
            return Err(conflict("field name for this scope"));
        }
        let mut stored = field.clone();
        stored.seq = self.field_seq.fetch_add(1, Ordering::SeqCst) + 1;
        tables.fields.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_field(&self, field: &FormFieldDefinition) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .fields
            .values()
            .any(|f| f.id != field.id && f.scope == field.scope && f.name == field.name)
        {
            return Err(conflict("field name for this scope"));
        }
        tables.fields.insert(field.id, field.clone());
        Ok(())
    }

    async fn delete_field(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.fields.remove(&id).is_some())
    }
}

#[async_trait]
impl ApplicationRepository for MemoryStore {
    async fn next_application_seq(&self) -> StoreResult<u64> {
        Ok(self.application_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn insert_application(&self, app: &Application) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .applications
            .values()
            .any(|a| a.application_number == app.application_number)
        {
            return Err(conflict("application number"));
        }
        tables.applications.insert(app.id, app.clone());
        Ok(())
    }

    async fn get_application(&self, id: Uuid) -> StoreResult<Option<Application>> {
        Ok(self.tables.read().await.applications.get(&id).cloned())
    }

    async fn list_applications(&self, owner: Option<Uuid>) -> StoreResult<Vec<Application>> {
        let tables = self.tables.read().await;
        let mut apps: Vec<_> = tables
            .applications
            .values()
            .filter(|a| owner.map_or(true, |o| a.user_id == o))
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }

    async fn update_application(&self, app: &Application) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.applications.get_mut(&app.id) {
            existing.personal_info = app.personal_info.clone();
            existing.address = app.address.clone();
            existing.employment_info = app.employment_info.clone();
            existing.loan_details.purpose = app.loan_details.purpose.clone();
            existing.dynamic_fields = app.dynamic_fields.clone();
            existing.updated_at = app.updated_at;
        }
        Ok(())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: &[ApplicationStatus],
        change: &StatusChange,
    ) -> StoreResult<Option<Application>> {
        let mut tables = self.tables.write().await;
        match tables.applications.get_mut(&id) {
            Some(app) if from.contains(&app.status) => {
                change.apply(app);
                Ok(Some(app.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn count_for_loan(&self, loan_id: Uuid) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .applications
            .values()
            .filter(|a| a.loan_id == loan_id)
            .count() as i64)
    }
}

#[async_trait]
impl OtpRepository for MemoryStore {
    async fn replace_challenge(&self, challenge: &OtpChallenge) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        for old in tables.challenges.iter_mut().filter(|c| {
            c.identifier_key == challenge.identifier_key
                && c.purpose == challenge.purpose
                && c.consumed_at.is_none()
        }) {
            old.consumed_at = Some(challenge.created_at);
        }
        tables.challenges.push(challenge.clone());
        Ok(())
    }

    async fn consume_challenge(
        &self,
        identifier_key: &str,
        purpose: OtpPurpose,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let found = tables.challenges.iter_mut().find(|c| {
            c.identifier_key == identifier_key
                && c.purpose == purpose
                && c.code_hash == code_hash
                && c.is_live(now)
        });
        match found {
            Some(challenge) => {
                challenge.consumed_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge_challenges(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.challenges.len();
        tables.challenges.retain(|c| c.is_live(now));
        Ok((before - tables.challenges.len()) as u64)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(conflict("email"));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        self.tables.write().await.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl EligibilityRepository for MemoryStore {
    async fn insert_check(&self, check: &EligibilityCheck) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .eligibility
            .insert(check.id, check.clone());
        Ok(())
    }

    async fn get_check(&self, id: Uuid) -> StoreResult<Option<EligibilityCheck>> {
        Ok(self.tables.read().await.eligibility.get(&id).cloned())
    }

    async fn list_checks(
        &self,
        query: &EligibilityQuery,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<EligibilityCheck>, i64)> {
        let tables = self.tables.read().await;
        let mut matching: Vec<_> = tables
            .eligibility
            .values()
            .filter(|c| query.email.as_deref().map_or(true, |e| c.email == e))
            .filter(|c| query.loan_id.map_or(true, |l| c.loan_id == Some(l)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn is_healthy(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
