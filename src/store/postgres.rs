//! PostgreSQL store

use async_trait::async_trait;
use sqlx::types::chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    ApplicationRepository, CatalogRepository, EligibilityRepository, FormFieldRepository,
    HealthCheck, OtpRepository, StoreError, StoreResult, UserRepository,
};
use crate::application::{
    AddressInfo, Application, ApplicationStatus, Document, EmploymentInfo, LoanDetails,
    PersonalInfo, StatusChange,
};
use crate::catalog::{
    CategoryWithCount, InterestRate, LoanCategory, LoanFilter, LoanHighlight, LoanProduct,
    LoanType, RepaymentOption, RequiredDocument,
};
use crate::db;
use crate::eligibility::{EligibilityCheck, EligibilityQuery};
use crate::forms::{DynamicValues, FieldKind, FieldScope, FieldWidth, FormFieldDefinition};
use crate::models::User;
use crate::otp::{OtpChallenge, OtpPurpose};

/// Store backed by a Postgres pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LoanRow {
    id: Uuid,
    name: String,
    slug: String,
    loan_type: LoanType,
    description: String,
    category_id: Option<Uuid>,
    interest_rate: Json<InterestRate>,
    min_loan_amount: f64,
    max_loan_amount: f64,
    min_tenure: i32,
    max_tenure: i32,
    features: Json<Vec<LoanHighlight>>,
    benefits: Json<Vec<LoanHighlight>>,
    required_documents: Json<Vec<RequiredDocument>>,
    repayment_options: Json<Vec<RepaymentOption>>,
    image: Option<String>,
    is_active: bool,
    display_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LoanRow> for LoanProduct {
    fn from(row: LoanRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            loan_type: row.loan_type,
            description: row.description,
            category_id: row.category_id,
            interest_rate: row.interest_rate.0,
            min_loan_amount: row.min_loan_amount,
            max_loan_amount: row.max_loan_amount,
            min_tenure: row.min_tenure,
            max_tenure: row.max_tenure,
            features: row.features.0,
            benefits: row.benefits.0,
            required_documents: row.required_documents.0,
            repayment_options: row.repayment_options.0,
            image: row.image,
            is_active: row.is_active,
            display_order: row.display_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryCountRow {
    #[sqlx(flatten)]
    category: LoanCategory,
    loan_count: i64,
}

#[derive(sqlx::FromRow)]
struct FieldRow {
    id: Uuid,
    loan_id: Option<Uuid>,
    category_id: Option<Uuid>,
    name: String,
    label: String,
    kind: FieldKind,
    options: Vec<String>,
    required: bool,
    placeholder: Option<String>,
    width: FieldWidth,
    section: Option<String>,
    field_order: i32,
    is_active: bool,
    seq: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FieldRow> for FormFieldDefinition {
    type Error = StoreError;

    fn try_from(row: FieldRow) -> Result<Self, Self::Error> {
        let scope = FieldScope::from_ids(row.loan_id, row.category_id)
            .map_err(|e| StoreError::Database(format!("form field {}: {e}", row.id)))?;
        Ok(Self {
            id: row.id,
            scope,
            name: row.name,
            label: row.label,
            kind: row.kind,
            options: row.options,
            required: row.required,
            placeholder: row.placeholder,
            width: row.width,
            section: row.section,
            order: row.field_order,
            is_active: row.is_active,
            seq: row.seq,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    application_number: String,
    user_id: Uuid,
    loan_id: Uuid,
    loan_type: LoanType,
    personal_info: Json<PersonalInfo>,
    address: Json<AddressInfo>,
    employment_info: Json<EmploymentInfo>,
    loan_details: Json<LoanDetails>,
    dynamic_fields: Json<DynamicValues>,
    documents: Json<Vec<Document>>,
    status: ApplicationStatus,
    submitted_at: Option<DateTime<Utc>>,
    approved_at: Option<DateTime<Utc>>,
    approved_by: Option<Uuid>,
    rejected_at: Option<DateTime<Utc>>,
    rejected_by: Option<Uuid>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        Self {
            id: row.id,
            application_number: row.application_number,
            user_id: row.user_id,
            loan_id: row.loan_id,
            loan_type: row.loan_type,
            personal_info: row.personal_info.0,
            address: row.address.0,
            employment_info: row.employment_info.0,
            loan_details: row.loan_details.0,
            dynamic_fields: row.dynamic_fields.0,
            documents: row.documents.0,
            status: row.status,
            submitted_at: row.submitted_at,
            approved_at: row.approved_at,
            approved_by: row.approved_by,
            rejected_at: row.rejected_at,
            rejected_by: row.rejected_by,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn list_loans(&self, filter: LoanFilter) -> StoreResult<Vec<LoanProduct>> {
        let rows = sqlx::query_as::<_, LoanRow>(
            r#"
            SELECT * FROM loans
            WHERE ($1::bool = FALSE OR is_active)
              AND ($2::loan_type IS NULL OR loan_type = $2)
              AND ($3::uuid IS NULL OR category_id = $3)
            ORDER BY display_order ASC, name ASC
            "#,
        )
        .bind(filter.active_only)
        .bind(filter.loan_type)
        .bind(filter.category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LoanProduct::from).collect())
    }

    async fn get_loan(&self, id: Uuid) -> StoreResult<Option<LoanProduct>> {
        let row = sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(LoanProduct::from))
    }

    async fn get_loan_by_slug(&self, slug: &str) -> StoreResult<Option<LoanProduct>> {
        let row = sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(LoanProduct::from))
    }

    async fn insert_loan(&self, loan: &LoanProduct) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO loans (
                id, name, slug, loan_type, description, category_id, interest_rate,
                min_loan_amount, max_loan_amount, min_tenure, max_tenure,
                features, benefits, required_documents, repayment_options,
                image, is_active, display_order, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(loan.id)
        .bind(&loan.name)
        .bind(&loan.slug)
        .bind(loan.loan_type)
        .bind(&loan.description)
        .bind(loan.category_id)
        .bind(Json(&loan.interest_rate))
        .bind(loan.min_loan_amount)
        .bind(loan.max_loan_amount)
        .bind(loan.min_tenure)
        .bind(loan.max_tenure)
        .bind(Json(&loan.features))
        .bind(Json(&loan.benefits))
        .bind(Json(&loan.required_documents))
        .bind(Json(&loan.repayment_options))
        .bind(&loan.image)
        .bind(loan.is_active)
        .bind(loan.display_order)
        .bind(loan.created_at)
        .bind(loan.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_loan(&self, loan: &LoanProduct) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE loans SET
                name = $2, slug = $3, loan_type = $4, description = $5, category_id = $6,
                interest_rate = $7, min_loan_amount = $8, max_loan_amount = $9,
                min_tenure = $10, max_tenure = $11, features = $12, benefits = $13,
                required_documents = $14, repayment_options = $15, image = $16,
                is_active = $17, display_order = $18, updated_at = $19
            WHERE id = $1
            "#,
        )
        .bind(loan.id)
        .bind(&loan.name)
        .bind(&loan.slug)
        .bind(loan.loan_type)
        .bind(&loan.description)
        .bind(loan.category_id)
        .bind(Json(&loan.interest_rate))
        .bind(loan.min_loan_amount)
        .bind(loan.max_loan_amount)
        .bind(loan.min_tenure)
        .bind(loan.max_tenure)
        .bind(Json(&loan.features))
        .bind(Json(&loan.benefits))
        .bind(Json(&loan.required_documents))
        .bind(Json(&loan.repayment_options))
        .bind(&loan.image)
        .bind(loan.is_active)
        .bind(loan.display_order)
        .bind(loan.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_loan(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_categories(&self) -> StoreResult<Vec<CategoryWithCount>> {
        let rows = sqlx::query_as::<_, CategoryCountRow>(
            r#"
            SELECT c.*, COUNT(l.id) AS loan_count
            FROM loan_categories c
            LEFT JOIN loans l ON l.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| CategoryWithCount {
                category: r.category,
                loan_count: r.loan_count,
            })
            .collect())
    }

    async fn get_category(&self, id: Uuid) -> StoreResult<Option<LoanCategory>> {
        let row = sqlx::query_as::<_, LoanCategory>("SELECT * FROM loan_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_category(&self, category: &LoanCategory) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO loan_categories (id, name, slug, description, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.active)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_category(&self, category: &LoanCategory) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE loan_categories
            SET name = $2, slug = $3, description = $4, active = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.active)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM loan_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_loans_in_category(&self, id: Uuid) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl FormFieldRepository for PgStore {
    async fn list_fields(&self, scope: FieldScope) -> StoreResult<Vec<FormFieldDefinition>> {
        let rows = sqlx::query_as::<_, FieldRow>(
            r#"
            SELECT * FROM form_fields
            WHERE ($1::uuid IS NOT NULL AND loan_id = $1)
               OR ($2::uuid IS NOT NULL AND category_id = $2)
            ORDER BY seq ASC
            "#,
        )
        .bind(scope.loan_id())
        .bind(scope.category_id())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(FormFieldDefinition::try_from).collect()
    }

    async fn get_field(&self, id: Uuid) -> StoreResult<Option<FormFieldDefinition>> {
        let row = sqlx::query_as::<_, FieldRow>("SELECT * FROM form_fields WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(FormFieldDefinition::try_from).transpose()
    }

    async fn insert_field(&self, field: &FormFieldDefinition) -> StoreResult<FormFieldDefinition> {
        let row = sqlx::query_as::<_, FieldRow>(
            r#"
            INSERT INTO form_fields (
                id, loan_id, category_id, name, label, kind, options, required,
                placeholder, width, section, field_order, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(field.id)
        .bind(field.scope.loan_id())
        .bind(field.scope.category_id())
        .bind(&field.name)
        .bind(&field.label)
        .bind(field.kind)
        .bind(&field.options)
        .bind(field.required)
        .bind(&field.placeholder)
        .bind(field.width)
        .bind(&field.section)
        .bind(field.order)
        .bind(field.is_active)
        .bind(field.created_at)
        .bind(field.updated_at)
        .fetch_one(&self.pool)
        .await?;
        FormFieldDefinition::try_from(row)
    }

    async fn update_field(&self, field: &FormFieldDefinition) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE form_fields SET
                name = $2, label = $3, kind = $4, options = $5, required = $6,
                placeholder = $7, width = $8, section = $9, field_order = $10,
                is_active = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(field.id)
        .bind(&field.name)
        .bind(&field.label)
        .bind(field.kind)
        .bind(&field.options)
        .bind(field.required)
        .bind(&field.placeholder)
        .bind(field.width)
        .bind(&field.section)
        .bind(field.order)
        .bind(field.is_active)
        .bind(field.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_field(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM form_fields WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ApplicationRepository for PgStore {
    async fn next_application_seq(&self) -> StoreResult<u64> {
        let seq: i64 = sqlx::query_scalar("SELECT nextval('application_number_seq')")
            .fetch_one(&self.pool)
            .await?;
        Ok(seq as u64)
    }

    async fn insert_application(&self, app: &Application) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO applications (
                id, application_number, user_id, loan_id, loan_type, personal_info,
                address, employment_info, loan_details, dynamic_fields, documents,
                status, submitted_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(app.id)
        .bind(&app.application_number)
        .bind(app.user_id)
        .bind(app.loan_id)
        .bind(app.loan_type)
        .bind(Json(&app.personal_info))
        .bind(Json(&app.address))
        .bind(Json(&app.employment_info))
        .bind(Json(&app.loan_details))
        .bind(Json(&app.dynamic_fields))
        .bind(Json(&app.documents))
        .bind(app.status)
        .bind(app.submitted_at)
        .bind(app.created_at)
        .bind(app.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_application(&self, id: Uuid) -> StoreResult<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Application::from))
    }

    async fn list_applications(&self, owner: Option<Uuid>) -> StoreResult<Vec<Application>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT * FROM applications
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Application::from).collect())
    }

    async fn update_application(&self, app: &Application) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE applications SET
                personal_info = $2, address = $3, employment_info = $4,
                loan_details = jsonb_set(loan_details, '{purpose}', $5),
                dynamic_fields = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(app.id)
        .bind(Json(&app.personal_info))
        .bind(Json(&app.address))
        .bind(Json(&app.employment_info))
        .bind(Json(&app.loan_details.purpose))
        .bind(Json(&app.dynamic_fields))
        .bind(app.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: &[ApplicationStatus],
        change: &StatusChange,
    ) -> StoreResult<Option<Application>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut app = match row.map(Application::from) {
            Some(app) if from.contains(&app.status) => app,
            _ => return Ok(None),
        };
        change.apply(&mut app);

        sqlx::query(
            r#"
            UPDATE applications SET
                status = $2, approved_at = $3, approved_by = $4, rejected_at = $5,
                rejected_by = $6, rejection_reason = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(app.id)
        .bind(app.status)
        .bind(app.approved_at)
        .bind(app.approved_by)
        .bind(app.rejected_at)
        .bind(app.rejected_by)
        .bind(&app.rejection_reason)
        .bind(app.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(app))
    }

    async fn count_for_loan(&self, loan_id: Uuid) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE loan_id = $1")
            .bind(loan_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl OtpRepository for PgStore {
    async fn replace_challenge(&self, challenge: &OtpChallenge) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE otp_challenges SET consumed_at = $3
            WHERE identifier_key = $1 AND purpose = $2 AND consumed_at IS NULL
            "#,
        )
        .bind(&challenge.identifier_key)
        .bind(challenge.purpose)
        .bind(challenge.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO otp_challenges (
                id, identifier_key, email, phone, purpose, code_hash, expires_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(challenge.id)
        .bind(&challenge.identifier_key)
        .bind(&challenge.email)
        .bind(&challenge.phone)
        .bind(challenge.purpose)
        .bind(&challenge.code_hash)
        .bind(challenge.expires_at)
        .bind(challenge.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn consume_challenge(
        &self,
        identifier_key: &str,
        purpose: OtpPurpose,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        // Only one concurrent caller can flip consumed_at
        let result = sqlx::query(
            r#"
            UPDATE otp_challenges SET consumed_at = $4
            WHERE identifier_key = $1 AND purpose = $2 AND code_hash = $3
              AND consumed_at IS NULL AND expires_at > $4
            "#,
        )
        .bind(identifier_key)
        .bind(purpose)
        .bind(code_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_challenges(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM otp_challenges WHERE consumed_at IS NOT NULL OR expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, phone, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            "UPDATE users SET name = $2, phone = $3, role = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.role)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl EligibilityRepository for PgStore {
    async fn insert_check(&self, check: &EligibilityCheck) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO eligibility_checks (
                id, email, loan_id, pancard, dob, gender, personal_email, employment_type,
                company_name, next_salary_date, net_monthly_income, pin_code, state, city,
                status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(check.id)
        .bind(&check.email)
        .bind(check.loan_id)
        .bind(&check.pancard)
        .bind(check.dob)
        .bind(&check.gender)
        .bind(&check.personal_email)
        .bind(check.employment_type)
        .bind(&check.company_name)
        .bind(check.next_salary_date)
        .bind(check.net_monthly_income)
        .bind(&check.pin_code)
        .bind(&check.state)
        .bind(&check.city)
        .bind(check.status)
        .bind(check.created_at)
        .bind(check.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_check(&self, id: Uuid) -> StoreResult<Option<EligibilityCheck>> {
        let check =
            sqlx::query_as::<_, EligibilityCheck>("SELECT * FROM eligibility_checks WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(check)
    }

    async fn list_checks(
        &self,
        query: &EligibilityQuery,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<EligibilityCheck>, i64)> {
        let checks = sqlx::query_as::<_, EligibilityCheck>(
            r#"
            SELECT * FROM eligibility_checks
            WHERE ($1::text IS NULL OR email = $1)
              AND ($2::uuid IS NULL OR loan_id = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(&query.email)
        .bind(query.loan_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM eligibility_checks
            WHERE ($1::text IS NULL OR email = $1)
              AND ($2::uuid IS NULL OR loan_id = $2)
            "#,
        )
        .bind(&query.email)
        .bind(query.loan_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((checks, total))
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn is_healthy(&self) -> bool {
        db::check_health(&self.pool).await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
