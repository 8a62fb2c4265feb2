//! Application intake and review
//!
//! Intake validates everything before the first write. Once the application
//! row exists, later failures (email) only produce warnings.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use sqlx::types::chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use super::emi::calculate_emi;
use super::intake::{FileGroup, SubmissionForm, DYNAMIC_FILE_PREFIX};
use super::model::{
    format_application_number, Actor, Application, ApplicationStatus, Document, DocumentStatus,
    DocumentType, LoanDetails, PersonalInfo, UpdateApplicationRequest,
};
use super::review::{self, Decision};
use crate::blob::BlobStore;
use crate::error::{ApiError, ApiResult};
use crate::forms::{
    parse_dynamic_values, validate_values, FieldKind, FieldValue, FormFieldDefinition,
    FormSchemaService,
};
use crate::notify::{templates, EmailMessage, Notifier};
use crate::store::{ApplicationRepository, CatalogRepository, UserRepository};

/// Application plus any non-fatal problems hit after it was saved
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub application: Application,
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    catalog: Arc<dyn CatalogRepository>,
    users: Arc<dyn UserRepository>,
    forms: FormSchemaService,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<dyn Notifier>,
}

impl ApplicationService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        catalog: Arc<dyn CatalogRepository>,
        users: Arc<dyn UserRepository>,
        forms: FormSchemaService,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            applications,
            catalog,
            users,
            forms,
            blobs,
            notifier,
        }
    }

    /// Validate, store documents, persist and confirm a new application
    pub async fn submit(&self, actor: &Actor, form: SubmissionForm) -> ApiResult<Outcome> {
        let loan_id = form
            .loan_id
            .ok_or_else(|| ApiError::validation("loanId is required", vec!["loanId".into()]))?;
        let loan = self
            .catalog
            .get_loan(loan_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;
        if !loan.is_active {
            return Err(ApiError::BadRequest("Loan is not accepting applications".into()));
        }

        let (amount, tenure) = form.loan_details.normalize()?;
        loan.check_amount(amount)?;
        loan.check_tenure(tenure)?;

        let personal_info = validated_personal_info(form.personal_info.clone())?;

        let schema = self.forms.effective_for_loan(&loan).await?;
        let uploaded = dynamic_uploads(&schema, &form)?;
        validate_values(&schema, &form.dynamic_fields, &uploaded)?;

        let interest_rate = loan.annual_rate();
        let emi = calculate_emi(amount, interest_rate, tenure);

        let SubmissionForm {
            address,
            employment_info,
            loan_details,
            mut dynamic_fields,
            files,
            ..
        } = form;

        let documents = self.store_documents(files).await?;
        let stored: Vec<String> = documents.iter().map(|d| d.url.clone()).collect();

        let mut file_refs: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for doc in &documents {
            if let DocumentType::Dynamic(field) = &doc.doc_type {
                file_refs.entry(field.clone()).or_default().push(doc.url.clone());
            }
        }
        for (field, urls) in file_refs {
            dynamic_fields.insert(field, FieldValue::List(urls));
        }

        let seq = match self.applications.next_application_seq().await {
            Ok(seq) => seq,
            Err(e) => {
                self.discard_blobs(&stored).await;
                return Err(e.into());
            }
        };

        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            application_number: format_application_number(now, seq),
            user_id: actor.user_id,
            loan_id: loan.id,
            loan_type: loan.loan_type,
            personal_info,
            address,
            employment_info,
            loan_details: LoanDetails {
                loan_amount: amount,
                loan_tenure: tenure,
                interest_rate,
                emi,
                purpose: loan_details.purpose,
            },
            dynamic_fields,
            documents,
            status: ApplicationStatus::Submitted,
            submitted_at: Some(now),
            approved_at: None,
            approved_by: None,
            rejected_at: None,
            rejected_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.applications.insert_application(&application).await {
            self.discard_blobs(&stored).await;
            return Err(e.into());
        }

        tracing::info!(
            application_id = %application.id,
            application_number = %application.application_number,
            loan_id = %loan.id,
            documents = application.documents.len(),
            "Application submitted"
        );

        let message =
            templates::application_submitted(&application.personal_info.email, &application);
        let warnings = self.notify(message).await.into_iter().collect();

        Ok(Outcome {
            application,
            warnings,
        })
    }

    /// Own applications, or all of them for admins
    pub async fn list(&self, actor: &Actor) -> ApiResult<Vec<Application>> {
        let owner = (!actor.is_admin()).then_some(actor.user_id);
        Ok(self.applications.list_applications(owner).await?)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> ApiResult<Application> {
        let app = self.find(id).await?;
        review::ensure_can_view(&app, actor)?;
        Ok(app)
    }

    /// Edit applicant-supplied sections; amounts, rate, EMI and status stay fixed
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        request: UpdateApplicationRequest,
    ) -> ApiResult<Application> {
        let mut app = self.find(id).await?;
        review::ensure_can_update(&app, actor)?;

        if let Some(info) = request.personal_info {
            app.personal_info = validated_personal_info(Some(info))?;
        }
        if let Some(address) = request.address {
            app.address = address;
        }
        if let Some(employment) = request.employment_info {
            app.employment_info = employment;
        }
        if let Some(purpose) = request.purpose {
            app.loan_details.purpose = Some(purpose);
        }
        if let Some(raw) = request.dynamic_fields {
            let mut values = parse_dynamic_values(raw)?;
            // File references are owned by the intake pipeline
            for (field, value) in &app.dynamic_fields {
                if app
                    .documents
                    .iter()
                    .any(|d| d.doc_type == DocumentType::Dynamic(field.clone()))
                {
                    values.insert(field.clone(), value.clone());
                }
            }
            if let Some(loan) = self.catalog.get_loan(app.loan_id).await? {
                let schema = self.forms.effective_for_loan(&loan).await?;
                let uploaded: HashSet<String> = app
                    .documents
                    .iter()
                    .filter_map(|d| match &d.doc_type {
                        DocumentType::Dynamic(field) => Some(field.clone()),
                        _ => None,
                    })
                    .collect();
                validate_values(&schema, &values, &uploaded)?;
            }
            app.dynamic_fields = values;
        }

        app.updated_at = Utc::now();
        self.applications.update_application(&app).await?;
        tracing::info!(application_id = %app.id, actor = %actor.user_id, "Application updated");
        Ok(app)
    }

    pub async fn approve(&self, actor: &Actor, id: Uuid) -> ApiResult<Outcome> {
        let app = self.decide(actor, id, Decision::Approve).await?;
        let to = self.recipient(&app).await;
        let warnings = self
            .notify(templates::application_approved(&to, &app))
            .await
            .into_iter()
            .collect();
        Ok(Outcome {
            application: app,
            warnings,
        })
    }

    pub async fn reject(&self, actor: &Actor, id: Uuid, reason: Option<String>) -> ApiResult<Outcome> {
        let app = self.decide(actor, id, Decision::Reject { reason }).await?;
        let to = self.recipient(&app).await;
        let warnings = self
            .notify(templates::application_rejected(&to, &app))
            .await
            .into_iter()
            .collect();
        Ok(Outcome {
            application: app,
            warnings,
        })
    }

    /// Move a non-terminal application into the decided state
    async fn decide(&self, actor: &Actor, id: Uuid, decision: Decision) -> ApiResult<Application> {
        review::ensure_can_decide(actor)?;
        let current = self.find(id).await?;
        review::ensure_transitionable(&current)?;

        let change = decision.into_change(actor, Utc::now());
        let status = change.status;
        let app = self
            .applications
            .transition(id, &ApplicationStatus::NON_TERMINAL, &change)
            .await?
            .ok_or_else(|| {
                ApiError::Conflict(format!(
                    "Application {} was decided concurrently",
                    current.application_number
                ))
            })?;

        tracing::info!(
            application_id = %app.id,
            application_number = %app.application_number,
            status = ?status,
            actor = %actor.user_id,
            "Application decided"
        );
        Ok(app)
    }

    async fn find(&self, id: Uuid) -> ApiResult<Application> {
        self.applications
            .get_application(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Application not found".to_string()))
    }

    /// Account email of the owner, falling back to the form's email
    async fn recipient(&self, app: &Application) -> String {
        match self.users.get_user(app.user_id).await {
            Ok(Some(user)) => user.email,
            Ok(None) => app.personal_info.email.clone(),
            Err(e) => {
                tracing::warn!(user_id = %app.user_id, error = %e, "Owner lookup failed");
                app.personal_info.email.clone()
            }
        }
    }

    /// Send a message; a failure becomes a warning string
    async fn notify(&self, message: EmailMessage) -> Option<String> {
        let subject = message.subject.clone();
        match self.notifier.send(message).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(subject = %subject, error = %e, "Notification failed");
                Some(format!("Notification email could not be sent: {e}"))
            }
        }
    }

    async fn store_documents(
        &self,
        files: Vec<super::intake::UploadedFile>,
    ) -> ApiResult<Vec<Document>> {
        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            match self.blobs.put(&file.extension, file.bytes).await {
                Ok(url) => documents.push(Document {
                    doc_type: file.group.document_type(),
                    name: file.file_name,
                    url,
                    status: DocumentStatus::Pending,
                    uploaded_at: Utc::now(),
                }),
                Err(e) => {
                    let stored: Vec<String> = documents.iter().map(|d| d.url.clone()).collect();
                    self.discard_blobs(&stored).await;
                    return Err(e.into());
                }
            }
        }
        Ok(documents)
    }

    async fn discard_blobs(&self, urls: &[String]) {
        for url in urls {
            if let Err(e) = self.blobs.delete(url).await {
                tracing::warn!(url = %url, error = %e, "Failed to remove orphaned upload");
            }
        }
    }
}

fn validated_personal_info(info: Option<PersonalInfo>) -> ApiResult<PersonalInfo> {
    let info = info
        .ok_or_else(|| ApiError::validation("personalInfo is required", vec!["personalInfo".into()]))?
        .normalized();
    info.validate()?;
    Ok(info)
}

/// Names of dynamic File fields with uploads; uploads for any other name are rejected
fn dynamic_uploads(schema: &[FormFieldDefinition], form: &SubmissionForm) -> ApiResult<HashSet<String>> {
    let file_fields: HashSet<&str> = schema
        .iter()
        .filter(|f| f.kind == FieldKind::File)
        .map(|f| f.name.as_str())
        .collect();

    let mut uploaded = HashSet::new();
    let mut unknown = Vec::new();
    for file in &form.files {
        if let FileGroup::Dynamic(field) = &file.group {
            if file_fields.contains(field.as_str()) {
                uploaded.insert(field.clone());
            } else {
                unknown.push(format!("{DYNAMIC_FILE_PREFIX}{field}"));
            }
        }
    }

    if unknown.is_empty() {
        Ok(uploaded)
    } else {
        unknown.sort();
        unknown.dedup();
        Err(ApiError::validation(
            format!("Uploads for unknown file fields: {}", unknown.join(", ")),
            unknown,
        ))
    }
}
