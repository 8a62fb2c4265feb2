//! Shared fixtures for the integration suites

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::sync::Mutex;

use loandesk_server::application::{Actor, FileGroup, LoanDetailsInput, PersonalInfo, SubmissionForm, UploadedFile};
use loandesk_server::blob::MemoryBlobStore;
use loandesk_server::catalog::{CreateLoanRequest, InterestRate, LoanProduct, LoanType};
use loandesk_server::config::Config;
use loandesk_server::models::User;
use loandesk_server::notify::{EmailMessage, Notifier, NotifyError};
use loandesk_server::store::Repositories;
use loandesk_server::AppState;

/// Notifier that records every message and can be switched to fail
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Six-digit code from the most recent OTP email
    pub async fn last_code(&self) -> Option<String> {
        let sent = self.sent.lock().await;
        let text = &sent.iter().rev().find(|m| m.subject.starts_with("Your OTP"))?.text;
        text.split(|c: char| !c.is_ascii_digit())
            .find(|part| part.len() == 6)
            .map(str::to_string)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        // Attempts are recorded even when delivery fails
        self.sent.lock().await.push(message);
        if self.failing.load(Ordering::SeqCst) {
            Err(NotifyError::Rejected(503))
        } else {
            Ok(())
        }
    }
}

pub struct TestContext {
    pub config: Config,
    pub state: AppState,
    pub repos: Repositories,
    pub blobs: Arc<MemoryBlobStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn context() -> TestContext {
    context_with(Config::in_memory())
}

pub fn context_with(config: Config) -> TestContext {
    let repos = Repositories::memory();
    let blobs = Arc::new(MemoryBlobStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::new(&config, repos.clone(), blobs.clone(), notifier.clone());
    TestContext {
        config,
        state,
        repos,
        blobs,
        notifier,
    }
}

/// Personal loan: 10,000..500,000 over 3..36 months at 18%
pub fn personal_loan_request(name: &str) -> CreateLoanRequest {
    CreateLoanRequest {
        name: name.to_string(),
        slug: None,
        loan_type: LoanType::Personal,
        description: "Unsecured personal loan".to_string(),
        category_id: None,
        interest_rate: InterestRate {
            min: 12.0,
            max: 24.0,
            default: Some(18.0),
        },
        min_loan_amount: 10_000.0,
        max_loan_amount: 500_000.0,
        min_tenure: 3,
        max_tenure: 36,
        features: Vec::new(),
        benefits: Vec::new(),
        required_documents: Vec::new(),
        repayment_options: Vec::new(),
        image: None,
        is_active: Some(true),
        display_order: Some(1),
    }
}

/// The context's personal loan, created on first use
pub async fn personal_loan(ctx: &TestContext) -> LoanProduct {
    if let Ok(Some(loan)) = ctx.state.catalog_service.find_by_slug("personal-loan").await {
        return loan;
    }
    ctx.state
        .catalog_service
        .create_loan(personal_loan_request("Personal Loan"))
        .await
        .unwrap()
}

pub async fn borrower(ctx: &TestContext, email: &str) -> (User, Actor) {
    let user = ctx.state.auth_service.get_or_create_user(email).await.unwrap();
    let actor = Actor {
        user_id: user.id,
        role: user.role,
    };
    (user, actor)
}

pub async fn admin(ctx: &TestContext) -> (User, Actor) {
    let user = ctx
        .state
        .auth_service
        .ensure_admin("admin@loandesk.test", Some("Admin".into()))
        .await
        .unwrap();
    let actor = Actor {
        user_id: user.id,
        role: user.role,
    };
    (user, actor)
}

pub fn submission(loan: &LoanProduct, email: &str, amount: f64, tenure: u32) -> SubmissionForm {
    SubmissionForm {
        loan_id: Some(loan.id),
        personal_info: Some(PersonalInfo {
            full_name: "Asha Rao".to_string(),
            email: email.to_string(),
            phone: Some("9876543210".to_string()),
            ..Default::default()
        }),
        loan_details: LoanDetailsInput {
            loan_amount: serde_json::json!(amount),
            loan_tenure: serde_json::json!(tenure),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn pdf(group: FileGroup, name: &str) -> UploadedFile {
    UploadedFile {
        group,
        file_name: name.to_string(),
        extension: "pdf".to_string(),
        bytes: Bytes::from_static(b"%PDF-1.4 test"),
    }
}
