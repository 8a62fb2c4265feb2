//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::application::ApplicationService;
use crate::auth::AuthService;
use crate::blob::BlobStore;
use crate::catalog::CatalogService;
use crate::config::Config;
use crate::eligibility::EligibilityService;
use crate::forms::FormSchemaService;
use crate::middleware::RateLimiter;
use crate::notify::Notifier;
use crate::otp::OtpService;
use crate::store::{HealthCheck, Repositories};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub catalog_service: Arc<CatalogService>,
    pub form_service: Arc<FormSchemaService>,
    pub application_service: Arc<ApplicationService>,
    pub eligibility_service: Arc<EligibilityService>,
    pub health: Arc<dyn HealthCheck>,
    pub otp_limiter: RateLimiter,
    /// Submissions must carry an application verification token
    pub require_application_otp: bool,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire every service over one set of repositories
    pub fn new(
        config: &Config,
        repos: Repositories,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let otp_service = OtpService::new(repos.otps.clone(), notifier.clone(), config.otp_ttl_seconds);
        let auth_service = AuthService::new(
            repos.users.clone(),
            otp_service,
            config.jwt_secret.clone(),
            config.jwt_access_token_ttl_seconds,
            config.otp_expose_code_on_delivery_failure,
        );
        let form_service = FormSchemaService::new(repos.forms.clone(), repos.catalog.clone());
        let catalog_service = CatalogService::new(repos.catalog.clone(), repos.applications.clone());
        let application_service = ApplicationService::new(
            repos.applications.clone(),
            repos.catalog.clone(),
            repos.users.clone(),
            form_service.clone(),
            blobs,
            notifier,
        );

        Self {
            auth_service: Arc::new(auth_service),
            catalog_service: Arc::new(catalog_service),
            form_service: Arc::new(form_service),
            application_service: Arc::new(application_service),
            eligibility_service: Arc::new(EligibilityService::new(repos.eligibility)),
            health: repos.health,
            otp_limiter: RateLimiter::per_minute(config.otp_rate_limit_per_minute),
            require_application_otp: config.require_application_otp,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<CatalogService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.catalog_service.clone()
    }
}

impl FromRef<AppState> for Arc<FormSchemaService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.form_service.clone()
    }
}

impl FromRef<AppState> for Arc<ApplicationService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.application_service.clone()
    }
}

impl FromRef<AppState> for Arc<EligibilityService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.eligibility_service.clone()
    }
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.otp_limiter.clone()
    }
}
