//! Loan applications: intake, storage model and review

pub mod emi;
pub mod intake;
pub mod model;
pub mod review;
mod service;

pub use intake::{FileGroup, LoanDetailsInput, SubmissionForm, UploadedFile};
pub use model::{
    Actor, Address, AddressInfo, Application, ApplicationStatus, Document, DocumentStatus,
    DocumentType, EmploymentInfo, LoanDetails, PersonalInfo, RejectRequest, StatusChange,
    UpdateApplicationRequest,
};
pub use review::Decision;
pub use service::{ApplicationService, Outcome};
