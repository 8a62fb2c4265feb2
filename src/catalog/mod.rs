//! Loan catalog: products, categories and EMI previews

pub mod model;
mod service;
mod slug;

pub use model::{
    CategoryLoanRequest, CategoryWithCount, CreateCategoryRequest, CreateLoanRequest, EmiQuote,
    InterestRate, LoanCategory, LoanFilter, LoanHighlight, LoanProduct, LoanType,
    RepaymentOption, RequiredDocument, UpdateCategoryRequest, UpdateLoanRequest,
};
pub use service::CatalogService;
pub use slug::slugify;
