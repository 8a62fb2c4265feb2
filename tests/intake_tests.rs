//! Application intake pipeline

mod common;

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use loandesk_server::application::{ApplicationStatus, DocumentStatus, DocumentType, FileGroup};
    use loandesk_server::error::ApiError;
    use loandesk_server::forms::{CreateFormFieldRequest, FieldKind, FieldValue, FieldWidth};
    use serde_json::json;

    use crate::common::{borrower, context, pdf, personal_loan, submission};

    fn field(loan_id: uuid::Uuid, name: &str, kind: FieldKind, required: bool) -> CreateFormFieldRequest {
        CreateFormFieldRequest {
            loan_id: Some(loan_id),
            category_id: None,
            name: name.to_string(),
            label: None,
            kind,
            options: Vec::new(),
            required,
            placeholder: None,
            width: FieldWidth::Full,
            section: None,
            order: 0,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_submission() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let (user, actor) = borrower(&ctx, "asha@example.com").await;

        let mut form = submission(&loan, "asha@example.com", 50_000.0, 12);
        form.files = vec![
            pdf(FileGroup::IdProof, "pan.pdf"),
            pdf(FileGroup::AddressProof, "utility.pdf"),
            pdf(FileGroup::BankStatement, "jan.pdf"),
            pdf(FileGroup::BankStatement, "feb.pdf"),
        ];

        let outcome = ctx.state.application_service.submit(&actor, form).await.unwrap();
        let app = outcome.application;

        assert!((app.loan_details.emi - 4584).abs() <= 1, "emi was {}", app.loan_details.emi);
        assert_eq!(app.loan_details.interest_rate, 18.0);
        assert_eq!(app.loan_details.loan_amount, 50_000.0);
        assert_eq!(app.loan_details.loan_tenure, 12);
        assert_eq!(app.status, ApplicationStatus::Submitted);
        assert!(app.submitted_at.is_some());
        assert_eq!(app.user_id, user.id);
        assert!(app.application_number.starts_with("APP"));
        assert_eq!(app.documents.len(), 4);
        assert!(app.documents.iter().all(|d| d.status == DocumentStatus::Pending));
        assert_eq!(
            app.documents
                .iter()
                .filter(|d| d.doc_type == DocumentType::BankStatement)
                .count(),
            2
        );
        assert!(outcome.warnings.is_empty());

        assert_eq!(ctx.blobs.len().await, 4);
        let sent = ctx.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "asha@example.com");
        assert!(sent[0].text.contains(&app.application_number));

        let stored = ctx.state.application_service.get(&actor, app.id).await.unwrap();
        assert_eq!(stored.application_number, app.application_number);
    }

    #[tokio::test]
    async fn test_rate_snapshot_survives_product_change() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let (_, actor) = borrower(&ctx, "asha@example.com").await;
        let app = ctx
            .state
            .application_service
            .submit(&actor, submission(&loan, "asha@example.com", 50_000.0, 12))
            .await
            .unwrap()
            .application;

        let update = serde_json::from_value(json!({
            "interestRate": { "min": 10.0, "max": 30.0, "default": 25.0 }
        }))
        .unwrap();
        ctx.state.catalog_service.update_loan(loan.id, update).await.unwrap();

        let stored = ctx.state.application_service.get(&actor, app.id).await.unwrap();
        assert_eq!(stored.loan_details.interest_rate, 18.0);
        assert_eq!(stored.loan_details.emi, app.loan_details.emi);
    }

    #[tokio::test]
    async fn test_out_of_bounds_amount_and_tenure() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let (_, actor) = borrower(&ctx, "asha@example.com").await;
        let service = &ctx.state.application_service;

        let err = service
            .submit(&actor, submission(&loan, "asha@example.com", 5_000.0, 12))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidAmount(_)));

        let err = service
            .submit(&actor, submission(&loan, "asha@example.com", 50_000.0, 48))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidTenure(_)));

        assert!(service.list(&actor).await.unwrap().is_empty());
        assert_eq!(ctx.notifier.count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_loan_is_not_found() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let (_, actor) = borrower(&ctx, "asha@example.com").await;
        let mut form = submission(&loan, "asha@example.com", 50_000.0, 12);
        form.loan_id = Some(uuid::Uuid::new_v4());

        let err = ctx.state.application_service.submit(&actor, form).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_alternate_amount_names() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let (_, actor) = borrower(&ctx, "asha@example.com").await;
        let mut form = submission(&loan, "asha@example.com", 0.0, 0);
        form.loan_details = serde_json::from_value(json!({
            "principal": "100000",
            "tenureMonths": "24"
        }))
        .unwrap();

        let app = ctx
            .state
            .application_service
            .submit(&actor, form)
            .await
            .unwrap()
            .application;
        assert_eq!(app.loan_details.loan_amount, 100_000.0);
        assert_eq!(app.loan_details.loan_tenure, 24);
    }

    #[tokio::test]
    async fn test_required_select_missing_aborts_without_side_effects() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let (_, actor) = borrower(&ctx, "asha@example.com").await;

        let mut purpose = field(loan.id, "loanPurpose", FieldKind::Select, true);
        purpose.options = vec!["Medical".into(), "Travel".into()];
        ctx.state.form_service.create(purpose).await.unwrap();

        let mut form = submission(&loan, "asha@example.com", 50_000.0, 12);
        form.files = vec![pdf(FileGroup::IdProof, "pan.pdf")];
        form.dynamic_fields
            .insert("extraNote".into(), FieldValue::Text("call after 6pm".into()));

        match ctx.state.application_service.submit(&actor, form).await {
            Err(ApiError::ValidationFailed { fields, .. }) => assert_eq!(fields, vec!["loanPurpose"]),
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(ctx.blobs.is_empty().await);
        assert!(ctx.state.application_service.list(&actor).await.unwrap().is_empty());
        assert_eq!(ctx.notifier.count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_dynamic_keys_pass_through() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let (_, actor) = borrower(&ctx, "asha@example.com").await;

        let mut purpose = field(loan.id, "loanPurpose", FieldKind::Select, true);
        purpose.options = vec!["Medical".into(), "Travel".into()];
        ctx.state.form_service.create(purpose).await.unwrap();

        let mut form = submission(&loan, "asha@example.com", 50_000.0, 12);
        form.dynamic_fields
            .insert("loanPurpose".into(), FieldValue::Text("Medical".into()));
        form.dynamic_fields
            .insert("legacyField".into(), FieldValue::Number(7.0));

        let app = ctx
            .state
            .application_service
            .submit(&actor, form)
            .await
            .unwrap()
            .application;
        assert_eq!(
            app.dynamic_fields.get("legacyField"),
            Some(&FieldValue::Number(7.0))
        );
        assert_eq!(
            app.dynamic_fields.get("loanPurpose"),
            Some(&FieldValue::Text("Medical".into()))
        );
    }

    #[tokio::test]
    async fn test_dynamic_file_field_uploads() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let (_, actor) = borrower(&ctx, "asha@example.com").await;
        ctx.state
            .form_service
            .create(field(loan.id, "salarySlip", FieldKind::File, true))
            .await
            .unwrap();

        // Required file without an upload
        let err = ctx
            .state
            .application_service
            .submit(&actor, submission(&loan, "asha@example.com", 50_000.0, 12))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailed { .. }));

        let mut form = submission(&loan, "asha@example.com", 50_000.0, 12);
        form.files = vec![
            pdf(FileGroup::Dynamic("salarySlip".into()), "march.pdf"),
            pdf(FileGroup::Dynamic("salarySlip".into()), "april.pdf"),
            pdf(FileGroup::IncomeProof, "itr.pdf"),
        ];
        let app = ctx
            .state
            .application_service
            .submit(&actor, form)
            .await
            .unwrap()
            .application;

        assert_eq!(app.documents.len(), 3);
        let urls: HashSet<String> = app
            .documents
            .iter()
            .filter(|d| d.doc_type == DocumentType::Dynamic("salarySlip".into()))
            .map(|d| d.url.clone())
            .collect();
        assert_eq!(urls.len(), 2);
        match app.dynamic_fields.get("salarySlip") {
            Some(FieldValue::List(refs)) => {
                assert_eq!(refs.iter().cloned().collect::<HashSet<_>>(), urls)
            }
            other => panic!("expected file references, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_for_non_file_field_is_rejected() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let (_, actor) = borrower(&ctx, "asha@example.com").await;
        ctx.state
            .form_service
            .create(field(loan.id, "employer", FieldKind::Text, false))
            .await
            .unwrap();

        let mut form = submission(&loan, "asha@example.com", 50_000.0, 12);
        form.files = vec![pdf(FileGroup::Dynamic("employer".into()), "letter.pdf")];
        match ctx.state.application_service.submit(&actor, form).await {
            Err(ApiError::ValidationFailed { fields, .. }) => {
                assert_eq!(fields, vec!["dynamicFiles_employer"])
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(ctx.blobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_personal_info() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let (_, actor) = borrower(&ctx, "asha@example.com").await;

        let mut form = submission(&loan, "not-an-email", 50_000.0, 12);
        if let Some(info) = form.personal_info.as_mut() {
            info.full_name = "  ".into();
        }
        match ctx.state.application_service.submit(&actor, form).await {
            Err(ApiError::ValidationFailed { fields, .. }) => {
                assert_eq!(fields, vec!["email", "full_name"])
            }
            other => panic!("expected validation failure, got {other:?}"),
        }

        let mut form = submission(&loan, "asha@example.com", 50_000.0, 12);
        form.personal_info = None;
        assert!(matches!(
            ctx.state.application_service.submit(&actor, form).await,
            Err(ApiError::ValidationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_notification_failure_is_a_warning() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let (_, actor) = borrower(&ctx, "asha@example.com").await;
        ctx.notifier.set_failing(true);

        let outcome = ctx
            .state
            .application_service
            .submit(&actor, submission(&loan, "asha@example.com", 50_000.0, 12))
            .await
            .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(ctx.notifier.count().await, 1);
        let listed = ctx.state.application_service.list(&actor).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, outcome.application.id);
    }

    #[tokio::test]
    async fn test_concurrent_application_numbers_are_unique() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let (_, actor) = borrower(&ctx, "asha@example.com").await;

        let mut handles = Vec::with_capacity(1000);
        for _ in 0..1000 {
            let service = ctx.state.application_service.clone();
            let form = submission(&loan, "asha@example.com", 50_000.0, 12);
            handles.push(tokio::spawn(async move {
                service.submit(&actor, form).await.map(|o| o.application.application_number)
            }));
        }

        let mut numbers = HashSet::new();
        for handle in handles {
            numbers.insert(handle.await.unwrap().unwrap());
        }
        assert_eq!(numbers.len(), 1000);
    }
}
