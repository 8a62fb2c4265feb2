//! HTTP surface: routing, extractors, status codes and response envelopes

mod common;

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use loandesk_server::api_router;
    use loandesk_server::auth::{VerifyOtpRequest, VerifyOtpResponse};
    use loandesk_server::config::Config;
    use loandesk_server::otp::{OtpIdentifier, OtpPurpose};

    use crate::common::{admin, borrower, context, context_with, personal_loan, TestContext};

    const BOUNDARY: &str = "loandesk-test-boundary";

    fn app(ctx: &TestContext) -> Router {
        api_router(ctx.state.clone())
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    enum Part<'a> {
        Text(&'a str, String),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart(uri: &str, token: &str, parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, file_name, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn token_for(ctx: &TestContext, email: &str) -> String {
        let (user, _) = borrower(ctx, email).await;
        ctx.state.auth_service.issue_access_token(&user).unwrap()
    }

    async fn admin_token(ctx: &TestContext) -> String {
        let (user, _) = admin(ctx).await;
        ctx.state.auth_service.issue_access_token(&user).unwrap()
    }

    async fn application_token(ctx: &TestContext, email: &str) -> String {
        let auth = &ctx.state.auth_service;
        let issued = auth
            .otp()
            .issue(&OtpIdentifier::new(Some(email), None).unwrap(), OtpPurpose::Application)
            .await
            .unwrap();
        match auth
            .verify_otp(VerifyOtpRequest {
                email: Some(email.to_string()),
                phone: None,
                otp: issued.code,
                purpose: OtpPurpose::Application,
            })
            .await
            .unwrap()
        {
            VerifyOtpResponse::Application {
                verification_token, ..
            } => verification_token,
            other => panic!("expected verification token, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_health_reports_store() {
        let ctx = context();
        let response = app(&ctx).oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert!(response.headers().contains_key("x-request-id"));

        let (_, body) = send(app(&ctx), get("/health", None)).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["healthy"], true);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let ctx = context();
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();
        let response = app(&ctx).oneshot(request).await.unwrap();
        assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
    }

    #[tokio::test]
    async fn test_otp_login_flow() {
        let ctx = context();
        ctx.notifier.set_failing(true);

        let (status, body) = send(
            app(&ctx),
            json_request(
                "POST",
                "/api/auth/send-otp",
                None,
                json!({ "email": "asha@example.com", "purpose": "login" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["delivered"], false);
        let code = body["data"]["code"].as_str().unwrap().to_string();

        let (status, body) = send(
            app(&ctx),
            json_request(
                "POST",
                "/api/auth/verify-otp",
                None,
                json!({ "email": "asha@example.com", "otp": code, "purpose": "login" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["data"]["accessToken"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["user"]["role"], "user");

        let (status, body) = send(app(&ctx), get("/api/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "asha@example.com");

        // The code was consumed by the first verification
        let (status, body) = send(
            app(&ctx),
            json_request(
                "POST",
                "/api/auth/verify-otp",
                None,
                json!({ "email": "asha@example.com", "otp": code, "purpose": "login" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_OTP");
    }

    #[tokio::test]
    async fn test_missing_and_bad_tokens() {
        let ctx = context();
        let (status, body) = send(app(&ctx), get("/api/auth/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "MISSING_TOKEN");

        let (status, body) = send(app(&ctx), get("/api/auth/me", Some("garbage"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");

        // Verification tokens cannot stand in for access tokens
        let verification = application_token(&ctx, "asha@example.com").await;
        let (status, body) = send(app(&ctx), get("/api/auth/me", Some(&verification))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_TOKEN_TYPE");
    }

    #[tokio::test]
    async fn test_otp_endpoints_are_throttled() {
        let mut config = Config::in_memory();
        config.otp_rate_limit_per_minute = 2;
        let ctx = context_with(config);

        let request = || {
            let mut request = json_request(
                "POST",
                "/api/auth/send-otp",
                None,
                json!({ "email": "asha@example.com" }),
            );
            request
                .headers_mut()
                .insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
            request
        };
        assert_eq!(send(app(&ctx), request()).await.0, StatusCode::OK);
        assert_eq!(send(app(&ctx), request()).await.0, StatusCode::OK);

        let response = app(&ctx).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");

        // The current-user route is not throttled
        let (status, _) = send(app(&ctx), get("/api/auth/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_catalog_admin_routes() {
        let ctx = context();
        let user = token_for(&ctx, "asha@example.com").await;
        let admin = admin_token(&ctx).await;
        let body = json!({
            "name": "Home Loan",
            "type": "Home",
            "description": "Buy a home",
            "interestRate": { "min": 8.5, "max": 10.5 },
            "minLoanAmount": 500000,
            "maxLoanAmount": 10000000,
            "minTenure": 12,
            "maxTenure": 360
        });

        let (status, err) = send(app(&ctx), json_request("POST", "/api/loans", Some(&user), body.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(err["error"]["code"], "FORBIDDEN");

        let (status, created) = send(app(&ctx), json_request("POST", "/api/loans", Some(&admin), body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["slug"], "home-loan");

        let (status, fetched) = send(app(&ctx), get("/api/loans/home-loan", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["data"]["name"], "Home Loan");

        let (status, listed) = send(app(&ctx), get("/api/loans/type/home", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);

        let (status, emi) = send(
            app(&ctx),
            get("/api/loans/home-loan/emi?amount=1000000&tenure=240", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(emi["data"]["emi"].as_i64().unwrap() > 0);

        let (status, _) = send(app(&ctx), get("/api/loans/no-such-loan", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let id = created["data"]["id"].as_str().unwrap();
        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/api/loans/{id}"))
            .header(header::AUTHORIZATION, format!("Bearer {admin}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(&ctx), delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_render_and_categories_are_public() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;

        let (status, body) = send(app(&ctx), get(&format!("/api/form-fields/loan/{}/render", loan.id), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].is_array());

        let (status, body) = send(app(&ctx), get("/api/categories", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_deactivated_loan_is_not_public() {
        let ctx = context();
        let admin = admin_token(&ctx).await;
        let (status, _) = send(
            app(&ctx),
            json_request(
                "POST",
                "/api/loans",
                Some(&admin),
                json!({
                    "name": "Retired Loan",
                    "type": "Personal",
                    "interestRate": { "min": 12, "max": 18 },
                    "minLoanAmount": 10000,
                    "maxLoanAmount": 100000,
                    "minTenure": 6,
                    "maxTenure": 24,
                    "isActive": false
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(app(&ctx), get("/api/loans/retired-loan", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(
            app(&ctx),
            get("/api/loans/retired-loan/emi?amount=50000&tenure=12", None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_category_detail_requires_login() {
        let ctx = context();
        let admin = admin_token(&ctx).await;
        let user = token_for(&ctx, "asha@example.com").await;
        let (_, body) = send(
            app(&ctx),
            json_request("POST", "/api/categories", Some(&admin), json!({ "name": "Instant" })),
        )
        .await;
        let id = body["data"]["id"].as_str().unwrap().to_string();
        for (name, active) in [("Live Loan", true), ("Paused Loan", false)] {
            let (status, _) = send(
                app(&ctx),
                json_request(
                    "POST",
                    "/api/loans",
                    Some(&admin),
                    json!({
                        "name": name,
                        "type": "Personal",
                        "categoryId": id,
                        "interestRate": { "min": 12, "max": 18 },
                        "minLoanAmount": 10000,
                        "maxLoanAmount": 100000,
                        "minTenure": 6,
                        "maxTenure": 24,
                        "isActive": active
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        for uri in [format!("/api/categories/{id}"), format!("/api/categories/{id}/loans")] {
            let (status, _) = send(app(&ctx), get(&uri, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let loans = format!("/api/categories/{id}/loans");
        let (status, body) = send(app(&ctx), get(&loans, Some(&user))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        let (_, body) = send(app(&ctx), get(&loans, Some(&admin))).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_eligibility_submission() {
        let ctx = context();
        let (status, body) = send(
            app(&ctx),
            json_request(
                "POST",
                "/api/eligibility",
                None,
                json!({
                    "email": "asha@example.com",
                    "pancard": "abcde1234f",
                    "dob": "1990-05-17",
                    "gender": "Female",
                    "personalEmail": "asha.personal@example.com",
                    "employmentType": "SELF EMPLOYED",
                    "netMonthlyIncome": 80000,
                    "pinCode": "560001"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["pancard"], "ABCDE1234F");

        let (status, body) = send(
            app(&ctx),
            json_request("POST", "/api/eligibility", None, json!({ "email": "asha@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
        assert!(body["error"]["details"]["fields"]
            .as_array()
            .unwrap()
            .contains(&json!("pancard")));

        // Listing is admin-only
        let (status, _) = send(app(&ctx), get("/api/eligibility", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let admin = admin_token(&ctx).await;
        let (status, body) = send(app(&ctx), get("/api/eligibility?limit=5", Some(&admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 1);
    }

    fn application_parts<'a>(loan_id: &str, email: &str, otp_token: Option<String>) -> Vec<Part<'a>> {
        let mut parts = vec![
            Part::Text("loanId", loan_id.to_string()),
            Part::Text(
                "personalInfo",
                json!({ "fullName": "Asha Rao", "email": email }).to_string(),
            ),
            Part::Text(
                "loanDetails",
                json!({ "loanAmount": "100000", "loanTenure": "24" }).to_string(),
            ),
            Part::File("idProof", "aadhaar.pdf", b"%PDF-1.4 id"),
        ];
        if let Some(token) = otp_token {
            parts.push(Part::Text("otpToken", token));
        }
        parts
    }

    #[tokio::test]
    async fn test_multipart_submission_requires_verified_email() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let user = token_for(&ctx, "asha@example.com").await;
        let loan_id = loan.id.to_string();

        let (status, body) = send(
            app(&ctx),
            multipart(
                "/api/applications",
                &user,
                &application_parts(&loan_id, "asha@example.com", None),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_OTP");
        assert!(ctx.blobs.is_empty().await);

        let verified = application_token(&ctx, "asha@example.com").await;
        let (status, body) = send(
            app(&ctx),
            multipart(
                "/api/applications",
                &user,
                &application_parts(&loan_id, "asha@example.com", Some(verified)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "Submitted");
        assert_eq!(body["data"]["loanDetails"]["emi"], 4992);
        assert_eq!(body["data"]["documents"][0]["type"], "ID");
        assert!(body["data"]["applicationNumber"]
            .as_str()
            .unwrap()
            .starts_with("APP"));

        let id = body["data"]["id"].as_str().unwrap().to_string();
        let (status, body) = send(app(&ctx), get(&format!("/api/applications/{id}"), Some(&user))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["personalInfo"]["email"], "asha@example.com");
    }

    #[tokio::test]
    async fn test_token_for_other_email_is_rejected() {
        let ctx = context();
        let loan = personal_loan(&ctx).await;
        let user = token_for(&ctx, "asha@example.com").await;
        let other = application_token(&ctx, "ravi@example.com").await;

        let (status, body) = send(
            app(&ctx),
            multipart(
                "/api/applications",
                &user,
                &application_parts(&loan.id.to_string(), "asha@example.com", Some(other)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_OTP");
    }

    #[tokio::test]
    async fn test_rejected_file_type() {
        let mut config = Config::in_memory();
        config.require_application_otp = false;
        let ctx = context_with(config);
        let loan = personal_loan(&ctx).await;
        let user = token_for(&ctx, "asha@example.com").await;

        let mut parts = application_parts(&loan.id.to_string(), "asha@example.com", None);
        parts.push(Part::File("incomeProof", "payslip.exe", b"MZ"));
        let (status, body) = send(app(&ctx), multipart("/api/applications", &user, &parts)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["fields"], json!(["incomeProof"]));
        assert!(ctx.blobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_review_over_http() {
        let mut config = Config::in_memory();
        config.require_application_otp = false;
        let ctx = context_with(config);
        let loan = personal_loan(&ctx).await;
        let user = token_for(&ctx, "asha@example.com").await;
        let admin = admin_token(&ctx).await;

        let (_, body) = send(
            app(&ctx),
            multipart(
                "/api/applications",
                &user,
                &application_parts(&loan.id.to_string(), "asha@example.com", None),
            ),
        )
        .await;
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            app(&ctx),
            json_request("POST", &format!("/api/applications/{id}/approve"), Some(&user), Value::Null),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Body is optional on reject
        let reject = Request::builder()
            .method("POST")
            .uri(format!("/api/applications/{id}/reject"))
            .header(header::AUTHORIZATION, format!("Bearer {admin}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(&ctx), reject).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "Rejected");
        assert_eq!(
            body["data"]["rejectionReason"],
            "Application did not meet eligibility criteria"
        );

        let (status, body) = send(
            app(&ctx),
            json_request("POST", &format!("/api/applications/{id}/approve"), Some(&admin), Value::Null),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }
}
