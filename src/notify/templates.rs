//! Email bodies for applicants

use super::EmailMessage;
use crate::application::Application;
use crate::otp::OtpPurpose;

fn wrap(title_color: &str, title: &str, body: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;"><h2 style="color: {title_color};">{title}</h2>{body}</div>"#
    )
}

fn para(text: &str) -> String {
    format!(r#"<p style="color: #666;">{text}</p>"#)
}

/// Format an amount with thousands separators, e.g. `50,000`
pub fn format_amount(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if whole < 0 {
        out.insert(0, '-');
    }
    out
}

pub fn otp_code(to: &str, code: &str, purpose: OtpPurpose, ttl_minutes: i64) -> EmailMessage {
    let purpose = purpose.as_str();
    EmailMessage {
        to: to.to_string(),
        subject: format!("Your OTP for {purpose}"),
        html: format!(
            r#"<div style="font-family:sans-serif; line-height:1.6"><h2>Your OTP Code</h2><p>Your OTP for <strong>{purpose}</strong> is:</p><h1 style="font-size:32px; letter-spacing:2px">{code}</h1><p>This OTP will expire in {ttl_minutes} minutes.</p></div>"#
        ),
        text: format!("OTP for {purpose}: {code} (expires in {ttl_minutes} minutes)"),
    }
}

pub fn application_submitted(to: &str, app: &Application) -> EmailMessage {
    let amount = format_amount(app.loan_details.loan_amount);
    let body = [
        para(&format!("Dear {},", app.personal_info.full_name)),
        para("Your loan application has been submitted successfully."),
        para(&format!(
            "<strong>Application Number:</strong> {}",
            app.application_number
        )),
        para(&format!("<strong>Loan Type:</strong> {}", app.loan_type.as_str())),
        para(&format!("<strong>Loan Amount:</strong> ₹{amount}")),
        para("We will review your application and get back to you soon."),
    ]
    .concat();
    EmailMessage {
        to: to.to_string(),
        subject: "Loan Application Submitted".to_string(),
        html: wrap("#333", "Loan Application Submitted", &body),
        text: format!(
            "Your {} loan application {} for ₹{amount} has been submitted.",
            app.loan_type.as_str(),
            app.application_number
        ),
    }
}

pub fn application_approved(to: &str, app: &Application) -> EmailMessage {
    let amount = format_amount(app.loan_details.loan_amount);
    let body = [
        para(&format!("Dear {},", app.personal_info.full_name)),
        para("Congratulations! Your loan application has been approved."),
        para(&format!(
            "<strong>Application Number:</strong> {}",
            app.application_number
        )),
        para(&format!("<strong>Loan Amount:</strong> ₹{amount}")),
        para("Our team will contact you shortly to proceed with the disbursement."),
    ]
    .concat();
    EmailMessage {
        to: to.to_string(),
        subject: "Loan Application Approved".to_string(),
        html: wrap("#28a745", "Loan Application Approved!", &body),
        text: format!("Your loan application {} has been approved.", app.application_number),
    }
}

pub fn application_rejected(to: &str, app: &Application) -> EmailMessage {
    let reason = app.rejection_reason.as_deref().unwrap_or_default();
    let body = [
        para(&format!("Dear {},", app.personal_info.full_name)),
        para("We regret to inform you that your loan application has been rejected."),
        para(&format!(
            "<strong>Application Number:</strong> {}",
            app.application_number
        )),
        para(&format!("<strong>Reason:</strong> {reason}")),
        para("Please feel free to contact us if you have any questions."),
    ]
    .concat();
    EmailMessage {
        to: to.to_string(),
        subject: "Loan Application Status".to_string(),
        html: wrap("#dc3545", "Loan Application Status", &body),
        text: format!(
            "Your loan application {} has been rejected. Reason: {reason}",
            app.application_number
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(50_000.0), "50,000");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1_234_567.4), "1,234,567");
    }

    #[test]
    fn test_otp_email_mentions_purpose_and_expiry() {
        let msg = otp_code("a@b.com", "123456", OtpPurpose::Application, 10);
        assert_eq!(msg.subject, "Your OTP for application");
        assert!(msg.text.contains("123456"));
        assert!(msg.text.contains("10 minutes"));
    }
}
