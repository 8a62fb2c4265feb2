//! Amortizing-loan installment math

/// Monthly installment for `principal` at `annual_rate` percent over `months`
///
/// A zero rate amortizes straight-line (`principal / months`). The result is
/// rounded to the nearest whole currency unit. Zero months yields 0.
pub fn calculate_emi(principal: f64, annual_rate: f64, months: u32) -> i64 {
    if months == 0 || !principal.is_finite() || !annual_rate.is_finite() {
        return 0;
    }
    let n = f64::from(months);
    let r = annual_rate / 100.0 / 12.0;
    if r == 0.0 {
        return (principal / n).round() as i64;
    }
    let growth = (1.0 + r).powf(n);
    (principal * r * growth / (growth - 1.0)).round() as i64
}

/// Total repaid over the tenure at the given installment
pub fn total_payable(emi: i64, months: u32) -> i64 {
    emi * i64::from(months)
}
