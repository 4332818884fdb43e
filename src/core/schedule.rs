//! Installment scheduling - Expands a credit purchase into its installment plan.
//!
//! Pure and deterministic: the same purchase parameters always produce the
//! same plan. The financed amount is split evenly at cent precision, with the
//! last installment absorbing the rounding remainder so the principals always
//! sum to exactly `total_value - down_payment`.

use chrono::{Duration, NaiveDate};

/// One planned installment, before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedInstallment {
    /// 1-based position within the purchase
    pub number: i32,
    /// Scheduled principal value
    pub principal: f64,
    /// When the installment falls due
    pub due_date: NaiveDate,
}

/// Rounds a monetary value to cents.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Expands purchase parameters into the full installment plan.
///
/// Installment `i` (1-based) is due at `first_due_date + (i-1) * interval_days`
/// and carries `round2(payable / count)` of principal, except the last one,
/// which also absorbs the rounding remainder. Callers validate the inputs
/// (`count >= 1`, `interval_days >= 1`, `down_payment < total_value`) before
/// calling.
#[must_use]
pub fn plan_installments(
    total_value: f64,
    down_payment: f64,
    count: i32,
    first_due_date: NaiveDate,
    interval_days: i32,
) -> Vec<PlannedInstallment> {
    let payable = total_value - down_payment;
    let base = round2(payable / f64::from(count));

    let mut plan: Vec<PlannedInstallment> = (1..=count)
        .map(|number| {
            let offset = i64::from(number - 1) * i64::from(interval_days);
            PlannedInstallment {
                number,
                principal: base,
                due_date: first_due_date + Duration::days(offset),
            }
        })
        .collect();

    // The last installment absorbs whatever cent rounding left over, so the
    // plan's principals sum to the payable amount exactly.
    let planned_total: f64 = plan.iter().map(|p| p.principal).sum();
    let remainder = round2(payable - planned_total);
    if let Some(last) = plan.last_mut() {
        last.principal = round2(last.principal + remainder);
    }

    plan
}
