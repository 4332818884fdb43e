//! Dashboard aggregation business logic.
//!
//! Read-only views over the installment table: installments grouped by due
//! date for the receivables calendar, and windowed totals with a delinquency
//! rate for the summary cards. Enriching each installment with its purchase's
//! payer data is the caller's job (see
//! [`crate::core::purchase::purchase_details`]).

use crate::{
    core::schedule::round2,
    entities::{Installment, InstallmentColumn, InstallmentStatus, credit_installment},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, QueryOrder, prelude::*};

/// All installments due on one calendar day.
#[derive(Debug, Clone)]
pub struct DueDateGroup {
    /// The calendar day
    pub due_date: NaiveDate,
    /// Sum of `total_owed` over the day's installments
    pub total: f64,
    /// Number of installments due that day
    pub count: usize,
    /// The day's installments, ordered by installment number
    pub installments: Vec<credit_installment::Model>,
}

/// Windowed counts and sums over installments.
#[derive(Debug, Clone, Default)]
pub struct CreditTotals {
    /// Installments in the window, any status
    pub installment_count: usize,
    /// Sum of `total_owed` over every installment in the window
    pub total_value: f64,
    /// Paid installments in the window
    pub paid_count: usize,
    /// Sum of `total_owed` over paid installments
    pub paid_value: f64,
    /// Pending installments in the window
    pub pending_count: usize,
    /// Sum of `total_owed` over pending installments
    pub pending_value: f64,
    /// Overdue installments in the window
    pub overdue_count: usize,
    /// Sum of `total_owed` over overdue installments
    pub overdue_value: f64,
    /// `overdue_value / total_value` as a 0..1 ratio; 0 when the window is
    /// empty
    pub delinquency_rate: f64,
}

/// Groups installments due in `[start, end]` by calendar day, ascending.
///
/// An optional status filter narrows the result; days with no matching
/// installments produce no group.
pub async fn by_due_date(
    db: &DatabaseConnection,
    start: NaiveDate,
    end: NaiveDate,
    status: Option<InstallmentStatus>,
) -> Result<Vec<DueDateGroup>> {
    let mut query = Installment::find().filter(InstallmentColumn::DueDate.between(start, end));

    if let Some(status) = status {
        query = query.filter(InstallmentColumn::Status.eq(status));
    }

    let installments = query
        .order_by_asc(InstallmentColumn::DueDate)
        .order_by_asc(InstallmentColumn::Number)
        .all(db)
        .await?;

    // The rows arrive due-date ordered, so one forward pass groups them.
    let mut groups: Vec<DueDateGroup> = Vec::new();
    for installment in installments {
        let owed = installment.total_owed();
        let starts_new_day = groups
            .last()
            .map_or(true, |group| group.due_date != installment.due_date);

        if starts_new_day {
            groups.push(DueDateGroup {
                due_date: installment.due_date,
                total: 0.0,
                count: 0,
                installments: Vec::new(),
            });
        }
        if let Some(group) = groups.last_mut() {
            group.total = round2(group.total + owed);
            group.count += 1;
            group.installments.push(installment);
        }
    }

    Ok(groups)
}

/// Computes counts and sums over installments whose due date falls in the
/// optional `[start, end]` window, plus the delinquency rate.
pub async fn totals(
    db: &DatabaseConnection,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<CreditTotals> {
    let mut query = Installment::find();

    if let Some(start) = start {
        query = query.filter(InstallmentColumn::DueDate.gte(start));
    }
    if let Some(end) = end {
        query = query.filter(InstallmentColumn::DueDate.lte(end));
    }

    let installments = query.all(db).await?;

    let mut result = CreditTotals::default();
    for installment in &installments {
        let owed = installment.total_owed();
        result.installment_count += 1;
        result.total_value += owed;

        match installment.status {
            InstallmentStatus::Paid => {
                result.paid_count += 1;
                result.paid_value += owed;
            }
            InstallmentStatus::Pending => {
                result.pending_count += 1;
                result.pending_value += owed;
            }
            InstallmentStatus::Overdue => {
                result.overdue_count += 1;
                result.overdue_value += owed;
            }
            InstallmentStatus::Canceled => {}
        }
    }

    result.total_value = round2(result.total_value);
    result.paid_value = round2(result.paid_value);
    result.pending_value = round2(result.pending_value);
    result.overdue_value = round2(result.overdue_value);
    result.delinquency_rate = if result.total_value > 0.0 {
        result.overdue_value / result.total_value
    } else {
        0.0
    };

    Ok(result)
}
