//! Credit installment entity - One scheduled obligation of a credit purchase.
//!
//! Each purchase generates N installments up front; they are paid (possibly
//! out of order), reversed, or canceled over time. A paid installment always
//! carries its payment date, the id of the ledger entry created for it, and
//! the user who recorded the payment.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an installment.
///
/// Only `Pending` and `Overdue` can move to `Paid` or `Canceled`; `Paid`
/// moves back to `Pending`/`Overdue` only through an explicit reversal;
/// `Canceled` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum InstallmentStatus {
    /// Not yet paid, not yet past due
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled; payment fields are populated
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Not paid and past its due date
    #[sea_orm(string_value = "overdue")]
    Overdue,
    /// Canceled together with its purchase; terminal
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

impl InstallmentStatus {
    /// Whether an installment in this status can still be paid or canceled.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Overdue)
    }
}

/// Credit installment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_installments")]
pub struct Model {
    /// UUID of the installment
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning credit purchase
    pub purchase_id: String,
    /// 1-based position within the purchase, unique per purchase
    pub number: i32,
    /// Scheduled principal value
    pub principal: f64,
    /// Interest charged at payment time
    pub interest: f64,
    /// Late penalty charged at payment time
    pub penalty: f64,
    /// When this installment falls due
    pub due_date: Date,
    /// Lifecycle status
    pub status: InstallmentStatus,
    /// Date the installment was paid; set iff status is `Paid`
    pub payment_date: Option<Date>,
    /// Ledger entry created for the payment; set iff status is `Paid`
    pub ledger_entry_id: Option<String>,
    /// Id of the user who recorded the payment; set iff status is `Paid`
    pub paid_by_user_id: Option<String>,
    /// Name of the user who recorded the payment
    pub paid_by_name: Option<String>,
    /// Free-text note about the installment or its payment
    pub note: String,
    /// When the installment was created
    pub created_at: DateTimeUtc,
    /// When the installment was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Total owed for this installment: principal + interest + penalty.
    #[must_use]
    pub fn total_owed(&self) -> f64 {
        self.principal + self.interest + self.penalty
    }

    /// Days this installment is (or was) late, never negative.
    ///
    /// A paid installment is measured against its payment date; an unpaid
    /// one against `today`.
    #[must_use]
    pub fn days_late(&self, today: NaiveDate) -> i64 {
        let reference = self.payment_date.unwrap_or(today);
        (reference - self.due_date).num_days().max(0)
    }
}

/// Status an unpaid installment should carry for a given due date.
#[must_use]
pub fn status_for_due_date(due_date: NaiveDate, today: NaiveDate) -> InstallmentStatus {
    if due_date < today {
        InstallmentStatus::Overdue
    } else {
        InstallmentStatus::Pending
    }
}

/// Defines relationships between `CreditInstallment` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each installment belongs to one credit purchase
    #[sea_orm(
        belongs_to = "super::credit_purchase::Entity",
        from = "Column::PurchaseId",
        to = "super::credit_purchase::Column::Id"
    )]
    Purchase,
}

impl Related<super::credit_purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn installment(due: NaiveDate, paid: Option<NaiveDate>) -> Model {
        Model {
            id: "i1".to_string(),
            purchase_id: "p1".to_string(),
            number: 1,
            principal: 100.0,
            interest: 2.5,
            penalty: 1.0,
            due_date: due,
            status: if paid.is_some() {
                InstallmentStatus::Paid
            } else {
                InstallmentStatus::Pending
            },
            payment_date: paid,
            ledger_entry_id: paid.map(|_| "e1".to_string()),
            paid_by_user_id: paid.map(|_| "u1".to_string()),
            paid_by_name: paid.map(|_| "User".to_string()),
            note: String::new(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_total_owed_sums_components() {
        let inst = installment(date(2025, 2, 1), None);
        assert_eq!(inst.total_owed(), 103.5);
    }

    #[test]
    fn test_days_late_unpaid_past_due() {
        let inst = installment(date(2025, 2, 1), None);
        assert_eq!(inst.days_late(date(2025, 2, 11)), 10);
    }

    #[test]
    fn test_days_late_unpaid_not_yet_due() {
        let inst = installment(date(2025, 2, 1), None);
        assert_eq!(inst.days_late(date(2025, 1, 20)), 0);
    }

    #[test]
    fn test_days_late_paid_measures_against_payment_date() {
        let inst = installment(date(2025, 2, 1), Some(date(2025, 2, 6)));
        // Today is irrelevant once paid
        assert_eq!(inst.days_late(date(2025, 12, 31)), 5);
    }

    #[test]
    fn test_days_late_paid_on_time() {
        let inst = installment(date(2025, 2, 1), Some(date(2025, 1, 30)));
        assert_eq!(inst.days_late(date(2025, 12, 31)), 0);
    }

    #[test]
    fn test_status_for_due_date() {
        let due = date(2025, 2, 1);
        assert_eq!(
            status_for_due_date(due, date(2025, 2, 1)),
            InstallmentStatus::Pending
        );
        assert_eq!(
            status_for_due_date(due, date(2025, 2, 2)),
            InstallmentStatus::Overdue
        );
    }

    #[test]
    fn test_open_statuses() {
        assert!(InstallmentStatus::Pending.is_open());
        assert!(InstallmentStatus::Overdue.is_open());
        assert!(!InstallmentStatus::Paid.is_open());
        assert!(!InstallmentStatus::Canceled.is_open());
    }
}
