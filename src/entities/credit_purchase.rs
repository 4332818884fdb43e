//! Credit purchase entity - The master record of one credit sale.
//!
//! A purchase carries the payer's contact data, the financed amount, and the
//! scheduling parameters from which its installment set is generated. The
//! installments themselves live in `credit_installments` and reference this
//! table by `purchase_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a credit purchase.
///
/// Transitions are enforced by the service layer: `Active -> Canceled` via
/// cancellation, `Active -> Completed` when every open installment is paid,
/// and `Completed -> Active` when a payment is reversed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PurchaseStatus {
    /// Open purchase with at least one unpaid installment
    #[sea_orm(string_value = "active")]
    Active,
    /// Canceled by an operator; open installments were canceled with it
    #[sea_orm(string_value = "canceled")]
    Canceled,
    /// Every non-canceled installment is paid
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// Credit purchase database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_purchases")]
pub struct Model {
    /// UUID of the purchase
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Name of the paying customer
    pub payer_name: String,
    /// Payer's document number (CPF/CNPJ), if known
    pub payer_document: Option<String>,
    /// Payer's contact phone, if known
    pub payer_phone: Option<String>,
    /// What was sold
    pub description: String,
    /// Total value of the sale
    pub total_value: f64,
    /// Amount paid up front; the installments cover `total_value - down_payment`
    pub down_payment: f64,
    /// How many installments the remainder is split into
    pub installment_count: i32,
    /// Due date of the first installment
    pub first_due_date: Date,
    /// Days between consecutive installments
    pub interval_days: i32,
    /// Monthly interest rate in percent (informational)
    pub monthly_interest_rate: f64,
    /// Id of the user who recorded the sale
    pub recorded_by_user_id: String,
    /// Name of the user who recorded the sale
    pub recorded_by_name: String,
    /// Lifecycle status
    pub status: PurchaseStatus,
    /// When the purchase was created
    pub created_at: DateTimeUtc,
    /// When the purchase was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Amount covered by the installment schedule (`total - down payment`).
    #[must_use]
    pub fn payable_value(&self) -> f64 {
        self.total_value - self.down_payment
    }
}

/// Defines relationships between `CreditPurchase` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One purchase has many installments
    #[sea_orm(has_many = "super::credit_installment::Entity")]
    Installments,
}

impl Related<super::credit_installment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
