//! Financial entry entity - One monetary movement in the generic ledger.
//!
//! The schema is owned by the ledger subsystem; this core only creates an
//! entry when an installment is paid and deletes it when the payment is
//! reversed. The modality fields are a denormalized snapshot taken at
//! payment time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Financial entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_entries")]
pub struct Model {
    /// UUID of the entry
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Value of the movement
    pub value: f64,
    /// Date the movement happened
    pub date: Date,
    /// Payment modality used
    pub modality_id: String,
    /// Modality name at the time of the movement
    pub modality_name: String,
    /// Modality display color at the time of the movement
    pub modality_color: String,
    /// When the entry was created
    pub created_at: DateTimeUtc,
    /// When the entry was last modified
    pub updated_at: DateTimeUtc,
}

/// `FinancialEntry` has no owned relationships; installments reference it by id
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
