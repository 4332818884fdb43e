//! Payment modality entity - Reference data consulted when paying.
//!
//! Modality CRUD belongs to the surrounding application; the core only
//! looks a modality up by id and requires it to be active before accepting
//! a payment tagged with it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment modality database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_modalities")]
pub struct Model {
    /// UUID of the modality
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name (e.g. "PIX", "Cash")
    pub name: String,
    /// Display color
    pub color: String,
    /// Whether the modality currently accepts payments
    pub is_active: bool,
    /// When the modality was created
    pub created_at: DateTimeUtc,
    /// When the modality was last modified
    pub updated_at: DateTimeUtc,
}

/// `PaymentModality` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
