//! Entity module - Contains all SeaORM entity definitions for the per-tenant
//! store. These entities represent the store's tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod credit_installment;
pub mod credit_purchase;
pub mod financial_entry;
pub mod payment_modality;

// Re-export specific types to avoid conflicts
pub use credit_installment::{
    Column as InstallmentColumn, Entity as Installment, InstallmentStatus,
    Model as InstallmentModel,
};
pub use credit_purchase::{
    Column as PurchaseColumn, Entity as Purchase, Model as PurchaseModel, PurchaseStatus,
};
pub use financial_entry::{
    Column as FinancialEntryColumn, Entity as FinancialEntry, Model as FinancialEntryModel,
};
pub use payment_modality::{
    Column as PaymentModalityColumn, Entity as PaymentModality, Model as PaymentModalityModel,
};
