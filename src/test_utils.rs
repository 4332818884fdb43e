//! Shared test utilities for `credit-ledger`.
//!
//! This module provides common helper functions for provisioning in-memory
//! tenant stores and creating test entities with sensible defaults.

use crate::{
    config::StoreConfig,
    core::{
        RecordingUser,
        payment::PaymentInput,
        purchase::{NewCreditPurchase, create_purchase},
    },
    entities::{InstallmentStatus, PurchaseStatus, credit_installment, credit_purchase,
        payment_modality},
    errors::Result,
    tenancy::TenantStoreRouter,
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use uuid::Uuid;

/// Provisions a fresh in-memory tenant store through the router.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let router = TenantStoreRouter::new(StoreConfig::in_memory());
    router.provision("test-tenant", None).await
}

/// The default operator stamped on test writes.
#[must_use]
pub fn test_recorder() -> RecordingUser {
    RecordingUser::new("user-1", "Test Operator")
}

/// Purchase fields with sensible defaults.
///
/// # Defaults
/// * `total_value`: 300.0, no down payment
/// * `installment_count`: 3 (100.0 each)
/// * `first_due_date`: 2025-02-01, `interval_days`: 30
#[must_use]
pub fn new_purchase_fields() -> NewCreditPurchase {
    NewCreditPurchase {
        payer_name: "Test Payer".to_string(),
        payer_document: None,
        payer_phone: None,
        description: "Washing machine".to_string(),
        total_value: 300.0,
        down_payment: 0.0,
        installment_count: 3,
        first_due_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap_or_default(),
        interval_days: 30,
        monthly_interest_rate: 0.0,
    }
}

/// Creates a test purchase (3 installments of 100.0) for the given payer.
pub async fn create_test_purchase(
    db: &DatabaseConnection,
    payer_name: &str,
) -> Result<(credit_purchase::Model, Vec<credit_installment::Model>)> {
    let mut fields = new_purchase_fields();
    fields.payer_name = payer_name.to_string();
    create_purchase(db, fields, &test_recorder()).await
}

/// Creates a test purchase with a custom installment count
/// (100.0 of principal per installment).
pub async fn create_test_purchase_with(
    db: &DatabaseConnection,
    payer_name: &str,
    installment_count: i32,
) -> Result<(credit_purchase::Model, Vec<credit_installment::Model>)> {
    let mut fields = new_purchase_fields();
    fields.payer_name = payer_name.to_string();
    fields.total_value = 100.0 * f64::from(installment_count);
    fields.installment_count = installment_count;
    create_purchase(db, fields, &test_recorder()).await
}

/// Inserts a payment modality directly (modality CRUD is outside the core).
pub async fn create_test_modality(
    db: &DatabaseConnection,
    name: &str,
    is_active: bool,
) -> Result<payment_modality::Model> {
    let now = chrono::Utc::now();
    let modality = payment_modality::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(name.to_string()),
        color: Set("#3b82f6".to_string()),
        is_active: Set(is_active),
        created_at: Set(now),
        updated_at: Set(now),
    };
    modality.insert(db).await.map_err(Into::into)
}

/// Payment input with sensible defaults (dated 2025-02-10, no charges).
#[must_use]
pub fn payment_input(modality_id: &str) -> PaymentInput {
    PaymentInput {
        payment_date: NaiveDate::from_ymd_opt(2025, 2, 10).unwrap_or_default(),
        modality_id: modality_id.to_string(),
        interest: 0.0,
        penalty: 0.0,
        note: String::new(),
    }
}

/// Forces an installment to paid with consistent payment fields, bypassing
/// the payment flow. Use when a test needs paid rows without modalities or
/// ledger entries.
pub async fn force_paid(
    db: &DatabaseConnection,
    installment: &credit_installment::Model,
    payment_date: NaiveDate,
) -> Result<credit_installment::Model> {
    let mut active: credit_installment::ActiveModel = installment.clone().into();
    active.status = Set(InstallmentStatus::Paid);
    active.payment_date = Set(Some(payment_date));
    active.ledger_entry_id = Set(Some(format!("test-entry-{}", installment.id)));
    active.paid_by_user_id = Set(Some("user-1".to_string()));
    active.paid_by_name = Set(Some("Test Operator".to_string()));
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Forces an installment into the given status, bypassing transition checks.
/// Setting `Paid` stamps consistent payment fields.
pub async fn set_installment_status(
    db: &DatabaseConnection,
    installment: &credit_installment::Model,
    status: InstallmentStatus,
) -> Result<credit_installment::Model> {
    if status == InstallmentStatus::Paid {
        return force_paid(db, installment, installment.due_date).await;
    }

    let mut active: credit_installment::ActiveModel = installment.clone().into();
    active.status = Set(status);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Forces a purchase into the given status, bypassing transition checks.
pub async fn set_purchase_status(
    db: &DatabaseConnection,
    purchase: &credit_purchase::Model,
    status: PurchaseStatus,
) -> Result<credit_purchase::Model> {
    let mut active: credit_purchase::ActiveModel = purchase.clone().into();
    active.status = Set(status);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}
