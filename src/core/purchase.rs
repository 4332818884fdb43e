//! Credit purchase business logic - Lifecycle of the master sale record.
//!
//! A purchase and its complete installment set are created together inside
//! one store transaction; they are never written piecemeal. Cancellation
//! bulk-closes the open installments while preserving paid ones as history,
//! and deletion cascades irreversibly to the whole installment set.

use crate::{
    core::{RecordingUser, schedule},
    entities::{
        Installment, InstallmentColumn, InstallmentStatus, Purchase, PurchaseColumn,
        PurchaseStatus, credit_installment, credit_purchase,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{
    DatabaseConnection, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*,
};
use tracing::info;
use uuid::Uuid;

/// Input fields for a new credit purchase.
#[derive(Debug, Clone)]
pub struct NewCreditPurchase {
    /// Name of the paying customer (required)
    pub payer_name: String,
    /// Payer's document number, if known
    pub payer_document: Option<String>,
    /// Payer's contact phone, if known
    pub payer_phone: Option<String>,
    /// What was sold (required)
    pub description: String,
    /// Total value of the sale (> 0)
    pub total_value: f64,
    /// Amount paid up front (>= 0, < total)
    pub down_payment: f64,
    /// Number of installments (>= 1)
    pub installment_count: i32,
    /// Due date of the first installment
    pub first_due_date: NaiveDate,
    /// Days between consecutive installments (>= 1)
    pub interval_days: i32,
    /// Monthly interest rate in percent (>= 0, informational)
    pub monthly_interest_rate: f64,
}

/// Optional filters for listing purchases.
#[derive(Debug, Clone, Default)]
pub struct PurchaseFilter {
    /// Restrict to one lifecycle status
    pub status: Option<PurchaseStatus>,
    /// Case-insensitive partial match on the payer name
    pub payer_name: Option<String>,
    /// Rows to skip (pagination)
    pub offset: u64,
    /// Page size; `None` means the default of 100
    pub limit: Option<u64>,
}

/// A purchase joined with its installments and derived totals.
#[derive(Debug, Clone)]
pub struct PurchaseDetails {
    /// The purchase itself
    pub purchase: credit_purchase::Model,
    /// All installments, ordered by number
    pub installments: Vec<credit_installment::Model>,
    /// Sum of `total_owed` over paid installments
    pub paid_value: f64,
    /// Sum of `total_owed` over pending/overdue installments
    pub pending_value: f64,
    /// Number of paid installments
    pub paid_count: usize,
    /// Number of overdue installments
    pub overdue_count: usize,
    /// Paid share of the financed amount, in percent
    pub percent_paid: f64,
}

fn validate_new_purchase(fields: &NewCreditPurchase, recorded_by: &RecordingUser) -> Result<()> {
    if fields.payer_name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Payer name is required".to_string(),
        });
    }

    if fields.description.trim().is_empty() {
        return Err(Error::Validation {
            message: "Purchase description is required".to_string(),
        });
    }

    if !fields.total_value.is_finite() || fields.total_value <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: fields.total_value,
        });
    }

    if !fields.down_payment.is_finite() || fields.down_payment < 0.0 {
        return Err(Error::InvalidAmount {
            amount: fields.down_payment,
        });
    }

    if fields.down_payment >= fields.total_value {
        return Err(Error::Validation {
            message: "Down payment must be less than the total value".to_string(),
        });
    }

    if fields.installment_count < 1 {
        return Err(Error::Validation {
            message: "Installment count must be at least 1".to_string(),
        });
    }

    if fields.interval_days < 1 {
        return Err(Error::Validation {
            message: "Interval between installments must be at least 1 day".to_string(),
        });
    }

    if !fields.monthly_interest_rate.is_finite() || fields.monthly_interest_rate < 0.0 {
        return Err(Error::Validation {
            message: "Interest rate cannot be negative".to_string(),
        });
    }

    if recorded_by.user_id.trim().is_empty() || recorded_by.name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Recording user is required".to_string(),
        });
    }

    Ok(())
}

/// Creates a credit purchase together with its full installment set.
///
/// Validates every invariant before any write, then persists the purchase
/// and the generated installment batch inside one transaction — both are
/// written or neither is.
pub async fn create_purchase(
    db: &DatabaseConnection,
    fields: NewCreditPurchase,
    recorded_by: &RecordingUser,
) -> Result<(credit_purchase::Model, Vec<credit_installment::Model>)> {
    validate_new_purchase(&fields, recorded_by)?;

    let now = chrono::Utc::now();
    let purchase = credit_purchase::Model {
        id: Uuid::new_v4().to_string(),
        payer_name: fields.payer_name.trim().to_string(),
        payer_document: fields.payer_document,
        payer_phone: fields.payer_phone,
        description: fields.description.trim().to_string(),
        total_value: fields.total_value,
        down_payment: fields.down_payment,
        installment_count: fields.installment_count,
        first_due_date: fields.first_due_date,
        interval_days: fields.interval_days,
        monthly_interest_rate: fields.monthly_interest_rate,
        recorded_by_user_id: recorded_by.user_id.clone(),
        recorded_by_name: recorded_by.name.clone(),
        status: PurchaseStatus::Active,
        created_at: now,
        updated_at: now,
    };

    let plan = schedule::plan_installments(
        fields.total_value,
        fields.down_payment,
        fields.installment_count,
        fields.first_due_date,
        fields.interval_days,
    );
    let installments: Vec<credit_installment::Model> = plan
        .into_iter()
        .map(|planned| credit_installment::Model {
            id: Uuid::new_v4().to_string(),
            purchase_id: purchase.id.clone(),
            number: planned.number,
            principal: planned.principal,
            interest: 0.0,
            penalty: 0.0,
            due_date: planned.due_date,
            status: InstallmentStatus::Pending,
            payment_date: None,
            ledger_entry_id: None,
            paid_by_user_id: None,
            paid_by_name: None,
            note: String::new(),
            created_at: now,
            updated_at: now,
        })
        .collect();

    // Single transaction: the purchase is never visible without its
    // installment set, nor the other way around.
    let txn = db.begin().await?;
    credit_purchase::ActiveModel::from(purchase.clone())
        .insert(&txn)
        .await?;
    Installment::insert_many(
        installments
            .iter()
            .cloned()
            .map(credit_installment::ActiveModel::from),
    )
    .exec(&txn)
    .await?;
    txn.commit().await?;

    info!(
        purchase_id = %purchase.id,
        installments = installments.len(),
        "created credit purchase"
    );

    Ok((purchase, installments))
}

/// Retrieves a purchase by its unique id.
pub async fn get_purchase_by_id(
    db: &DatabaseConnection,
    purchase_id: &str,
) -> Result<Option<credit_purchase::Model>> {
    Purchase::find_by_id(purchase_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Cancels a purchase and bulk-cancels its open installments.
///
/// Installments already paid are left untouched as history. Returns the
/// updated purchase and how many installments were canceled.
pub async fn cancel_purchase(
    db: &DatabaseConnection,
    purchase_id: &str,
) -> Result<(credit_purchase::Model, u64)> {
    let txn = db.begin().await?;

    let purchase = Purchase::find_by_id(purchase_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::PurchaseNotFound {
            id: purchase_id.to_string(),
        })?;

    if purchase.status == PurchaseStatus::Canceled {
        return Err(Error::StateConflict {
            message: "Purchase is already canceled".to_string(),
        });
    }

    let now = chrono::Utc::now();
    let mut active: credit_purchase::ActiveModel = purchase.into();
    active.status = Set(PurchaseStatus::Canceled);
    active.updated_at = Set(now);
    let updated = active.update(&txn).await?;

    let canceled = Installment::update_many()
        .set(credit_installment::ActiveModel {
            status: Set(InstallmentStatus::Canceled),
            updated_at: Set(now),
            ..Default::default()
        })
        .filter(InstallmentColumn::PurchaseId.eq(purchase_id))
        .filter(InstallmentColumn::Status.is_in([
            InstallmentStatus::Pending,
            InstallmentStatus::Overdue,
        ]))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(
        purchase_id,
        canceled_installments = canceled.rows_affected,
        "canceled credit purchase"
    );

    Ok((updated, canceled.rows_affected))
}

/// Retrieves a purchase with its installments and derived payment totals.
pub async fn purchase_details(
    db: &DatabaseConnection,
    purchase_id: &str,
) -> Result<PurchaseDetails> {
    let purchase = get_purchase_by_id(db, purchase_id)
        .await?
        .ok_or_else(|| Error::PurchaseNotFound {
            id: purchase_id.to_string(),
        })?;

    let installments = Installment::find()
        .filter(InstallmentColumn::PurchaseId.eq(purchase_id))
        .order_by_asc(InstallmentColumn::Number)
        .all(db)
        .await?;

    let paid_value: f64 = installments
        .iter()
        .filter(|i| i.status == InstallmentStatus::Paid)
        .map(credit_installment::Model::total_owed)
        .sum();
    let pending_value: f64 = installments
        .iter()
        .filter(|i| i.status.is_open())
        .map(credit_installment::Model::total_owed)
        .sum();
    let paid_count = installments
        .iter()
        .filter(|i| i.status == InstallmentStatus::Paid)
        .count();
    let overdue_count = installments
        .iter()
        .filter(|i| i.status == InstallmentStatus::Overdue)
        .count();

    let payable = purchase.payable_value();
    let percent_paid = if payable > 0.0 {
        schedule::round2(paid_value / payable * 100.0)
    } else {
        100.0
    };

    Ok(PurchaseDetails {
        purchase,
        installments,
        paid_value: schedule::round2(paid_value),
        pending_value: schedule::round2(pending_value),
        paid_count,
        overdue_count,
        percent_paid,
    })
}

/// Lists purchases newest-first with optional status/payer filters and
/// offset/limit pagination.
pub async fn list_purchases(
    db: &DatabaseConnection,
    filter: &PurchaseFilter,
) -> Result<Vec<credit_purchase::Model>> {
    let mut query = Purchase::find();

    if let Some(status) = filter.status {
        query = query.filter(PurchaseColumn::Status.eq(status));
    }
    if let Some(payer_name) = &filter.payer_name {
        query = query.filter(PurchaseColumn::PayerName.contains(payer_name.as_str()));
    }

    query
        .order_by_desc(PurchaseColumn::CreatedAt)
        .offset(filter.offset)
        .limit(filter.limit.unwrap_or(100))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts purchases matching the same filters as [`list_purchases`].
pub async fn count_purchases(db: &DatabaseConnection, filter: &PurchaseFilter) -> Result<u64> {
    let mut query = Purchase::find();

    if let Some(status) = filter.status {
        query = query.filter(PurchaseColumn::Status.eq(status));
    }
    if let Some(payer_name) = &filter.payer_name {
        query = query.filter(PurchaseColumn::PayerName.contains(payer_name.as_str()));
    }

    query.count(db).await.map_err(Into::into)
}

/// Updates the payer's contact information; `None` leaves a field unchanged.
pub async fn update_contact_info(
    db: &DatabaseConnection,
    purchase_id: &str,
    payer_phone: Option<String>,
    payer_document: Option<String>,
) -> Result<credit_purchase::Model> {
    let purchase = get_purchase_by_id(db, purchase_id)
        .await?
        .ok_or_else(|| Error::PurchaseNotFound {
            id: purchase_id.to_string(),
        })?;

    let mut active: credit_purchase::ActiveModel = purchase.into();
    if let Some(phone) = payer_phone {
        active.payer_phone = Set(Some(phone));
    }
    if let Some(document) = payer_document {
        active.payer_document = Set(Some(document));
    }
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Deletes a purchase and all its installments. Irreversible.
///
/// Returns how many installments were removed with it.
pub async fn delete_purchase(db: &DatabaseConnection, purchase_id: &str) -> Result<u64> {
    let txn = db.begin().await?;

    Purchase::find_by_id(purchase_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::PurchaseNotFound {
            id: purchase_id.to_string(),
        })?;

    let removed = Installment::delete_many()
        .filter(InstallmentColumn::PurchaseId.eq(purchase_id))
        .exec(&txn)
        .await?;
    Purchase::delete_by_id(purchase_id).exec(&txn).await?;

    txn.commit().await?;

    info!(
        purchase_id,
        deleted_installments = removed.rows_affected,
        "deleted credit purchase"
    );

    Ok(removed.rows_affected)
}
