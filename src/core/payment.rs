//! Installment payment business logic - Paying, reversing, and overdue refresh.
//!
//! Paying an installment creates one ledger entry and stamps the payment
//! fields in a single conditional update: the `WHERE status IN (pending,
//! overdue)` clause is the authoritative guard, so two concurrent payments
//! of the same installment cannot both succeed — the loser's transaction
//! rolls back and its ledger entry is discarded. Reversal deletes the linked
//! ledger entry best-effort and recomputes the installment status from its
//! due date.

use crate::{
    core::{RecordingUser, ledger, schedule},
    entities::{
        Installment, InstallmentColumn, InstallmentStatus, Purchase, PurchaseStatus,
        credit_installment, credit_installment::status_for_due_date, credit_purchase,
        financial_entry,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseConnection, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, warn};

/// Input fields for paying one installment.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    /// Date the payment was received
    pub payment_date: NaiveDate,
    /// Payment modality used; must exist and be active
    pub modality_id: String,
    /// Interest charged on top of the principal (>= 0)
    pub interest: f64,
    /// Late penalty charged on top of the principal (>= 0)
    pub penalty: f64,
    /// Free-text note; empty leaves the installment's note unchanged
    pub note: String,
}

/// Retrieves an installment by its unique id.
pub async fn get_installment_by_id(
    db: &DatabaseConnection,
    installment_id: &str,
) -> Result<Option<credit_installment::Model>> {
    Installment::find_by_id(installment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Pays one installment: creates the ledger entry for
/// `principal + interest + penalty` and stamps the payment fields.
///
/// Fails if the installment is missing, already paid, or canceled; if the
/// owning purchase is missing or canceled; or if the modality is missing or
/// inactive. When the payment settles the last open installment of the
/// purchase, the purchase transitions to completed.
pub async fn pay_installment(
    db: &DatabaseConnection,
    installment_id: &str,
    input: PaymentInput,
    recorded_by: &RecordingUser,
) -> Result<(credit_installment::Model, financial_entry::Model)> {
    if !input.interest.is_finite() || input.interest < 0.0 {
        return Err(Error::InvalidAmount {
            amount: input.interest,
        });
    }
    if !input.penalty.is_finite() || input.penalty < 0.0 {
        return Err(Error::InvalidAmount {
            amount: input.penalty,
        });
    }

    let txn = db.begin().await?;

    let installment = Installment::find_by_id(installment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::InstallmentNotFound {
            id: installment_id.to_string(),
        })?;

    match installment.status {
        InstallmentStatus::Paid => {
            return Err(Error::StateConflict {
                message: "Installment is already paid".to_string(),
            });
        }
        InstallmentStatus::Canceled => {
            return Err(Error::StateConflict {
                message: "Cannot pay a canceled installment".to_string(),
            });
        }
        InstallmentStatus::Pending | InstallmentStatus::Overdue => {}
    }

    let purchase = Purchase::find_by_id(&installment.purchase_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::PurchaseNotFound {
            id: installment.purchase_id.clone(),
        })?;

    if purchase.status == PurchaseStatus::Canceled {
        return Err(Error::StateConflict {
            message: "Cannot pay an installment of a canceled purchase".to_string(),
        });
    }

    let modality = crate::core::modality::find_modality_by_id(&txn, &input.modality_id)
        .await?
        .ok_or_else(|| Error::ModalityNotFound {
            id: input.modality_id.clone(),
        })?;

    if !modality.is_active {
        return Err(Error::StateConflict {
            message: format!("Payment modality '{}' is inactive", modality.name),
        });
    }

    let total_paid = schedule::round2(installment.principal + input.interest + input.penalty);
    let entry =
        ledger::create_ledger_entry(&txn, total_paid, input.payment_date, &modality).await?;

    // Conditional transition is the authoritative guard: if another request
    // settled this installment since our read, zero rows match and the whole
    // transaction (ledger entry included) rolls back.
    let now = Utc::now();
    let mut stamp = credit_installment::ActiveModel {
        status: Set(InstallmentStatus::Paid),
        payment_date: Set(Some(input.payment_date)),
        ledger_entry_id: Set(Some(entry.id.clone())),
        paid_by_user_id: Set(Some(recorded_by.user_id.clone())),
        paid_by_name: Set(Some(recorded_by.name.clone())),
        interest: Set(input.interest),
        penalty: Set(input.penalty),
        updated_at: Set(now),
        ..Default::default()
    };
    if !input.note.is_empty() {
        stamp.note = Set(input.note.clone());
    }

    let claimed = Installment::update_many()
        .set(stamp)
        .filter(InstallmentColumn::Id.eq(installment_id))
        .filter(InstallmentColumn::Status.is_in([
            InstallmentStatus::Pending,
            InstallmentStatus::Overdue,
        ]))
        .exec(&txn)
        .await?;

    if claimed.rows_affected == 0 {
        return Err(Error::StateConflict {
            message: "Installment was settled concurrently".to_string(),
        });
    }

    let paid = Installment::find_by_id(installment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::InstallmentNotFound {
            id: installment_id.to_string(),
        })?;

    complete_purchase_if_settled(&txn, &purchase).await?;

    txn.commit().await?;

    info!(
        installment_id,
        purchase_id = %paid.purchase_id,
        value = total_paid,
        "paid installment"
    );

    Ok((paid, entry))
}

/// Reverses the payment of an installment.
///
/// Deletes the linked ledger entry best-effort (a missing entry is logged,
/// not an error), clears the payment fields, and recomputes the status from
/// the due date. A completed owning purchase is reactivated.
pub async fn unpay_installment(
    db: &DatabaseConnection,
    installment_id: &str,
) -> Result<credit_installment::Model> {
    let txn = db.begin().await?;

    let installment = Installment::find_by_id(installment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::InstallmentNotFound {
            id: installment_id.to_string(),
        })?;

    if installment.status != InstallmentStatus::Paid {
        return Err(Error::StateConflict {
            message: "Only a paid installment can have its payment reverted".to_string(),
        });
    }

    // The installment-side state change is the authoritative outcome; a
    // ledger entry that is already gone does not abort the reversal.
    if let Some(entry_id) = &installment.ledger_entry_id {
        match ledger::delete_ledger_entry(&txn, entry_id).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(entry_id, installment_id, "linked ledger entry was already missing");
            }
            Err(e) => {
                warn!(entry_id, installment_id, error = %e, "failed to delete linked ledger entry");
            }
        }
    }

    let today = Utc::now().date_naive();
    let purchase_id = installment.purchase_id.clone();
    let reopened_status = status_for_due_date(installment.due_date, today);

    let mut active: credit_installment::ActiveModel = installment.into();
    active.status = Set(reopened_status);
    active.payment_date = Set(None);
    active.ledger_entry_id = Set(None);
    active.paid_by_user_id = Set(None);
    active.paid_by_name = Set(None);
    active.updated_at = Set(Utc::now());
    let reverted = active.update(&txn).await?;

    // At least one installment is open again, so a completed purchase
    // reopens.
    if let Some(purchase) = Purchase::find_by_id(&purchase_id).one(&txn).await? {
        if purchase.status == PurchaseStatus::Completed {
            let mut reopened: credit_purchase::ActiveModel = purchase.into();
            reopened.status = Set(PurchaseStatus::Active);
            reopened.updated_at = Set(Utc::now());
            reopened.update(&txn).await?;
        }
    }

    txn.commit().await?;

    info!(installment_id, purchase_id, "reverted installment payment");

    Ok(reverted)
}

/// Marks every pending installment past its due date as overdue.
///
/// Idempotent; paid and canceled installments are never touched. Invoked
/// periodically by an external scheduler.
pub async fn refresh_overdue(db: &DatabaseConnection) -> Result<u64> {
    let today = Utc::now().date_naive();

    let refreshed = Installment::update_many()
        .set(credit_installment::ActiveModel {
            status: Set(InstallmentStatus::Overdue),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(InstallmentColumn::Status.eq(InstallmentStatus::Pending))
        .filter(InstallmentColumn::PaymentDate.is_null())
        .filter(InstallmentColumn::DueDate.lt(today))
        .exec(db)
        .await?;

    if refreshed.rows_affected > 0 {
        info!(count = refreshed.rows_affected, "marked installments overdue");
    }

    Ok(refreshed.rows_affected)
}

/// Lists all overdue installments, earliest due first.
pub async fn find_overdue(db: &DatabaseConnection) -> Result<Vec<credit_installment::Model>> {
    Installment::find()
        .filter(InstallmentColumn::Status.eq(InstallmentStatus::Overdue))
        .order_by_asc(InstallmentColumn::DueDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists open installments falling due within the next `days` days,
/// earliest due first.
pub async fn find_due_soon(
    db: &DatabaseConnection,
    days: i64,
) -> Result<Vec<credit_installment::Model>> {
    let today = Utc::now().date_naive();
    let horizon = today + chrono::Duration::days(days);

    Installment::find()
        .filter(InstallmentColumn::Status.is_in([
            InstallmentStatus::Pending,
            InstallmentStatus::Overdue,
        ]))
        .filter(InstallmentColumn::DueDate.between(today, horizon))
        .order_by_asc(InstallmentColumn::DueDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Transitions an active purchase to completed when every non-canceled
/// installment is paid.
async fn complete_purchase_if_settled<C>(db: &C, purchase: &credit_purchase::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    if purchase.status != PurchaseStatus::Active {
        return Ok(());
    }

    let installments = Installment::find()
        .filter(InstallmentColumn::PurchaseId.eq(purchase.id.as_str()))
        .all(db)
        .await?;

    let mut any_paid = false;
    for installment in &installments {
        match installment.status {
            InstallmentStatus::Paid => any_paid = true,
            InstallmentStatus::Canceled => {}
            InstallmentStatus::Pending | InstallmentStatus::Overdue => return Ok(()),
        }
    }
    if !any_paid {
        return Ok(());
    }

    let mut completed: credit_purchase::ActiveModel = purchase.clone().into();
    completed.status = Set(PurchaseStatus::Completed);
    completed.updated_at = Set(Utc::now());
    completed.update(db).await?;

    info!(purchase_id = %purchase.id, "purchase completed");

    Ok(())
}
