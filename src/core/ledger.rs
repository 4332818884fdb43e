//! Narrow gateway to the generic financial ledger.
//!
//! The ledger's schema and CRUD belong to the surrounding application; this
//! core only creates one entry per installment payment and deletes it again
//! when the payment is reversed.

use crate::{
    entities::{FinancialEntry, financial_entry, payment_modality},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Set, prelude::*};
use uuid::Uuid;

/// Creates a ledger entry for one monetary movement, snapshotting the
/// modality's name and color at entry time.
pub async fn create_ledger_entry<C>(
    db: &C,
    value: f64,
    date: NaiveDate,
    modality: &payment_modality::Model,
) -> Result<financial_entry::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    let entry = financial_entry::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        value: Set(value),
        date: Set(date),
        modality_id: Set(modality.id.clone()),
        modality_name: Set(modality.name.clone()),
        modality_color: Set(modality.color.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    entry.insert(db).await.map_err(Into::into)
}

/// Deletes a ledger entry, returning whether a row was actually removed.
pub async fn delete_ledger_entry<C>(db: &C, entry_id: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = FinancialEntry::delete_by_id(entry_id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Retrieves a ledger entry by id.
pub async fn find_ledger_entry<C>(db: &C, entry_id: &str) -> Result<Option<financial_entry::Model>>
where
    C: ConnectionTrait,
{
    FinancialEntry::find_by_id(entry_id)
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{create_test_modality, setup_test_db};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_entry() -> Result<()> {
        let db = setup_test_db().await?;
        let modality = create_test_modality(&db, "PIX", true).await?;

        let entry = create_ledger_entry(&db, 150.0, date(2025, 2, 1), &modality).await?;
        assert_eq!(entry.value, 150.0);
        assert_eq!(entry.modality_name, "PIX");

        let found = find_ledger_entry(&db, &entry.id).await?;
        assert_eq!(found, Some(entry));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_entry_reports_removal() -> Result<()> {
        let db = setup_test_db().await?;
        let modality = create_test_modality(&db, "Cash", true).await?;
        let entry = create_ledger_entry(&db, 80.0, date(2025, 2, 1), &modality).await?;

        assert!(delete_ledger_entry(&db, &entry.id).await?);
        assert!(find_ledger_entry(&db, &entry.id).await?.is_none());

        // Second delete finds nothing to remove
        assert!(!delete_ledger_entry(&db, &entry.id).await?);

        Ok(())
    }
}
