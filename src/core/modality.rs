//! Payment modality lookup.
//!
//! Modality management (create/update/toggle) is handled by the surrounding
//! application; the payment flow only needs to resolve a modality by id and
//! check that it is active.

use crate::{
    entities::{PaymentModality, payment_modality},
    errors::Result,
};
use sea_orm::{ConnectionTrait, prelude::*};

/// Retrieves a payment modality by its unique id.
pub async fn find_modality_by_id<C>(
    db: &C,
    modality_id: &str,
) -> Result<Option<payment_modality::Model>>
where
    C: ConnectionTrait,
{
    PaymentModality::find_by_id(modality_id)
        .one(db)
        .await
        .map_err(Into::into)
}
