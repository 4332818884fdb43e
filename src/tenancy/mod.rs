//! Tenant-to-store routing and provisioning.
//!
//! Each tenant (client company) owns one isolated `SQLite` store. The router
//! derives a stable store name from the tenant id, opens the store lazily on
//! first use, and memoizes the handle for its own lifetime. It is an
//! explicitly constructed, injected value — there is no process-wide
//! singleton — and one router is shared by all request handlers.

use crate::config::StoreConfig;
use crate::entities::{
    FinancialEntry, FinancialEntryColumn, Installment, InstallmentColumn, PaymentModality,
    Purchase, PurchaseColumn,
};
use crate::errors::{Error, Result};
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Routes tenant ids to isolated store handles.
///
/// Handles are memoized per tenant and safe for concurrent reuse across
/// requests; no handle is ever shared between tenants.
#[derive(Debug)]
pub struct TenantStoreRouter {
    config: StoreConfig,
    handles: RwLock<HashMap<String, DatabaseConnection>>,
}

impl TenantStoreRouter {
    /// Creates a router over the given store configuration.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Derives the physical store name for a tenant.
    ///
    /// The name is the first 8 hex characters of SHA-256 of the tenant id,
    /// prefixed with a sanitized slug of the display name when one is given.
    /// The hash depends only on the tenant id, so the mapping is stable for
    /// the tenant's lifetime and collision-resistant across tenants.
    #[must_use]
    pub fn store_name(tenant_id: &str, display_name: Option<&str>) -> String {
        let digest = Sha256::digest(tenant_id.as_bytes());
        let short_hash = &hex::encode(digest)[..8];

        match display_name.map(slugify) {
            Some(slug) if !slug.is_empty() => format!("{slug}-{short_hash}"),
            _ => format!("tenant-{short_hash}"),
        }
    }

    /// Resolves a tenant to its store handle, opening the store on first use.
    ///
    /// # Errors
    /// Returns a validation error for an empty tenant id, or a database error
    /// if the store cannot be opened (fatal to the request, not retried).
    pub async fn resolve(
        &self,
        tenant_id: &str,
        display_name: Option<&str>,
    ) -> Result<DatabaseConnection> {
        if tenant_id.trim().is_empty() {
            return Err(Error::Validation {
                message: "Tenant id is required".to_string(),
            });
        }

        if let Some(handle) = self.handles.read().await.get(tenant_id) {
            return Ok(handle.clone());
        }

        // Resolve-or-create under the write lock; re-check because another
        // request may have opened the store while we waited.
        let mut handles = self.handles.write().await;
        if let Some(handle) = handles.get(tenant_id) {
            return Ok(handle.clone());
        }

        let name = Self::store_name(tenant_id, display_name);
        let url = self.store_url(&name)?;
        let handle = Database::connect(&url).await?;
        info!(tenant_id, store = %name, "opened tenant store");

        handles.insert(tenant_id.to_string(), handle.clone());
        Ok(handle)
    }

    /// Resolves a tenant and guarantees its schema and indexes exist.
    ///
    /// Idempotent: tables and indexes are created with `IF NOT EXISTS`, so
    /// calling this repeatedly is safe.
    ///
    /// # Errors
    /// Same failure modes as [`Self::resolve`], plus statement errors while
    /// establishing the schema.
    pub async fn provision(
        &self,
        tenant_id: &str,
        display_name: Option<&str>,
    ) -> Result<DatabaseConnection> {
        let handle = self.resolve(tenant_id, display_name).await?;
        ensure_schema(&handle).await?;
        Ok(handle)
    }

    /// Drops the cached handle for a tenant, closing nothing eagerly.
    ///
    /// The next [`Self::resolve`] reopens the store. Used when a tenant is
    /// decommissioned by the surrounding application.
    pub async fn forget(&self, tenant_id: &str) {
        self.handles.write().await.remove(tenant_id);
    }

    fn store_url(&self, name: &str) -> Result<String> {
        if self.config.in_memory {
            return Ok("sqlite::memory:".to_string());
        }

        std::fs::create_dir_all(&self.config.data_dir)?;
        let path = self.config.data_dir.join(format!("{name}.sqlite"));
        Ok(format!("sqlite://{}?mode=rwc", path.display()))
    }
}

/// Lowercases a display name and keeps only `[a-z0-9]` runs joined by `-`.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_dash = true;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }

    slug.trim_end_matches('-').chars().take(32).collect()
}

/// Creates the store's tables and indexes from the entity definitions.
///
/// Uniqueness on `(purchase_id, number)` enforces the 1-based installment
/// numbering within a purchase; the remaining indexes back the date- and
/// status-driven queries.
async fn ensure_schema(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut tables = [
        schema.create_table_from_entity(Purchase),
        schema.create_table_from_entity(Installment),
        schema.create_table_from_entity(FinancialEntry),
        schema.create_table_from_entity(PaymentModality),
    ];
    for table in &mut tables {
        table.if_not_exists();
        db.execute(builder.build(&*table)).await?;
    }

    let indexes = [
        Index::create()
            .if_not_exists()
            .name("idx_credit_installments_purchase_number")
            .table(Installment)
            .col(InstallmentColumn::PurchaseId)
            .col(InstallmentColumn::Number)
            .unique()
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_credit_installments_due_date")
            .table(Installment)
            .col(InstallmentColumn::DueDate)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_credit_installments_status")
            .table(Installment)
            .col(InstallmentColumn::Status)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_credit_purchases_status")
            .table(Purchase)
            .col(PurchaseColumn::Status)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_financial_entries_date")
            .table(FinancialEntry)
            .col(FinancialEntryColumn::Date)
            .to_owned(),
    ];
    for index in &indexes {
        db.execute(builder.build(index)).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::create_test_purchase;
    use sea_orm::EntityTrait;

    fn test_router() -> TenantStoreRouter {
        TenantStoreRouter::new(StoreConfig::in_memory())
    }

    #[test]
    fn test_store_name_is_deterministic() {
        let a = TenantStoreRouter::store_name("company-123", None);
        let b = TenantStoreRouter::store_name("company-123", None);
        assert_eq!(a, b);
        assert!(a.starts_with("tenant-"));
        assert_eq!(a.len(), "tenant-".len() + 8);
    }

    #[test]
    fn test_store_name_differs_per_tenant() {
        let a = TenantStoreRouter::store_name("company-123", None);
        let b = TenantStoreRouter::store_name("company-456", None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_store_name_uses_display_name_slug() {
        let name = TenantStoreRouter::store_name("company-123", Some("Acme Iron & Co."));
        assert!(name.starts_with("acme-iron-co-"));

        // Slug varies, hash suffix does not
        let plain = TenantStoreRouter::store_name("company-123", None);
        assert_eq!(
            name.rsplit('-').next().unwrap(),
            plain.rsplit('-').next().unwrap()
        );
    }

    #[test]
    fn test_store_name_ignores_unusable_display_name() {
        let name = TenantStoreRouter::store_name("company-123", Some("!!!"));
        assert!(name.starts_with("tenant-"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme Iron & Co."), "acme-iron-co");
        assert_eq!(slugify("  Padaria   do Zé  "), "padaria-do-z");
        assert_eq!(slugify("plain"), "plain");
    }

    #[tokio::test]
    async fn test_resolve_rejects_empty_tenant_id() {
        let router = test_router();
        let result = router.resolve("", None).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = router.resolve("   ", None).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_resolve_memoizes_handle() -> Result<()> {
        let router = test_router();
        let first = router.provision("company-123", None).await?;

        // Same cached connection: data written through the first handle is
        // visible through a later resolve of the same tenant.
        create_test_purchase(&first, "Payer").await?;

        let second = router.resolve("company-123", None).await?;
        let purchases = Purchase::find().all(&second).await?;
        assert_eq!(purchases.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_tenant_stores_are_isolated() -> Result<()> {
        let router = test_router();
        let store_a = router.provision("company-a", None).await?;
        let store_b = router.provision("company-b", None).await?;

        create_test_purchase(&store_a, "Only in A").await?;

        let in_a = Purchase::find().all(&store_a).await?;
        let in_b = Purchase::find().all(&store_b).await?;
        assert_eq!(in_a.len(), 1);
        assert!(in_b.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_provision_is_idempotent() -> Result<()> {
        let router = test_router();
        let store = router.provision("company-123", None).await?;
        router.provision("company-123", None).await?;
        router.provision("company-123", None).await?;

        create_test_purchase(&store, "Payer").await?;
        assert_eq!(Purchase::find().all(&store).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_forget_drops_cached_handle() -> Result<()> {
        let router = test_router();
        let before = router.provision("company-123", None).await?;
        create_test_purchase(&before, "Payer").await?;

        router.forget("company-123").await;

        // A fresh in-memory store comes back empty after re-provisioning.
        let after = router.provision("company-123", None).await?;
        assert!(Purchase::find().all(&after).await?.is_empty());

        Ok(())
    }
}
