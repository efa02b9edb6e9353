// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`LedgerStore`] trait.

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use tokio::sync::OnceCell;
use tracing::debug;

use tally_config::model::StorageConfig;
use tally_core::types::{
    InventoryLevel, Product, ProductId, ProductListing, SaleId, SaleLine, Seller, SellerId,
};
use tally_core::{AdapterType, HealthStatus, LedgerStore, PluginAdapter, TallyError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed sales ledger.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules.
/// The database is opened on the first call to [`LedgerStore::initialize`].
pub struct SqliteLedger {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteLedger {
    /// Create a ledger for the configured path. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, TallyError> {
        self.db.get().ok_or_else(|| TallyError::Storage {
            source: "ledger not initialized -- call initialize() first".into(),
        })
    }

    /// Record a sale with an explicit local timestamp.
    pub async fn record_sale_at(
        &self,
        seller_id: SellerId,
        product_id: ProductId,
        quantity: i64,
        at: NaiveDateTime,
    ) -> Result<SaleId, TallyError> {
        queries::sales::record_sale_at(self.db()?, seller_id, product_id, quantity, at).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteLedger {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TallyError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TallyError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn initialize(&self) -> Result<(), TallyError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| TallyError::Storage {
            source: "ledger already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite ledger initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), TallyError> {
        self.db()?.checkpoint().await
    }

    // --- Sellers ---

    async fn create_seller(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SellerId, TallyError> {
        queries::sellers::create_seller(self.db()?, username, password, display_name).await
    }

    async fn find_seller_by_username(&self, username: &str) -> Result<Option<Seller>, TallyError> {
        queries::sellers::find_seller_by_username(self.db()?, username).await
    }

    async fn list_sellers(&self) -> Result<Vec<Seller>, TallyError> {
        queries::sellers::list_sellers(self.db()?).await
    }

    // --- Products ---

    async fn create_product(
        &self,
        name: &str,
        purchase_price: f64,
        sale_price: f64,
        initial_inventory: i64,
    ) -> Result<ProductId, TallyError> {
        queries::products::create_product(
            self.db()?,
            name,
            purchase_price,
            sale_price,
            initial_inventory,
        )
        .await
    }

    async fn list_products(&self) -> Result<Vec<ProductListing>, TallyError> {
        queries::products::list_products(self.db()?).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, TallyError> {
        queries::products::get_product(self.db()?, id).await
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, TallyError> {
        queries::products::find_product_by_name(self.db()?, name).await
    }

    async fn add_stock(&self, id: ProductId, quantity: i64) -> Result<i64, TallyError> {
        queries::products::add_stock(self.db()?, id, quantity).await
    }

    async fn remove_stock(&self, id: ProductId, quantity: i64) -> Result<i64, TallyError> {
        queries::products::remove_stock(self.db()?, id, quantity).await
    }

    async fn inventory_snapshot(&self) -> Result<Vec<InventoryLevel>, TallyError> {
        queries::products::inventory_snapshot(self.db()?).await
    }

    // --- Sales ---

    async fn record_sale(
        &self,
        seller_id: SellerId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<SaleId, TallyError> {
        self.record_sale_at(seller_id, product_id, quantity, Local::now().naive_local())
            .await
    }

    async fn daily_sales_for_seller(
        &self,
        seller_id: Option<SellerId>,
        date: NaiveDate,
    ) -> Result<Vec<SaleLine>, TallyError> {
        queries::sales::sales_between(self.db()?, seller_id, date, date).await
    }

    async fn weekly_sales_for_seller(
        &self,
        seller_id: Option<SellerId>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SaleLine>, TallyError> {
        queries::sales::sales_between(self.db()?, seller_id, start, end).await
    }
}
