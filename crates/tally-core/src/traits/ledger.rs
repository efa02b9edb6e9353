// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The sales ledger: sellers, products and the append-only sales log.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::TallyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    InventoryLevel, Product, ProductId, ProductListing, SaleId, SaleLine, Seller, SellerId,
};

/// Persistent store for the sales ledger.
///
/// Implementations must serialize writes: the ledger is shared between the
/// agent loop and the scheduled jobs.
#[async_trait]
pub trait LedgerStore: PluginAdapter {
    /// Opens the backend and applies pending migrations.
    async fn initialize(&self) -> Result<(), TallyError>;

    /// Flushes pending writes and releases the backend.
    async fn close(&self) -> Result<(), TallyError>;

    // --- Sellers ---

    /// Registers a seller. Fails with [`TallyError::Conflict`] when the
    /// username is taken.
    async fn create_seller(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SellerId, TallyError>;

    /// Exact-match lookup by username.
    async fn find_seller_by_username(&self, username: &str) -> Result<Option<Seller>, TallyError>;

    /// All sellers in registration order.
    async fn list_sellers(&self) -> Result<Vec<Seller>, TallyError>;

    // --- Products ---

    /// Adds a product to the catalog.
    ///
    /// Rejects `sale_price <= purchase_price` before writing anything and
    /// fails with [`TallyError::Conflict`] when the name is taken.
    async fn create_product(
        &self,
        name: &str,
        purchase_price: f64,
        sale_price: f64,
        initial_inventory: i64,
    ) -> Result<ProductId, TallyError>;

    /// Catalog in insertion order, for selection menus.
    async fn list_products(&self) -> Result<Vec<ProductListing>, TallyError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, TallyError>;

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, TallyError>;

    /// Increases stock, returning the new count.
    async fn add_stock(&self, id: ProductId, quantity: i64) -> Result<i64, TallyError>;

    /// Decreases stock without going below zero, returning the new count.
    async fn remove_stock(&self, id: ProductId, quantity: i64) -> Result<i64, TallyError>;

    /// Current stock of every product.
    async fn inventory_snapshot(&self) -> Result<Vec<InventoryLevel>, TallyError>;

    // --- Sales ---

    /// Records a sale and decrements inventory in one transaction.
    async fn record_sale(
        &self,
        seller_id: SellerId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<SaleId, TallyError>;

    /// Sales made on `date`, for one seller or (`None`) for everyone.
    async fn daily_sales_for_seller(
        &self,
        seller_id: Option<SellerId>,
        date: NaiveDate,
    ) -> Result<Vec<SaleLine>, TallyError>;

    /// Sales made between `start` and `end`, both inclusive.
    async fn weekly_sales_for_seller(
        &self,
        seller_id: Option<SellerId>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SaleLine>, TallyError>;
}
