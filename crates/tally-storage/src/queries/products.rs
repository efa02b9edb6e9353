// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product catalog and stock operations.

use rusqlite::{OptionalExtension, Row, params};
use tally_core::TallyError;
use tally_core::types::{InventoryLevel, Product, ProductId, ProductListing};

use crate::database::{Database, flatten_tr_err, is_constraint_violation, map_tr_err, sql_err};

const PRODUCT_COLUMNS: &str = "id, name, purchase_price, sale_price, inventory_count";

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: ProductId(row.get(0)?),
        name: row.get(1)?,
        purchase_price: row.get(2)?,
        sale_price: row.get(3)?,
        inventory_count: row.get(4)?,
    })
}

fn check_price(label: &str, value: f64) -> Result<(), TallyError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TallyError::Validation(format!(
            "{label} must be a non-negative number, got {value}"
        )))
    }
}

fn check_positive(quantity: i64) -> Result<(), TallyError> {
    if quantity > 0 {
        Ok(())
    } else {
        Err(TallyError::Validation(format!(
            "quantity must be greater than zero, got {quantity}"
        )))
    }
}

/// Insert a product. Fails with `Conflict` when the name is taken.
pub async fn create_product(
    db: &Database,
    name: &str,
    purchase_price: f64,
    sale_price: f64,
    initial_inventory: i64,
) -> Result<ProductId, TallyError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(TallyError::Validation("product name must not be empty".into()));
    }
    check_price("purchase price", purchase_price)?;
    check_price("sale price", sale_price)?;
    if sale_price <= purchase_price {
        return Err(TallyError::Validation(format!(
            "sale price {sale_price} must be greater than purchase price {purchase_price}"
        )));
    }
    if initial_inventory < 0 {
        return Err(TallyError::Validation(format!(
            "initial inventory must not be negative, got {initial_inventory}"
        )));
    }
    db.connection()
        .call(move |conn| -> Result<ProductId, TallyError> {
            match conn.execute(
                "INSERT INTO products (name, purchase_price, sale_price, inventory_count)
                 VALUES (?1, ?2, ?3, ?4)",
                params![name, purchase_price, sale_price, initial_inventory],
            ) {
                Ok(_) => Ok(ProductId(conn.last_insert_rowid())),
                Err(e) if is_constraint_violation(&e) => Err(TallyError::Conflict {
                    entity: "product",
                    key: name,
                }),
                Err(e) => Err(sql_err(e)),
            }
        })
        .await
        .map_err(flatten_tr_err)
}

/// Products for the sale menu, in insertion order.
pub async fn list_products(db: &Database) -> Result<Vec<ProductListing>, TallyError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, sale_price FROM products ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok(ProductListing {
                    id: ProductId(row.get(0)?),
                    name: row.get(1)?,
                    sale_price: row.get(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Get a product by id.
pub async fn get_product(db: &Database, id: ProductId) -> Result<Option<Product>, TallyError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
                params![id.0],
                product_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Get a product by exact name.
pub async fn find_product_by_name(
    db: &Database,
    name: &str,
) -> Result<Option<Product>, TallyError> {
    let name = name.trim().to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE name = ?1"),
                params![name],
                product_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Increase stock and return the new count.
pub async fn add_stock(db: &Database, id: ProductId, quantity: i64) -> Result<i64, TallyError> {
    check_positive(quantity)?;
    adjust_stock(db, id, quantity).await
}

/// Decrease stock and return the new count. Never goes below zero.
pub async fn remove_stock(
    db: &Database,
    id: ProductId,
    quantity: i64,
) -> Result<i64, TallyError> {
    check_positive(quantity)?;
    adjust_stock(db, id, -quantity).await
}

async fn adjust_stock(db: &Database, id: ProductId, delta: i64) -> Result<i64, TallyError> {
    db.connection()
        .call(move |conn| -> Result<i64, TallyError> {
            let tx = conn.transaction().map_err(sql_err)?;
            let current: Option<i64> = tx
                .query_row(
                    "SELECT inventory_count FROM products WHERE id = ?1",
                    params![id.0],
                    |row| row.get(0),
                )
                .optional()
                .map_err(sql_err)?;
            let current = current.ok_or_else(|| TallyError::NotFound {
                entity: "product",
                key: id.0.to_string(),
            })?;
            let updated = current.checked_add(delta).ok_or_else(|| {
                TallyError::Validation(format!(
                    "stock overflow: {current} on hand, {delta} added"
                ))
            })?;
            if updated < 0 {
                return Err(TallyError::Validation(format!(
                    "insufficient stock: {current} available, {} requested",
                    -delta
                )));
            }
            tx.execute(
                "UPDATE products SET inventory_count = ?1 WHERE id = ?2",
                params![updated, id.0],
            )
            .map_err(sql_err)?;
            tx.commit().map_err(sql_err)?;
            Ok(updated)
        })
        .await
        .map_err(flatten_tr_err)
}

/// Current stock of every product, in insertion order.
pub async fn inventory_snapshot(db: &Database) -> Result<Vec<InventoryLevel>, TallyError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT name, inventory_count FROM products ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok(InventoryLevel {
                    product_name: row.get(0)?,
                    inventory_count: row.get(1)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
