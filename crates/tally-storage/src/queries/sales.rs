// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The append-only sales log.
//!
//! A sale and its inventory decrement are written in one transaction, so the
//! sum of recorded quantities always matches the stock that left the shelf.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{OptionalExtension, params};
use tally_core::TallyError;
use tally_core::types::{ProductId, SaleId, SaleLine, SellerId};
use tracing::debug;

use crate::database::{DATE_FORMAT, Database, TIMESTAMP_FORMAT, flatten_tr_err, map_tr_err, sql_err};

/// Record a sale stamped with `at` and decrement the product's stock.
///
/// Fails with `Validation` for a non-positive quantity or when stock is
/// insufficient, and with `NotFound` for an unknown seller or product. On
/// any failure neither row is changed.
pub async fn record_sale_at(
    db: &Database,
    seller_id: SellerId,
    product_id: ProductId,
    quantity: i64,
    at: NaiveDateTime,
) -> Result<SaleId, TallyError> {
    if quantity <= 0 {
        return Err(TallyError::Validation(format!(
            "quantity must be greater than zero, got {quantity}"
        )));
    }
    let created_at = at.format(TIMESTAMP_FORMAT).to_string();
    let sale_id = db
        .connection()
        .call(move |conn| -> Result<SaleId, TallyError> {
            let tx = conn.transaction().map_err(sql_err)?;

            let seller_exists = tx
                .query_row(
                    "SELECT 1 FROM sellers WHERE id = ?1",
                    params![seller_id.0],
                    |_| Ok(()),
                )
                .optional()
                .map_err(sql_err)?
                .is_some();
            if !seller_exists {
                return Err(TallyError::NotFound {
                    entity: "seller",
                    key: seller_id.0.to_string(),
                });
            }

            let stock: i64 = tx
                .query_row(
                    "SELECT inventory_count FROM products WHERE id = ?1",
                    params![product_id.0],
                    |row| row.get(0),
                )
                .optional()
                .map_err(sql_err)?
                .ok_or_else(|| TallyError::NotFound {
                    entity: "product",
                    key: product_id.0.to_string(),
                })?;
            if stock < quantity {
                return Err(TallyError::Validation(format!(
                    "insufficient stock: {stock} available, {quantity} requested"
                )));
            }

            tx.execute(
                "INSERT INTO sales (seller_id, product_id, quantity, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![seller_id.0, product_id.0, quantity, created_at],
            )
            .map_err(sql_err)?;
            let sale_id = SaleId(tx.last_insert_rowid());

            let updated = tx
                .execute(
                    "UPDATE products SET inventory_count = inventory_count - ?1 WHERE id = ?2",
                    params![quantity, product_id.0],
                )
                .map_err(sql_err)?;
            if updated != 1 {
                return Err(TallyError::Integrity {
                    message: format!(
                        "inventory decrement touched {updated} rows for product {}",
                        product_id.0
                    ),
                });
            }

            tx.commit().map_err(sql_err)?;
            Ok(sale_id)
        })
        .await
        .map_err(flatten_tr_err)?;
    debug!(sale_id = sale_id.0, seller_id = seller_id.0, product_id = product_id.0, quantity, "sale recorded");
    Ok(sale_id)
}

/// Sale lines dated within `[start, end]` (inclusive), optionally for one seller.
pub async fn sales_between(
    db: &Database,
    seller_id: Option<SellerId>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<SaleLine>, TallyError> {
    let start = start.format(DATE_FORMAT).to_string();
    let end = end.format(DATE_FORMAT).to_string();
    let seller = seller_id.map(|s| s.0);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT s.seller_id, v.name, p.name, s.quantity, p.sale_price, p.purchase_price
                 FROM sales s
                 JOIN sellers v ON v.id = s.seller_id
                 JOIN products p ON p.id = s.product_id
                 WHERE date(s.created_at) BETWEEN ?1 AND ?2
                   AND (?3 IS NULL OR s.seller_id = ?3)
                 ORDER BY s.created_at, s.id",
            )?;
            let rows = stmt.query_map(params![start, end, seller], |row| {
                Ok(SaleLine {
                    seller_id: SellerId(row.get(0)?),
                    seller_name: row.get(1)?,
                    product_name: row.get(2)?,
                    quantity: row.get(3)?,
                    sale_price: row.get(4)?,
                    purchase_price: row.get(5)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
