// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seller roster operations.

use rusqlite::{Row, params};
use tally_core::TallyError;
use tally_core::types::{Role, Seller, SellerId};

use crate::database::{Database, flatten_tr_err, is_constraint_violation, map_tr_err, sql_err};

const SELLER_COLUMNS: &str = "id, username, password, name, role";

fn seller_from_row(row: &Row<'_>) -> rusqlite::Result<Seller> {
    let role: String = row.get(4)?;
    Ok(Seller {
        id: SellerId(row.get(0)?),
        username: row.get(1)?,
        password: row.get(2)?,
        display_name: row.get(3)?,
        role: role.parse().unwrap_or_default(),
    })
}

/// Insert a seller. Fails with `Conflict` when the username is taken.
pub async fn create_seller(
    db: &Database,
    username: &str,
    password: &str,
    display_name: &str,
) -> Result<SellerId, TallyError> {
    let (username, password, display_name) = (
        username.trim().to_string(),
        password.to_string(),
        display_name.trim().to_string(),
    );
    if username.is_empty() || password.is_empty() || display_name.is_empty() {
        return Err(TallyError::Validation(
            "seller username, password and name must not be empty".into(),
        ));
    }
    db.connection()
        .call(move |conn| -> Result<SellerId, TallyError> {
            match conn.execute(
                "INSERT INTO sellers (username, password, name, role) VALUES (?1, ?2, ?3, ?4)",
                params![username, password, display_name, Role::Seller.to_string()],
            ) {
                Ok(_) => Ok(SellerId(conn.last_insert_rowid())),
                Err(e) if is_constraint_violation(&e) => Err(TallyError::Conflict {
                    entity: "seller",
                    key: username,
                }),
                Err(e) => Err(sql_err(e)),
            }
        })
        .await
        .map_err(flatten_tr_err)
}

/// Look up a seller by exact username.
pub async fn find_seller_by_username(
    db: &Database,
    username: &str,
) -> Result<Option<Seller>, TallyError> {
    let username = username.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELLER_COLUMNS} FROM sellers WHERE username = ?1"
            ))?;
            match stmt.query_row(params![username], seller_from_row) {
                Ok(seller) => Ok(Some(seller)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// All sellers in creation order.
pub async fn list_sellers(db: &Database) -> Result<Vec<Seller>, TallyError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {SELLER_COLUMNS} FROM sellers ORDER BY id"))?;
            let rows = stmt.query_map([], seller_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
