// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative multi-step admin forms.
//!
//! Each admin flow is a [`FlowSpec`]: an ordered list of fields, each with a
//! prompt and a [`FieldKind`] that parses and validates the reply. One driver
//! in the conversation engine walks every flow; [`FlowKind::commit`] turns the
//! collected values into a ledger write.

use std::collections::HashMap;

use strum::{Display, EnumString};
use tally_core::types::ProductId;
use tally_core::{LedgerStore, TallyError};

/// How a field's text reply is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-empty text, trimmed.
    Text,
    /// A finite number `>= 0`. Accepts `,` as the decimal separator.
    Price,
    /// A price strictly greater than the price collected under the given key.
    PriceAbove(&'static str),
    /// An integer `> 0`.
    Quantity,
    /// The exact name of an existing product.
    ExistingProduct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub prompt: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSpec {
    pub fields: &'static [FieldSpec],
}

/// A parsed field value held in the session while a flow is in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Price(f64),
    Quantity(i64),
    Product { id: ProductId, name: String },
}

/// The admin flows, keyed by the selection token that starts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum FlowKind {
    #[strum(serialize = "admin_agregar_producto")]
    AddProduct,
    #[strum(serialize = "admin_anadir_vendedor")]
    AddSeller,
    #[strum(serialize = "admin_restar_producto")]
    RemoveStock,
    #[strum(serialize = "admin_reponer_producto")]
    AddStock,
}

const ADD_PRODUCT: FlowSpec = FlowSpec {
    fields: &[
        FieldSpec {
            key: "name",
            prompt: "Ingresa el nombre del nuevo producto:",
            kind: FieldKind::Text,
        },
        FieldSpec {
            key: "purchase_price",
            prompt: "Ingresa el precio de compra:",
            kind: FieldKind::Price,
        },
        FieldSpec {
            key: "sale_price",
            prompt: "Ingresa el precio de venta:",
            kind: FieldKind::PriceAbove("purchase_price"),
        },
    ],
};

const ADD_SELLER: FlowSpec = FlowSpec {
    fields: &[
        FieldSpec {
            key: "username",
            prompt: "Ingresa el nombre de usuario del nuevo vendedor:",
            kind: FieldKind::Text,
        },
        FieldSpec {
            key: "password",
            prompt: "Ingresa la contraseña del nuevo vendedor:",
            kind: FieldKind::Text,
        },
        FieldSpec {
            key: "name",
            prompt: "Ingresa el nombre completo del nuevo vendedor:",
            kind: FieldKind::Text,
        },
    ],
};

const REMOVE_STOCK: FlowSpec = FlowSpec {
    fields: &[
        FieldSpec {
            key: "product",
            prompt: "Ingresa el nombre del producto que deseas restar:",
            kind: FieldKind::ExistingProduct,
        },
        FieldSpec {
            key: "quantity",
            prompt: "Ingresa la cantidad que deseas restar:",
            kind: FieldKind::Quantity,
        },
    ],
};

const ADD_STOCK: FlowSpec = FlowSpec {
    fields: &[
        FieldSpec {
            key: "product",
            prompt: "Ingresa el nombre del producto que deseas reponer:",
            kind: FieldKind::ExistingProduct,
        },
        FieldSpec {
            key: "quantity",
            prompt: "Ingresa la cantidad que deseas añadir al inventario:",
            kind: FieldKind::Quantity,
        },
    ],
};

/// Values collected so far, by field key.
pub type Pending = HashMap<&'static str, FieldValue>;

impl FlowKind {
    pub fn spec(self) -> &'static FlowSpec {
        match self {
            FlowKind::AddProduct => &ADD_PRODUCT,
            FlowKind::AddSeller => &ADD_SELLER,
            FlowKind::RemoveStock => &REMOVE_STOCK,
            FlowKind::AddStock => &ADD_STOCK,
        }
    }

    pub fn field(self, index: usize) -> Option<&'static FieldSpec> {
        self.spec().fields.get(index)
    }

    /// Write the completed form to the ledger and return the confirmation text.
    pub async fn commit(self, pending: &Pending, store: &dyn LedgerStore) -> Result<String, TallyError> {
        match self {
            FlowKind::AddProduct => {
                let name = text(pending, "name")?;
                let purchase = price(pending, "purchase_price")?;
                let sale = price(pending, "sale_price")?;
                store.create_product(name, purchase, sale, 0).await?;
                Ok(format!(
                    "Producto '{name}' agregado (compra ${purchase:.2}, venta ${sale:.2}). \
                     Usa \"Reponer producto\" para cargar inventario."
                ))
            }
            FlowKind::AddSeller => {
                let username = text(pending, "username")?;
                let password = text(pending, "password")?;
                let name = text(pending, "name")?;
                store.create_seller(username, password, name).await?;
                Ok(format!("Vendedor '{name}' (usuario '{username}') añadido."))
            }
            FlowKind::RemoveStock => {
                let (id, name) = product(pending, "product")?;
                let quantity = quantity(pending, "quantity")?;
                let remaining = store.remove_stock(id, quantity).await?;
                Ok(format!(
                    "Se restaron {quantity} unidades de '{name}'. Inventario actual: {remaining}."
                ))
            }
            FlowKind::AddStock => {
                let (id, name) = product(pending, "product")?;
                let quantity = quantity(pending, "quantity")?;
                let total = store.add_stock(id, quantity).await?;
                Ok(format!(
                    "Se añadieron {quantity} unidades de '{name}'. Inventario actual: {total}."
                ))
            }
        }
    }
}

/// Parse one reply according to `kind`.
pub async fn parse_field(
    kind: FieldKind,
    input: &str,
    pending: &Pending,
    store: &dyn LedgerStore,
) -> Result<FieldValue, TallyError> {
    let input = input.trim();
    match kind {
        FieldKind::Text => {
            if input.is_empty() {
                Err(TallyError::Validation("El valor no puede estar vacío.".into()))
            } else {
                Ok(FieldValue::Text(input.to_string()))
            }
        }
        FieldKind::Price => parse_price(input).map(FieldValue::Price),
        FieldKind::PriceAbove(floor_key) => {
            let value = parse_price(input)?;
            let floor = price(pending, floor_key)?;
            if value <= floor {
                return Err(TallyError::Validation(format!(
                    "El precio de venta debe ser mayor que el precio de compra (${floor:.2})."
                )));
            }
            Ok(FieldValue::Price(value))
        }
        FieldKind::Quantity => parse_quantity(input).map(FieldValue::Quantity),
        FieldKind::ExistingProduct => match store.find_product_by_name(input).await? {
            Some(p) => Ok(FieldValue::Product {
                id: p.id,
                name: p.name,
            }),
            None => Err(TallyError::NotFound {
                entity: "product",
                key: input.to_string(),
            }),
        },
    }
}

/// A number `>= 0`, with `.` or `,` as the decimal separator.
pub fn parse_price(input: &str) -> Result<f64, TallyError> {
    match input.trim().replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(TallyError::Validation(
            "Precio inválido. Ingresa un número mayor o igual a cero.".into(),
        )),
    }
}

/// Largest quantity accepted in a single sale or stock adjustment.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// An integer in `1..=MAX_QUANTITY`.
pub fn parse_quantity(input: &str) -> Result<i64, TallyError> {
    match input.trim().parse::<i64>() {
        Ok(q) if q > MAX_QUANTITY => Err(TallyError::Validation(format!(
            "La cantidad máxima es {MAX_QUANTITY}. Intenta de nuevo."
        ))),
        Ok(q) if q > 0 => Ok(q),
        Ok(_) => Err(TallyError::Validation(
            "La cantidad debe ser mayor que cero. Intenta de nuevo.".into(),
        )),
        Err(_) => Err(TallyError::Validation(
            "Cantidad inválida. Ingresa un número entero.".into(),
        )),
    }
}

fn missing(key: &str) -> TallyError {
    TallyError::Internal(format!("form field `{key}` missing or mistyped"))
}

fn text<'a>(pending: &'a Pending, key: &str) -> Result<&'a str, TallyError> {
    match pending.get(key) {
        Some(FieldValue::Text(s)) => Ok(s),
        _ => Err(missing(key)),
    }
}

fn price(pending: &Pending, key: &str) -> Result<f64, TallyError> {
    match pending.get(key) {
        Some(FieldValue::Price(p)) => Ok(*p),
        _ => Err(missing(key)),
    }
}

fn quantity(pending: &Pending, key: &str) -> Result<i64, TallyError> {
    match pending.get(key) {
        Some(FieldValue::Quantity(q)) => Ok(*q),
        _ => Err(missing(key)),
    }
}

fn product<'a>(pending: &'a Pending, key: &str) -> Result<(ProductId, &'a str), TallyError> {
    match pending.get(key) {
        Some(FieldValue::Product { id, name }) => Ok((*id, name)),
        _ => Err(missing(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn tokens_map_to_flows() {
        assert_eq!(
            FlowKind::from_str("admin_agregar_producto").unwrap(),
            FlowKind::AddProduct
        );
        assert_eq!(
            FlowKind::from_str("admin_reponer_producto").unwrap(),
            FlowKind::AddStock
        );
        assert_eq!(FlowKind::RemoveStock.to_string(), "admin_restar_producto");
        assert!(FlowKind::from_str("admin_menu").is_err());
    }

    #[test]
    fn every_flow_has_fields() {
        for kind in [
            FlowKind::AddProduct,
            FlowKind::AddSeller,
            FlowKind::RemoveStock,
            FlowKind::AddStock,
        ] {
            assert!(kind.field(0).is_some());
        }
        assert!(FlowKind::AddProduct.field(3).is_none());
    }

    #[test]
    fn price_parsing() {
        assert_eq!(parse_price("2.5").unwrap(), 2.5);
        assert_eq!(parse_price(" 2,5 ").unwrap(), 2.5);
        assert_eq!(parse_price("0").unwrap(), 0.0);
        assert!(parse_price("-1").is_err());
        assert!(parse_price("abc").is_err());
        assert!(parse_price("inf").is_err());
    }

    #[test]
    fn quantity_parsing() {
        assert_eq!(parse_quantity("3").unwrap(), 3);
        let zero = parse_quantity("0").unwrap_err().to_string();
        assert!(zero.contains("mayor que cero"));
        let word = parse_quantity("tres").unwrap_err().to_string();
        assert!(word.contains("número entero"));
        assert_eq!(parse_quantity("1000000").unwrap(), MAX_QUANTITY);
        let huge = parse_quantity("9223372036854775807").unwrap_err().to_string();
        assert!(huge.contains("cantidad máxima"));
    }

    #[test]
    fn typed_accessors_reject_wrong_variant() {
        let mut pending = Pending::new();
        pending.insert("name", FieldValue::Price(1.0));
        assert!(text(&pending, "name").is_err());
        assert!(price(&pending, "name").is_ok());
        assert!(quantity(&pending, "absent").is_err());
    }
}
