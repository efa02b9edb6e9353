// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing texts and menus (Spanish).

use tally_core::types::{Choice, ProductListing};

pub const WELCOME: &str = "¡Bienvenido al bot de ventas! 👋\nPulsa \"Iniciar sesión\" o escribe tu nombre de usuario.";
pub const ASK_USERNAME: &str = "Ingresa tu nombre de usuario:";
pub const ASK_PASSWORD: &str = "Ingresa tu contraseña:";
pub const UNKNOWN_USER: &str = "Usuario no encontrado. Intenta de nuevo.";
pub const WRONG_PASSWORD: &str = "Contraseña incorrecta. Escribe /start para intentarlo de nuevo.";
pub const ASK_ADMIN_PASSWORD: &str = "Ingresa la contraseña de administrador:";
pub const WRONG_ADMIN_PASSWORD: &str = "Contraseña de administrador incorrecta.";
pub const LOGGED_OUT: &str = "Sesión cerrada. Escribe /start para volver a entrar.";
pub const LOGIN_REQUIRED: &str = "Primero debes iniciar sesión.";
pub const ADMIN_REQUIRED: &str = "Necesitas acceso de administrador. Usa /admin.";
pub const NO_PRODUCTS: &str = "No hay productos disponibles por ahora.";
pub const PICK_PRODUCT: &str = "Selecciona el producto vendido:";
pub const PRODUCT_NOT_FOUND: &str = "Ese producto ya no existe. Elige otro:";
pub const GENERIC_FAILURE: &str = "Ocurrió un error al procesar tu solicitud. Intenta de nuevo más tarde.";
pub const UNKNOWN_OPTION: &str = "Opción no reconocida.";
pub const UNKNOWN_COMMAND: &str = "Comando desconocido. Usa /start, /admin o /logout.";
pub const NOT_EXPECTING_TEXT: &str = "No estaba esperando un mensaje. Usa los botones del menú.";
pub const ADMIN_PANEL: &str = "🔧 Panel de administración. ¿Qué deseas hacer?";
pub const FLOW_CANCELLED: &str = "Operación cancelada.";

pub fn seller_welcome(display_name: &str) -> String {
    format!(
        "¡Hola, {display_name}! 💪 ¿Preparado para conquistar el día? 🚀\n\
         Registra tus ventas y ¡vamos a superar esos objetivos! 🎯"
    )
}

pub fn ask_quantity(product: &str, available: i64) -> String {
    format!("Ingresa la cantidad de {product} vendida (disponibles: {available}):")
}

pub fn out_of_stock(product: &str) -> String {
    format!("No quedan unidades de {product}. Elige otro producto:")
}

pub fn insufficient_stock(product: &str, available: i64) -> String {
    format!("No hay suficiente inventario de {product}: quedan {available}. Ingresa otra cantidad:")
}

pub fn sale_recorded(quantity: i64, product: &str) -> String {
    format!("¡Venta registrada! 🎉\nHas vendido {quantity} unidades de {product}. ¡Sigue así! 💰")
}

pub fn product_missing(name: &str) -> String {
    format!("No se encontró un producto con el nombre '{name}'.")
}

pub fn duplicate(entity: &str, key: &str) -> String {
    match entity {
        "seller" => format!("Ya existe un vendedor con el usuario '{key}'."),
        _ => format!("Ya existe un producto con el nombre '{key}'."),
    }
}

pub fn login_choice() -> Vec<Choice> {
    vec![Choice::new("Iniciar sesión", "login")]
}

pub fn seller_menu() -> Vec<Choice> {
    vec![
        Choice::new("Venta", "venta"),
        Choice::new("Historial Diario", "historial"),
        Choice::new("Cerrar sesión", "cerrar_sesion"),
    ]
}

pub fn back_to_menu() -> Vec<Choice> {
    vec![Choice::new("Regresar", "atras_menu")]
}

pub fn product_menu(products: &[ProductListing]) -> Vec<Choice> {
    let mut choices: Vec<Choice> = products
        .iter()
        .map(|p| Choice::new(format!("{} - ${:.2}", p.name, p.sale_price), format!("product_{}", p.id.0)))
        .collect();
    choices.extend(back_to_menu());
    choices
}

pub fn admin_menu() -> Vec<Choice> {
    vec![
        Choice::new("Agregar producto", "admin_agregar_producto"),
        Choice::new("Reponer producto", "admin_reponer_producto"),
        Choice::new("Restar producto", "admin_restar_producto"),
        Choice::new("Añadir vendedor", "admin_anadir_vendedor"),
        Choice::new("Ver datos", "admin_ver_datos"),
        Choice::new("Cerrar sesión", "cerrar_sesion"),
    ]
}

pub fn back_to_admin() -> Vec<Choice> {
    vec![Choice::new("Volver al panel", "admin_menu")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::types::ProductId;

    #[test]
    fn product_menu_tokens() {
        let products = vec![ProductListing {
            id: ProductId(42),
            name: "Coffee".into(),
            sale_price: 5.0,
        }];
        let menu = product_menu(&products);
        assert_eq!(menu.len(), 2);
        assert_eq!(menu[0].token, "product_42");
        assert_eq!(menu[0].label, "Coffee - $5.00");
        assert_eq!(menu[1].token, "atras_menu");
    }

    #[test]
    fn sale_confirmation_mentions_quantity_and_product() {
        let text = sale_recorded(3, "Coffee");
        assert!(text.contains('3'));
        assert!(text.contains("Coffee"));
    }

    #[test]
    fn duplicate_messages() {
        assert!(duplicate("product", "Tea").contains("producto"));
        assert!(duplicate("seller", "ana").contains("vendedor"));
    }
}
