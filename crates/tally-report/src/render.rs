// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of reports in the bot's reply language (Spanish).

use std::fmt::Write;

use tally_core::types::InventoryLevel;

use crate::daily::DailyReport;
use crate::snapshot::AdminSnapshot;
use crate::totals::SellerTotals;
use crate::weekly::WeeklyReport;

/// `Coffee (43), Tea (0)`, or a placeholder for an empty catalog.
pub fn inventory_line(levels: &[InventoryLevel]) -> String {
    if levels.is_empty() {
        return "sin productos".to_string();
    }
    levels
        .iter()
        .map(|l| format!("{} ({})", l.product_name, l.inventory_count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The seller's "historial" view.
pub fn render_daily(report: &DailyReport, commission_rate: f64, inventory: &[InventoryLevel]) -> String {
    format!(
        "📈 Resumen del día 📈\n\
         Ventas totales: {}\n\
         Unidades vendidas: {}\n\
         Ganancias brutas: ${:.2}\n\
         Tu ganancia ({}%): ${:.2}\n\
         Tu porcentaje de ventas: {:.2}%\n\
         Inventario disponible: {}",
        report.sales_count,
        report.units,
        report.gross,
        percent(commission_rate),
        report.personal_share,
        report.percentage_of_total,
        inventory_line(inventory),
    )
}

/// The periodic reminder sent to a logged-in seller.
pub fn render_reminder(display_name: &str, report: &DailyReport) -> String {
    format!(
        "⏰ {display_name}, así va tu día:\n\
         Ventas registradas: {}\n\
         Unidades vendidas: {}\n\
         Ganancias brutas: ${:.2}\n\
         Tu ganancia: ${:.2}\n\
         ¡No olvides registrar cada venta! 💪",
        report.sales_count, report.units, report.gross, report.personal_share,
    )
}

/// The weekly digest for the sales group.
pub fn render_weekly(report: &WeeklyReport) -> String {
    let mut out = format!(
        "📊 Resumen Semanal ({} - {}) 📊\n\
         Ganancias semanales totales: ${:.2}\n\
         Margen semanal total: ${:.2}\n\
         Ventas semanales totales: {} productos\n\
         Producto más vendido: {}\n\n\
         Ventas por Vendedor:",
        report.start,
        report.end,
        report.total_gross,
        report.total_margin,
        report.total_quantity,
        report.best_product,
    );
    push_sellers(&mut out, &report.per_seller);
    let _ = write!(out, "\n\nEl vendedor de la semana: {}", report.best_seller);
    out
}

/// The administrator's "ver datos" view.
pub fn render_snapshot(snapshot: &AdminSnapshot, inventory: &[InventoryLevel]) -> String {
    let mut out = format!(
        "📊 Panel de Administración 📊\n\
         Ventas brutas del día: ${:.2}\n\
         Productos vendidos hoy: {}\n\n\
         Ventas por Vendedor:",
        snapshot.total_gross, snapshot.total_quantity,
    );
    push_sellers(&mut out, &snapshot.per_seller);
    let _ = write!(out, "\n\nInventario: {}", inventory_line(inventory));
    out
}

fn push_sellers(out: &mut String, sellers: &[SellerTotals]) {
    if sellers.is_empty() {
        out.push_str("\n(sin vendedores)");
    }
    for s in sellers {
        let _ = write!(out, "\n{}: {} productos (${:.2})", s.name, s.quantity, s.gross);
    }
}

fn percent(rate: f64) -> String {
    let value = rate * 100.0;
    if (value - value.round()).abs() < 1e-9 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
