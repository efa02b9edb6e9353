// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the ledger tables.

pub mod products;
pub mod sales;
pub mod sellers;
