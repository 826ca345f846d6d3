// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for tool records.
//!
//! Provides a migrated [`Database`] handle and [`ToolStore`], the
//! similarity store used by the lifecycle manager.

pub mod database;
pub mod document;
pub mod migrations;
pub mod store;
pub mod vector;

pub use database::Database;
pub use store::ToolStore;
