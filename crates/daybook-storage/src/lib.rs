// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Daybook's durable key-value state.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and a cached [`SqliteKeyValueStore`]
//! implementing the core `KeyValueStore` trait.

pub mod database;
pub mod kv;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use kv::SqliteKeyValueStore;
pub use models::StoredValue;
