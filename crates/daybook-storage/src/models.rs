// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed scalar values persisted in the `key_value` table.

/// A scalar stored under one key. The `kind` column records which variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl StoredValue {
    /// Value of the `kind` column.
    pub fn kind(&self) -> &'static str {
        match self {
            StoredValue::Str(_) => "string",
            StoredValue::Int(_) => "int",
            StoredValue::Bool(_) => "bool",
        }
    }

    /// Text encoding for the `value` column.
    pub fn encode(&self) -> String {
        match self {
            StoredValue::Str(s) => s.clone(),
            StoredValue::Int(i) => i.to_string(),
            StoredValue::Bool(b) => b.to_string(),
        }
    }

    /// Decode a `(kind, value)` row. Returns `None` for unknown kinds or bad text.
    pub fn decode(kind: &str, value: String) -> Option<Self> {
        match kind {
            "string" => Some(StoredValue::Str(value)),
            "int" => value.parse().ok().map(StoredValue::Int),
            "bool" => value.parse().ok().map(StoredValue::Bool),
            _ => None,
        }
    }
}
