// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Daybook notification subsystem.

use thiserror::Error;

/// The primary error type used across all Daybook collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum DaybookError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable key-value storage errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Notification scheduler errors (OS schedule/cancel/list failures).
    #[error("scheduler error: {message}")]
    Scheduler {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Entity repository errors (fetch or update failures).
    #[error("repository error: {message}")]
    Repository {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Platform bridge errors (lock-state queries and other native calls).
    #[error("platform error: {message}")]
    Platform {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Module adapter hub errors.
    #[error("hub error: {message}")]
    Hub {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An entity expected to exist was not found.
    #[error("{module} entity not found: {id}")]
    EntityNotFound { module: String, id: String },

    /// A notification payload could not be parsed.
    #[error("invalid notification payload: {0}")]
    InvalidPayload(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DaybookError {
    /// Wrap any error as a storage failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }

    /// Build a scheduler error without an underlying source.
    pub fn scheduler(message: impl Into<String>) -> Self {
        Self::Scheduler {
            message: message.into(),
            source: None,
        }
    }

    /// Build a repository error without an underlying source.
    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository {
            message: message.into(),
            source: None,
        }
    }

    /// Build a platform error without an underlying source.
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
            source: None,
        }
    }

    /// Build a hub error without an underlying source.
    pub fn hub(message: impl Into<String>) -> Self {
        Self::Hub {
            message: message.into(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for DaybookError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(err)
    }
}
