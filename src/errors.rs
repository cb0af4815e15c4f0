//! Unified error types for the income engine.
//!
//! Every fallible function in the crate returns [`Result`]. Storage errors from
//! `SeaORM` convert automatically through `?`.

use thiserror::Error;

/// Every error the crate can produce
#[derive(Debug, Error)]
pub enum Error {
    /// Any error raised by the ORM or the underlying driver
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Unreadable or malformed configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// Input rejected before any mutation happened
    #[error("Validation failed: {reason}")]
    Validation {
        /// Why the input was rejected
        reason: String,
    },

    /// The cadence walk produced more dates than the configured cap
    #[error("Cadence walk exceeded {cap} occurrences")]
    IterationCapExceeded {
        /// Configured maximum
        cap: usize,
    },

    /// A budget that had just been located or created could not be read back
    #[error("Budget not found for user {user_id} ({month}/{year}, {budget_type})")]
    BudgetNotFound {
        /// Owning user
        user_id: String,
        /// Calendar month
        month: u32,
        /// Calendar year
        year: i32,
        /// Requested budget type
        budget_type: String,
    },

    /// Outbound notification delivery failed
    #[error("Notification failed: {message}")]
    Notification {
        /// Delivery failure detail
        message: String,
    },

    /// Filesystem or socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable is missing or not unicode
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// True when the underlying storage error is a unique-constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(err) => matches!(
                err.sql_err(),
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
            ),
            _ => false,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
