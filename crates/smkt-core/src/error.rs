//! Unified error type for smart-market clearing
//!
//! [`SmktError`] covers the failures that stop a clearing run outright:
//! malformed tables and, in strict mode, soft diagnostics promoted to a
//! rejection. Recoverable problems never show up here; they are collected as
//! [`Diagnostics`](crate::Diagnostics) instead.
//!
//! # Example
//!
//! ```
//! use smkt_core::{SmktError, SmktResult};
//!
//! fn check_rows(gen_rows: usize, cost_rows: usize) -> SmktResult<()> {
//!     if cost_rows < gen_rows {
//!         return Err(SmktError::Shape(format!(
//!             "gencost has {cost_rows} rows, expected at least {gen_rows}"
//!         )));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_rows(3, 2).is_err());
//! ```

use thiserror::Error;

use crate::diagnostics::Diagnostics;

/// Error type for all smkt operations.
#[derive(Error, Debug)]
pub enum SmktError {
    /// Table dimensions that make row indexing impossible
    #[error("Shape error: {0}")]
    Shape(String),

    /// Strict mode: soft diagnostics were raised and the result was withheld
    #[error("clearing rejected in strict mode: {}", .0.summary())]
    Rejected(Diagnostics),
}

/// Convenience type alias for Results using SmktError.
pub type SmktResult<T> = Result<T, SmktError>;

impl SmktError {
    /// Diagnostics carried by a strict-mode rejection, if any
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            SmktError::Rejected(diag) => Some(diag),
            SmktError::Shape(_) => None,
        }
    }
}
