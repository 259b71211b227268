//! # Error Types
//!
//! Domain-specific error types for bodega-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  bodega-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input rejected before any write             │
//! │                                                                     │
//! │  bodega-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures; wraps CoreError so        │
//! │                         repositories surface domain errors too      │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → DbError → caller               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` derive, never manual Display impls
//! 2. Errors carry context (ids, counts), never bare strings
//! 3. Domain violations are explicit variants, never swallowed

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Category deletion blocked: products still reference it.
    ///
    /// Raised at the application layer (not just left to the foreign key)
    /// so the caller gets a message it can show, not a constraint code.
    #[error("category {id} still has {product_count} product(s); move or delete them first")]
    CategoryHasProducts { id: String, product_count: i64 },

    /// A sale must have at least one line item before it can be saved.
    #[error("sale has no items")]
    EmptySale,

    /// Input validation failure (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (bad characters, malformed code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = CoreError::CategoryHasProducts {
            id: "cat-1".to_string(),
            product_count: 3,
        };
        assert_eq!(
            err.to_string(),
            "category cat-1 still has 3 product(s); move or delete them first"
        );
    }

    #[test]
    fn validation_converts_to_core_error() {
        let err: CoreError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(err.to_string(), "validation error: name is required");
    }
}
