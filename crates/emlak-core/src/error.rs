//! # Error Hierarchy
//!
//! Structured error types for the domain layer, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Each variant carries the diagnostic context an operator needs: the
//! field that failed and the value that was rejected.

use thiserror::Error;

/// Domain primitive validation failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required text field was empty or whitespace-only.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A text field exceeded its maximum length.
    #[error("{field} must not exceed {max} characters (got {actual})")]
    TooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
        /// Actual length supplied.
        actual: usize,
    },

    /// An enum-valued field received a value outside its domain.
    #[error("unknown value for {field}: {value:?}")]
    UnknownVariant {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A geographic coordinate was outside the valid range.
    #[error("coordinate out of range: lat={lat}, lon={lon}")]
    CoordinateOutOfRange {
        /// Latitude supplied.
        lat: f64,
        /// Longitude supplied.
        lon: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        let err = ValidationError::EmptyField { field: "title" };
        assert!(err.to_string().contains("title"));

        let err = ValidationError::TooLong {
            field: "slug",
            max: 255,
            actual: 300,
        };
        let msg = err.to_string();
        assert!(msg.contains("slug"));
        assert!(msg.contains("255"));
        assert!(msg.contains("300"));
    }

    #[test]
    fn unknown_variant_carries_value() {
        let err = ValidationError::UnknownVariant {
            field: "rooms",
            value: "9+9".to_string(),
        };
        assert!(err.to_string().contains("9+9"));
    }
}
