//! Error taxonomy for property discovery, value resolution, and synthesis.

use std::fmt;

/// Failures surfaced by the engine.
///
/// All failures are synchronous and none are retried: value generation is
/// deterministic for a fixed seed, so a failed construction would fail the
/// same way again.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecimenError {
    /// The factory resolution chain was exhausted for a type.
    NoFactoryFound { type_name: String },

    /// No construction mechanism matches the registered type. Fatal: the
    /// type cannot be synthesized at all.
    NoViableCreationStrategy { type_name: String },

    /// A construction call failed, either because a required input was
    /// missing or because the underlying invocation reported an error.
    ConstructionFailed { type_name: String, message: String },

    /// An attribute did not read back as the value last written for it.
    RoundTripMismatch {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// A customization referenced an attribute name absent from the
    /// discovered property set.
    IllegalOverride {
        attribute: String,
        type_name: String,
    },

    /// The creation-strategy view and the accessor view of one attribute
    /// disagree on its type.
    TypeConflict {
        attribute: String,
        strategy_type: String,
        accessor_type: String,
    },

    /// The null value was written against an attribute declared not-null.
    NullDisallowed { attribute: String },

    /// A value was supplied for a name the description does not carry.
    UnknownAttribute { attribute: String },

    /// A downcast or representation failure inside an accessor, mutator, or
    /// invocation adapter.
    ValueAccess { message: String },
}

impl fmt::Display for SpecimenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecimenError::NoFactoryFound { type_name } => {
                write!(f, "no value factory found for type `{}`", type_name)
            }
            SpecimenError::NoViableCreationStrategy { type_name } => {
                write!(
                    f,
                    "no viable creation strategy for type `{}`",
                    type_name
                )
            }
            SpecimenError::ConstructionFailed { type_name, message } => {
                write!(
                    f,
                    "failed to construct an instance of `{}`: {}",
                    type_name, message
                )
            }
            SpecimenError::RoundTripMismatch {
                attribute,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "attribute `{}` did not round-trip: expected {}, read back {}",
                    attribute, expected, actual
                )
            }
            SpecimenError::IllegalOverride {
                attribute,
                type_name,
            } => {
                write!(
                    f,
                    "customization references attribute `{}`, which `{}` does not declare",
                    attribute, type_name
                )
            }
            SpecimenError::TypeConflict {
                attribute,
                strategy_type,
                accessor_type,
            } => {
                write!(
                    f,
                    "attribute `{}` is declared as `{}` by the creation strategy but `{}` by its accessors",
                    attribute, strategy_type, accessor_type
                )
            }
            SpecimenError::NullDisallowed { attribute } => {
                write!(
                    f,
                    "attribute `{}` is not-null but the null value was written",
                    attribute
                )
            }
            SpecimenError::UnknownAttribute { attribute } => {
                write!(f, "unknown attribute `{}`", attribute)
            }
            SpecimenError::ValueAccess { message } => {
                write!(f, "value access failed: {}", message)
            }
        }
    }
}

impl std::error::Error for SpecimenError {}

/// Helper constructors mirroring the variants, taking `impl Into<String>`.
impl SpecimenError {
    /// Create a `NoFactoryFound` error.
    pub fn no_factory(type_name: impl Into<String>) -> Self {
        Self::NoFactoryFound {
            type_name: type_name.into(),
        }
    }

    /// Create a `NoViableCreationStrategy` error.
    pub fn no_strategy(type_name: impl Into<String>) -> Self {
        Self::NoViableCreationStrategy {
            type_name: type_name.into(),
        }
    }

    /// Create a `ConstructionFailed` error.
    pub fn construction_failed(
        type_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ConstructionFailed {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Create a `RoundTripMismatch` error from `Debug` renderings.
    pub fn round_trip_mismatch(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::RoundTripMismatch {
            attribute: attribute.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an `IllegalOverride` error.
    pub fn illegal_override(
        attribute: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self::IllegalOverride {
            attribute: attribute.into(),
            type_name: type_name.into(),
        }
    }

    /// Create a `NullDisallowed` error.
    pub fn null_disallowed(attribute: impl Into<String>) -> Self {
        Self::NullDisallowed {
            attribute: attribute.into(),
        }
    }

    /// Create an `UnknownAttribute` error.
    pub fn unknown_attribute(attribute: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create a `ValueAccess` error.
    pub fn value_access(message: impl Into<String>) -> Self {
        Self::ValueAccess {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_factory_display() {
        let error = SpecimenError::no_factory("acme::Widget");
        assert_eq!(
            format!("{}", error),
            "no value factory found for type `acme::Widget`"
        );
    }

    #[test]
    fn test_round_trip_mismatch_display() {
        let error = SpecimenError::round_trip_mismatch("title", "\"a\"", "\"b\"");
        let display = format!("{}", error);
        assert!(display.contains("`title`"));
        assert!(display.contains("expected \"a\""));
        assert!(display.contains("read back \"b\""));
    }

    #[test]
    fn test_type_conflict_display() {
        let error = SpecimenError::TypeConflict {
            attribute: "id".to_string(),
            strategy_type: "u64".to_string(),
            accessor_type: "String".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("`id`"));
        assert!(display.contains("`u64`"));
        assert!(display.contains("`String`"));
    }

    #[test]
    fn test_helper_constructors() {
        assert_eq!(
            SpecimenError::no_strategy("T"),
            SpecimenError::NoViableCreationStrategy {
                type_name: "T".to_string()
            }
        );
        assert_eq!(
            SpecimenError::construction_failed("T", "boom"),
            SpecimenError::ConstructionFailed {
                type_name: "T".to_string(),
                message: "boom".to_string()
            }
        );
        assert_eq!(
            SpecimenError::unknown_attribute("x"),
            SpecimenError::UnknownAttribute {
                attribute: "x".to_string()
            }
        );
    }
}
