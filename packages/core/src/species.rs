//! Species identifiers.
//!
//! Nodes publish species ids either as plain integers or as composite
//! strings `"<db>-<numeric-id>"`, where the prefix names the database the
//! id belongs to. Queries against the node itself need the bare id.

use thiserror::Error;

/// Error returned when a species id does not carry a numeric part.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("species id {0:?} does not end in an integer")]
pub struct SpeciesIdError(pub String);

/// A species id as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeciesRef {
    Numeric(i64),
    Composite(String),
}

impl SpeciesRef {
    /// The node-local integer id.
    ///
    /// `Composite("7-123")` → `123`; `Composite("123")` → `123`;
    /// `Numeric(42)` → `42`.
    pub fn numeric_id(&self) -> Result<i64, SpeciesIdError> {
        match self {
            SpeciesRef::Numeric(id) => Ok(*id),
            SpeciesRef::Composite(s) => strip_database_prefix(s)
                .trim()
                .parse()
                .map_err(|_| SpeciesIdError(s.clone())),
        }
    }
}

impl From<i64> for SpeciesRef {
    fn from(id: i64) -> Self {
        SpeciesRef::Numeric(id)
    }
}

impl From<&str> for SpeciesRef {
    fn from(s: &str) -> Self {
        SpeciesRef::Composite(s.to_string())
    }
}

impl From<String> for SpeciesRef {
    fn from(s: String) -> Self {
        SpeciesRef::Composite(s)
    }
}

impl std::fmt::Display for SpeciesRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeciesRef::Numeric(id) => write!(f, "{id}"),
            SpeciesRef::Composite(s) => f.write_str(s),
        }
    }
}

/// Remove everything up to and including the first `-`.
pub fn strip_database_prefix(species_id: &str) -> &str {
    match species_id.split_once('-') {
        Some((_, rest)) => rest,
        None => species_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_id_is_stripped() {
        assert_eq!(SpeciesRef::from("7-123").numeric_id(), Ok(123));
    }

    #[test]
    fn integer_passes_through() {
        assert_eq!(SpeciesRef::from(42_i64).numeric_id(), Ok(42));
    }

    #[test]
    fn bare_numeric_string_parses() {
        assert_eq!(SpeciesRef::from("123").numeric_id(), Ok(123));
    }

    #[test]
    fn only_first_dash_is_a_separator() {
        assert_eq!(strip_database_prefix("XCDMS-149"), "149");
        assert_eq!(strip_database_prefix("a-b-c"), "b-c");
        assert_eq!(strip_database_prefix("149"), "149");
    }

    #[test]
    fn non_numeric_remainder_is_an_error() {
        assert_eq!(
            SpeciesRef::from("cdms-abc").numeric_id(),
            Err(SpeciesIdError("cdms-abc".into()))
        );
    }
}
