//! Error types for relay list handling.

use thiserror::Error;

use crate::location::RelayLocation;

/// Errors produced while loading or interpreting relay data.
#[derive(Debug, Error)]
pub enum RelayListError {
    #[error("failed to parse relay list: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read relay list: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid relay location '{0}'")]
    InvalidLocation(String),
}

/// A violation of the location hierarchy invariants.
///
/// The selector never repairs these; suppliers are expected to check their
/// output with [`crate::check_hierarchy`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("location {0} appears more than once")]
    DuplicateLocation(RelayLocation),
    #[error("location {child} is listed under {parent}, which does not contain it")]
    MisplacedChild {
        parent: RelayLocation,
        child: RelayLocation,
    },
    #[error("location {0} must be a top-level country")]
    NotACountry(RelayLocation),
}
