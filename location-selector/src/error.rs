//! Selector error types.

use thiserror::Error;

/// Errors reported when setting up a selector.
///
/// Runtime UI faults (stale rows, missing snapshots) are not errors; they
/// fall back to default behavior.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("invalid selector config: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
}
