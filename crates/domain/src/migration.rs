//! Versioned schema migration units.

use std::fmt::{Display, Formatter};

use mantia_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Numeric version taken from the prefix of a migration file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MigrationVersion(i64);

impl MigrationVersion {
    /// Creates a migration version. Versions are non-negative.
    pub fn new(value: i64) -> AppResult<Self> {
        if value < 0 {
            return Err(AppError::Validation(format!(
                "migration version must not be negative, got {value}"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the numeric value stored in the ledger.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Display for MigrationVersion {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{:03}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::MigrationVersion;

    #[test]
    fn negative_versions_are_rejected() {
        assert!(MigrationVersion::new(-1).is_err());
        assert!(MigrationVersion::new(0).is_ok());
    }

    #[test]
    fn versions_render_with_file_name_padding() {
        let version = MigrationVersion::new(2).map(|version| version.to_string());
        assert_eq!(version.ok().as_deref(), Some("002"));

        let wide = MigrationVersion::new(20240101).map(|version| version.to_string());
        assert_eq!(wide.ok().as_deref(), Some("20240101"));
    }
}
