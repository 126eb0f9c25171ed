use thiserror::Error;

use crate::extract::ExtractionConfig;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process has the database locked
    #[error("Configuration database is locked by another process")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A user of the enrichment service, created on first reference by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
}

/// A feed a user subscribes to, with its extraction configuration.
///
/// `selector` is the include selector (`None` means the `body` default);
/// `exclusions` is the ordered exclusion list. `script` is always excluded
/// by the engine whether or not it appears here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub id: i64,
    pub user_id: i64,
    pub url: String,
    pub selector: Option<String>,
    pub exclusions: Vec<String>,
}

impl FeedSource {
    /// The extraction configuration the pipeline consumes for this feed.
    pub fn extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig {
            include: self.selector.clone(),
            exclude: self.exclusions.clone(),
        }
    }
}
