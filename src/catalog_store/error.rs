use super::validation::ValidationError;
use thiserror::Error;

/// Errors surfaced by catalog store operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{entity} with {field} '{value}' already exists")]
    UniqueConstraintViolation {
        entity: &'static str,
        field: String,
        value: String,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CatalogError::NotFound { entity, id }
    }

    pub fn duplicate(entity: &'static str, field: &str, value: impl Into<String>) -> Self {
        CatalogError::UniqueConstraintViolation {
            entity,
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Names the entity on a unique violation translated from a raw SQLite error.
    pub(crate) fn for_entity(self, entity: &'static str, value: &str) -> Self {
        match self {
            CatalogError::UniqueConstraintViolation { field, .. } => {
                CatalogError::UniqueConstraintViolation {
                    entity,
                    field,
                    value: value.to_string(),
                }
            }
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, CatalogError::UniqueConstraintViolation { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CatalogError::Validation(_))
    }
}

/// SQLite reports unique failures as "UNIQUE constraint failed: table.column[, table.column]".
fn unique_failure_columns(message: &str) -> Option<String> {
    let columns = message.strip_prefix("UNIQUE constraint failed: ")?;
    Some(
        columns
            .split(", ")
            .map(|qualified| qualified.rsplit('.').next().unwrap_or(qualified))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ffi_err, Some(message)) = &err {
            if ffi_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
                if let Some(field) = unique_failure_columns(message) {
                    return CatalogError::UniqueConstraintViolation {
                        entity: "row",
                        field,
                        value: String::new(),
                    };
                }
            }
        }
        CatalogError::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn unique_failure_becomes_constraint_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, slug TEXT UNIQUE)", [])
            .unwrap();
        conn.execute("INSERT INTO t (slug) VALUES ('a')", []).unwrap();
        let err: CatalogError = conn
            .execute("INSERT INTO t (slug) VALUES ('a')", [])
            .unwrap_err()
            .into();

        match err {
            CatalogError::UniqueConstraintViolation { field, .. } => assert_eq!(field, "slug"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn other_sqlite_errors_stay_storage_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let err: CatalogError = conn
            .execute("INSERT INTO missing_table VALUES (1)", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, CatalogError::Storage(_)));
    }

    #[test]
    fn composite_unique_columns_are_listed() {
        assert_eq!(
            unique_failure_columns("UNIQUE constraint failed: listing_features.listing_id, listing_features.feature_id"),
            Some("listing_id, feature_id".to_string())
        );
        assert_eq!(unique_failure_columns("NOT NULL constraint failed: t.x"), None);
    }
}
