//! Local SQLite backend for `file:` and `:memory:` connection strings.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use usersync_core::error::query_err;
use usersync_core::{Email, MessagingId, RecordStore, StoreError, StoreRecord};

use crate::schema;

/// A single SQLite connection, held for the whole run.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    location: String,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let location = path.display().to_string();
        let conn = Connection::open(&path).map_err(|e| StoreError::Connect {
            url: location.clone(),
            source: Box::new(e),
        })?;
        tracing::debug!("opened sqlite store at {location}");
        Ok(Self { conn, location })
    }

    /// A private in-memory database; gone when the store is dropped.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Connect {
            url: ":memory:".to_string(),
            source: Box::new(e),
        })?;
        Ok(Self {
            conn,
            location: ":memory:".to_string(),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Create the `employees` table if it does not exist.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(schema::CREATE_TABLE)
            .map_err(|e| query_err("create table", e))
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StoreRecord> {
    Ok(StoreRecord {
        email: Email(row.get(0)?),
        // NULL reads as unset.
        messaging_id: MessagingId(row.get::<_, Option<i64>>(1)?.unwrap_or_default()),
    })
}

impl RecordStore for SqliteStore {
    fn fetch_all_records(&self) -> Result<Vec<StoreRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(schema::SELECT_ALL)
            .map_err(|e| query_err("select employees", e))?;
        let rows = stmt
            .query_map([], record_from_row)
            .map_err(|e| query_err("select employees", e))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| query_err("scan employee row", e))?);
        }
        Ok(records)
    }

    fn find_record(&self, email: &Email) -> Result<StoreRecord, StoreError> {
        self.conn
            .query_row(
                schema::SELECT_BY_EMAIL,
                params![email.as_str()],
                record_from_row,
            )
            .optional()
            .map_err(|e| query_err("select employee by email", e))?
            .ok_or_else(|| StoreError::NotFound {
                email: email.to_string(),
            })
    }

    fn insert(&self, record: &StoreRecord) -> Result<(), StoreError> {
        self.conn
            .execute(
                schema::INSERT,
                params![record.email.as_str(), record.messaging_id.0],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref failure, _)
                    if failure.code == ErrorCode::ConstraintViolation =>
                {
                    StoreError::Duplicate {
                        email: record.email.to_string(),
                    }
                }
                other => query_err("insert employee", other),
            })?;
        Ok(())
    }

    fn update_messaging_id(
        &self,
        email: &Email,
        messaging_id: MessagingId,
    ) -> Result<(), StoreError> {
        let affected = self
            .conn
            .execute(
                schema::UPDATE_MESSAGING_ID,
                params![messaging_id.0, email.as_str()],
            )
            .map_err(|e| query_err("update telegramID", e))?;
        if affected == 0 {
            tracing::debug!("update for {email} matched no rows");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().expect("open");
        store.ensure_schema().expect("schema");
        store
    }

    #[test]
    fn insert_then_fetch_all() {
        let store = store();
        store.insert(&StoreRecord::new("a@x.com", 1)).unwrap();
        store.insert(&StoreRecord::new("b@x.com", 0)).unwrap();

        let mut records = store.fetch_all_records().unwrap();
        records.sort_by(|a, b| a.email.cmp(&b.email));
        assert_eq!(
            records,
            vec![StoreRecord::new("a@x.com", 1), StoreRecord::new("b@x.com", 0)]
        );
    }

    #[test]
    fn duplicate_insert_is_distinguished() {
        let store = store();
        store.insert(&StoreRecord::new("a@x.com", 1)).unwrap();
        let err = store.insert(&StoreRecord::new("a@x.com", 2)).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }), "got: {err}");
    }

    #[test]
    fn find_missing_is_not_found() {
        let store = store();
        let err = store.find_record(&Email::from("nobody@x.com")).unwrap_err();
        assert!(err.is_not_found(), "got: {err}");
    }

    #[test]
    fn update_of_unknown_email_is_silent() {
        let store = store();
        store
            .update_messaging_id(&Email::from("ghost@x.com"), MessagingId(5))
            .expect("zero rows is not an error");
        assert!(store.fetch_all_records().unwrap().is_empty());
    }

    #[test]
    fn null_messaging_id_reads_as_unset() {
        let store = store();
        store
            .conn
            .execute(
                "INSERT INTO employees (email, telegramID) VALUES ('n@x.com', NULL)",
                [],
            )
            .unwrap();
        let record = store.find_record(&Email::from("n@x.com")).unwrap();
        assert!(record.messaging_id.is_unset());
    }

    #[test]
    fn missing_table_is_a_query_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.fetch_all_records().unwrap_err();
        assert!(matches!(err, StoreError::Query { .. }), "got: {err}");
    }
}
