//! # usersync-store
//!
//! [`RecordStore`] backends for the `employees` table.
//!
//! [`Store::open`] picks the backend from the connection string:
//!
//! | connection string                         | backend         |
//! |-------------------------------------------|-----------------|
//! | `libsql://…`, `https://…`, `http://…`     | [`TursoStore`]  |
//! | `file:<path>`, `sqlite:<path>`, `:memory:`| [`SqliteStore`] |

pub mod schema;
pub mod sqlite;
pub mod turso;

use usersync_core::{Email, MessagingId, RecordStore, StoreError, StoreRecord};

pub use sqlite::SqliteStore;
pub use turso::{RemoteError, TursoStore, TursoTarget};

/// The store opened for a run. Dropping it releases the connection.
#[derive(Debug)]
pub enum Store {
    Turso(TursoStore),
    Sqlite(SqliteStore),
}

impl Store {
    /// Open the store named by `url`. `auth_token` only applies to Turso.
    pub fn open(url: &str, auth_token: Option<&str>) -> Result<Store, StoreError> {
        let url = url.trim();
        if url.starts_with("libsql://") || url.starts_with("https://") || url.starts_with("http://")
        {
            return Ok(Store::Turso(TursoStore::open(url, auth_token)?));
        }
        if url == ":memory:" {
            return Ok(Store::Sqlite(SqliteStore::open_in_memory()?));
        }
        if let Some(rest) = url
            .strip_prefix("file:")
            .or_else(|| url.strip_prefix("sqlite:"))
        {
            let rest = turso::redact(rest);
            let path = rest.strip_prefix("//").unwrap_or(&rest);
            if path == ":memory:" {
                return Ok(Store::Sqlite(SqliteStore::open_in_memory()?));
            }
            if path.is_empty() {
                return Err(StoreError::UnsupportedUrl(url.to_string()));
            }
            return Ok(Store::Sqlite(SqliteStore::open(path)?));
        }
        Err(StoreError::UnsupportedUrl(turso::redact(url)))
    }

    /// Create the `employees` table if it does not exist.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        match self {
            Store::Turso(store) => store.ensure_schema(),
            Store::Sqlite(store) => store.ensure_schema(),
        }
    }

    /// Where the store lives, without credentials. For logs.
    pub fn location(&self) -> &str {
        match self {
            Store::Turso(store) => store.location(),
            Store::Sqlite(store) => store.location(),
        }
    }
}

impl RecordStore for Store {
    fn fetch_all_records(&self) -> Result<Vec<StoreRecord>, StoreError> {
        match self {
            Store::Turso(store) => store.fetch_all_records(),
            Store::Sqlite(store) => store.fetch_all_records(),
        }
    }

    fn find_record(&self, email: &Email) -> Result<StoreRecord, StoreError> {
        match self {
            Store::Turso(store) => store.find_record(email),
            Store::Sqlite(store) => store.find_record(email),
        }
    }

    fn insert(&self, record: &StoreRecord) -> Result<(), StoreError> {
        match self {
            Store::Turso(store) => store.insert(record),
            Store::Sqlite(store) => store.insert(record),
        }
    }

    fn update_messaging_id(
        &self,
        email: &Email,
        messaging_id: MessagingId,
    ) -> Result<(), StoreError> {
        match self {
            Store::Turso(store) => store.update_messaging_id(email, messaging_id),
            Store::Sqlite(store) => store.update_messaging_id(email, messaging_id),
        }
    }
}
