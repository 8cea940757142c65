//! Collaborator seams for the reconciler.
//!
//! Both traits are blocking: every call returns once the remote side has
//! answered or failed.

use crate::error::{DirectoryError, StoreError};
use crate::types::{Email, MessagingId, SourceUser, StoreRecord};

/// The identity provider's listing of organizational users.
pub trait DirectorySource {
    /// Full snapshot of every user in the configured domain.
    fn fetch_all_users(&self) -> Result<Vec<SourceUser>, DirectoryError>;

    /// A single user, or [`DirectoryError::UserNotFound`].
    fn fetch_user(&self, email: &Email) -> Result<SourceUser, DirectoryError>;
}

/// The persistent row store holding synchronized user records.
pub trait RecordStore {
    /// Full snapshot of every persisted record.
    fn fetch_all_records(&self) -> Result<Vec<StoreRecord>, StoreError>;

    /// A single record, or [`StoreError::NotFound`].
    fn find_record(&self, email: &Email) -> Result<StoreRecord, StoreError>;

    /// Insert a new record. Fails with [`StoreError::Duplicate`] when the
    /// email already exists.
    fn insert(&self, record: &StoreRecord) -> Result<(), StoreError>;

    /// Overwrite the messaging id of the record keyed by `email`.
    ///
    /// Zero affected rows is not an error.
    fn update_messaging_id(
        &self,
        email: &Email,
        messaging_id: MessagingId,
    ) -> Result<(), StoreError>;
}

impl<T: DirectorySource + ?Sized> DirectorySource for &T {
    fn fetch_all_users(&self) -> Result<Vec<SourceUser>, DirectoryError> {
        (**self).fetch_all_users()
    }

    fn fetch_user(&self, email: &Email) -> Result<SourceUser, DirectoryError> {
        (**self).fetch_user(email)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn fetch_all_records(&self) -> Result<Vec<StoreRecord>, StoreError> {
        (**self).fetch_all_records()
    }

    fn find_record(&self, email: &Email) -> Result<StoreRecord, StoreError> {
        (**self).find_record(email)
    }

    fn insert(&self, record: &StoreRecord) -> Result<(), StoreError> {
        (**self).insert(record)
    }

    fn update_messaging_id(
        &self,
        email: &Email,
        messaging_id: MessagingId,
    ) -> Result<(), StoreError> {
        (**self).update_messaging_id(email, messaging_id)
    }
}
