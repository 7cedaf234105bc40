//! Repository contract for link storage.

use crate::domain::entities::{Link, LinkCounts, LinkStatus, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Link data access bound to a single connection or transaction.
///
/// Methods take `&mut self` because every call runs on the one connection the
/// repository wraps. Writes issued through a [`LinkTransaction`] become
/// visible to other callers only after [`LinkTransaction::commit`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryLinkStore`] - In-process store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send {
    /// Finds a link by id, regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database errors.
    async fn find_by_id(&mut self, id: &str) -> Result<Option<Link>, AppError>;

    /// Finds the owner's link for a destination URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database errors.
    async fn find_by_original(
        &mut self,
        original: &str,
        owner_id: &str,
    ) -> Result<Option<Link>, AppError>;

    /// Finds a link by its short path.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database errors.
    async fn find_by_short(&mut self, short: &str) -> Result<Option<Link>, AppError>;

    /// Resolves the canonical id of the owner's link for `original`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database errors.
    async fn get_id_by_original(
        &mut self,
        original: &str,
        owner_id: &str,
    ) -> Result<Option<String>, AppError>;

    /// Lists the owner's links, oldest first, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database errors.
    async fn list_by_owner(
        &mut self,
        owner_id: &str,
        status: Option<LinkStatus>,
    ) -> Result<Vec<Link>, AppError>;

    /// Counts the owner's links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database errors.
    async fn count_by_owner(&mut self, owner_id: &str) -> Result<LinkCounts, AppError>;

    /// Inserts a new link under `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::IdConflict`] if the id is taken and
    /// [`AppError::Conflict`] on any other uniqueness violation
    /// (`(owner_id, original)` or `short`).
    ///
    /// Returns [`AppError::Store`] on database errors.
    async fn insert(&mut self, link: &NewLink, owner_id: &str) -> Result<(), AppError>;

    /// Sets the status of the link with `id`. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database errors.
    async fn update_status(&mut self, id: &str, status: LinkStatus) -> Result<(), AppError>;
}

/// A repository bound to an open transaction.
///
/// Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait LinkTransaction: LinkRepository {
    /// Makes every write of this transaction visible atomically.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the commit fails, or a conflict error if
    /// the store rejects the transaction's writes at commit time.
    async fn commit(self) -> Result<(), AppError>;

    /// Discards every write of this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the rollback fails.
    async fn rollback(self) -> Result<(), AppError>;
}

/// Source of transactions and plain connections for link data.
#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    type Tx: LinkTransaction + 'static;
    type Conn: LinkRepository;

    /// Opens a new transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if no transaction can be started.
    async fn begin(&self) -> Result<Self::Tx, AppError>;

    /// Acquires an autocommit connection for read-only work.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if no connection is available.
    async fn acquire(&self) -> Result<Self::Conn, AppError>;

    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store does not answer.
    async fn ping(&self) -> Result<(), AppError>;
}
