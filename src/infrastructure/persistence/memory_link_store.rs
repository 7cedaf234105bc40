//! In-memory link store.
//!
//! [`MemoryLinkStore`] implements [`LinkStore`] without a database. It is used
//! by the integration tests and for local runs without PostgreSQL.
//!
//! # Transactions
//!
//! A [`MemoryLinkTransaction`] works on a private copy of the data taken at
//! `begin`, so it reads its own writes and nobody else sees them. Writes are
//! also recorded in order; `commit` replays them against the current shared
//! state with every uniqueness constraint re-checked, and applies all of them
//! or none. Dropping a transaction discards it.
//!
//! # Fail points
//!
//! [`MemoryLinkStore::fail_on`] makes a chosen operation return
//! [`AppError::Store`], for exercising abort paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::entities::{Link, LinkCounts, LinkStatus, NewLink};
use crate::domain::repositories::{LinkRepository, LinkStore, LinkTransaction};
use crate::error::AppError;

/// Operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    Commit,
    FindById,
    FindByOriginal,
    FindByShort,
    GetIdByOriginal,
    ListByOwner,
    CountByOwner,
    Insert,
    UpdateStatus,
    Ping,
}

impl FailPoint {
    fn operation(self) -> &'static str {
        match self {
            Self::Begin => "links.begin",
            Self::Commit => "links.commit",
            Self::FindById => "links.find_by_id",
            Self::FindByOriginal => "links.find_by_original",
            Self::FindByShort => "links.find_by_short",
            Self::GetIdByOriginal => "links.get_id_by_original",
            Self::ListByOwner => "links.list_by_owner",
            Self::CountByOwner => "links.count_by_owner",
            Self::Insert => "links.insert",
            Self::UpdateStatus => "links.update_status",
            Self::Ping => "links.ping",
        }
    }
}

#[derive(Debug, Clone)]
struct StoredLink {
    owner_id: String,
    link: Link,
}

#[derive(Debug, Clone, Default)]
struct LinkTable {
    rows: BTreeMap<String, StoredLink>,
}

impl LinkTable {
    fn find_by_id(&self, id: &str) -> Option<Link> {
        self.rows.get(id).map(|row| row.link.clone())
    }

    fn find_by_original(&self, original: &str, owner_id: &str) -> Option<Link> {
        self.rows
            .values()
            .find(|row| row.owner_id == owner_id && row.link.original == original)
            .map(|row| row.link.clone())
    }

    fn find_by_short(&self, short: &str) -> Option<Link> {
        self.rows
            .values()
            .find(|row| row.link.short == short)
            .map(|row| row.link.clone())
    }

    fn list_by_owner(&self, owner_id: &str, status: Option<LinkStatus>) -> Vec<Link> {
        let mut links: Vec<Link> = self
            .rows
            .values()
            .filter(|row| row.owner_id == owner_id)
            .filter(|row| status.is_none_or(|status| row.link.status == status))
            .map(|row| row.link.clone())
            .collect();

        links.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        links
    }

    fn count_by_owner(&self, owner_id: &str) -> LinkCounts {
        self.rows
            .values()
            .filter(|row| row.owner_id == owner_id)
            .fold(LinkCounts::default(), |mut counts, row| {
                counts.total += 1;
                if row.link.is_active() {
                    counts.active += 1;
                }
                counts
            })
    }

    fn insert(&mut self, link: &NewLink, owner_id: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.rows.contains_key(&link.id) {
            return Err(AppError::id_conflict(&link.id));
        }
        if self.find_by_original(&link.original, owner_id).is_some() {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "links_owner_original_key" }),
            ));
        }
        if self.find_by_short(&link.short).is_some() {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "links_short_key" }),
            ));
        }

        self.rows.insert(
            link.id.clone(),
            StoredLink {
                owner_id: owner_id.to_string(),
                link: Link {
                    id: link.id.clone(),
                    original: link.original.clone(),
                    short: link.short.clone(),
                    status: link.status,
                    created_at: now,
                    updated_at: now,
                },
            },
        );

        Ok(())
    }

    fn update_status(&mut self, id: &str, status: LinkStatus, now: DateTime<Utc>) {
        if let Some(row) = self.rows.get_mut(id) {
            row.link.status = status;
            row.link.updated_at = now;
        }
    }

    fn apply(&mut self, write: &Write) -> Result<(), AppError> {
        match write {
            Write::Insert { link, owner_id, at } => self.insert(link, owner_id, *at),
            Write::UpdateStatus { id, status, at } => {
                self.update_status(id, *status, *at);
                Ok(())
            }
        }
    }
}

/// A write recorded by a transaction for replay at commit.
#[derive(Debug, Clone)]
enum Write {
    Insert {
        link: NewLink,
        owner_id: String,
        at: DateTime<Utc>,
    },
    UpdateStatus {
        id: String,
        status: LinkStatus,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Default)]
struct Shared {
    table: Mutex<LinkTable>,
    fail_points: Mutex<HashSet<FailPoint>>,
}

impl Shared {
    fn table(&self) -> MutexGuard<'_, LinkTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, point: FailPoint) -> Result<(), AppError> {
        let armed = self
            .fail_points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&point);

        if armed {
            return Err(AppError::store(point.operation(), "injected failure"));
        }
        Ok(())
    }
}

/// Thread-safe in-process link store.
#[derive(Debug, Clone, Default)]
pub struct MemoryLinkStore {
    shared: Arc<Shared>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `point` fail until [`Self::clear_fail_points`] is called.
    pub fn fail_on(&self, point: FailPoint) {
        self.shared
            .fail_points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(point);
    }

    pub fn clear_fail_points(&self) {
        self.shared
            .fail_points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of committed links across all owners.
    pub fn len(&self) -> usize {
        self.shared.table().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    type Tx = MemoryLinkTransaction;
    type Conn = MemoryLinkConnection;

    async fn begin(&self) -> Result<Self::Tx, AppError> {
        self.shared.check(FailPoint::Begin)?;

        Ok(MemoryLinkTransaction {
            shared: Arc::clone(&self.shared),
            snapshot: self.shared.table().clone(),
            writes: Vec::new(),
        })
    }

    async fn acquire(&self) -> Result<Self::Conn, AppError> {
        Ok(MemoryLinkConnection {
            shared: Arc::clone(&self.shared),
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.shared.check(FailPoint::Ping)
    }
}

/// Autocommit connection; every write is visible immediately.
#[derive(Debug)]
pub struct MemoryLinkConnection {
    shared: Arc<Shared>,
}

#[async_trait]
impl LinkRepository for MemoryLinkConnection {
    async fn find_by_id(&mut self, id: &str) -> Result<Option<Link>, AppError> {
        self.shared.check(FailPoint::FindById)?;
        Ok(self.shared.table().find_by_id(id))
    }

    async fn find_by_original(
        &mut self,
        original: &str,
        owner_id: &str,
    ) -> Result<Option<Link>, AppError> {
        self.shared.check(FailPoint::FindByOriginal)?;
        Ok(self.shared.table().find_by_original(original, owner_id))
    }

    async fn find_by_short(&mut self, short: &str) -> Result<Option<Link>, AppError> {
        self.shared.check(FailPoint::FindByShort)?;
        Ok(self.shared.table().find_by_short(short))
    }

    async fn get_id_by_original(
        &mut self,
        original: &str,
        owner_id: &str,
    ) -> Result<Option<String>, AppError> {
        self.shared.check(FailPoint::GetIdByOriginal)?;
        Ok(self
            .shared
            .table()
            .find_by_original(original, owner_id)
            .map(|link| link.id))
    }

    async fn list_by_owner(
        &mut self,
        owner_id: &str,
        status: Option<LinkStatus>,
    ) -> Result<Vec<Link>, AppError> {
        self.shared.check(FailPoint::ListByOwner)?;
        Ok(self.shared.table().list_by_owner(owner_id, status))
    }

    async fn count_by_owner(&mut self, owner_id: &str) -> Result<LinkCounts, AppError> {
        self.shared.check(FailPoint::CountByOwner)?;
        Ok(self.shared.table().count_by_owner(owner_id))
    }

    async fn insert(&mut self, link: &NewLink, owner_id: &str) -> Result<(), AppError> {
        self.shared.check(FailPoint::Insert)?;
        self.shared.table().insert(link, owner_id, Utc::now())
    }

    async fn update_status(&mut self, id: &str, status: LinkStatus) -> Result<(), AppError> {
        self.shared.check(FailPoint::UpdateStatus)?;
        self.shared.table().update_status(id, status, Utc::now());
        Ok(())
    }
}

/// Transaction over a private copy of the link table.
#[derive(Debug)]
pub struct MemoryLinkTransaction {
    shared: Arc<Shared>,
    snapshot: LinkTable,
    writes: Vec<Write>,
}

#[async_trait]
impl LinkRepository for MemoryLinkTransaction {
    async fn find_by_id(&mut self, id: &str) -> Result<Option<Link>, AppError> {
        self.shared.check(FailPoint::FindById)?;
        Ok(self.snapshot.find_by_id(id))
    }

    async fn find_by_original(
        &mut self,
        original: &str,
        owner_id: &str,
    ) -> Result<Option<Link>, AppError> {
        self.shared.check(FailPoint::FindByOriginal)?;
        Ok(self.snapshot.find_by_original(original, owner_id))
    }

    async fn find_by_short(&mut self, short: &str) -> Result<Option<Link>, AppError> {
        self.shared.check(FailPoint::FindByShort)?;
        Ok(self.snapshot.find_by_short(short))
    }

    async fn get_id_by_original(
        &mut self,
        original: &str,
        owner_id: &str,
    ) -> Result<Option<String>, AppError> {
        self.shared.check(FailPoint::GetIdByOriginal)?;
        Ok(self
            .snapshot
            .find_by_original(original, owner_id)
            .map(|link| link.id))
    }

    async fn list_by_owner(
        &mut self,
        owner_id: &str,
        status: Option<LinkStatus>,
    ) -> Result<Vec<Link>, AppError> {
        self.shared.check(FailPoint::ListByOwner)?;
        Ok(self.snapshot.list_by_owner(owner_id, status))
    }

    async fn count_by_owner(&mut self, owner_id: &str) -> Result<LinkCounts, AppError> {
        self.shared.check(FailPoint::CountByOwner)?;
        Ok(self.snapshot.count_by_owner(owner_id))
    }

    async fn insert(&mut self, link: &NewLink, owner_id: &str) -> Result<(), AppError> {
        self.shared.check(FailPoint::Insert)?;

        let write = Write::Insert {
            link: link.clone(),
            owner_id: owner_id.to_string(),
            at: Utc::now(),
        };
        self.snapshot.apply(&write)?;
        self.writes.push(write);
        Ok(())
    }

    async fn update_status(&mut self, id: &str, status: LinkStatus) -> Result<(), AppError> {
        self.shared.check(FailPoint::UpdateStatus)?;

        let write = Write::UpdateStatus {
            id: id.to_string(),
            status,
            at: Utc::now(),
        };
        self.snapshot.apply(&write)?;
        self.writes.push(write);
        Ok(())
    }
}

#[async_trait]
impl LinkTransaction for MemoryLinkTransaction {
    async fn commit(self) -> Result<(), AppError> {
        self.shared.check(FailPoint::Commit)?;

        let mut table = self.shared.table();
        let mut next = table.clone();
        for write in &self.writes {
            next.apply(write)?;
        }
        *table = next;

        tracing::trace!(writes = self.writes.len(), "Memory transaction committed");
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "owner-a";

    fn new_link(id: &str, original: &str, short: &str) -> NewLink {
        NewLink::new(id, original, short, LinkStatus::Active)
    }

    #[tokio::test]
    async fn test_transaction_reads_its_own_writes() {
        let store = MemoryLinkStore::new();
        let mut tx = store.begin().await.unwrap();

        tx.insert(&new_link("id1", "https://a.example.com", "p/1"), OWNER)
            .await
            .unwrap();

        assert!(tx.find_by_id("id1").await.unwrap().is_some());
        assert!(store.is_empty());

        tx.commit().await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_is_discarded() {
        let store = MemoryLinkStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert(&new_link("id1", "https://a.example.com", "p/1"), OWNER)
                .await
                .unwrap();
        }

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_commit_rechecks_constraints() {
        let store = MemoryLinkStore::new();
        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();

        first
            .insert(&new_link("id1", "https://a.example.com", "p/1"), OWNER)
            .await
            .unwrap();
        second
            .insert(&new_link("id1", "https://b.example.com", "p/2"), OWNER)
            .await
            .unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();

        assert!(matches!(err, AppError::IdConflict { .. }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_constraint_violations() {
        let store = MemoryLinkStore::new();
        let mut conn = store.acquire().await.unwrap();

        conn.insert(&new_link("id1", "https://a.example.com", "p/1"), OWNER)
            .await
            .unwrap();

        let dup_original = conn
            .insert(&new_link("id2", "https://a.example.com", "p/2"), OWNER)
            .await
            .unwrap_err();
        assert!(matches!(dup_original, AppError::Conflict { .. }));

        let dup_short = conn
            .insert(&new_link("id3", "https://c.example.com", "p/1"), OWNER)
            .await
            .unwrap_err();
        assert!(matches!(dup_short, AppError::Conflict { .. }));

        // same original under another owner is allowed
        conn.insert(&new_link("id4", "https://a.example.com", "p/4"), "owner-b")
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_counts_and_status_filter() {
        let store = MemoryLinkStore::new();
        let mut conn = store.acquire().await.unwrap();

        conn.insert(&new_link("id1", "https://a.example.com", "p/1"), OWNER)
            .await
            .unwrap();
        conn.insert(&new_link("id2", "https://b.example.com", "p/2"), OWNER)
            .await
            .unwrap();
        conn.update_status("id2", LinkStatus::Inactive).await.unwrap();

        let counts = conn.count_by_owner(OWNER).await.unwrap();
        assert_eq!(counts, LinkCounts { total: 2, active: 1 });

        let inactive = conn
            .list_by_owner(OWNER, Some(LinkStatus::Inactive))
            .await
            .unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].id, "id2");
    }

    #[tokio::test]
    async fn test_fail_point_injection() {
        let store = MemoryLinkStore::new();
        store.fail_on(FailPoint::Insert);

        let mut conn = store.acquire().await.unwrap();
        let err = conn
            .insert(&new_link("id1", "https://a.example.com", "p/1"), OWNER)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store { operation: "links.insert", .. }));

        store.clear_fail_points();
        conn.insert(&new_link("id1", "https://a.example.com", "p/1"), OWNER)
            .await
            .unwrap();
    }
}
