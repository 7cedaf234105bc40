//! Link lifecycle engine.
//!
//! [`LinkService`] saves links idempotently per `(owner, original)`, changes
//! their visibility status, lists and counts an owner's links and resolves
//! short paths for redirects. Every write runs inside one unit of work.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::application::unit_of_work::UnitOfWork;
use crate::domain::entities::{Link, LinkCounts, LinkStatus, ListFilter, NewLink};
use crate::domain::repositories::{LinkRepository, LinkStore};
use crate::error::AppError;
use crate::utils::code_generator::generate_short_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveOutcome {
    Created,
    StatusUpdated,
}

/// Service owning the link lifecycle.
///
/// Generic over the [`LinkStore`] so the same engine runs on PostgreSQL and
/// on the in-memory store.
pub struct LinkService<S: LinkStore> {
    uow: UnitOfWork<S>,
}

impl<S: LinkStore> Clone for LinkService<S> {
    fn clone(&self) -> Self {
        Self {
            uow: self.uow.clone(),
        }
    }
}

impl<S: LinkStore> LinkService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            uow: UnitOfWork::new(store),
        }
    }

    /// Sets the deadline applied to each transaction the service opens.
    pub fn with_tx_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.uow = self.uow.with_timeout(timeout);
        self
    }

    pub fn unit_of_work(&self) -> &UnitOfWork<S> {
        &self.uow
    }

    /// Saves `link` for `owner_id` in its own transaction.
    ///
    /// If the owner already has a link for `link.original`, only its status is
    /// changed and the caller's id and short path are discarded. Otherwise
    /// the link is inserted as given. The stored record is returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::IdConflict`] if `link.id` is already used by any
    /// owner, even when the `(owner, original)` pair is new.
    ///
    /// Returns [`AppError::Validation`] if a field is empty or `original` is
    /// not an http(s) URL.
    ///
    /// Returns [`AppError::Conflict`] if the store rejects a concurrent
    /// duplicate, and [`AppError::Store`] on storage failures.
    pub async fn save_link(&self, link: NewLink, owner_id: &str) -> Result<Link, AppError> {
        let owner_id = owner_id.to_string();
        let (saved, outcome) = self
            .uow
            .run(None, move |tx| {
                Box::pin(async move { save_on(tx, link, &owner_id).await })
            })
            .await?;

        record_save(&saved, outcome);
        Ok(saved)
    }

    /// Same as [`Self::save_link`] but inside the caller's transaction.
    ///
    /// Nothing is committed; the caller decides the outcome of `tx`.
    pub async fn save_link_in(
        &self,
        tx: &mut S::Tx,
        link: NewLink,
        owner_id: &str,
    ) -> Result<Link, AppError> {
        let owner_id = owner_id.to_string();
        let (saved, outcome) = self
            .uow
            .run(Some(tx), move |tx| {
                Box::pin(async move { save_on(tx, link, &owner_id).await })
            })
            .await?;

        record_save(&saved, outcome);
        Ok(saved)
    }

    /// Changes the status of the owner's link for `original`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the owner has no link for `original`,
    /// and [`AppError::Store`] on storage failures.
    pub async fn update_status(
        &self,
        original: &str,
        owner_id: &str,
        status: LinkStatus,
    ) -> Result<Link, AppError> {
        let original = original.to_string();
        let owner_id = owner_id.to_string();
        let link = self
            .uow
            .run(None, move |tx| {
                Box::pin(async move { update_status_on(tx, &original, &owner_id, status).await })
            })
            .await?;

        metrics::counter!("links_status_updated_total").increment(1);
        Ok(link)
    }

    /// Same as [`Self::update_status`] but inside the caller's transaction.
    pub async fn update_status_in(
        &self,
        tx: &mut S::Tx,
        original: &str,
        owner_id: &str,
        status: LinkStatus,
    ) -> Result<Link, AppError> {
        let original = original.to_string();
        let owner_id = owner_id.to_string();
        let link = self
            .uow
            .run(Some(tx), move |tx| {
                Box::pin(async move { update_status_on(tx, &original, &owner_id, status).await })
            })
            .await?;

        metrics::counter!("links_status_updated_total").increment(1);
        Ok(link)
    }

    /// Lists the owner's links matching `filter`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on storage failures.
    pub async fn list_links(
        &self,
        owner_id: &str,
        filter: ListFilter,
    ) -> Result<Vec<Link>, AppError> {
        let mut conn = self.uow.store().acquire().await?;
        let links = conn.list_by_owner(owner_id, filter.status()).await?;

        tracing::debug!(owner_id, ?filter, count = links.len(), "Listed links");
        Ok(links)
    }

    /// Returns the original URL behind `short` if the link is active.
    ///
    /// Unknown and inactive short paths both yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on storage failures.
    pub async fn resolve_original(&self, short: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.uow.store().acquire().await?;
        let resolved = conn
            .find_by_short(short)
            .await?
            .filter(Link::is_active)
            .map(|link| link.original);

        let outcome = if resolved.is_some() { "hit" } else { "miss" };
        metrics::counter!("links_resolved_total", "outcome" => outcome).increment(1);
        tracing::debug!(short, outcome, "Resolved short path");

        Ok(resolved)
    }

    /// Generates a short path and a fresh id, then saves the link.
    ///
    /// When the owner already shortened `original`, the existing link is
    /// returned with its status set to `status`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the owner id is too short for a
    /// short path prefix, [`AppError::Entropy`] if no random bytes are
    /// available, plus everything [`Self::save_link`] returns.
    pub async fn shorten(
        &self,
        owner_id: &str,
        original: &str,
        status: LinkStatus,
    ) -> Result<Link, AppError> {
        let short = generate_short_path(owner_id)?;
        let id = uuid::Uuid::new_v4().to_string();

        self.save_link(NewLink::new(id, original, short, status), owner_id)
            .await
    }

    /// Total and active link counts for an owner.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on storage failures.
    pub async fn count_links(&self, owner_id: &str) -> Result<LinkCounts, AppError> {
        let mut conn = self.uow.store().acquire().await?;
        conn.count_by_owner(owner_id).await
    }

    /// Checks that the store answers.
    pub async fn health_check(&self) -> Result<(), AppError> {
        self.uow.store().ping().await
    }
}

fn record_save(link: &Link, outcome: SaveOutcome) {
    match outcome {
        SaveOutcome::Created => {
            metrics::counter!("links_created_total").increment(1);
            tracing::info!(id = %link.id, short = %link.short, "Link created");
        }
        SaveOutcome::StatusUpdated => {
            metrics::counter!("links_status_updated_total").increment(1);
            tracing::info!(id = %link.id, status = %link.status, "Existing link re-saved");
        }
    }
}

async fn save_on<R: LinkRepository>(
    repo: &mut R,
    link: NewLink,
    owner_id: &str,
) -> Result<(Link, SaveOutcome), AppError> {
    let existing = repo.find_by_original(&link.original, owner_id).await?;

    if repo.find_by_id(&link.id).await?.is_some() {
        return Err(AppError::id_conflict(&link.id));
    }

    link.validate()?;

    let (id, outcome) = match existing {
        Some(_) => {
            let id = repo
                .get_id_by_original(&link.original, owner_id)
                .await?
                .ok_or_else(|| {
                    AppError::internal(
                        "Existing link vanished inside the transaction",
                        json!({ "original": link.original }),
                    )
                })?;
            repo.update_status(&id, link.status).await?;
            (id, SaveOutcome::StatusUpdated)
        }
        None => {
            repo.insert(&link, owner_id).await?;
            (link.id, SaveOutcome::Created)
        }
    };

    let saved = refetch(repo, &id).await?;
    Ok((saved, outcome))
}

async fn update_status_on<R: LinkRepository>(
    repo: &mut R,
    original: &str,
    owner_id: &str,
    status: LinkStatus,
) -> Result<Link, AppError> {
    let id = repo
        .get_id_by_original(original, owner_id)
        .await?
        .ok_or_else(|| AppError::not_found("Link not found", json!({ "original": original })))?;

    repo.update_status(&id, status).await?;
    tracing::debug!(%id, %status, "Link status updated");

    refetch(repo, &id).await
}

async fn refetch<R: LinkRepository>(repo: &mut R, id: &str) -> Result<Link, AppError> {
    repo.find_by_id(id).await?.ok_or_else(|| {
        AppError::internal("Saved link could not be read back", json!({ "id": id }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use chrono::Utc;

    const OWNER: &str = "owner-0000000000000000000000000001";

    fn stored(id: &str, original: &str, status: LinkStatus) -> Link {
        Link {
            id: id.to_string(),
            original: original.to_string(),
            short: format!("short/{id}"),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn new_link(id: &str, original: &str) -> NewLink {
        NewLink::new(id, original, format!("short/{id}"), LinkStatus::Active)
    }

    #[tokio::test]
    async fn test_save_inserts_new_link() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_original().times(1).returning(|_, _| Ok(None));

        let mut lookups = 0;
        repo.expect_find_by_id().times(2).returning(move |id| {
            lookups += 1;
            if lookups == 1 {
                Ok(None)
            } else {
                Ok(Some(stored(id, "https://example.com", LinkStatus::Active)))
            }
        });
        repo.expect_insert()
            .withf(|link, owner| link.id == "id1" && owner == OWNER)
            .times(1)
            .returning(|_, _| Ok(()));

        let (link, outcome) = save_on(&mut repo, new_link("id1", "https://example.com"), OWNER)
            .await
            .unwrap();

        assert_eq!(link.id, "id1");
        assert_eq!(outcome, SaveOutcome::Created);
    }

    #[tokio::test]
    async fn test_save_existing_original_updates_status_only() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_original()
            .returning(|original, _| Ok(Some(stored("canonical", original, LinkStatus::Active))));
        repo.expect_find_by_id().returning(|id| {
            if id == "canonical" {
                Ok(Some(stored(id, "https://example.com", LinkStatus::Inactive)))
            } else {
                Ok(None)
            }
        });
        repo.expect_get_id_by_original()
            .returning(|_, _| Ok(Some("canonical".to_string())));
        repo.expect_update_status()
            .withf(|id, status| id == "canonical" && *status == LinkStatus::Inactive)
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_insert().never();

        let mut link = new_link("fresh-id", "https://example.com");
        link.status = LinkStatus::Inactive;

        let (saved, outcome) = save_on(&mut repo, link, OWNER).await.unwrap();

        assert_eq!(saved.id, "canonical");
        assert_eq!(saved.status, LinkStatus::Inactive);
        assert_eq!(outcome, SaveOutcome::StatusUpdated);
    }

    #[tokio::test]
    async fn test_save_rejects_taken_id_before_writing() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_original().returning(|_, _| Ok(None));
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(stored(id, "https://other.example.com", LinkStatus::Active))));
        repo.expect_insert().never();
        repo.expect_update_status().never();

        let err = save_on(&mut repo, new_link("id1", "https://example.com"), OWNER)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::IdConflict { ref id } if id == "id1"));
    }

    #[tokio::test]
    async fn test_save_validates_before_writing() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_original().returning(|_, _| Ok(None));
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_insert().never();

        let err = save_on(&mut repo, new_link("id1", "not a url"), OWNER)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_save_refetch_miss_is_internal_error() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_original().returning(|_, _| Ok(None));
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_insert().returning(|_, _| Ok(()));

        let err = save_on(&mut repo, new_link("id1", "https://example.com"), OWNER)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_update_status_unknown_original_is_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_get_id_by_original().returning(|_, _| Ok(None));
        repo.expect_update_status().never();

        let err = update_status_on(&mut repo, "https://example.com", OWNER, LinkStatus::Active)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_storage_error_propagates_unchanged() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_original()
            .returning(|_, _| Err(AppError::store("links.find_by_original", "connection reset")));

        let err = save_on(&mut repo, new_link("id1", "https://example.com"), OWNER)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Store {
                operation: "links.find_by_original",
                ..
            }
        ));
    }
}
