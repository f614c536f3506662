use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use studypath_core::model::{
    ItemId, QuizResult, ReviewItem, Roadmap, RoadmapId, RoadmapStatus, UserId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Optional criteria for listing roadmaps.
#[derive(Debug, Clone, Default)]
pub struct RoadmapFilter {
    pub status: Option<RoadmapStatus>,
    /// Case-insensitive substring match on the topic.
    pub topic: Option<String>,
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for review items. All access is scoped to the owning
/// user; an item belonging to another user is indistinguishable from a
/// missing one.
#[async_trait]
pub trait ReviewItemRepository: Send + Sync {
    /// Persist or update an item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the item cannot be stored.
    async fn upsert_item(&self, item: &ReviewItem) -> Result<(), StorageError>;

    /// Fetch one item by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_item(&self, user_id: &UserId, id: ItemId) -> Result<ReviewItem, StorageError>;

    /// All items for a user, ordered by `next_review` ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn list_items(&self, user_id: &UserId) -> Result<Vec<ReviewItem>, StorageError>;

    /// Delete one item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing was deleted.
    async fn delete_item(&self, user_id: &UserId, id: ItemId) -> Result<(), StorageError>;
}

/// Repository contract for roadmaps.
#[async_trait]
pub trait RoadmapRepository: Send + Sync {
    /// Persist or update a roadmap (steps included).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the roadmap cannot be stored.
    async fn upsert_roadmap(&self, roadmap: &Roadmap) -> Result<(), StorageError>;

    /// Fetch one roadmap by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_roadmap(&self, user_id: &UserId, id: RoadmapId) -> Result<Roadmap, StorageError>;

    /// Roadmaps for a user matching `filter`, newest first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn list_roadmaps(
        &self,
        user_id: &UserId,
        filter: &RoadmapFilter,
        limit: u32,
    ) -> Result<Vec<Roadmap>, StorageError>;

    /// Delete one roadmap.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing was deleted.
    async fn delete_roadmap(&self, user_id: &UserId, id: RoadmapId) -> Result<(), StorageError>;
}

/// Repository contract for submitted quiz results. Results are append-only.
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// Persist a newly submitted result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn insert_result(&self, result: &QuizResult) -> Result<(), StorageError>;

    /// Results for a user, optionally filtered by topic substring
    /// (case-insensitive), newest first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    async fn list_results(
        &self,
        user_id: &UserId,
        topic: Option<&str>,
        limit: u32,
    ) -> Result<Vec<QuizResult>, StorageError>;
}

//
// ─── STORAGE BUNDLE ────────────────────────────────────────────────────────────
//

/// Aggregates the three repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub items: Arc<dyn ReviewItemRepository>,
    pub roadmaps: Arc<dyn RoadmapRepository>,
    pub quizzes: Arc<dyn QuizResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let items: Arc<dyn ReviewItemRepository> = Arc::new(repo.clone());
        let roadmaps: Arc<dyn RoadmapRepository> = Arc::new(repo.clone());
        let quizzes: Arc<dyn QuizResultRepository> = Arc::new(repo);
        Self {
            items,
            roadmaps,
            quizzes,
        }
    }
}

//
// ─── IN-MEMORY REPOSITORY ──────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    items: Arc<Mutex<HashMap<(UserId, ItemId), ReviewItem>>>,
    roadmaps: Arc<Mutex<HashMap<(UserId, RoadmapId), Roadmap>>>,
    quizzes: Arc<Mutex<Vec<QuizResult>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn topic_matches(topic: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => topic.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

#[async_trait]
impl ReviewItemRepository for InMemoryRepository {
    async fn upsert_item(&self, item: &ReviewItem) -> Result<(), StorageError> {
        let mut guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((item.user_id.clone(), item.id), item.clone());
        Ok(())
    }

    async fn get_item(&self, user_id: &UserId, id: ItemId) -> Result<ReviewItem, StorageError> {
        let guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(&(user_id.clone(), id))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_items(&self, user_id: &UserId) -> Result<Vec<ReviewItem>, StorageError> {
        let guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut items: Vec<ReviewItem> = guard
            .values()
            .filter(|item| &item.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.next_review);
        Ok(items)
    }

    async fn delete_item(&self, user_id: &UserId, id: ItemId) -> Result<(), StorageError> {
        let mut guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .remove(&(user_id.clone(), id))
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl RoadmapRepository for InMemoryRepository {
    async fn upsert_roadmap(&self, roadmap: &Roadmap) -> Result<(), StorageError> {
        let mut guard = self
            .roadmaps
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((roadmap.user_id.clone(), roadmap.id), roadmap.clone());
        Ok(())
    }

    async fn get_roadmap(&self, user_id: &UserId, id: RoadmapId) -> Result<Roadmap, StorageError> {
        let guard = self
            .roadmaps
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(&(user_id.clone(), id))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_roadmaps(
        &self,
        user_id: &UserId,
        filter: &RoadmapFilter,
        limit: u32,
    ) -> Result<Vec<Roadmap>, StorageError> {
        let guard = self
            .roadmaps
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut roadmaps: Vec<Roadmap> = guard
            .values()
            .filter(|roadmap| &roadmap.user_id == user_id)
            .filter(|roadmap| filter.status.is_none_or(|status| roadmap.status == status))
            .filter(|roadmap| topic_matches(&roadmap.topic, filter.topic.as_deref()))
            .cloned()
            .collect();
        roadmaps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        roadmaps.truncate(limit as usize);
        Ok(roadmaps)
    }

    async fn delete_roadmap(&self, user_id: &UserId, id: RoadmapId) -> Result<(), StorageError> {
        let mut guard = self
            .roadmaps
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .remove(&(user_id.clone(), id))
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl QuizResultRepository for InMemoryRepository {
    async fn insert_result(&self, result: &QuizResult) -> Result<(), StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(result.clone());
        Ok(())
    }

    async fn list_results(
        &self,
        user_id: &UserId,
        topic: Option<&str>,
        limit: u32,
    ) -> Result<Vec<QuizResult>, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut results: Vec<QuizResult> = guard
            .iter()
            .filter(|result| &result.user_id == user_id)
            .filter(|result| topic_matches(&result.topic, topic))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results.truncate(limit as usize);
        Ok(results)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
