use std::collections::BTreeMap;
use std::sync::Arc;

use studypath_core::model::{ItemId, Quality, ReviewItem, UserId};
use studypath_core::scheduler;
use studypath_core::time::Clock;

use storage::repository::ReviewItemRepository;

use crate::error::ReviewServiceError;

/// Default number of due items returned when the caller does not say.
pub const DEFAULT_REVIEW_LIMIT: usize = 20;

//
// ─── STATS ─────────────────────────────────────────────────────────────────────
//

/// Aggregate numbers across all of a user's review items.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverallReviewStats {
    pub total_items: u32,
    pub average_quality: f64,
    pub total_reviews: u32,
    pub due_today: u32,
}

/// Aggregate numbers for one topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicReviewStats {
    pub topic: String,
    pub item_count: u32,
    pub average_quality: f64,
    pub due_count: u32,
}

/// Overall plus per-topic review statistics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReviewStats {
    pub overall: OverallReviewStats,
    pub topics: Vec<TopicReviewStats>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Coordinates the spaced-repetition queue: due selection, responses, and
/// item management.
#[derive(Clone)]
pub struct ReviewService {
    clock: Clock,
    items: Arc<dyn ReviewItemRepository>,
}

impl ReviewService {
    #[must_use]
    pub fn new(clock: Clock, items: Arc<dyn ReviewItemRepository>) -> Self {
        Self { clock, items }
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// The user's due items, most overdue first, truncated to `limit`
    /// (default [`DEFAULT_REVIEW_LIMIT`]).
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Storage` if repository access fails.
    pub async fn due_reviews(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<ReviewItem>, ReviewServiceError> {
        let items = self.items.list_items(user_id).await?;
        Ok(scheduler::due_items(
            &items,
            self.now(),
            limit.unwrap_or(DEFAULT_REVIEW_LIMIT),
        ))
    }

    /// Record the user's recall rating for one item.
    ///
    /// Validates the raw 0-5 rating, applies the scheduler, persists, and
    /// returns the updated item.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Review` for an out-of-range rating,
    /// `ReviewServiceError::Storage` if the item is missing or persistence
    /// fails.
    pub async fn respond(
        &self,
        user_id: &UserId,
        item_id: ItemId,
        quality: u8,
    ) -> Result<ReviewItem, ReviewServiceError> {
        let quality = Quality::new(quality)?;
        let item = self.items.get_item(user_id, item_id).await?;

        let updated = scheduler::apply_review(&item, quality, self.now());
        self.items.upsert_item(&updated).await?;
        Ok(updated)
    }

    /// Add a manually authored item, due immediately.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Storage` if persistence fails.
    pub async fn add_item(
        &self,
        user_id: &UserId,
        question: &str,
        answer: Option<&str>,
        topic: &str,
        subtopic: Option<&str>,
    ) -> Result<ReviewItem, ReviewServiceError> {
        let mut item = ReviewItem::new(user_id.clone(), question, topic, self.now());
        if let Some(answer) = answer {
            item = item.with_answer(answer);
        }
        if let Some(subtopic) = subtopic {
            item = item.with_subtopic(subtopic);
        }

        self.items.upsert_item(&item).await?;
        Ok(item)
    }

    /// Delete one item. Items are never deleted automatically.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Storage` (`NotFound`) if the item does
    /// not exist for this user.
    pub async fn delete_item(
        &self,
        user_id: &UserId,
        item_id: ItemId,
    ) -> Result<(), ReviewServiceError> {
        self.items.delete_item(user_id, item_id).await?;
        Ok(())
    }

    /// Overall and per-topic statistics for a user's review queue.
    ///
    /// Per-topic rows are sorted by item count, largest first.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Storage` if repository access fails.
    pub async fn stats(&self, user_id: &UserId) -> Result<ReviewStats, ReviewServiceError> {
        let items = self.items.list_items(user_id).await?;
        if items.is_empty() {
            return Ok(ReviewStats::default());
        }
        let now = self.now();

        let total_items = items.len() as u32;
        let total_reviews: u32 = items.iter().map(|item| item.review_count).sum();
        let average_quality =
            items.iter().map(|item| item.average_quality).sum::<f64>() / f64::from(total_items);
        let due_today = items.iter().filter(|item| item.next_review <= now).count() as u32;

        let mut by_topic: BTreeMap<&str, (u32, f64, u32)> = BTreeMap::new();
        for item in &items {
            let entry = by_topic.entry(item.topic.as_str()).or_default();
            entry.0 += 1;
            entry.1 += item.average_quality;
            if item.next_review <= now {
                entry.2 += 1;
            }
        }

        let mut topics: Vec<TopicReviewStats> = by_topic
            .into_iter()
            .map(|(topic, (item_count, quality_sum, due_count))| TopicReviewStats {
                topic: topic.to_string(),
                item_count,
                average_quality: quality_sum / f64::from(item_count),
                due_count,
            })
            .collect();
        topics.sort_by(|a, b| b.item_count.cmp(&a.item_count));

        Ok(ReviewStats {
            overall: OverallReviewStats {
                total_items,
                average_quality,
                total_reviews,
                due_today,
            },
            topics,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
