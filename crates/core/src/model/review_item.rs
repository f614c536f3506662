use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{ItemId, UserId};

/// Ease factor assigned to items that have never been reviewed.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors that can occur while building review inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("invalid quality rating: {0} (expected 0-5)")]
    InvalidQuality(u8),
}

//
// ─── QUALITY ───────────────────────────────────────────────────────────────────
//

/// A 0-5 self-assessed recall rating supplied by the user after a review.
///
/// 0 is a total blackout, 5 a perfect response. Ratings of 3 and above count
/// as a pass for scheduling purposes. Constructing a `Quality` validates the
/// range, so the scheduler can assume every rating it receives is in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    /// Validates a raw rating.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidQuality` if the value is not in 0-5.
    pub fn new(value: u8) -> Result<Self, ReviewError> {
        if value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(ReviewError::InvalidQuality(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// A rating of 3 or above counts as a successful recall.
    #[must_use]
    pub fn is_passing(self) -> bool {
        self.0 >= 3
    }
}

//
// ─── ITEM SOURCE ───────────────────────────────────────────────────────────────
//

/// Where a review item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSource {
    /// Created automatically from a wrong quiz answer.
    Quiz,
    /// Added by the user directly.
    Manual,
    /// Derived from a roadmap step.
    Roadmap,
}

impl ItemSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ItemSource::Quiz => "quiz",
            ItemSource::Manual => "manual",
            ItemSource::Roadmap => "roadmap",
        }
    }
}

//
// ─── REVIEW ITEM ───────────────────────────────────────────────────────────────
//

/// A single question scheduled for spaced repetition.
///
/// The scheduling fields (`ease_factor`, `interval_days`, `repetitions`,
/// `next_review`, `last_reviewed`, `review_count`, `average_quality`) are
/// mutated exclusively by `scheduler::apply_review`; everything else is fixed
/// at creation. Invariants maintained by the scheduler:
///
/// - `ease_factor` never drops below 1.3
/// - `interval_days` is always at least 1
/// - `repetitions` resets to 0 whenever a review fails (quality < 3)
/// - `average_quality` is the arithmetic mean of every rating ever submitted
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    pub id: ItemId,
    pub user_id: UserId,
    pub question: String,
    pub answer: Option<String>,
    pub topic: String,
    pub subtopic: Option<String>,

    pub ease_factor: f64,
    pub interval_days: i64,
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub review_count: u32,
    pub average_quality: f64,

    pub source: ItemSource,
    pub source_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReviewItem {
    /// Creates a new item with default scheduling state, due immediately.
    #[must_use]
    pub fn new(
        user_id: UserId,
        question: impl Into<String>,
        topic: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ItemId::generate(),
            user_id,
            question: question.into(),
            answer: None,
            topic: topic.into(),
            subtopic: None,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: 1,
            repetitions: 0,
            next_review: now,
            last_reviewed: None,
            review_count: 0,
            average_quality: 0.0,
            source: ItemSource::Manual,
            source_id: None,
            created_at: now,
        }
    }

    #[must_use]
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    #[must_use]
    pub fn with_subtopic(mut self, subtopic: impl Into<String>) -> Self {
        self.subtopic = Some(subtopic.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: ItemSource, source_id: Option<String>) -> Self {
        self.source = source;
        self.source_id = source_id;
        self
    }

    /// Seeds the starting ease factor (quiz items seed by question difficulty).
    #[must_use]
    pub fn with_ease_factor(mut self, ease_factor: f64) -> Self {
        self.ease_factor = ease_factor;
        self
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
