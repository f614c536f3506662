use studypath_core::model::{ItemId, ReviewItem, UserId};

use super::{SqliteRepository, mapping::map_item_row};
use crate::repository::{ReviewItemRepository, StorageError};

#[async_trait::async_trait]
impl ReviewItemRepository for SqliteRepository {
    async fn upsert_item(&self, item: &ReviewItem) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO review_items (
                id, user_id, question, answer, topic, subtopic,
                ease_factor, interval_days, repetitions, next_review,
                last_reviewed, review_count, average_quality,
                source, source_id, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ON CONFLICT(id) DO UPDATE SET
                -- identity and created_at stay from the original insert;
                -- only scheduling state changes across reviews
                ease_factor = excluded.ease_factor,
                interval_days = excluded.interval_days,
                repetitions = excluded.repetitions,
                next_review = excluded.next_review,
                last_reviewed = excluded.last_reviewed,
                review_count = excluded.review_count,
                average_quality = excluded.average_quality
            ",
        )
        .bind(item.id.to_string())
        .bind(item.user_id.as_str())
        .bind(&item.question)
        .bind(&item.answer)
        .bind(&item.topic)
        .bind(&item.subtopic)
        .bind(item.ease_factor)
        .bind(item.interval_days)
        .bind(i64::from(item.repetitions))
        .bind(item.next_review)
        .bind(item.last_reviewed)
        .bind(i64::from(item.review_count))
        .bind(item.average_quality)
        .bind(item.source.as_str())
        .bind(&item.source_id)
        .bind(item.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_item(&self, user_id: &UserId, id: ItemId) -> Result<ReviewItem, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                id, user_id, question, answer, topic, subtopic, ease_factor,
                interval_days, repetitions, next_review, last_reviewed,
                review_count, average_quality, source, source_id, created_at
            FROM review_items
            WHERE id = ?1 AND user_id = ?2
            ",
        )
        .bind(id.to_string())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_item_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn list_items(&self, user_id: &UserId) -> Result<Vec<ReviewItem>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                id, user_id, question, answer, topic, subtopic, ease_factor,
                interval_days, repetitions, next_review, last_reviewed,
                review_count, average_quality, source, source_id, created_at
            FROM review_items
            WHERE user_id = ?1
            ORDER BY next_review ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(map_item_row(&row)?);
        }
        Ok(items)
    }

    async fn delete_item(&self, user_id: &UserId, id: ItemId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM review_items WHERE id = ?1 AND user_id = ?2")
            .bind(id.to_string())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
