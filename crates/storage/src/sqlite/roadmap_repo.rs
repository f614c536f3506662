use studypath_core::model::{Roadmap, RoadmapId, UserId};

use super::{
    SqliteRepository,
    mapping::{map_roadmap_row, steps_to_json, tags_to_json},
};
use crate::repository::{RoadmapFilter, RoadmapRepository, StorageError};

#[async_trait::async_trait]
impl RoadmapRepository for SqliteRepository {
    async fn upsert_roadmap(&self, roadmap: &Roadmap) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO roadmaps (
                id, user_id, title, description, topic, level, steps,
                progress, status, estimated_duration, tags, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                steps = excluded.steps,
                progress = excluded.progress,
                status = excluded.status,
                estimated_duration = excluded.estimated_duration,
                tags = excluded.tags
            ",
        )
        .bind(roadmap.id.to_string())
        .bind(roadmap.user_id.as_str())
        .bind(&roadmap.title)
        .bind(&roadmap.description)
        .bind(&roadmap.topic)
        .bind(roadmap.level.as_str())
        .bind(steps_to_json(&roadmap.steps)?)
        .bind(i64::from(roadmap.progress))
        .bind(roadmap.status.as_str())
        .bind(&roadmap.estimated_duration)
        .bind(tags_to_json(&roadmap.tags)?)
        .bind(roadmap.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_roadmap(&self, user_id: &UserId, id: RoadmapId) -> Result<Roadmap, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                id, user_id, title, description, topic, level, steps,
                progress, status, estimated_duration, tags, created_at
            FROM roadmaps
            WHERE id = ?1 AND user_id = ?2
            ",
        )
        .bind(id.to_string())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_roadmap_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn list_roadmaps(
        &self,
        user_id: &UserId,
        filter: &RoadmapFilter,
        limit: u32,
    ) -> Result<Vec<Roadmap>, StorageError> {
        // Optional filters collapse to always-true clauses when absent.
        let rows = sqlx::query(
            r"
            SELECT
                id, user_id, title, description, topic, level, steps,
                progress, status, estimated_duration, tags, created_at
            FROM roadmaps
            WHERE user_id = ?1
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR topic LIKE '%' || ?3 || '%')
            ORDER BY created_at DESC
            LIMIT ?4
            ",
        )
        .bind(user_id.as_str())
        .bind(filter.status.map(|status| status.as_str()))
        .bind(filter.topic.as_deref())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut roadmaps = Vec::with_capacity(rows.len());
        for row in rows {
            roadmaps.push(map_roadmap_row(&row)?);
        }
        Ok(roadmaps)
    }

    async fn delete_roadmap(&self, user_id: &UserId, id: RoadmapId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM roadmaps WHERE id = ?1 AND user_id = ?2")
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
