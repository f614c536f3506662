use studypath_core::model::{QuizResult, UserId};

use super::{
    SqliteRepository,
    mapping::{answers_to_json, map_quiz_row, questions_to_json},
};
use crate::repository::{QuizResultRepository, StorageError};

#[async_trait::async_trait]
impl QuizResultRepository for SqliteRepository {
    async fn insert_result(&self, result: &QuizResult) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO quiz_results (
                id, user_id, topic, questions, answers, score,
                total_questions, percentage, difficulty, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(result.id.to_string())
        .bind(result.user_id.as_str())
        .bind(&result.topic)
        .bind(questions_to_json(&result.questions)?)
        .bind(answers_to_json(&result.answers)?)
        .bind(i64::from(result.score))
        .bind(i64::from(result.total_questions))
        .bind(i64::from(result.percentage))
        .bind(result.difficulty.as_str())
        .bind(result.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => StorageError::Connection(other.to_string()),
        })?;

        Ok(())
    }

    async fn list_results(
        &self,
        user_id: &UserId,
        topic: Option<&str>,
        limit: u32,
    ) -> Result<Vec<QuizResult>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                id, user_id, topic, questions, answers, score,
                total_questions, percentage, difficulty, created_at
            FROM quiz_results
            WHERE user_id = ?1
              AND (?2 IS NULL OR topic LIKE '%' || ?2 || '%')
            ORDER BY created_at DESC
            LIMIT ?3
            ",
        )
        .bind(user_id.as_str())
        .bind(topic)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(map_quiz_row(&row)?);
        }
        Ok(results)
    }
}
