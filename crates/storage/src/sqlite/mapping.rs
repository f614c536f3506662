use std::str::FromStr;

use sqlx::Row;

use studypath_core::model::{
    AnswerRecord, ItemId, ItemSource, Level, Question, QuizId, QuizResult,
    QuestionDifficulty, ReviewItem, Roadmap, RoadmapId, RoadmapStatus, Step, UserId,
};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

//
// ─── ENUM ENCODINGS ────────────────────────────────────────────────────────────
//

pub(crate) fn parse_item_source(s: &str) -> Result<ItemSource, StorageError> {
    match s {
        "quiz" => Ok(ItemSource::Quiz),
        "manual" => Ok(ItemSource::Manual),
        "roadmap" => Ok(ItemSource::Roadmap),
        _ => Err(StorageError::Serialization(format!("invalid source: {s}"))),
    }
}

pub(crate) fn parse_level(s: &str) -> Result<Level, StorageError> {
    match s {
        "beginner" => Ok(Level::Beginner),
        "intermediate" => Ok(Level::Intermediate),
        "advanced" => Ok(Level::Advanced),
        _ => Err(StorageError::Serialization(format!("invalid level: {s}"))),
    }
}

pub(crate) fn parse_status(s: &str) -> Result<RoadmapStatus, StorageError> {
    match s {
        "active" => Ok(RoadmapStatus::Active),
        "completed" => Ok(RoadmapStatus::Completed),
        "paused" => Ok(RoadmapStatus::Paused),
        _ => Err(StorageError::Serialization(format!("invalid status: {s}"))),
    }
}

pub(crate) fn parse_difficulty(s: &str) -> Result<QuestionDifficulty, StorageError> {
    QuestionDifficulty::parse(s)
        .ok_or_else(|| StorageError::Serialization(format!("invalid difficulty: {s}")))
}

//
// ─── ROW MAPPING ───────────────────────────────────────────────────────────────
//

fn count_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn percent_from_i64(field: &'static str, v: i64) -> Result<u8, StorageError> {
    u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_item_row(row: &sqlx::sqlite::SqliteRow) -> Result<ReviewItem, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let source: String = row.try_get("source").map_err(ser)?;

    Ok(ReviewItem {
        id: ItemId::from_str(&id).map_err(ser)?,
        user_id: UserId::new(user_id),
        question: row.try_get("question").map_err(ser)?,
        answer: row.try_get("answer").map_err(ser)?,
        topic: row.try_get("topic").map_err(ser)?,
        subtopic: row.try_get("subtopic").map_err(ser)?,
        ease_factor: row.try_get("ease_factor").map_err(ser)?,
        interval_days: row.try_get("interval_days").map_err(ser)?,
        repetitions: count_from_i64(
            "repetitions",
            row.try_get::<i64, _>("repetitions").map_err(ser)?,
        )?,
        next_review: row.try_get("next_review").map_err(ser)?,
        last_reviewed: row.try_get("last_reviewed").map_err(ser)?,
        review_count: count_from_i64(
            "review_count",
            row.try_get::<i64, _>("review_count").map_err(ser)?,
        )?,
        average_quality: row.try_get("average_quality").map_err(ser)?,
        source: parse_item_source(&source)?,
        source_id: row.try_get("source_id").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn steps_to_json(steps: &[Step]) -> Result<String, StorageError> {
    serde_json::to_string(steps).map_err(ser)
}

pub(crate) fn tags_to_json(tags: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(tags).map_err(ser)
}

pub(crate) fn map_roadmap_row(row: &sqlx::sqlite::SqliteRow) -> Result<Roadmap, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let level: String = row.try_get("level").map_err(ser)?;
    let status: String = row.try_get("status").map_err(ser)?;
    let steps_json: String = row.try_get("steps").map_err(ser)?;
    let tags_json: String = row.try_get("tags").map_err(ser)?;

    Ok(Roadmap {
        id: RoadmapId::from_str(&id).map_err(ser)?,
        user_id: UserId::new(user_id),
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        topic: row.try_get("topic").map_err(ser)?,
        level: parse_level(&level)?,
        steps: serde_json::from_str::<Vec<Step>>(&steps_json).map_err(ser)?,
        progress: percent_from_i64("progress", row.try_get::<i64, _>("progress").map_err(ser)?)?,
        status: parse_status(&status)?,
        estimated_duration: row.try_get("estimated_duration").map_err(ser)?,
        tags: serde_json::from_str::<Vec<String>>(&tags_json).map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn questions_to_json(questions: &[Question]) -> Result<String, StorageError> {
    serde_json::to_string(questions).map_err(ser)
}

pub(crate) fn answers_to_json(answers: &[AnswerRecord]) -> Result<String, StorageError> {
    serde_json::to_string(answers).map_err(ser)
}

pub(crate) fn map_quiz_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizResult, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let difficulty: String = row.try_get("difficulty").map_err(ser)?;
    let questions_json: String = row.try_get("questions").map_err(ser)?;
    let answers_json: String = row.try_get("answers").map_err(ser)?;

    Ok(QuizResult {
        id: QuizId::from_str(&id).map_err(ser)?,
        user_id: UserId::new(user_id),
        topic: row.try_get("topic").map_err(ser)?,
        questions: serde_json::from_str::<Vec<Question>>(&questions_json).map_err(ser)?,
        answers: serde_json::from_str::<Vec<AnswerRecord>>(&answers_json).map_err(ser)?,
        score: count_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        total_questions: count_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        percentage: percent_from_i64(
            "percentage",
            row.try_get::<i64, _>("percentage").map_err(ser)?,
        )?,
        difficulty: parse_difficulty(&difficulty)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
