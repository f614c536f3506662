use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{QuizId, UserId};

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Difficulty band for a quiz or an individual question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl QuestionDifficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionDifficulty::Easy => "easy",
            QuestionDifficulty::Medium => "medium",
            QuestionDifficulty::Hard => "hard",
        }
    }

    /// Parses a difficulty string, `None` for anything unrecognized.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(QuestionDifficulty::Easy),
            "medium" => Some(QuestionDifficulty::Medium),
            "hard" => Some(QuestionDifficulty::Hard),
            _ => None,
        }
    }
}

/// A single multiple-choice question: four options, one correct index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`, always 0-3.
    pub correct_answer: u8,
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: QuestionDifficulty,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub subtopic: Option<String>,
}

//
// ─── QUIZ RESULT ───────────────────────────────────────────────────────────────
//

/// The user's answer to one question of a submitted quiz.
///
/// `selected_answer` is the chosen option index, or `-1` when the question
/// was left unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_index: u32,
    pub selected_answer: i32,
    pub is_correct: bool,
    pub time_spent_secs: u32,
}

/// A scored, submitted quiz. Read-mostly once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    pub id: QuizId,
    pub user_id: UserId,
    pub topic: String,
    pub questions: Vec<Question>,
    pub answers: Vec<AnswerRecord>,
    pub score: u32,
    pub total_questions: u32,
    /// Derived: `round(100 * score / total_questions)`.
    pub percentage: u8,
    pub difficulty: QuestionDifficulty,
    pub created_at: DateTime<Utc>,
}

/// Percentage score for a quiz, rounded to the nearest whole number.
///
/// Replaces the original pre-save hook: callers compute this explicitly
/// before persisting. A zero-question quiz scores 0.
#[must_use]
pub fn calculate_percentage(score: u32, total_questions: u32) -> u8 {
    if total_questions == 0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percentage = ((f64::from(score) / f64::from(total_questions)) * 100.0).round() as u8;
    percentage
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(calculate_percentage(3, 4), 75);
        assert_eq!(calculate_percentage(4, 4), 100);
        assert_eq!(calculate_percentage(1, 3), 33);
        assert_eq!(calculate_percentage(2, 3), 67);
    }

    #[test]
    fn percentage_of_empty_quiz_is_zero() {
        assert_eq!(calculate_percentage(0, 0), 0);
    }

    #[test]
    fn difficulty_parse_roundtrips() {
        for difficulty in [
            QuestionDifficulty::Easy,
            QuestionDifficulty::Medium,
            QuestionDifficulty::Hard,
        ] {
            assert_eq!(QuestionDifficulty::parse(difficulty.as_str()), Some(difficulty));
        }
        assert_eq!(QuestionDifficulty::parse("impossible"), None);
    }

    #[test]
    fn question_serde_defaults_difficulty_to_medium() {
        let json = r#"{"prompt":"Q","options":["a","b","c","d"],"correct_answer":1,"explanation":null}"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.difficulty, QuestionDifficulty::Medium);
    }
}
