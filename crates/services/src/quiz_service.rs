use std::collections::BTreeMap;
use std::sync::Arc;

use studypath_core::model::{
    AnswerRecord, ItemSource, Question, QuestionDifficulty, QuizId, QuizResult, ReviewItem,
    UserId, calculate_percentage,
};
use studypath_core::time::Clock;

use storage::repository::{QuizResultRepository, ReviewItemRepository};

use crate::ai::LearnerProfile;
use crate::error::QuizServiceError;
use crate::generation_service::GenerationService;

/// Default number of stored results returned by a listing.
pub const DEFAULT_RESULT_LIMIT: u32 = 10;

/// Per-topic rows reported by quiz statistics, largest topics first.
const TOPIC_STATS_LIMIT: usize = 10;

/// Answer sentinel for a question the user skipped.
pub const UNANSWERED: i32 = -1;

//
// ─── STATS ─────────────────────────────────────────────────────────────────────
//

/// Aggregate numbers across all of a user's submitted quizzes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverallQuizStats {
    pub total_quizzes: u32,
    pub average_score: f64,
    pub best_score: u8,
    pub total_questions: u32,
    pub total_correct: u32,
}

/// Aggregate numbers for one topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicQuizStats {
    pub topic: String,
    pub quiz_count: u32,
    pub average_score: f64,
    pub best_score: u8,
}

/// Overall plus per-topic quiz statistics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuizStats {
    pub overall: OverallQuizStats,
    pub topics: Vec<TopicQuizStats>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Generates quizzes, scores submissions, and feeds missed questions into
/// the spaced-repetition queue.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    generation: GenerationService,
    quizzes: Arc<dyn QuizResultRepository>,
    items: Arc<dyn ReviewItemRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        generation: GenerationService,
        quizzes: Arc<dyn QuizResultRepository>,
        items: Arc<dyn ReviewItemRepository>,
    ) -> Self {
        Self {
            clock,
            generation,
            quizzes,
            items,
        }
    }

    /// Generate quiz questions for a topic.
    ///
    /// Always yields at least one question (generation degrades to a
    /// placeholder rather than failing).
    pub async fn generate_questions(
        &self,
        topic: &str,
        difficulty: QuestionDifficulty,
        count: u32,
        profile: Option<&LearnerProfile>,
    ) -> Vec<Question> {
        let draft = self
            .generation
            .generate_quiz(topic, difficulty, count, profile)
            .await;

        draft
            .questions
            .into_iter()
            .map(|question| Question {
                prompt: question.prompt,
                options: question.options,
                correct_answer: question.correct_answer,
                explanation: Some(question.explanation),
                difficulty: question.difficulty,
                topic: Some(draft.topic.clone()),
                subtopic: None,
            })
            .collect()
    }

    /// Score a submitted quiz and persist the result.
    ///
    /// `answers[i]` is the selected option index for question `i`, or
    /// [`UNANSWERED`]; missing trailing answers count as unanswered. Each
    /// answered-but-wrong question becomes a quiz-sourced review item whose
    /// starting ease is seeded by the question's difficulty (easy 2.0,
    /// medium 2.5, hard 3.0). A review item that fails to persist is logged
    /// and skipped rather than failing the submission.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the result cannot be stored.
    pub async fn submit(
        &self,
        user_id: &UserId,
        topic: &str,
        questions: Vec<Question>,
        answers: &[i32],
        difficulty: QuestionDifficulty,
    ) -> Result<QuizResult, QuizServiceError> {
        let now = self.clock.now();
        let quiz_id = QuizId::generate();

        let mut score: u32 = 0;
        let mut records = Vec::with_capacity(questions.len());

        for (index, question) in questions.iter().enumerate() {
            let selected = answers.get(index).copied().unwrap_or(UNANSWERED);
            let is_correct = selected == i32::from(question.correct_answer);
            if is_correct {
                score += 1;
            }

            records.push(AnswerRecord {
                question_index: index as u32,
                selected_answer: selected,
                is_correct,
                time_spent_secs: 0,
            });

            if !is_correct && selected != UNANSWERED {
                self.schedule_missed_question(user_id, topic, &quiz_id, question, now)
                    .await;
            }
        }

        let total_questions = questions.len() as u32;
        let result = QuizResult {
            id: quiz_id,
            user_id: user_id.clone(),
            topic: topic.into(),
            questions,
            answers: records,
            score,
            total_questions,
            percentage: calculate_percentage(score, total_questions),
            difficulty,
            created_at: now,
        };

        self.quizzes.insert_result(&result).await?;
        Ok(result)
    }

    /// Stored results for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn results(
        &self,
        user_id: &UserId,
        topic: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<QuizResult>, QuizServiceError> {
        let results = self
            .quizzes
            .list_results(user_id, topic, limit.unwrap_or(DEFAULT_RESULT_LIMIT))
            .await?;
        Ok(results)
    }

    /// Overall and per-topic statistics across every stored result.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn stats(&self, user_id: &UserId) -> Result<QuizStats, QuizServiceError> {
        let results = self.quizzes.list_results(user_id, None, u32::MAX).await?;
        if results.is_empty() {
            return Ok(QuizStats::default());
        }

        let total_quizzes = results.len() as u32;
        let average_score = results
            .iter()
            .map(|result| f64::from(result.percentage))
            .sum::<f64>()
            / f64::from(total_quizzes);
        let best_score = results.iter().map(|result| result.percentage).max().unwrap_or(0);
        let total_questions = results.iter().map(|result| result.total_questions).sum();
        let total_correct = results.iter().map(|result| result.score).sum();

        let mut by_topic: BTreeMap<&str, (u32, f64, u8)> = BTreeMap::new();
        for result in &results {
            let entry = by_topic.entry(result.topic.as_str()).or_default();
            entry.0 += 1;
            entry.1 += f64::from(result.percentage);
            entry.2 = entry.2.max(result.percentage);
        }

        let mut topics: Vec<TopicQuizStats> = by_topic
            .into_iter()
            .map(|(topic, (quiz_count, score_sum, best_score))| TopicQuizStats {
                topic: topic.to_string(),
                quiz_count,
                average_score: score_sum / f64::from(quiz_count),
                best_score,
            })
            .collect();
        topics.sort_by(|a, b| b.quiz_count.cmp(&a.quiz_count));
        topics.truncate(TOPIC_STATS_LIMIT);

        Ok(QuizStats {
            overall: OverallQuizStats {
                total_quizzes,
                average_score,
                best_score,
                total_questions,
                total_correct,
            },
            topics,
        })
    }

    /// Explain why the user's answer to a question was wrong.
    pub async fn explain_answer(
        &self,
        question: &str,
        options: &[String],
        correct_answer: usize,
        user_answer: usize,
    ) -> String {
        self.generation
            .explain_answer(question, options, correct_answer, user_answer)
            .await
    }

    async fn schedule_missed_question(
        &self,
        user_id: &UserId,
        topic: &str,
        quiz_id: &QuizId,
        question: &Question,
        now: chrono::DateTime<chrono::Utc>,
    ) {
        let ease = match question.difficulty {
            QuestionDifficulty::Easy => 2.0,
            QuestionDifficulty::Medium => 2.5,
            QuestionDifficulty::Hard => 3.0,
        };
        let correct_option = question
            .options
            .get(usize::from(question.correct_answer))
            .cloned()
            .unwrap_or_default();

        let item = ReviewItem::new(user_id.clone(), question.prompt.clone(), topic, now)
            .with_answer(correct_option)
            .with_source(ItemSource::Quiz, Some(quiz_id.to_string()))
            .with_ease_factor(ease);

        if let Err(err) = self.items.upsert_item(&item).await {
            tracing::warn!(error = %err, "failed to save review item for missed question");
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use storage::repository::InMemoryRepository;
    use studypath_core::time::{fixed_clock, fixed_now};

    use crate::ai::{GeneratorError, TextGenerator};

    struct SilentGenerator;

    #[async_trait]
    impl TextGenerator for SilentGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, GeneratorError> {
            Err(GeneratorError::Disabled)
        }
    }

    fn build_service(repo: InMemoryRepository) -> QuizService {
        QuizService::new(
            fixed_clock(),
            GenerationService::new(Arc::new(SilentGenerator)),
            Arc::new(repo.clone()),
            Arc::new(repo),
        )
    }

    fn build_question(prompt: &str, correct: u8, difficulty: QuestionDifficulty) -> Question {
        Question {
            prompt: prompt.into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: correct,
            explanation: Some("because".into()),
            difficulty,
            topic: None,
            subtopic: None,
        }
    }

    #[tokio::test]
    async fn generate_questions_degrades_to_placeholder() {
        let service = build_service(InMemoryRepository::new());
        let questions = service
            .generate_questions("Rust", QuestionDifficulty::Medium, 5, None)
            .await;

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].prompt, "What is a key concept in Rust?");
        assert_eq!(questions[0].topic.as_deref(), Some("Rust"));
        assert_eq!(questions[0].options.len(), 4);
    }

    #[tokio::test]
    async fn submit_scores_and_persists_the_result() {
        let repo = InMemoryRepository::new();
        let service = build_service(repo.clone());
        let user = UserId::new("u1");

        let questions = vec![
            build_question("Q1", 0, QuestionDifficulty::Medium),
            build_question("Q2", 1, QuestionDifficulty::Medium),
            build_question("Q3", 2, QuestionDifficulty::Medium),
            build_question("Q4", 3, QuestionDifficulty::Medium),
        ];
        let result = service
            .submit(&user, "Rust", questions, &[0, 1, 0, 3], QuestionDifficulty::Medium)
            .await
            .unwrap();

        assert_eq!(result.score, 3);
        assert_eq!(result.total_questions, 4);
        assert_eq!(result.percentage, 75);
        assert_eq!(result.answers.len(), 4);
        assert!(!result.answers[2].is_correct);
        assert_eq!(result.created_at, fixed_now());

        let stored = repo.list_results(&user, None, 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], result);
    }

    #[tokio::test]
    async fn wrong_answers_become_review_items_with_seeded_ease() {
        let repo = InMemoryRepository::new();
        let service = build_service(repo.clone());
        let user = UserId::new("u1");

        let questions = vec![
            build_question("Easy miss", 1, QuestionDifficulty::Easy),
            build_question("Hard miss", 2, QuestionDifficulty::Hard),
            build_question("Correct", 0, QuestionDifficulty::Medium),
        ];
        service
            .submit(&user, "Rust", questions, &[0, 0, 0], QuestionDifficulty::Medium)
            .await
            .unwrap();

        let mut items = repo.list_items(&user).await.unwrap();
        items.sort_by(|a, b| a.question.cmp(&b.question));
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].question, "Easy miss");
        assert_eq!(items[0].ease_factor, 2.0);
        assert_eq!(items[0].answer.as_deref(), Some("b"));
        assert_eq!(items[0].source, ItemSource::Quiz);
        assert!(items[0].source_id.is_some());

        assert_eq!(items[1].question, "Hard miss");
        assert_eq!(items[1].ease_factor, 3.0);
        assert_eq!(items[1].answer.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn unanswered_questions_are_wrong_but_not_scheduled() {
        let repo = InMemoryRepository::new();
        let service = build_service(repo.clone());
        let user = UserId::new("u1");

        let questions = vec![
            build_question("Skipped", 1, QuestionDifficulty::Medium),
            build_question("Missing", 2, QuestionDifficulty::Medium),
        ];
        // One explicit skip, one missing trailing answer.
        let result = service
            .submit(&user, "Rust", questions, &[UNANSWERED], QuestionDifficulty::Medium)
            .await
            .unwrap();

        assert_eq!(result.score, 0);
        assert_eq!(result.percentage, 0);
        assert_eq!(result.answers[0].selected_answer, UNANSWERED);
        assert_eq!(result.answers[1].selected_answer, UNANSWERED);
        assert!(repo.list_items(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_aggregate_across_results() {
        let repo = InMemoryRepository::new();
        let service = build_service(repo);
        let user = UserId::new("u1");

        // 100% on Rust, 50% on Rust, 0% on Go.
        let q = |correct| vec![build_question("Q", correct, QuestionDifficulty::Medium)];
        service
            .submit(&user, "Rust", q(0), &[0], QuestionDifficulty::Medium)
            .await
            .unwrap();
        let two = vec![
            build_question("Q1", 0, QuestionDifficulty::Medium),
            build_question("Q2", 1, QuestionDifficulty::Medium),
        ];
        service
            .submit(&user, "Rust", two, &[0, 0], QuestionDifficulty::Medium)
            .await
            .unwrap();
        service
            .submit(&user, "Go", q(1), &[0], QuestionDifficulty::Medium)
            .await
            .unwrap();

        let stats = service.stats(&user).await.unwrap();
        assert_eq!(stats.overall.total_quizzes, 3);
        assert_eq!(stats.overall.best_score, 100);
        assert_eq!(stats.overall.total_questions, 4);
        assert_eq!(stats.overall.total_correct, 2);
        assert!((stats.overall.average_score - 50.0).abs() < 1e-9);

        assert_eq!(stats.topics[0].topic, "Rust");
        assert_eq!(stats.topics[0].quiz_count, 2);
        assert!((stats.topics[0].average_score - 75.0).abs() < 1e-9);
        assert_eq!(stats.topics[1].topic, "Go");
        assert_eq!(stats.topics[1].best_score, 0);
    }

    #[tokio::test]
    async fn stats_for_no_results_are_zero() {
        let service = build_service(InMemoryRepository::new());
        let stats = service.stats(&UserId::new("u1")).await.unwrap();
        assert_eq!(stats, QuizStats::default());
    }
}
