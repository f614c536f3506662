use std::sync::Arc;

use serde_json::Value;

use studypath_core::model::{Level, QuestionDifficulty};

use crate::ai::{
    LearnerProfile, QuizDraft, RoadmapDraft, TextGenerator, extract, normalize_quiz,
    normalize_roadmap, prompts,
};

const ROADMAP_MAX_TOKENS: u32 = 2000;
const QUIZ_MAX_TOKENS: u32 = 1500;
const EXPLANATION_MAX_TOKENS: u32 = 600;

/// Low temperature keeps the structured-JSON responses consistent; the
/// explanation prompt runs warmer for readable prose.
const STRUCTURED_TEMPERATURE: f32 = 0.3;
const EXPLANATION_TEMPERATURE: f32 = 0.7;

const EXPLANATION_FALLBACK: &str =
    "Sorry, I couldn't generate the explanation right now. Please review the concepts again.";

/// Runs the generation pipeline: prompt, generate, extract, normalize.
///
/// Every public method follows the always-usable policy: a generator failure
/// or unextractable response degrades to normalizing an empty object (or a
/// canned sentence for explanations) instead of propagating an error. The
/// degraded path is logged.
#[derive(Clone)]
pub struct GenerationService {
    generator: Arc<dyn TextGenerator>,
}

impl GenerationService {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Generate a roadmap draft for a topic and level.
    ///
    /// Always returns a complete draft; see [`normalize_roadmap`].
    pub async fn generate_roadmap(&self, topic: &str, level: Level) -> RoadmapDraft {
        let prompt = prompts::roadmap_prompt(topic, level);
        let raw = self
            .structured_json(&prompt, ROADMAP_MAX_TOKENS, "roadmap")
            .await;
        normalize_roadmap(&raw, topic, level)
    }

    /// Generate a quiz draft for a topic and difficulty.
    ///
    /// Always returns at least one question; see [`normalize_quiz`].
    pub async fn generate_quiz(
        &self,
        topic: &str,
        difficulty: QuestionDifficulty,
        count: u32,
        profile: Option<&LearnerProfile>,
    ) -> QuizDraft {
        let prompt = prompts::quiz_prompt(topic, difficulty, count, profile);
        let raw = self.structured_json(&prompt, QUIZ_MAX_TOKENS, "quiz").await;
        normalize_quiz(&raw, topic, difficulty)
    }

    /// Generate a plain-text explanation for a wrong quiz answer.
    pub async fn explain_answer(
        &self,
        question: &str,
        options: &[String],
        correct_answer: usize,
        user_answer: usize,
    ) -> String {
        let prompt = prompts::explanation_prompt(question, options, correct_answer, user_answer);
        match self
            .generator
            .generate(&prompt, EXPLANATION_TEMPERATURE, EXPLANATION_MAX_TOKENS)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "explanation generation failed, using fallback");
                EXPLANATION_FALLBACK.into()
            }
        }
    }

    /// Generate and extract a JSON value, degrading to an empty object so the
    /// normalizers always have something to work from.
    async fn structured_json(&self, prompt: &str, max_tokens: u32, kind: &str) -> Value {
        let text = match self
            .generator
            .generate(prompt, STRUCTURED_TEMPERATURE, max_tokens)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(kind, error = %err, "generation failed, normalizing defaults");
                return Value::Object(serde_json::Map::new());
            }
        };

        match extract(&text) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(kind, error = %err, response_len = text.len(), "extraction failed, normalizing defaults");
                Value::Object(serde_json::Map::new())
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
