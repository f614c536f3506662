use serde_json::Value;

use studypath_core::model::{Level, QuestionDifficulty};

//
// ─── DRAFT TYPES ───────────────────────────────────────────────────────────────
//

/// A roadmap step as produced by normalization, before ids and ordering are
/// assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDraft {
    pub title: String,
    pub description: String,
    pub resources: Vec<String>,
    pub estimated_time: String,
}

/// A fully-populated roadmap candidate. Normalization guarantees at least
/// five steps (padding with the canonical defaults) and no empty fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapDraft {
    pub title: String,
    pub description: String,
    pub estimated_duration: String,
    pub steps: Vec<StepDraft>,
    pub tags: Vec<String>,
}

/// A quiz question candidate: always exactly four options and an in-range
/// correct index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: u8,
    pub explanation: String,
    pub difficulty: QuestionDifficulty,
}

/// A fully-populated quiz candidate; never has zero questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub topic: String,
    pub difficulty: QuestionDifficulty,
    pub questions: Vec<QuestionDraft>,
}

//
// ─── FIELD HELPERS ─────────────────────────────────────────────────────────────
//

/// Non-empty string field, `None` otherwise. Empty strings count as absent,
/// matching the permissive falsy handling the source data was shaped by.
fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// String elements of an array field; `None` when the field is not an array.
fn string_array(value: &Value, key: &str) -> Option<Vec<String>> {
    value.get(key).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

//
// ─── ROADMAP NORMALIZATION ─────────────────────────────────────────────────────
//

/// The five canonical fallback steps, in order. A roadmap with fewer than
/// five usable generated steps is padded from this list, starting at the
/// index equal to the number of steps already kept.
fn default_steps(topic: &str) -> [StepDraft; 5] {
    [
        StepDraft {
            title: "Foundation and Basics".into(),
            description: format!("Learn the fundamental concepts of {topic}"),
            resources: vec!["Official documentation".into(), "Introductory tutorials".into()],
            estimated_time: "1 week".into(),
        },
        StepDraft {
            title: "Core Concepts".into(),
            description: format!("Dive deeper into the main principles of {topic}"),
            resources: vec!["In-depth guides".into(), "Video courses".into()],
            estimated_time: "1-2 weeks".into(),
        },
        StepDraft {
            title: "Practical Application".into(),
            description: "Apply your knowledge through hands-on projects".into(),
            resources: vec!["Project ideas".into(), "Code examples".into()],
            estimated_time: "1-2 weeks".into(),
        },
        StepDraft {
            title: "Advanced Topics".into(),
            description: "Explore advanced concepts and best practices".into(),
            resources: vec!["Advanced guides".into(), "Expert articles".into()],
            estimated_time: "1 week".into(),
        },
        StepDraft {
            title: "Mastery and Practice".into(),
            description: "Reinforce learning through continued practice".into(),
            resources: vec!["Practice problems".into(), "Community forums".into()],
            estimated_time: "Ongoing".into(),
        },
    ]
}

const MIN_ROADMAP_STEPS: usize = 5;

/// Coerces a loosely-structured roadmap candidate into a complete draft.
///
/// Never fails: every missing or malformed field is replaced with a
/// deterministic default derived from the generation parameters. Candidate
/// steps that are not JSON objects are dropped; per-field defaults keep the
/// original array position in their wording.
#[must_use]
pub fn normalize_roadmap(raw: &Value, topic: &str, level: Level) -> RoadmapDraft {
    let title = string_field(raw, "title").unwrap_or_else(|| format!("{topic} Learning Path"));
    let description = string_field(raw, "description").unwrap_or_else(|| {
        format!(
            "A structured approach to mastering {topic} at {} level",
            level.as_str()
        )
    });
    let estimated_duration =
        string_field(raw, "estimatedDuration").unwrap_or_else(|| "4-6 weeks".into());
    let tags = string_array(raw, "tags").unwrap_or_else(|| {
        vec![
            topic.to_lowercase(),
            level.as_str().into(),
            "learning".into(),
            "skills".into(),
        ]
    });

    let mut steps = Vec::new();
    if let Some(candidates) = raw.get("steps").and_then(Value::as_array) {
        for (index, candidate) in candidates.iter().enumerate() {
            if !candidate.is_object() {
                continue;
            }
            let position = index + 1;
            let resources = string_array(candidate, "resources")
                .filter(|resources| !resources.is_empty())
                .unwrap_or_else(|| {
                    vec!["Official documentation".into(), "Online tutorials".into()]
                });
            steps.push(StepDraft {
                title: string_field(candidate, "title")
                    .unwrap_or_else(|| format!("Step {position}")),
                description: string_field(candidate, "description")
                    .unwrap_or_else(|| format!("Learning step {position} for {topic}")),
                resources,
                estimated_time: string_field(candidate, "estimatedTime")
                    .unwrap_or_else(|| "1 week".into()),
            });
        }
    }

    let defaults = default_steps(topic);
    while steps.len() < MIN_ROADMAP_STEPS {
        match defaults.get(steps.len()) {
            Some(default) => steps.push(default.clone()),
            None => break,
        }
    }

    RoadmapDraft {
        title,
        description,
        estimated_duration,
        steps,
        tags,
    }
}

//
// ─── QUIZ NORMALIZATION ────────────────────────────────────────────────────────
//

const OPTIONS_PER_QUESTION: usize = 4;

fn placeholder_options() -> Vec<String> {
    vec![
        "Option A".into(),
        "Option B".into(),
        "Option C".into(),
        "Option D".into(),
    ]
}

/// Coerces a loosely-structured quiz candidate into a complete draft.
///
/// Never fails, and never returns zero questions: an empty (or entirely
/// malformed) candidate list yields a single generic placeholder question so
/// the result stays usable.
#[must_use]
pub fn normalize_quiz(raw: &Value, topic: &str, difficulty: QuestionDifficulty) -> QuizDraft {
    let quiz_topic = string_field(raw, "topic").unwrap_or_else(|| topic.into());
    let quiz_difficulty = string_field(raw, "difficulty")
        .and_then(|s| QuestionDifficulty::parse(&s))
        .unwrap_or(difficulty);

    let mut questions = Vec::new();
    if let Some(candidates) = raw.get("questions").and_then(Value::as_array) {
        for (index, candidate) in candidates.iter().enumerate() {
            if !candidate.is_object() {
                continue;
            }
            let position = index + 1;

            let options = string_array(candidate, "options")
                .filter(|options| options.len() == OPTIONS_PER_QUESTION)
                .unwrap_or_else(placeholder_options);

            // Only a genuine integer in 0-3 is trusted; floats and
            // out-of-range values fall back to the first option.
            let correct_answer = candidate
                .get("correctAnswer")
                .and_then(Value::as_i64)
                .filter(|&idx| (0..=3).contains(&idx))
                .map_or(0, |idx| {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let idx = idx as u8;
                    idx
                });

            questions.push(QuestionDraft {
                prompt: string_field(candidate, "question")
                    .unwrap_or_else(|| format!("Question {position} about {topic}")),
                options,
                correct_answer,
                explanation: string_field(candidate, "explanation").unwrap_or_else(|| {
                    "This is the correct answer based on the topic concepts.".into()
                }),
                difficulty: string_field(candidate, "difficulty")
                    .and_then(|s| QuestionDifficulty::parse(&s))
                    .unwrap_or(quiz_difficulty),
            });
        }
    }

    if questions.is_empty() {
        questions.push(QuestionDraft {
            prompt: format!("What is a key concept in {topic}?"),
            options: vec![
                "Concept A".into(),
                "Concept B".into(),
                "Concept C".into(),
                "Option D".into(),
            ],
            correct_answer: 0,
            explanation: "This is a fundamental concept in the field.".into(),
            difficulty: quiz_difficulty,
        });
    }

    QuizDraft {
        topic: quiz_topic,
        difficulty: quiz_difficulty,
        questions,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
