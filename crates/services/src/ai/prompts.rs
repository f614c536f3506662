use studypath_core::model::{Level, QuestionDifficulty};

/// Optional personalization context supplied by the caller.
///
/// The authentication collaborator owns user profiles; this is the narrow
/// slice of one that shapes quiz generation.
#[derive(Debug, Clone, Default)]
pub struct LearnerProfile {
    pub learning_style: Vec<String>,
    pub skill_level: Option<String>,
}

impl LearnerProfile {
    fn context_block(&self) -> String {
        let style = if self.learning_style.is_empty() {
            "balanced".to_string()
        } else {
            self.learning_style.join(", ")
        };
        let skill = self.skill_level.as_deref().unwrap_or("intermediate");
        format!(
            "User Profile:\n- Learning style: {style}\n- Skill level: {skill}\n"
        )
    }
}

/// Prompt asking for a structured learning roadmap as a bare JSON object.
#[must_use]
pub fn roadmap_prompt(topic: &str, level: Level) -> String {
    format!(
        r#"Create a learning roadmap for "{topic}" at {level} level.

Return only a JSON object with this exact structure:
{{
  "title": "Learning roadmap title",
  "description": "What the learner will achieve",
  "estimatedDuration": "6-8 weeks",
  "steps": [
    {{
      "title": "Step name",
      "description": "What to learn and how",
      "resources": ["Resource 1", "Resource 2", "Resource 3"],
      "estimatedTime": "1-2 weeks"
    }}
  ],
  "tags": ["tag1", "tag2", "tag3"]
}}

Requirements:
- Exactly 5-7 steps
- Each step must have title, description, resources array, and estimatedTime
- Include practical projects and hands-on exercises
- Provide specific, actionable resources (links, book titles, video courses, etc.)
- No text outside the JSON object"#,
        topic = topic,
        level = level.as_str(),
    )
}

/// Prompt asking for a multiple-choice quiz as a bare JSON object.
#[must_use]
pub fn quiz_prompt(
    topic: &str,
    difficulty: QuestionDifficulty,
    count: u32,
    profile: Option<&LearnerProfile>,
) -> String {
    let profile_context = profile.map(LearnerProfile::context_block).unwrap_or_default();
    format!(
        r#"Create a {difficulty} level quiz about "{topic}" with {count} questions.

{profile_context}
Return only a JSON object with this exact structure:
{{
  "topic": "{topic}",
  "difficulty": "{difficulty}",
  "questions": [
    {{
      "question": "Question text here",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctAnswer": 0,
      "explanation": "Why this answer is correct"
    }}
  ]
}}

Requirements:
- Each question must have question, options (4 items), correctAnswer (0-3), explanation
- Mix conceptual, practical, and scenario-based questions
- No text outside the JSON object"#,
        difficulty = difficulty.as_str(),
        topic = topic,
        count = count,
        profile_context = profile_context,
    )
}

/// Prompt asking for an encouraging explanation of a wrong answer.
#[must_use]
pub fn explanation_prompt(
    question: &str,
    options: &[String],
    correct_answer: usize,
    user_answer: usize,
) -> String {
    let listed: Vec<String> = options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}. {option}", i + 1))
        .collect();
    let correct = options.get(correct_answer).map_or("", String::as_str);
    let chosen = options.get(user_answer).map_or("", String::as_str);

    format!(
        r#"A student answered incorrectly:

Question: {question}
Options: {options}
Correct: {correct_number}. {correct}
Student chose: {chosen_number}. {chosen}

Provide a helpful explanation covering:
1. Why the correct answer is right
2. Why their answer was incorrect
3. A learning tip
4. How to avoid this mistake

Keep it encouraging and educational."#,
        question = question,
        options = listed.join(", "),
        correct_number = correct_answer + 1,
        correct = correct,
        chosen_number = user_answer + 1,
        chosen = chosen,
    )
}
