pub mod client;
pub mod extract;
pub mod normalize;
pub mod prompts;

pub use client::{ChatClient, GeneratorConfig, GeneratorError, TextGenerator};
pub use extract::{ExtractionError, extract};
pub use normalize::{
    QuestionDraft, QuizDraft, RoadmapDraft, StepDraft, normalize_quiz, normalize_roadmap,
};
pub use prompts::LearnerProfile;
