mod ids;
mod quiz;
mod review_item;
mod roadmap;

pub use ids::{ItemId, ParseIdError, QuizId, RoadmapId, UserId};
pub use quiz::{
    AnswerRecord, Question, QuestionDifficulty, QuizResult, calculate_percentage,
};
pub use review_item::{ItemSource, Quality, ReviewError, ReviewItem};
pub use roadmap::{Level, Roadmap, RoadmapError, RoadmapStatus, Step};
