#![forbid(unsafe_code)]

pub mod ai;
pub mod app_services;
pub mod error;
pub mod generation_service;
pub mod quiz_service;
pub mod review_service;
pub mod roadmap_service;

pub use studypath_core::Clock;

pub use app_services::AppServices;
pub use error::{
    AppServicesError, QuizServiceError, ReviewServiceError, RoadmapServiceError,
};
pub use generation_service::GenerationService;
pub use quiz_service::{OverallQuizStats, QuizService, QuizStats, TopicQuizStats};
pub use review_service::{
    DEFAULT_REVIEW_LIMIT, OverallReviewStats, ReviewService, ReviewStats, TopicReviewStats,
};
pub use roadmap_service::RoadmapService;
