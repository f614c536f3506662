use std::sync::Arc;

use storage::repository::Storage;
use studypath_core::time::Clock;

use crate::ai::{ChatClient, TextGenerator};
use crate::error::AppServicesError;
use crate::generation_service::GenerationService;
use crate::quiz_service::QuizService;
use crate::review_service::ReviewService;
use crate::roadmap_service::RoadmapService;

/// The application's service layer, fully wired.
///
/// Storage and the text generator are constructed once and injected here;
/// nothing in the services reaches for global state.
#[derive(Clone)]
pub struct AppServices {
    pub reviews: ReviewService,
    pub roadmaps: RoadmapService,
    pub quizzes: QuizService,
    pub generation: GenerationService,
}

impl AppServices {
    /// Wire services over an existing storage bundle and generator.
    #[must_use]
    pub fn new(clock: Clock, storage: &Storage, generator: Arc<dyn TextGenerator>) -> Self {
        let generation = GenerationService::new(generator);
        Self {
            reviews: ReviewService::new(clock, storage.items.clone()),
            roadmaps: RoadmapService::new(
                clock,
                generation.clone(),
                storage.roadmaps.clone(),
            ),
            quizzes: QuizService::new(
                clock,
                generation.clone(),
                storage.quizzes.clone(),
                storage.items.clone(),
            ),
            generation,
        }
    }

    /// Bootstrap against `SQLite`, reading generator settings from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Sqlite` if the database cannot be opened or
    /// migrated.
    pub async fn sqlite(database_url: &str) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(database_url).await?;
        let generator: Arc<dyn TextGenerator> = Arc::new(ChatClient::from_env());
        Ok(Self::new(Clock::default(), &storage, generator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studypath_core::model::{Level, UserId};
    use studypath_core::time::fixed_clock;

    #[tokio::test]
    async fn wired_services_share_one_storage_backend() {
        let storage = Storage::in_memory();
        let generator: Arc<dyn TextGenerator> = Arc::new(ChatClient::new(None));
        let services = AppServices::new(fixed_clock(), &storage, generator);

        let user = UserId::new("u1");
        let roadmap = services
            .roadmaps
            .create(&user, "Rust", Level::Beginner)
            .await
            .unwrap();
        assert_eq!(roadmap.steps.len(), 5);

        // The review service sees items created through the quiz service's
        // shared repository handle.
        services
            .reviews
            .add_item(&user, "Q", None, "Rust", None)
            .await
            .unwrap();
        let due = services.reviews.due_reviews(&user, None).await.unwrap();
        assert_eq!(due.len(), 1);
    }
}
