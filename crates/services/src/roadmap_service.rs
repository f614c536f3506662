use std::sync::Arc;

use studypath_core::model::{Level, Roadmap, RoadmapId, RoadmapStatus, Step, UserId};
use studypath_core::time::Clock;

use storage::repository::{RoadmapFilter, RoadmapRepository};

use crate::ai::RoadmapDraft;
use crate::error::RoadmapServiceError;
use crate::generation_service::GenerationService;

/// Default number of roadmaps returned by a listing.
pub const DEFAULT_ROADMAP_LIMIT: u32 = 10;

/// Creates roadmaps from generated drafts and manages their lifecycle.
#[derive(Clone)]
pub struct RoadmapService {
    clock: Clock,
    generation: GenerationService,
    roadmaps: Arc<dyn RoadmapRepository>,
}

impl RoadmapService {
    #[must_use]
    pub fn new(
        clock: Clock,
        generation: GenerationService,
        roadmaps: Arc<dyn RoadmapRepository>,
    ) -> Self {
        Self {
            clock,
            generation,
            roadmaps,
        }
    }

    /// Generate and persist a roadmap for a topic and level.
    ///
    /// The roadmap is created fully formed: generation always yields a
    /// complete draft (degrading to canonical defaults), steps are numbered
    /// from 1, and progress is computed before the first save.
    ///
    /// # Errors
    ///
    /// Returns `RoadmapServiceError::Storage` if persistence fails.
    pub async fn create(
        &self,
        user_id: &UserId,
        topic: &str,
        level: Level,
    ) -> Result<Roadmap, RoadmapServiceError> {
        let draft = self.generation.generate_roadmap(topic, level).await;
        let mut roadmap = assemble(draft, user_id.clone(), topic, level, self.clock.now());
        roadmap.calculate_progress();

        self.roadmaps.upsert_roadmap(&roadmap).await?;
        Ok(roadmap)
    }

    /// Roadmaps for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RoadmapServiceError::Storage` if repository access fails.
    pub async fn list(
        &self,
        user_id: &UserId,
        filter: &RoadmapFilter,
        limit: Option<u32>,
    ) -> Result<Vec<Roadmap>, RoadmapServiceError> {
        let roadmaps = self
            .roadmaps
            .list_roadmaps(user_id, filter, limit.unwrap_or(DEFAULT_ROADMAP_LIMIT))
            .await?;
        Ok(roadmaps)
    }

    /// Fetch one roadmap.
    ///
    /// # Errors
    ///
    /// Returns `RoadmapServiceError::Storage` (`NotFound`) if missing.
    pub async fn get(
        &self,
        user_id: &UserId,
        id: RoadmapId,
    ) -> Result<Roadmap, RoadmapServiceError> {
        let roadmap = self.roadmaps.get_roadmap(user_id, id).await?;
        Ok(roadmap)
    }

    /// Toggle completion of one step and persist the recomputed progress.
    ///
    /// # Errors
    ///
    /// Returns `RoadmapServiceError::Roadmap` for an out-of-range step index,
    /// `RoadmapServiceError::Storage` if the roadmap is missing or
    /// persistence fails.
    pub async fn toggle_step(
        &self,
        user_id: &UserId,
        id: RoadmapId,
        step_index: usize,
    ) -> Result<Roadmap, RoadmapServiceError> {
        let mut roadmap = self.roadmaps.get_roadmap(user_id, id).await?;
        roadmap.toggle_step(step_index, self.clock.now())?;

        self.roadmaps.upsert_roadmap(&roadmap).await?;
        Ok(roadmap)
    }

    /// Delete one roadmap.
    ///
    /// # Errors
    ///
    /// Returns `RoadmapServiceError::Storage` (`NotFound`) if missing.
    pub async fn delete(
        &self,
        user_id: &UserId,
        id: RoadmapId,
    ) -> Result<(), RoadmapServiceError> {
        self.roadmaps.delete_roadmap(user_id, id).await?;
        Ok(())
    }
}

/// Builds the domain roadmap from a normalized draft: fresh id, 1-based step
/// ordering, nothing completed yet.
fn assemble(
    draft: RoadmapDraft,
    user_id: UserId,
    topic: &str,
    level: Level,
    now: chrono::DateTime<chrono::Utc>,
) -> Roadmap {
    let steps = draft
        .steps
        .into_iter()
        .enumerate()
        .map(|(index, step)| Step {
            title: step.title,
            description: step.description,
            resources: step.resources,
            estimated_time: step.estimated_time,
            completed: false,
            completed_at: None,
            order: index as u32 + 1,
        })
        .collect();

    Roadmap {
        id: RoadmapId::generate(),
        user_id,
        title: draft.title,
        description: draft.description,
        topic: topic.into(),
        level,
        steps,
        progress: 0,
        status: RoadmapStatus::Active,
        estimated_duration: draft.estimated_duration,
        tags: draft.tags,
        created_at: now,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use storage::repository::{InMemoryRepository, StorageError};
    use studypath_core::model::RoadmapError;
    use studypath_core::time::fixed_clock;

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

    fn build_service(repo: InMemoryRepository) -> RoadmapService {
        RoadmapService::new(
            fixed_clock(),
            GenerationService::new(Arc::new(SilentGenerator)),
            Arc::new(repo),
        )
    }

    #[tokio::test]
    async fn create_persists_a_fully_formed_roadmap() {
        let repo = InMemoryRepository::new();
        let service = build_service(repo.clone());
        let user = UserId::new("u1");

        let roadmap = service.create(&user, "Rust", Level::Beginner).await.unwrap();

        assert_eq!(roadmap.title, "Rust Learning Path");
        assert_eq!(roadmap.steps.len(), 5);
        assert_eq!(roadmap.steps[0].order, 1);
        assert_eq!(roadmap.steps[4].order, 5);
        assert!(roadmap.steps.iter().all(|step| !step.completed));
        assert_eq!(roadmap.progress, 0);
        assert_eq!(roadmap.status, RoadmapStatus::Active);

        let stored = repo.get_roadmap(&user, roadmap.id).await.unwrap();
        assert_eq!(stored, roadmap);
    }

    #[tokio::test]
    async fn toggle_step_updates_progress_and_persists() {
        let repo = InMemoryRepository::new();
        let service = build_service(repo.clone());
        let user = UserId::new("u1");

        let roadmap = service.create(&user, "Rust", Level::Beginner).await.unwrap();

        let updated = service.toggle_step(&user, roadmap.id, 0).await.unwrap();
        assert!(updated.steps[0].completed);
        assert_eq!(updated.progress, 20);

        let stored = repo.get_roadmap(&user, roadmap.id).await.unwrap();
        assert_eq!(stored.progress, 20);

        // Toggling back clears the completion stamp.
        let reverted = service.toggle_step(&user, roadmap.id, 0).await.unwrap();
        assert!(!reverted.steps[0].completed);
        assert_eq!(reverted.steps[0].completed_at, None);
        assert_eq!(reverted.progress, 0);
    }

    #[tokio::test]
    async fn completing_every_step_completes_the_roadmap() {
        let repo = InMemoryRepository::new();
        let service = build_service(repo.clone());
        let user = UserId::new("u1");

        let roadmap = service.create(&user, "Rust", Level::Beginner).await.unwrap();
        let mut latest = roadmap.clone();
        for index in 0..roadmap.steps.len() {
            latest = service.toggle_step(&user, roadmap.id, index).await.unwrap();
        }

        assert_eq!(latest.progress, 100);
        assert_eq!(latest.status, RoadmapStatus::Completed);
    }

    #[tokio::test]
    async fn toggle_step_rejects_invalid_index() {
        let repo = InMemoryRepository::new();
        let service = build_service(repo);
        let user = UserId::new("u1");

        let roadmap = service.create(&user, "Rust", Level::Beginner).await.unwrap();
        let err = service.toggle_step(&user, roadmap.id, 9).await.unwrap_err();
        assert!(matches!(
            err,
            RoadmapServiceError::Roadmap(RoadmapError::StepIndexOutOfRange { index: 9, len: 5 })
        ));
    }

    #[tokio::test]
    async fn get_and_delete_are_scoped_to_the_owner() {
        let repo = InMemoryRepository::new();
        let service = build_service(repo);
        let user = UserId::new("u1");
        let stranger = UserId::new("u2");

        let roadmap = service.create(&user, "Rust", Level::Beginner).await.unwrap();

        let err = service.get(&stranger, roadmap.id).await.unwrap_err();
        assert!(matches!(
            err,
            RoadmapServiceError::Storage(StorageError::NotFound)
        ));

        service.delete(&user, roadmap.id).await.unwrap();
        let err = service.delete(&user, roadmap.id).await.unwrap_err();
        assert!(matches!(
            err,
            RoadmapServiceError::Storage(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_honors_filter_and_default_limit() {
        let repo = InMemoryRepository::new();
        let service = build_service(repo);
        let user = UserId::new("u1");

        service.create(&user, "Rust", Level::Beginner).await.unwrap();
        service.create(&user, "Go", Level::Advanced).await.unwrap();

        let all = service
            .list(&user, &RoadmapFilter::default(), None)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let filtered = service
            .list(
                &user,
                &RoadmapFilter {
                    status: None,
                    topic: Some("go".into()),
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].topic, "Go");
    }
}
