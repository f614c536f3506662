use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{RoadmapId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors that can occur during roadmap operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoadmapError {
    #[error("step index {index} out of range for {len} steps")]
    StepIndexOutOfRange { index: usize, len: usize },
}

//
// ─── LEVEL & STATUS ────────────────────────────────────────────────────────────
//

/// Target proficiency level a roadmap is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

/// Lifecycle state of a roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadmapStatus {
    Active,
    Completed,
    Paused,
}

impl RoadmapStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RoadmapStatus::Active => "active",
            RoadmapStatus::Completed => "completed",
            RoadmapStatus::Paused => "paused",
        }
    }
}

//
// ─── STEP ──────────────────────────────────────────────────────────────────────
//

/// One ordered step of a learning roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub title: String,
    pub description: String,
    pub resources: Vec<String>,
    pub estimated_time: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// 1-based position within the roadmap.
    pub order: u32,
}

//
// ─── ROADMAP ───────────────────────────────────────────────────────────────────
//

/// A generated learning roadmap: an ordered sequence of steps with derived
/// progress.
///
/// `progress` and `status` are derived state; callers must invoke
/// [`Roadmap::calculate_progress`] after any change to step completion and
/// persist the result. There are no hidden lifecycle hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct Roadmap {
    pub id: RoadmapId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub topic: String,
    pub level: Level,
    pub steps: Vec<Step>,
    /// Derived: `round(100 * completed steps / total steps)`.
    pub progress: u8,
    pub status: RoadmapStatus,
    pub estimated_duration: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Roadmap {
    /// Recomputes `progress` from step completion and reconciles `status`.
    ///
    /// A roadmap is `Completed` exactly when progress reaches 100; dropping
    /// back below 100 demotes it to `Active` again (a `Paused` roadmap stays
    /// paused). Returns the new progress value.
    pub fn calculate_progress(&mut self) -> u8 {
        if self.steps.is_empty() {
            self.progress = 0;
            return 0;
        }

        let completed = self.steps.iter().filter(|step| step.completed).count();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let progress = ((completed as f64 / self.steps.len() as f64) * 100.0).round() as u8;

        self.progress = progress;
        if progress == 100 {
            self.status = RoadmapStatus::Completed;
        } else if self.status == RoadmapStatus::Completed {
            self.status = RoadmapStatus::Active;
        }

        progress
    }

    /// Toggles completion of the step at `index` and recomputes progress.
    ///
    /// This is the only mutation steps support. Marking a step complete
    /// stamps `completed_at`; unmarking clears it.
    ///
    /// # Errors
    ///
    /// Returns `RoadmapError::StepIndexOutOfRange` for an invalid index.
    pub fn toggle_step(
        &mut self,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<(), RoadmapError> {
        let len = self.steps.len();
        let step = self
            .steps
            .get_mut(index)
            .ok_or(RoadmapError::StepIndexOutOfRange { index, len })?;

        step.completed = !step.completed;
        step.completed_at = step.completed.then_some(now);

        self.calculate_progress();
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn build_step(order: u32, completed: bool) -> Step {
        Step {
            title: format!("Step {order}"),
            description: "desc".into(),
            resources: vec!["Official documentation".into()],
            estimated_time: "1 week".into(),
            completed,
            completed_at: completed.then(fixed_now),
            order,
        }
    }

    fn build_roadmap(steps: Vec<Step>) -> Roadmap {
        Roadmap {
            id: RoadmapId::generate(),
            user_id: UserId::new("u1"),
            title: "Rust Learning Path".into(),
            description: "desc".into(),
            topic: "Rust".into(),
            level: Level::Beginner,
            steps,
            progress: 0,
            status: RoadmapStatus::Active,
            estimated_duration: "4-6 weeks".into(),
            tags: vec!["rust".into()],
            created_at: fixed_now(),
        }
    }

    #[test]
    fn progress_rounds_completed_ratio() {
        let steps = vec![
            build_step(1, true),
            build_step(2, true),
            build_step(3, true),
            build_step(4, false),
        ];
        let mut roadmap = build_roadmap(steps);

        assert_eq!(roadmap.calculate_progress(), 75);
        assert_eq!(roadmap.status, RoadmapStatus::Active);
    }

    #[test]
    fn completing_last_step_completes_roadmap() {
        let steps = vec![
            build_step(1, true),
            build_step(2, true),
            build_step(3, true),
            build_step(4, false),
        ];
        let mut roadmap = build_roadmap(steps);
        roadmap.calculate_progress();

        roadmap.toggle_step(3, fixed_now()).unwrap();

        assert_eq!(roadmap.progress, 100);
        assert_eq!(roadmap.status, RoadmapStatus::Completed);
        assert_eq!(roadmap.steps[3].completed_at, Some(fixed_now()));
    }

    #[test]
    fn untoggling_a_step_demotes_completed_status() {
        let steps = vec![build_step(1, true), build_step(2, true)];
        let mut roadmap = build_roadmap(steps);
        roadmap.calculate_progress();
        assert_eq!(roadmap.status, RoadmapStatus::Completed);

        roadmap.toggle_step(0, fixed_now()).unwrap();

        assert_eq!(roadmap.progress, 50);
        assert_eq!(roadmap.status, RoadmapStatus::Active);
        assert_eq!(roadmap.steps[0].completed_at, None);
    }

    #[test]
    fn paused_roadmap_stays_paused_below_completion() {
        let mut roadmap = build_roadmap(vec![build_step(1, false), build_step(2, true)]);
        roadmap.status = RoadmapStatus::Paused;

        roadmap.calculate_progress();
        assert_eq!(roadmap.status, RoadmapStatus::Paused);
    }

    #[test]
    fn empty_roadmap_has_zero_progress() {
        let mut roadmap = build_roadmap(Vec::new());
        assert_eq!(roadmap.calculate_progress(), 0);
    }

    #[test]
    fn toggle_rejects_out_of_range_index() {
        let mut roadmap = build_roadmap(vec![build_step(1, false)]);
        let err = roadmap.toggle_step(5, fixed_now()).unwrap_err();
        assert_eq!(err, RoadmapError::StepIndexOutOfRange { index: 5, len: 1 });
    }
}
