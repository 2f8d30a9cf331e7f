//! Workload estimation and sequential scheduling.
//!
//! This module turns a prioritized task list into a plan:
//! - Workload score from the number of open and high-priority open tasks
//! - Back-to-back blocks in rank order, separated by a fixed break
//! - Tasks without an estimate get a default duration

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::RankedTask;
use crate::task::{Priority, TaskDescriptor};

/// A scheduled work block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledBlock {
    pub task_id: Option<String>,
    pub task_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub priority_score: f64,
}

impl ScheduledBlock {
    /// Get total duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// A suggested plan with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub blocks: Vec<ScheduledBlock>,
    pub reasoning: String,
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Break between blocks (minutes)
    pub break_minutes: i64,
    /// Duration for tasks without an estimate (minutes)
    pub default_task_minutes: i64,
    /// Maximum number of blocks
    pub max_tasks: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            break_minutes: 15,
            default_task_minutes: 60,
            max_tasks: 10,
        }
    }
}

/// Workload score (0.0 to 1.0).
///
/// Each open task adds 0.1 and each open high or urgent task another 0.2.
pub fn workload_score(tasks: &[TaskDescriptor]) -> f64 {
    let open: Vec<&TaskDescriptor> = tasks.iter().filter(|t| t.is_open()).collect();
    let pressing = open
        .iter()
        .filter(|t| matches!(t.priority, Some(Priority::High | Priority::Urgent)))
        .count();
    (open.len() as f64 * 0.1 + pressing as f64 * 0.2).min(1.0)
}

/// Sequential scheduler
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a new scheduler with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Lay out open tasks in rank order starting at `start`.
    ///
    /// # Arguments
    /// * `ranked` - Tasks sorted by priority, highest first
    /// * `start` - Start of the first block
    pub fn plan(&self, ranked: &[RankedTask], start: DateTime<Utc>) -> Schedule {
        let mut blocks = Vec::new();
        let mut current = start;

        for entry in ranked
            .iter()
            .filter(|r| r.task.is_open())
            .take(self.config.max_tasks)
        {
            let minutes = entry
                .task
                .estimated_duration
                .map(i64::from)
                .filter(|m| *m > 0)
                .unwrap_or(self.config.default_task_minutes);
            let end = current + Duration::minutes(minutes);

            blocks.push(ScheduledBlock {
                task_id: entry.task.id.clone(),
                task_title: entry.task.title.clone(),
                start_time: current,
                end_time: end,
                priority_score: entry.assessment.priority_score,
            });

            current = end + Duration::minutes(self.config.break_minutes);
        }

        let reasoning = if blocks.is_empty() {
            "No tasks to schedule".to_string()
        } else {
            format!(
                "Scheduled {} tasks based on priority and estimated duration",
                blocks.len()
            )
        };
        Schedule { blocks, reasoning }
    }
}
