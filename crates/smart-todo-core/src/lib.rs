//! # Smart Todo Core Library
//!
//! Context-aware task suggestions: given a task and free-text daily context
//! (messages, emails, notes), the engine scores priority, suggests a
//! category and a deadline, enhances the description and proposes new
//! candidate tasks found in the context.
//!
//! ## Architecture
//!
//! - **Analysis**: tokenization, TF-IDF keywords, lexicon sentiment, urgency
//!   and time-expression detection, people/project mentions
//! - **Scoring**: weighted priority score with a per-term breakdown
//! - **Engine**: stateless [`SuggestionEngine`] built from an injected
//!   [`Config`], optionally backed by a [`TextGenerator`]
//! - **API**: JSON request dispatcher for an HTTP layer
//!
//! ## Key Components
//!
//! - [`SuggestionEngine`]: all suggestion operations
//! - [`Config`]: TOML configuration with keyword tables and weights
//! - [`TextGenerator`]: trait for generative-model backends
//! - [`api::handle_request`]: action dispatcher

pub mod analysis;
pub mod api;
pub mod candidates;
pub mod categorize;
pub mod config;
pub mod deadline;
pub mod engine;
pub mod enhance;
pub mod error;
pub mod generator;
pub mod scheduler;
pub mod scoring;
pub mod task;

pub use analysis::{FeatureExtractor, FeatureVector, Keyword, TimeAnchor, TimeExpression};
pub use api::{Action, ActionOutcome, ContextData, SuggestionRequest, SuggestionResponse};
pub use candidates::CandidateTask;
pub use categorize::{CategoryMatch, CategorySuggestion};
pub use config::Config;
pub use deadline::{Complexity, DeadlineSource, DeadlineSuggestion};
pub use engine::{ContextAnalysis, Generated, RankedTask, SuggestionEngine, SuggestionResult};
pub use enhance::{Enhancement, EnhancementSource};
pub use error::{ConfigError, CoreError, Result};
pub use generator::{OpenAiGenerator, Prompt, TextGenerator};
pub use scheduler::{workload_score, Schedule, ScheduledBlock, Scheduler, SchedulerConfig};
pub use scoring::{ObjectiveTerm, PriorityAssessment, PriorityCalculator, PriorityWeights, ScoreBreakdown};
pub use task::{ContextSnippet, Priority, SourceType, TaskDescriptor, TaskStatus};
