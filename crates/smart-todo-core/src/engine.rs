//! The suggestion engine.
//!
//! [`SuggestionEngine`] ties feature extraction, scoring, categorization,
//! deadline suggestion, enhancement and candidate extraction together. It
//! holds only immutable configuration and an optional generator, so one
//! instance can serve concurrent callers. Every operation takes the current
//! time explicitly; identical inputs give identical outputs on the local path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::{FeatureExtractor, FeatureVector, Keyword};
use crate::candidates::{self, CandidateTask};
use crate::categorize::{suggest_category, CategorySuggestion};
use crate::config::Config;
use crate::deadline::{suggest_deadline, DeadlineSuggestion};
use crate::enhance::{self, Enhancement};
use crate::error::Result;
use crate::generator::{generate_with_timeout, OpenAiGenerator, Prompt, TextGenerator};
use crate::scoring::{PriorityAssessment, PriorityCalculator};
use crate::task::{ContextSnippet, Priority, TaskDescriptor};

/// A value computed either by the generator or locally.
///
/// `degraded` is set only when a configured generator failed and the local
/// path stood in for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generated<T> {
    pub value: T,
    pub degraded: bool,
}

impl<T> Generated<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            degraded: false,
        }
    }
}

/// One task in a prioritized list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTask {
    /// 1-based position
    pub rank: usize,
    pub task: TaskDescriptor,
    #[serde(flatten)]
    pub assessment: PriorityAssessment,
}

/// Summary of a batch of context snippets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextAnalysis {
    pub keywords: Vec<Keyword>,
    pub sentiment: f64,
    pub urgent: bool,
    pub urgency_score: f64,
    pub potential_tasks: Vec<CandidateTask>,
    pub deadlines_mentioned: Vec<String>,
    pub people_mentioned: Vec<String>,
    pub projects_mentioned: Vec<String>,
    pub time_expressions: Vec<crate::analysis::TimeExpression>,
}

/// Everything the engine suggests for one task and its context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResult {
    pub suggested_category: CategorySuggestion,
    pub suggested_priority: Priority,
    pub suggested_deadline: Option<DateTime<Utc>>,
    pub deadline: DeadlineSuggestion,
    pub priority_score: f64,
    pub priority: PriorityAssessment,
    pub enhanced_description: String,
    pub enhancement: Enhancement,
    pub candidate_tasks: Vec<CandidateTask>,
    pub features: FeatureVector,
    /// True when a configured generator failed and local results were used
    pub degraded: bool,
}

/// Stateless suggestion engine.
#[derive(Clone)]
pub struct SuggestionEngine {
    config: Config,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl std::fmt::Debug for SuggestionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionEngine")
            .field("config", &self.config)
            .field("generator", &self.generator.as_ref().map(|g| g.name().to_string()))
            .finish()
    }
}

impl SuggestionEngine {
    /// Local-only engine.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            generator: None,
        }
    }

    /// Use `generator` for enhancement and suggestions.
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Engine with the generator described by `config.generator`, if usable.
    pub fn from_config(config: Config) -> Self {
        let generator = OpenAiGenerator::from_config(&config.generator);
        let engine = Self::new(config);
        match generator {
            Some(generator) => engine.with_generator(Arc::new(generator)),
            None => engine,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    fn extractor(&self) -> FeatureExtractor<'_> {
        FeatureExtractor::new(&self.config)
    }

    /// Features of an optional task text plus context snippets.
    pub fn extract_features(
        &self,
        task_text: Option<&str>,
        snippets: &[ContextSnippet],
    ) -> FeatureVector {
        self.extractor().extract(task_text, snippets)
    }

    /// Label that enters the score: explicit, else hinted by wording, else medium.
    fn effective_priority(task: &TaskDescriptor, features: &FeatureVector) -> (Priority, bool) {
        match task.priority {
            Some(priority) => (priority, false),
            None => match features.priority_hint {
                Some(hint) => (hint, true),
                None => (Priority::default(), false),
            },
        }
    }

    fn calculator(&self, now: DateTime<Utc>) -> PriorityCalculator {
        let scoring = &self.config.scoring;
        PriorityCalculator::new(scoring.weights, scoring.horizon_days, now)
            .with_urgency_threshold(scoring.urgency_threshold)
    }

    /// Features that feed the priority score.
    ///
    /// Urgency and sentiment cover the task text plus its context. The
    /// priority hint comes from the task's own wording only, so a loud
    /// snippet cannot relabel the task.
    fn scoring_features(&self, task: &TaskDescriptor, snippets: &[ContextSnippet]) -> FeatureVector {
        let own = self.extractor().extract_text(&task.text());
        if snippets.is_empty() {
            return own;
        }
        let mut features = self.extract_features(Some(&task.text()), snippets);
        features.priority_hint = own.priority_hint;
        features
    }

    /// Score a task against its context.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInput`](crate::CoreError) for an invalid task.
    pub fn score_priority(
        &self,
        task: &TaskDescriptor,
        snippets: &[ContextSnippet],
        now: DateTime<Utc>,
    ) -> Result<PriorityAssessment> {
        task.validate()?;
        let features = self.scoring_features(task, snippets);
        Ok(self.assess(task, &features, now))
    }

    fn assess(
        &self,
        task: &TaskDescriptor,
        features: &FeatureVector,
        now: DateTime<Utc>,
    ) -> PriorityAssessment {
        let (priority, inferred) = Self::effective_priority(task, features);
        self.calculator(now)
            .assess(priority, inferred, features, task.deadline)
    }

    /// Score and rank many tasks against shared context, highest score first.
    ///
    /// Ties keep the earlier deadline first, then input order.
    ///
    /// # Errors
    /// Fails on the first invalid task.
    pub fn prioritize_tasks(
        &self,
        tasks: &[TaskDescriptor],
        snippets: &[ContextSnippet],
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedTask>> {
        let mut scored = tasks
            .iter()
            .map(|task| Ok((task.clone(), self.score_priority(task, snippets, now)?)))
            .collect::<Result<Vec<_>>>()?;

        scored.sort_by(|(a_task, a), (b_task, b)| {
            b.priority_score
                .total_cmp(&a.priority_score)
                .then_with(|| match (a_task.deadline, b_task.deadline) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
        });

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(i, (task, assessment))| RankedTask {
                rank: i + 1,
                task,
                assessment,
            })
            .collect())
    }

    /// Suggest a category from the task text and its context.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInput`](crate::CoreError) for an invalid task.
    pub fn categorize(
        &self,
        task: &TaskDescriptor,
        snippets: &[ContextSnippet],
    ) -> Result<CategorySuggestion> {
        task.validate()?;
        let features = self.extract_features(Some(&task.text()), snippets);
        Ok(suggest_category(&features, &self.config.categories, &task.tags))
    }

    /// Suggest a deadline. Time mentions come from the task text only.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInput`](crate::CoreError) for an invalid task.
    pub fn suggest_deadline(
        &self,
        task: &TaskDescriptor,
        now: DateTime<Utc>,
    ) -> Result<DeadlineSuggestion> {
        task.validate()?;
        let features = self.extractor().extract_text(&task.text());
        Ok(self.deadline_for(task, &features, now))
    }

    fn deadline_for(
        &self,
        task: &TaskDescriptor,
        features: &FeatureVector,
        now: DateTime<Utc>,
    ) -> DeadlineSuggestion {
        let (priority, _) = Self::effective_priority(task, features);
        suggest_deadline(
            &task.text(),
            &features.time_expressions,
            priority,
            task.estimated_duration,
            &self.config.deadline,
            now,
        )
    }

    /// Local template enhancement.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInput`](crate::CoreError) for an invalid task.
    pub fn enhance_local(
        &self,
        task: &TaskDescriptor,
        snippets: &[ContextSnippet],
    ) -> Result<Enhancement> {
        task.validate()?;
        let features = self.extract_features(Some(&task.text()), snippets);
        Ok(enhance::template(task, &features, snippets))
    }

    /// Enhance the description, preferring the generator when configured.
    ///
    /// # Errors
    /// Only for invalid input; generator failures fall back to the template.
    pub async fn enhance_description(
        &self,
        task: &TaskDescriptor,
        snippets: &[ContextSnippet],
    ) -> Result<Generated<Enhancement>> {
        let local = self.enhance_local(task, snippets)?;
        let prompt = enhance::prompt(task, snippets);
        Ok(match self.generate(&prompt).await {
            GeneratorOutcome::Text(text) => Generated::new(Enhancement::generated(text)),
            GeneratorOutcome::Failed => Generated {
                value: local,
                degraded: true,
            },
            GeneratorOutcome::NotConfigured => Generated::new(local),
        })
    }

    /// Candidate tasks found in the snippets, ranked.
    pub fn candidate_tasks(&self, snippets: &[ContextSnippet]) -> Vec<CandidateTask> {
        let features = self.extract_features(None, snippets);
        candidates::extract_candidates(snippets, &features.keywords, &self.config)
    }

    /// Task suggestions from context, preferring the generator when configured.
    pub async fn generate_suggestions(
        &self,
        snippets: &[ContextSnippet],
    ) -> Generated<Vec<CandidateTask>> {
        let local = self.candidate_tasks(snippets);
        if snippets.is_empty() {
            return Generated::new(local);
        }

        let prompt = candidates::prompt(snippets, self.config.features.max_candidates);
        match self.generate(&prompt).await {
            GeneratorOutcome::Text(text) => {
                let generated = candidates::parse_generated(&text, &self.config);
                if generated.is_empty() {
                    tracing::warn!("generator returned no usable suggestions, using local ones");
                    Generated {
                        value: local,
                        degraded: true,
                    }
                } else {
                    Generated::new(generated)
                }
            }
            GeneratorOutcome::Failed => Generated {
                value: local,
                degraded: true,
            },
            GeneratorOutcome::NotConfigured => Generated::new(local),
        }
    }

    /// Keywords, sentiment, urgency and mentions across `snippets`.
    pub fn analyze_context(&self, snippets: &[ContextSnippet]) -> ContextAnalysis {
        let features = self.extract_features(None, snippets);
        let potential_tasks =
            candidates::extract_candidates(snippets, &features.keywords, &self.config);
        ContextAnalysis {
            keywords: features.keywords,
            sentiment: features.sentiment,
            urgent: features.urgent,
            urgency_score: features.urgency_confidence,
            potential_tasks,
            deadlines_mentioned: features.deadline_phrases,
            people_mentioned: features.people,
            projects_mentioned: features.projects,
            time_expressions: features.time_expressions,
        }
    }

    /// Full local suggestion for a task and its context.
    ///
    /// Priority sees the task and its context, with the priority hint taken
    /// from the task wording. Time mentions for the deadline come from the
    /// task text only. Candidates come from the context.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInput`](crate::CoreError) for an invalid task.
    pub fn suggest_local(
        &self,
        task: &TaskDescriptor,
        snippets: &[ContextSnippet],
        now: DateTime<Utc>,
    ) -> Result<SuggestionResult> {
        task.validate()?;
        let task_features = self.extractor().extract_text(&task.text());
        let mut all_features = self.extract_features(Some(&task.text()), snippets);
        all_features.priority_hint = task_features.priority_hint;

        let priority = self.assess(task, &all_features, now);
        let deadline = self.deadline_for(task, &task_features, now);
        let category = suggest_category(&all_features, &self.config.categories, &task.tags);
        let enhancement = enhance::template(task, &all_features, snippets);
        let candidate_tasks =
            candidates::extract_candidates(snippets, &all_features.keywords, &self.config);

        Ok(SuggestionResult {
            suggested_category: category,
            suggested_priority: priority.suggested_priority,
            suggested_deadline: Some(deadline.deadline),
            priority_score: priority.priority_score,
            priority,
            deadline,
            enhanced_description: enhancement.enhanced_description.clone(),
            enhancement,
            candidate_tasks,
            features: all_features,
            degraded: false,
        })
    }

    /// Full suggestion, using the generator for enhancement and candidates
    /// when configured.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInput`](crate::CoreError) for an invalid task.
    pub async fn suggest(
        &self,
        task: &TaskDescriptor,
        snippets: &[ContextSnippet],
        now: DateTime<Utc>,
    ) -> Result<SuggestionResult> {
        let mut result = self.suggest_local(task, snippets, now)?;
        if self.generator.is_none() {
            return Ok(result);
        }

        let enhancement = self.enhance_description(task, snippets).await?;
        let suggestions = self.generate_suggestions(snippets).await;

        result.degraded = enhancement.degraded || suggestions.degraded;
        result.enhanced_description = enhancement.value.enhanced_description.clone();
        result.enhancement = enhancement.value;
        result.candidate_tasks = suggestions.value;
        Ok(result)
    }

    async fn generate(&self, prompt: &Prompt) -> GeneratorOutcome {
        let Some(generator) = self.generator.as_deref() else {
            return GeneratorOutcome::NotConfigured;
        };
        let settings = &self.config.generator;
        match generate_with_timeout(
            generator,
            prompt,
            Duration::from_secs(settings.timeout_secs),
            settings.max_retries,
        )
        .await
        {
            Ok(text) => GeneratorOutcome::Text(text),
            Err(e) => {
                tracing::warn!(
                    generator = generator.name(),
                    error = %e,
                    "generator unavailable, falling back to local suggestions"
                );
                GeneratorOutcome::Failed
            }
        }
    }
}

enum GeneratorOutcome {
    Text(String),
    Failed,
    NotConfigured,
}
