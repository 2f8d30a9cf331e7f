//! JSON request dispatcher.
//!
//! An HTTP layer hands a request body to [`handle_json`] and gets back a
//! status code plus a JSON body. The `action` field selects which engine
//! operation runs; unknown actions are client errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::candidates::CandidateTask;
use crate::categorize::CategorySuggestion;
use crate::deadline::DeadlineSuggestion;
use crate::engine::{ContextAnalysis, RankedTask, SuggestionEngine};
use crate::enhance::Enhancement;
use crate::error::{CoreError, Result};
use crate::scoring::PriorityAssessment;
use crate::task::{ContextSnippet, SourceType, TaskDescriptor};

/// Engine operation selected by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Prioritize,
    SuggestDeadline,
    Categorize,
    EnhanceDescription,
    GenerateSuggestions,
    AnalyzeContext,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Prioritize,
        Action::SuggestDeadline,
        Action::Categorize,
        Action::EnhanceDescription,
        Action::GenerateSuggestions,
        Action::AnalyzeContext,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Prioritize => "prioritize",
            Action::SuggestDeadline => "suggest_deadline",
            Action::Categorize => "categorize",
            Action::EnhanceDescription => "enhance_description",
            Action::GenerateSuggestions => "generate_suggestions",
            Action::AnalyzeContext => "analyze_context",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| CoreError::UnsupportedAction(wanted.to_string()))
    }
}

/// Context as sent by callers: a list of snippets, one snippet, or bare text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextData {
    Many(Vec<ContextSnippet>),
    One(ContextSnippet),
    Text(String),
}

impl ContextData {
    /// Snippets in input order. Bare text becomes a note, and every snippet
    /// without a timestamp is stamped `now`.
    pub fn into_snippets(self, now: DateTime<Utc>) -> Vec<ContextSnippet> {
        match self {
            ContextData::Many(snippets) => snippets.into_iter().map(|s| s.stamped(now)).collect(),
            ContextData::One(snippet) => vec![snippet.stamped(now)],
            ContextData::Text(text) => vec![ContextSnippet::new(text, SourceType::Note, now)],
        }
    }
}

fn default_action() -> String {
    Action::Prioritize.as_str().to_string()
}

/// Incoming request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    #[serde(default)]
    pub task_data: Option<TaskDescriptor>,
    /// Batch input for `prioritize`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskDescriptor>,
    #[serde(default)]
    pub context_data: Option<ContextData>,
    #[serde(default = "default_action")]
    pub action: String,
    /// Reference time; the call time when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<DateTime<Utc>>,
}

impl SuggestionRequest {
    /// Empty request for `action`.
    pub fn new(action: Action) -> Self {
        Self {
            task_data: None,
            tasks: Vec::new(),
            context_data: None,
            action: action.as_str().to_string(),
            now: None,
        }
    }
}

/// Result of one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    Priority(PriorityAssessment),
    PrioritizedTasks(Vec<RankedTask>),
    Deadline(DeadlineSuggestion),
    Category(CategorySuggestion),
    Enhancement(Enhancement),
    Suggestions(Vec<CandidateTask>),
    Analysis(ContextAnalysis),
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub action: Action,
    #[serde(flatten)]
    pub outcome: ActionOutcome,
    /// True when a configured generator failed and local results were used
    pub degraded: bool,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&CoreError> for ErrorResponse {
    fn from(err: &CoreError) -> Self {
        Self {
            error: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

fn require_task(request: &SuggestionRequest, action: Action) -> Result<TaskDescriptor> {
    request
        .task_data
        .clone()
        .ok_or_else(|| CoreError::invalid("task_data", format!("required for {action}")))
}

/// Run the action named in `request`.
///
/// # Errors
/// - [`CoreError::UnsupportedAction`] for an unknown action
/// - [`CoreError::InvalidInput`] for missing or invalid task data
pub async fn handle_request(
    engine: &SuggestionEngine,
    request: SuggestionRequest,
    now: DateTime<Utc>,
) -> Result<SuggestionResponse> {
    let action: Action = request.action.parse()?;
    let now = request.now.unwrap_or(now);
    tracing::info!(%action, "handling suggestion request");

    let snippets = request
        .context_data
        .clone()
        .map(|data| data.into_snippets(now))
        .unwrap_or_default();

    let mut degraded = false;
    let outcome = match action {
        Action::Prioritize if !request.tasks.is_empty() => {
            let ranked = engine.prioritize_tasks(&request.tasks, &snippets, now)?;
            ActionOutcome::PrioritizedTasks(ranked)
        }
        Action::Prioritize => {
            let task = require_task(&request, action)?;
            ActionOutcome::Priority(engine.score_priority(&task, &snippets, now)?)
        }
        Action::SuggestDeadline => {
            let task = require_task(&request, action)?;
            ActionOutcome::Deadline(engine.suggest_deadline(&task, now)?)
        }
        Action::Categorize => {
            let task = require_task(&request, action)?;
            ActionOutcome::Category(engine.categorize(&task, &snippets)?)
        }
        Action::EnhanceDescription => {
            let task = require_task(&request, action)?;
            let enhanced = engine.enhance_description(&task, &snippets).await?;
            degraded = enhanced.degraded;
            ActionOutcome::Enhancement(enhanced.value)
        }
        Action::GenerateSuggestions => {
            let suggestions = engine.generate_suggestions(&snippets).await;
            degraded = suggestions.degraded;
            ActionOutcome::Suggestions(suggestions.value)
        }
        Action::AnalyzeContext => ActionOutcome::Analysis(engine.analyze_context(&snippets)),
    };

    if degraded {
        tracing::warn!(%action, "responding with degraded suggestions");
    }
    Ok(SuggestionResponse {
        action,
        outcome,
        degraded,
    })
}

/// Parse a JSON body and run it. Malformed JSON is invalid input.
///
/// # Errors
/// Same as [`handle_request`], plus [`CoreError::InvalidInput`] for bodies
/// that do not parse.
pub async fn handle_json(
    engine: &SuggestionEngine,
    body: &str,
    now: DateTime<Utc>,
) -> Result<SuggestionResponse> {
    let request: SuggestionRequest =
        serde_json::from_str(body).map_err(|e| CoreError::invalid("request", e.to_string()))?;
    handle_request(engine, request, now).await
}

/// Run a JSON body and render the HTTP-style status and response body.
pub async fn respond(
    engine: &SuggestionEngine,
    body: &str,
    now: DateTime<Utc>,
) -> (u16, serde_json::Value) {
    let rendered = match handle_json(engine, body, now).await {
        Ok(response) => serde_json::to_value(&response).map(|value| (200, value)),
        Err(err) => serde_json::to_value(ErrorResponse::from(&err))
            .map(|value| (err.status_code(), value)),
    };
    rendered.unwrap_or_else(|e| {
        (
            500,
            serde_json::json!({ "error": "json", "message": e.to_string() }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 10, 0, 0).unwrap()
    }

    fn engine() -> SuggestionEngine {
        SuggestionEngine::new(Config::default())
    }

    #[test]
    fn parses_actions() {
        assert_eq!("categorize".parse::<Action>().unwrap(), Action::Categorize);
        let err = "fly".parse::<Action>().unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedAction(a) if a == "fly"));
    }

    #[test]
    fn context_data_shapes() {
        let many: ContextData =
            serde_json::from_str(r#"[{"text": "a", "source": "email"}]"#).unwrap();
        assert!(matches!(many, ContextData::Many(ref v) if v.len() == 1));
        let one: ContextData =
            serde_json::from_str(r#"{"content": "b", "context_type": "whatsapp"}"#).unwrap();
        let snippets = one.into_snippets(now());
        assert_eq!(snippets[0].source(), SourceType::Message);
        let text: ContextData = serde_json::from_str(r#""call mom""#).unwrap();
        assert_eq!(text.into_snippets(now())[0].timestamp(), Some(now()));
    }

    #[tokio::test]
    async fn default_action_is_prioritize() {
        let body = r#"{"task_data": {"title": "Finish report asap"}}"#;
        let response = handle_json(&engine(), body, now()).await.unwrap();
        assert_eq!(response.action, Action::Prioritize);
        assert!(matches!(response.outcome, ActionOutcome::Priority(ref a) if a.priority_score >= 0.7));
    }

    #[tokio::test]
    async fn unknown_action_is_client_error() {
        let (status, body) = respond(&engine(), r#"{"action": "teleport"}"#, now()).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "unsupported_action");
    }

    #[tokio::test]
    async fn malformed_timestamp_is_invalid_input() {
        let body = r#"{"action": "suggest_deadline", "task_data": {"title": "x", "deadline": "soon"}}"#;
        let err = handle_json(&engine(), body, now()).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn missing_task_is_invalid_input() {
        let err = handle_json(&engine(), r#"{"action": "categorize"}"#, now())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { ref field, .. } if field == "task_data"));
    }

    #[tokio::test]
    async fn response_shape_is_flat() {
        let body = r#"{"action": "analyze_context", "context_data": "Need to pay the rent today"}"#;
        let (status, value) = respond(&engine(), body, now()).await;
        assert_eq!(status, 200);
        assert_eq!(value["action"], "analyze_context");
        assert_eq!(value["degraded"], false);
        assert!(value["analysis"]["potential_tasks"].is_array());
    }
}
