//! Request dispatch through the JSON API.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use smart_todo_core::api::{handle_json, respond};
use smart_todo_core::{ActionOutcome, Config, SuggestionEngine};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 5, 10, 0, 0).unwrap()
}

fn engine() -> SuggestionEngine {
    SuggestionEngine::new(Config::default())
}

#[tokio::test]
async fn test_batch_prioritize() {
    let body = json!({
        "action": "prioritize",
        "tasks": [
            { "id": "1", "title": "Water plants", "priority": "low" },
            { "id": "2", "title": "Server down, fix immediately" },
            { "id": "3", "title": "Tax return", "deadline": "2025-03-05T18:00:00Z" }
        ]
    })
    .to_string();

    let (status, value) = respond(&engine(), &body, now()).await;
    assert_eq!(status, 200);
    let ids: Vec<&str> = value["prioritized_tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["task"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["2", "3", "1"]);
    assert_eq!(value["prioritized_tasks"][0]["rank"], 1);
    assert!(value["prioritized_tasks"][0]["reasoning"].is_string());
}

#[tokio::test]
async fn test_every_action_dispatches() {
    let task = json!({ "title": "Pay the electricity bill", "estimated_duration": 20 });
    let context = json!([
        { "text": "Reminder: electricity bill due Friday", "source": "email",
          "timestamp": "2025-03-04T08:00:00Z" },
        { "content": "Let's meet tomorrow at 3pm to discuss budget", "context_type": "whatsapp",
          "timestamp": "2025-03-05T09:00:00Z" }
    ]);

    for action in [
        "prioritize",
        "suggest_deadline",
        "categorize",
        "enhance_description",
        "generate_suggestions",
        "analyze_context",
    ] {
        let body = json!({ "action": action, "task_data": task, "context_data": context });
        let response = handle_json(&engine(), &body.to_string(), now())
            .await
            .unwrap_or_else(|e| panic!("{action} failed: {e}"));
        assert_eq!(response.action.as_str(), action);
        assert!(!response.degraded);
    }
}

#[tokio::test]
async fn test_categorize_response() {
    let body = json!({
        "action": "categorize",
        "task_data": { "title": "Book flight and hotel" }
    })
    .to_string();
    let response = handle_json(&engine(), &body, now()).await.unwrap();
    match response.outcome {
        ActionOutcome::Category(c) => assert_eq!(c.category.as_deref(), Some("travel")),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_responses() {
    let (status, value) = respond(&engine(), "not json", now()).await;
    assert_eq!(status, 400);
    assert_eq!(value["error"], "invalid_input");

    let (status, value) = respond(
        &engine(),
        &json!({ "action": "prioritize", "task_data": { "title": "   " } }).to_string(),
        now(),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(value["error"], "invalid_input");

    let (status, value) = respond(&engine(), r#"{"action": "summon"}"#, now()).await;
    assert_eq!(status, 400);
    assert_eq!(value["error"], "unsupported_action");
    assert!(value["message"].as_str().unwrap().contains("summon"));
}

#[tokio::test]
async fn test_prioritize_reads_context() {
    let task = json!({ "title": "Review budget" });
    let quiet = json!({ "action": "prioritize", "task_data": task });
    let pressed = json!({
        "action": "prioritize",
        "task_data": task,
        "context_data": "URGENT: the budget review is overdue, deadline today, do it asap!"
    });

    let score = |value: &serde_json::Value| value["priority"]["priority_score"].as_f64().unwrap();
    let (_, without) = respond(&engine(), &quiet.to_string(), now()).await;
    let (_, with) = respond(&engine(), &pressed.to_string(), now()).await;
    assert!(score(&with) > score(&without));
    assert_eq!(with["priority"]["effective_priority"], "medium");
}

#[tokio::test]
async fn test_undated_snippets_keep_input_order() {
    let body = json!({
        "action": "generate_suggestions",
        "context_data": [
            { "text": "Need to call plumber", "source": "note" },
            { "text": "Need to call dentist", "source": "note" },
            { "text": "Need to call bank", "source": "note" }
        ]
    })
    .to_string();

    for _ in 0..2 {
        let response = handle_json(&engine(), &body, now()).await.unwrap();
        let ActionOutcome::Suggestions(suggestions) = response.outcome else {
            panic!("expected suggestions");
        };
        let order: Vec<Option<usize>> = suggestions.iter().map(|c| c.source_index).collect();
        assert_eq!(order, vec![Some(0), Some(1), Some(2)]);
        assert!(suggestions.iter().all(|c| c.timestamp == Some(now())));
    }
}
