use chrono::{DateTime, Utc};
use clap::Args;
use smart_todo_core::{Priority, TaskDescriptor};

use super::{note_snippets, print_json, runtime, CliResult, Globals};

#[derive(Args)]
pub struct SuggestArgs {
    /// Task title
    title: String,
    /// Task description
    #[arg(long, short)]
    description: Option<String>,
    /// Explicit priority (low, medium, high, urgent)
    #[arg(long, short)]
    priority: Option<Priority>,
    /// Hard deadline (RFC 3339)
    #[arg(long)]
    deadline: Option<DateTime<Utc>>,
    /// Estimated duration in minutes
    #[arg(long)]
    duration: Option<u32>,
    /// Existing tag (repeatable)
    #[arg(long = "tag", short)]
    tags: Vec<String>,
    /// Context text (repeatable)
    #[arg(long = "context", short)]
    context: Vec<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl SuggestArgs {
    fn task(&self) -> TaskDescriptor {
        let mut task = TaskDescriptor::new(self.title.clone());
        task.description = self.description.clone();
        task.priority = self.priority;
        task.deadline = self.deadline;
        task.estimated_duration = self.duration;
        task.tags = self.tags.iter().cloned().collect();
        task
    }
}

pub fn run(globals: &Globals, args: SuggestArgs) -> CliResult {
    let now = globals.now();
    let task = args.task();
    let snippets = note_snippets(&args.context, now);
    let engine = globals.engine()?;

    let result = runtime()?.block_on(engine.suggest(&task, &snippets, now))?;
    if args.json {
        return print_json(&result);
    }

    println!(
        "Priority:  {} ({:.3})",
        result.suggested_priority, result.priority_score
    );
    println!(
        "Deadline:  {} [{}]",
        result.deadline.deadline.to_rfc3339(),
        result.deadline.reasoning
    );
    match &result.suggested_category.category {
        Some(category) => println!(
            "Category:  {} ({:.2})",
            category, result.suggested_category.confidence
        ),
        None => println!("Category:  none"),
    }
    if !result.suggested_category.suggested_tags.is_empty() {
        println!(
            "Tags:      {}",
            result.suggested_category.suggested_tags.join(", ")
        );
    }
    println!();
    println!("{}", result.enhanced_description);
    if !result.candidate_tasks.is_empty() {
        println!();
        println!("Related tasks:");
        for candidate in &result.candidate_tasks {
            println!("  [{:.2}] {}", candidate.confidence, candidate.title);
        }
    }
    if result.degraded {
        eprintln!("warning: generator unavailable, showing local suggestions");
    }
    Ok(())
}
