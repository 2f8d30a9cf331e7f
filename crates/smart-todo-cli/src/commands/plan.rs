use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use smart_todo_core::{workload_score, RankedTask, Schedule, Scheduler, TaskDescriptor};
use std::path::PathBuf;

use super::{note_snippets, print_json, read_input, CliResult, Globals};

#[derive(Args)]
pub struct PlanArgs {
    /// JSON array of tasks; stdin when absent or "-"
    file: Option<PathBuf>,
    /// Start of the first block (RFC 3339); defaults to now
    #[arg(long)]
    start: Option<DateTime<Utc>>,
    /// Context text shared by all tasks (repeatable)
    #[arg(long = "context", short)]
    context: Vec<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Plan {
    workload: f64,
    ranked: Vec<RankedTask>,
    schedule: Schedule,
}

pub fn run(globals: &Globals, args: PlanArgs) -> CliResult {
    let input = read_input(args.file.as_deref())?;
    let tasks: Vec<TaskDescriptor> = serde_json::from_str(&input)?;
    let now = globals.now();
    let engine = globals.engine()?;

    let snippets = note_snippets(&args.context, now);
    let ranked = engine.prioritize_tasks(&tasks, &snippets, now)?;
    let schedule = Scheduler::new().plan(&ranked, args.start.unwrap_or(now));
    let plan = Plan {
        workload: workload_score(&tasks),
        ranked,
        schedule,
    };
    if args.json {
        return print_json(&plan);
    }

    println!("Workload: {:.2}", plan.workload);
    for block in &plan.schedule.blocks {
        println!(
            "{} - {}  {} ({:.3})",
            block.start_time.format("%Y-%m-%d %H:%M"),
            block.end_time.format("%H:%M"),
            block.task_title,
            block.priority_score
        );
    }
    println!("{}", plan.schedule.reasoning);
    Ok(())
}
