use clap::Args;
use smart_todo_core::{ContextSnippet, SourceType};
use std::path::PathBuf;

use super::{print_json, read_input, CliResult, Globals};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Context texts, one snippet each
    texts: Vec<String>,
    /// Read one snippet from a file ("-" for stdin)
    #[arg(long, short)]
    file: Option<PathBuf>,
    /// Source of the snippets (message, email, note)
    #[arg(long, default_value = "note")]
    source: SourceType,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(globals: &Globals, args: AnalyzeArgs) -> CliResult {
    let now = globals.now();
    let mut texts = args.texts;
    if let Some(path) = args.file.as_deref() {
        texts.push(read_input(Some(path))?);
    }
    if texts.iter().all(|t| t.trim().is_empty()) {
        return Err("no context given; pass text arguments or --file".into());
    }
    let snippets: Vec<ContextSnippet> = texts
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| ContextSnippet::new(t, args.source, now))
        .collect();

    let engine = globals.engine()?;
    let analysis = engine.analyze_context(&snippets);
    if args.json {
        return print_json(&analysis);
    }

    let keywords: Vec<&str> = analysis.keywords.iter().map(|k| k.term.as_str()).collect();
    println!("Keywords:  {}", keywords.join(", "));
    println!("Sentiment: {:.2}", analysis.sentiment);
    println!(
        "Urgency:   {:.2}{}",
        analysis.urgency_score,
        if analysis.urgent { " (urgent)" } else { "" }
    );
    if !analysis.people_mentioned.is_empty() {
        println!("People:    {}", analysis.people_mentioned.join(", "));
    }
    if !analysis.projects_mentioned.is_empty() {
        println!("Projects:  {}", analysis.projects_mentioned.join(", "));
    }
    if !analysis.deadlines_mentioned.is_empty() {
        println!("Deadlines: {}", analysis.deadlines_mentioned.join(", "));
    }
    if analysis.potential_tasks.is_empty() {
        println!("No potential tasks found");
    } else {
        println!("Potential tasks:");
        for candidate in &analysis.potential_tasks {
            println!("  [{:.2}] {}", candidate.confidence, candidate.title);
        }
    }
    Ok(())
}
