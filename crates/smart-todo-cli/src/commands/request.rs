use clap::Args;
use smart_todo_core::api;
use std::path::PathBuf;

use super::{read_input, runtime, CliResult, Globals};

#[derive(Args)]
pub struct RequestArgs {
    /// JSON request file; stdin when absent or "-"
    file: Option<PathBuf>,
}

/// Prints the response body; a non-200 status fails the command.
pub fn run(globals: &Globals, args: RequestArgs) -> CliResult {
    let body = read_input(args.file.as_deref())?;
    let engine = globals.engine()?;
    let (status, value) = runtime()?.block_on(api::respond(&engine, &body, globals.now()));
    println!("{}", serde_json::to_string_pretty(&value)?);
    if status != 200 {
        return Err(format!("request failed with status {status}").into());
    }
    Ok(())
}
