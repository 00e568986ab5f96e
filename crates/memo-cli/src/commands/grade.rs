//! The `memo grade` command.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use memo_core::gateway::Gateway;
use memo_core::model::TestId;
use memo_core::reply::{parse_reply, receive_reply};
use memo_core::report::GradeReport;

use super::{select_test, Globals};

fn read_reply(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read reply from {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read reply from stdin")?;
            Ok(text)
        }
    }
}

pub fn execute(
    globals: &Globals,
    input: Option<PathBuf>,
    test: Option<TestId>,
    format: String,
    report_path: Option<PathBuf>,
) -> Result<()> {
    if !matches!(format.as_str(), "text" | "json") {
        bail!("unknown format {format:?}; expected text or json");
    }

    let text = read_reply(input.as_ref())?;
    let (config, mut store) = globals.open()?;

    // An explicit --test wins; receive_reply rejects a reply naming another test.
    let requested = match test {
        Some(id) => Some(id),
        None => parse_reply(&text)?.test_id,
    };
    let test = select_test(&store, requested)?.id;

    let grades = receive_reply(&mut store, test, &text, config.grade_options())
        .with_context(|| format!("reply for test {test} was not graded"))?;
    let sheet = store.test_sheet(test)?;
    let report = GradeReport::new(test, grades, &sheet);

    if let Some(path) = &report_path {
        report.save_json(path)?;
        eprintln!("Report written to {}", path.display());
    }

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print!("{}", report.to_text()),
    }

    Ok(())
}
