//! The `memo prepare` command.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use memo_core::assembler::prepare_test;
use memo_core::gateway::Gateway;
use memo_core::model::EntityKind;
use memo_core::render::render_test;

use super::Globals;

pub fn execute(globals: &Globals, questions: Option<usize>, output: Option<PathBuf>) -> Result<()> {
    let (config, mut store) = globals.open()?;
    let max_questions = questions.unwrap_or(config.questions_per_test);

    if store.count(EntityKind::Pair)? == 0 {
        bail!("no pairs to ask about; add one with `memo add-pair`");
    }

    let assembled = match prepare_test(&mut store, max_questions, Utc::now()) {
        Ok(assembled) => assembled,
        Err(e) => {
            store.rollback()?;
            return Err(e).context("failed to prepare test");
        }
    };
    store.commit().context("failed to save test")?;

    let test = assembled.test.id;
    let sheet = store.test_sheet(test)?;
    let text = render_test(test, &sheet);

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &text)
                .with_context(|| format!("failed to write test to {}", path.display()))?;
            eprintln!(
                "Test {test} with {} question(s) written to {}",
                sheet.len(),
                path.display()
            );
        }
        None => print!("{text}"),
    }

    Ok(())
}
