//! Plain-text test rendering.
//!
//! The output is the same format the reply parser reads, with every answer
//! slot left empty:
//!
//! ```text
//! Test ID: 2
//!
//! polski → español:
//!   wąż =
//!   komputer =
//!
//! español → polski:
//!   serpiente =
//! ```

use std::fmt::Write;

use crate::model::{SheetEntry, TestId};

/// Separator between the two language names of a section header.
pub const ARROW: char = '→';

/// Prefix of the line naming the test a reply belongs to.
pub const TEST_ID_PREFIX: &str = "Test ID:";

/// Format a section header, e.g. `polski → español:`.
pub fn header(source: &str, target: &str) -> String {
    format!("{source} {ARROW} {target}:")
}

/// Order entries by `(source_language_id, target_language_id)`, keeping
/// creation order within each group.
pub fn sort_entries(entries: &[SheetEntry]) -> Vec<&SheetEntry> {
    let mut sorted: Vec<&SheetEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.key());
    sorted
}

/// Render a test with empty answer slots.
pub fn render_test(test: TestId, entries: &[SheetEntry]) -> String {
    render_with(test, entries, |_| "")
}

/// Render a test, filling each answer slot with `answer(entry)`.
pub fn render_with<'a, F>(test: TestId, entries: &'a [SheetEntry], mut answer: F) -> String
where
    F: FnMut(&'a SheetEntry) -> &'a str,
{
    let mut out = String::new();
    let _ = writeln!(out, "{TEST_ID_PREFIX} {test}");

    let mut prev_key = None;
    for entry in sort_entries(entries) {
        if prev_key != Some(entry.key()) {
            prev_key = Some(entry.key());
            out.push('\n');
            let _ = writeln!(
                out,
                "{}",
                header(&entry.source_language.name, &entry.target_language.name)
            );
        }
        let _ = writeln!(out, "  {} = {}", entry.prompt, answer(entry));
    }
    out
}
