//! Grading report sent back after a reply has been checked.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{SheetEntry, TestId, Verdict};
use crate::reply::Grade;

/// Summary of one graded reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    pub test_id: TestId,
    /// Every answer of the reply, in reply order.
    pub grades: Vec<Grade>,
    pub correct: usize,
    pub incorrect: usize,
    /// Questions of the test still without a result after this reply.
    pub still_open: usize,
}

impl GradeReport {
    /// Build a report from the grades of a reply and the test's sheet as it
    /// looks after the grades were committed.
    pub fn new(test_id: TestId, grades: Vec<Grade>, sheet: &[SheetEntry]) -> Self {
        let correct = grades.iter().filter(|g| g.verdict.is_correct()).count();
        let incorrect = grades.len() - correct;
        let still_open = sheet.iter().filter(|e| e.is_open()).count();
        Self {
            test_id,
            grades,
            correct,
            incorrect,
            still_open,
        }
    }

    /// Fraction of answers that were correct, 0.0 for an empty reply.
    pub fn score(&self) -> f64 {
        if self.grades.is_empty() {
            0.0
        } else {
            self.correct as f64 / self.grades.len() as f64
        }
    }

    pub fn mistakes(&self) -> impl Iterator<Item = &Grade> {
        self.grades
            .iter()
            .filter(|g| g.verdict == Verdict::Incorrect)
    }

    /// Format the report as plain text.
    pub fn to_text(&self) -> String {
        let mut text = String::new();

        text.push_str(&format!(
            "Test {}: {}/{} correct ({:.0}%)\n",
            self.test_id,
            self.correct,
            self.grades.len(),
            self.score() * 100.0
        ));

        if self.incorrect > 0 {
            text.push_str("\nMistakes:\n");
            for g in self.mistakes() {
                let submitted = if g.submitted.is_empty() {
                    "(no answer)"
                } else {
                    g.submitted.as_str()
                };
                text.push_str(&format!(
                    "  {} = {} (expected: {})\n",
                    g.prompt, submitted, g.expected
                ));
            }
        }

        if self.still_open > 0 {
            text.push_str(&format!("\n{} question(s) still open\n", self.still_open));
        }

        text
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }
}
