//! Test assembly.
//!
//! Turns ranked candidates into a stored test with one open question per
//! candidate. Nothing here commits; the caller owns the transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::gateway::Gateway;
use crate::model::{NewQuestion, Question, Test};
use crate::scoring::{rank_from_gateway, Candidate};

/// Default number of questions in a new test.
pub const DEFAULT_QUESTIONS_PER_TEST: usize = 20;

/// A freshly created test and its questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledTest {
    pub test: Test,
    pub questions: Vec<Question>,
}

/// Create a test from the front of `candidates`.
///
/// At most `max_questions` questions are created. On error the staged test
/// and any questions already saved must be rolled back by the caller.
pub fn assemble_test<G: Gateway + ?Sized>(
    gateway: &mut G,
    candidates: &[Candidate],
    max_questions: usize,
    created_at: DateTime<Utc>,
) -> Result<AssembledTest, StoreError> {
    let test_id = gateway.save_test(created_at)?;

    let mut questions = Vec::with_capacity(max_questions.min(candidates.len()));
    for candidate in candidates.iter().take(max_questions) {
        let new = NewQuestion {
            pair: candidate.pair,
            test: test_id,
            direction: candidate.direction,
        };
        let id = gateway.save_question(new)?;
        questions.push(Question {
            id,
            pair: new.pair,
            test: new.test,
            direction: new.direction,
            result: None,
        });
    }

    tracing::info!(
        test = %test_id,
        questions = questions.len(),
        available = candidates.len(),
        "assembled test"
    );

    Ok(AssembledTest {
        test: Test {
            id: test_id,
            created_at,
        },
        questions,
    })
}

/// Score every pair and assemble a test from the best candidates.
pub fn prepare_test<G: Gateway + ?Sized>(
    gateway: &mut G,
    max_questions: usize,
    created_at: DateTime<Utc>,
) -> Result<AssembledTest, StoreError> {
    let candidates = rank_from_gateway(gateway)?;
    assemble_test(gateway, &candidates, max_questions, created_at)
}
