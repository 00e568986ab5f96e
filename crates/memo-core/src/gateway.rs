//! Storage gateway trait.
//!
//! The core never talks to a database directly. Everything it persists or
//! queries goes through this trait, implemented by the `memo-store` crate.
//! Writes are staged until [`Gateway::commit`]; [`Gateway::rollback`]
//! discards them.

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{
    EntityKind, Language, LanguageId, NewPair, NewQuestion, Pair, PairId, PairView, Phrase,
    PhraseId, QuestionId, ResultTally, SheetEntry, Test, TestId, Verdict,
};

/// Transactional access to languages, phrases, pairs, tests and questions.
pub trait Gateway {
    // -----------------------------------------------------------------------
    // Staged writes
    // -----------------------------------------------------------------------

    fn save_language(&mut self, name: &str) -> Result<LanguageId, StoreError>;

    fn save_phrase(&mut self, value: &str) -> Result<PhraseId, StoreError>;

    /// Fails with `DuplicateEntity` if the pair or its swapped form exists.
    fn save_pair(&mut self, pair: NewPair) -> Result<PairId, StoreError>;

    fn save_test(&mut self, created_at: DateTime<Utc>) -> Result<TestId, StoreError>;

    /// Fails with `MissingRequiredField` if the test does not exist and with
    /// `DuplicateEntity` if (pair, test, direction) is already taken.
    fn save_question(&mut self, question: NewQuestion) -> Result<QuestionId, StoreError>;

    /// Record the verdict of an open question. A question is graded once.
    fn record_result(&mut self, question: QuestionId, verdict: Verdict) -> Result<(), StoreError>;

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    fn find_language(&self, name: &str) -> Result<Option<Language>, StoreError>;

    fn find_phrase(&self, value: &str) -> Result<Option<Phrase>, StoreError>;

    /// Exactly one test, or `NotFound`.
    fn find_test(&self, id: TestId) -> Result<Test, StoreError>;

    /// The most recently created test, if any.
    fn latest_test(&self) -> Result<Option<Test>, StoreError>;

    /// All pairs in insertion order.
    fn pairs(&self) -> Result<Vec<Pair>, StoreError>;

    /// All pairs with phrase and language text, in insertion order.
    fn pair_views(&self) -> Result<Vec<PairView>, StoreError>;

    /// The questions of a test, in creation order.
    fn test_sheet(&self, test: TestId) -> Result<Vec<SheetEntry>, StoreError>;

    /// Graded question counts grouped by (pair, direction, verdict).
    fn result_tallies(&self) -> Result<Vec<ResultTally>, StoreError>;

    fn count(&self, kind: EntityKind) -> Result<u64, StoreError>;

    // -----------------------------------------------------------------------
    // Transaction boundary
    // -----------------------------------------------------------------------

    /// Apply every staged write, or none of them.
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard every staged write.
    fn rollback(&mut self) -> Result<(), StoreError>;
}
