//! In-memory gateway for tests and dry runs.
//!
//! Enforces the same invariants as the SQLite store: unique language names
//! and phrase values, no pair stored together with its swapped form, unique
//! (pair, test, direction) questions, questions only on existing tests, and a
//! single verdict per question.

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::gateway::Gateway;
use crate::model::{
    EntityKind, Language, LanguageId, NewPair, NewQuestion, Pair, PairId, PairView,
    Phrase, PhraseId, Question, QuestionId, ResultTally, SheetEntry, Test, TestId, Verdict,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    languages: Vec<Language>,
    phrases: Vec<Phrase>,
    pairs: Vec<Pair>,
    tests: Vec<Test>,
    questions: Vec<Question>,
}

impl Tables {
    fn language(&self, id: LanguageId) -> Result<&Language, StoreError> {
        self.languages
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| not_found(EntityKind::Language, id))
    }

    fn phrase(&self, id: PhraseId) -> Result<&Phrase, StoreError> {
        self.phrases
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(EntityKind::Phrase, id))
    }

    fn pair(&self, id: PairId) -> Result<&Pair, StoreError> {
        self.pairs
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(EntityKind::Pair, id))
    }
}

fn not_found(entity: EntityKind, key: impl ToString) -> StoreError {
    StoreError::NotFound {
        entity,
        key: key.to_string(),
    }
}

fn next_id(len: usize) -> i64 {
    len as i64 + 1
}

/// A [`Gateway`] backed by plain vectors.
///
/// Staged writes are visible to reads on the same gateway, as they are on a
/// database connection inside a transaction.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    committed: Tables,
    working: Tables,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Gateway for MemoryGateway {
    fn save_language(&mut self, name: &str) -> Result<LanguageId, StoreError> {
        let tables = &mut self.working;
        if tables.languages.iter().any(|l| l.name == name) {
            return Err(StoreError::DuplicateEntity {
                entity: EntityKind::Language,
            });
        }
        let id = LanguageId(next_id(tables.languages.len()));
        tables.languages.push(Language {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    fn save_phrase(&mut self, value: &str) -> Result<PhraseId, StoreError> {
        let tables = &mut self.working;
        if tables.phrases.iter().any(|p| p.value == value) {
            return Err(StoreError::DuplicateEntity {
                entity: EntityKind::Phrase,
            });
        }
        let id = PhraseId(next_id(tables.phrases.len()));
        tables.phrases.push(Phrase {
            id,
            value: value.to_string(),
        });
        Ok(id)
    }

    fn save_pair(&mut self, pair: NewPair) -> Result<PairId, StoreError> {
        let tables = &mut self.working;
        tables.phrase(pair.first_phrase).map_err(|_| missing("first_phrase_id"))?;
        tables.language(pair.first_language).map_err(|_| missing("first_language_id"))?;
        tables.phrase(pair.second_phrase).map_err(|_| missing("second_phrase_id"))?;
        tables.language(pair.second_language).map_err(|_| missing("second_language_id"))?;

        let swapped = pair.swapped();
        let taken = tables.pairs.iter().any(|p| {
            let stored = NewPair {
                first_phrase: p.first_phrase,
                first_language: p.first_language,
                second_phrase: p.second_phrase,
                second_language: p.second_language,
            };
            stored == pair || stored == swapped
        });
        if taken {
            return Err(StoreError::DuplicateEntity {
                entity: EntityKind::Pair,
            });
        }

        let id = PairId(next_id(tables.pairs.len()));
        tables.pairs.push(Pair {
            id,
            first_phrase: pair.first_phrase,
            first_language: pair.first_language,
            second_phrase: pair.second_phrase,
            second_language: pair.second_language,
        });
        Ok(id)
    }

    fn save_test(&mut self, created_at: DateTime<Utc>) -> Result<TestId, StoreError> {
        let tables = &mut self.working;
        let id = TestId(next_id(tables.tests.len()));
        tables.tests.push(Test { id, created_at });
        Ok(id)
    }

    fn save_question(&mut self, question: NewQuestion) -> Result<QuestionId, StoreError> {
        let tables = &mut self.working;
        if !tables.tests.iter().any(|t| t.id == question.test) {
            return Err(StoreError::MissingRequiredField {
                entity: EntityKind::Question,
                field: "test_id",
            });
        }
        if tables.pair(question.pair).is_err() {
            return Err(StoreError::MissingRequiredField {
                entity: EntityKind::Question,
                field: "pair_id",
            });
        }
        let taken = tables.questions.iter().any(|q| {
            q.pair == question.pair && q.test == question.test && q.direction == question.direction
        });
        if taken {
            return Err(StoreError::DuplicateEntity {
                entity: EntityKind::Question,
            });
        }

        let id = QuestionId(next_id(tables.questions.len()));
        tables.questions.push(Question {
            id,
            pair: question.pair,
            test: question.test,
            direction: question.direction,
            result: None,
        });
        Ok(id)
    }

    fn record_result(&mut self, question: QuestionId, verdict: Verdict) -> Result<(), StoreError> {
        let stored = self
            .working
            .questions
            .iter_mut()
            .find(|q| q.id == question && q.result.is_none())
            .ok_or_else(|| not_found(EntityKind::Question, format!("open question {question}")))?;
        stored.result = Some(verdict);
        Ok(())
    }

    fn find_language(&self, name: &str) -> Result<Option<Language>, StoreError> {
        Ok(self.working.languages.iter().find(|l| l.name == name).cloned())
    }

    fn find_phrase(&self, value: &str) -> Result<Option<Phrase>, StoreError> {
        Ok(self.working.phrases.iter().find(|p| p.value == value).cloned())
    }

    fn find_test(&self, id: TestId) -> Result<Test, StoreError> {
        self.working
            .tests
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Test, id))
    }

    fn latest_test(&self) -> Result<Option<Test>, StoreError> {
        Ok(self.working.tests.iter().max_by_key(|t| t.id).cloned())
    }

    fn pairs(&self) -> Result<Vec<Pair>, StoreError> {
        Ok(self.working.pairs.clone())
    }

    fn pair_views(&self) -> Result<Vec<PairView>, StoreError> {
        let tables = &self.working;
        tables
            .pairs
            .iter()
            .map(|p| {
                Ok(PairView {
                    id: p.id,
                    first_phrase: tables.phrase(p.first_phrase)?.value.clone(),
                    first_language: tables.language(p.first_language)?.name.clone(),
                    second_phrase: tables.phrase(p.second_phrase)?.value.clone(),
                    second_language: tables.language(p.second_language)?.name.clone(),
                })
            })
            .collect()
    }

    fn test_sheet(&self, test: TestId) -> Result<Vec<SheetEntry>, StoreError> {
        let tables = &self.working;
        tables
            .questions
            .iter()
            .filter(|q| q.test == test)
            .map(|q| {
                let pair = tables.pair(q.pair)?;
                let first = (
                    tables.phrase(pair.first_phrase)?.value.clone(),
                    tables.language(pair.first_language)?.clone(),
                );
                let second = (
                    tables.phrase(pair.second_phrase)?.value.clone(),
                    tables.language(pair.second_language)?.clone(),
                );
                Ok(SheetEntry::from_sides(
                    q.id,
                    q.pair,
                    q.direction,
                    q.result,
                    first,
                    second,
                ))
            })
            .collect()
    }

    fn result_tallies(&self) -> Result<Vec<ResultTally>, StoreError> {
        let mut tallies: Vec<ResultTally> = Vec::new();
        for q in &self.working.questions {
            let Some(verdict) = q.result else { continue };
            match tallies
                .iter_mut()
                .find(|t| t.pair == q.pair && t.direction == q.direction && t.verdict == verdict)
            {
                Some(tally) => tally.count += 1,
                None => tallies.push(ResultTally {
                    pair: q.pair,
                    direction: q.direction,
                    verdict,
                    count: 1,
                }),
            }
        }
        Ok(tallies)
    }

    fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
        let tables = &self.working;
        let n = match kind {
            EntityKind::Language => tables.languages.len(),
            EntityKind::Phrase => tables.phrases.len(),
            EntityKind::Pair => tables.pairs.len(),
            EntityKind::Test => tables.tests.len(),
            EntityKind::Question => tables.questions.len(),
        };
        Ok(n as u64)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.committed = self.working.clone();
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.working = self.committed.clone();
        Ok(())
    }
}

fn missing(field: &'static str) -> StoreError {
    StoreError::MissingRequiredField {
        entity: EntityKind::Pair,
        field,
    }
}
