//! The SQLite session.

use std::path::Path;

use chrono::{DateTime, Utc};
use memo_core::error::StoreError;
use memo_core::gateway::Gateway;
use memo_core::model::{
    Direction, EntityKind, Language, LanguageId, NewPair, NewQuestion, Pair, PairId, PairView,
    Phrase, PhraseId, QuestionId, ResultTally, SheetEntry, Test, TestId, Verdict,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::constraint::{backend, translate};
use crate::schema::{apply_pragmas, create_schema, table_name};

/// A single SQLite connection implementing [`Gateway`].
///
/// The first staged write opens a transaction; [`Gateway::commit`] and
/// [`Gateway::rollback`] end it. Dropping the gateway with a transaction still
/// open rolls it back.
pub struct SqliteGateway {
    conn: Connection,
}

impl SqliteGateway {
    /// Open (or create) the database at `path`, creating parent directories
    /// and any missing tables.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path).map_err(backend)?;
        tracing::debug!(path = %path.display(), "opened database");
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        apply_pragmas(&conn).map_err(backend)?;
        create_schema(&conn).map_err(backend)?;
        Ok(Self { conn })
    }

    /// Whether staged writes are waiting for a commit.
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Close the session, discarding anything not committed.
    pub fn close(mut self) -> Result<(), StoreError> {
        if self.in_transaction() {
            self.rollback()?;
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction() {
            self.conn.execute_batch("BEGIN").map_err(backend)?;
            tracing::debug!("began transaction");
        }
        Ok(())
    }

    fn exists(&self, kind: EntityKind, id: i64) -> Result<bool, StoreError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
            table_name(kind)
        );
        self.conn
            .query_row(&sql, [id], |row| row.get(0))
            .map_err(backend)
    }
}

impl Drop for SqliteGateway {
    fn drop(&mut self) {
        if self.in_transaction() {
            match self.conn.execute_batch("ROLLBACK") {
                Ok(()) => tracing::warn!("rolled back uncommitted changes"),
                Err(e) => tracing::warn!(error = %e, "rollback on close failed"),
            }
        }
    }
}

fn sqlite_to_verdict(result: Option<bool>) -> Option<Verdict> {
    result.map(Verdict::from_correct)
}

fn test_from_row(row: &Row<'_>) -> rusqlite::Result<Test> {
    Ok(Test {
        id: TestId(row.get(0)?),
        created_at: row.get(1)?,
    })
}

fn not_found(entity: EntityKind, key: impl ToString) -> StoreError {
    StoreError::NotFound {
        entity,
        key: key.to_string(),
    }
}

impl Gateway for SqliteGateway {
    fn save_language(&mut self, name: &str) -> Result<LanguageId, StoreError> {
        self.begin()?;
        self.conn
            .execute("INSERT INTO languages (name) VALUES (?1)", [name])
            .map_err(|e| translate(EntityKind::Language, e, || Ok("name")))?;
        let id = LanguageId(self.conn.last_insert_rowid());
        tracing::debug!(%id, name, "staged language");
        Ok(id)
    }

    fn save_phrase(&mut self, value: &str) -> Result<PhraseId, StoreError> {
        self.begin()?;
        self.conn
            .execute("INSERT INTO phrases (value) VALUES (?1)", [value])
            .map_err(|e| translate(EntityKind::Phrase, e, || Ok("value")))?;
        let id = PhraseId(self.conn.last_insert_rowid());
        tracing::debug!(%id, value, "staged phrase");
        Ok(id)
    }

    fn save_pair(&mut self, pair: NewPair) -> Result<PairId, StoreError> {
        self.begin()?;
        self.conn
            .execute(
                "INSERT INTO pairs (first_phrase_id, first_language_id, second_phrase_id, second_language_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    pair.first_phrase.0,
                    pair.first_language.0,
                    pair.second_phrase.0,
                    pair.second_language.0
                ],
            )
            .map_err(|e| {
                translate(EntityKind::Pair, e, || {
                    Ok(if !self.exists(EntityKind::Phrase, pair.first_phrase.0)? {
                        "first_phrase_id"
                    } else if !self.exists(EntityKind::Language, pair.first_language.0)? {
                        "first_language_id"
                    } else if !self.exists(EntityKind::Phrase, pair.second_phrase.0)? {
                        "second_phrase_id"
                    } else {
                        "second_language_id"
                    })
                })
            })?;
        let id = PairId(self.conn.last_insert_rowid());
        tracing::debug!(%id, "staged pair");
        Ok(id)
    }

    fn save_test(&mut self, created_at: DateTime<Utc>) -> Result<TestId, StoreError> {
        self.begin()?;
        self.conn
            .execute("INSERT INTO tests (created_at) VALUES (?1)", [created_at])
            .map_err(|e| translate(EntityKind::Test, e, || Ok("created_at")))?;
        let id = TestId(self.conn.last_insert_rowid());
        tracing::debug!(%id, "staged test");
        Ok(id)
    }

    fn save_question(&mut self, question: NewQuestion) -> Result<QuestionId, StoreError> {
        self.begin()?;
        self.conn
            .execute(
                "INSERT INTO questions (pair_id, test_id, inverted) VALUES (?1, ?2, ?3)",
                params![
                    question.pair.0,
                    question.test.0,
                    question.direction.is_inverted()
                ],
            )
            .map_err(|e| {
                translate(EntityKind::Question, e, || {
                    Ok(if self.exists(EntityKind::Test, question.test.0)? {
                        "pair_id"
                    } else {
                        "test_id"
                    })
                })
            })?;
        let id = QuestionId(self.conn.last_insert_rowid());
        tracing::debug!(%id, pair = %question.pair, test = %question.test, direction = %question.direction, "staged question");
        Ok(id)
    }

    fn record_result(&mut self, question: QuestionId, verdict: Verdict) -> Result<(), StoreError> {
        self.begin()?;
        let changed = self
            .conn
            .execute(
                "UPDATE questions SET result = ?1 WHERE id = ?2 AND result IS NULL",
                params![verdict.is_correct(), question.0],
            )
            .map_err(backend)?;
        if changed == 0 {
            return Err(not_found(
                EntityKind::Question,
                format!("open question {question}"),
            ));
        }
        tracing::debug!(%question, %verdict, "staged result");
        Ok(())
    }

    fn find_language(&self, name: &str) -> Result<Option<Language>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, name FROM languages WHERE name = ?1",
                [name],
                |row| {
                    Ok(Language {
                        id: LanguageId(row.get(0)?),
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(backend)
    }

    fn find_phrase(&self, value: &str) -> Result<Option<Phrase>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, value FROM phrases WHERE value = ?1",
                [value],
                |row| {
                    Ok(Phrase {
                        id: PhraseId(row.get(0)?),
                        value: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(backend)
    }

    fn find_test(&self, id: TestId) -> Result<Test, StoreError> {
        self.conn
            .query_row(
                "SELECT id, created_at FROM tests WHERE id = ?1",
                [id.0],
                test_from_row,
            )
            .optional()
            .map_err(backend)?
            .ok_or_else(|| not_found(EntityKind::Test, id))
    }

    fn latest_test(&self) -> Result<Option<Test>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, created_at FROM tests ORDER BY id DESC LIMIT 1",
                [],
                test_from_row,
            )
            .optional()
            .map_err(backend)
    }

    fn pairs(&self) -> Result<Vec<Pair>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, first_phrase_id, first_language_id, second_phrase_id, second_language_id
                 FROM pairs ORDER BY id",
            )
            .map_err(backend)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Pair {
                    id: PairId(row.get(0)?),
                    first_phrase: PhraseId(row.get(1)?),
                    first_language: LanguageId(row.get(2)?),
                    second_phrase: PhraseId(row.get(3)?),
                    second_language: LanguageId(row.get(4)?),
                })
            })
            .map_err(backend)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(backend)
    }

    fn pair_views(&self) -> Result<Vec<PairView>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT p.id, fp.value, fl.name, sp.value, sl.name
                 FROM pairs p
                 JOIN phrases fp ON fp.id = p.first_phrase_id
                 JOIN languages fl ON fl.id = p.first_language_id
                 JOIN phrases sp ON sp.id = p.second_phrase_id
                 JOIN languages sl ON sl.id = p.second_language_id
                 ORDER BY p.id",
            )
            .map_err(backend)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PairView {
                    id: PairId(row.get(0)?),
                    first_phrase: row.get(1)?,
                    first_language: row.get(2)?,
                    second_phrase: row.get(3)?,
                    second_language: row.get(4)?,
                })
            })
            .map_err(backend)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(backend)
    }

    fn test_sheet(&self, test: TestId) -> Result<Vec<SheetEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT q.id, q.pair_id, q.inverted, q.result,
                        fp.value, fl.id, fl.name,
                        sp.value, sl.id, sl.name
                 FROM questions q
                 JOIN pairs p ON p.id = q.pair_id
                 JOIN phrases fp ON fp.id = p.first_phrase_id
                 JOIN languages fl ON fl.id = p.first_language_id
                 JOIN phrases sp ON sp.id = p.second_phrase_id
                 JOIN languages sl ON sl.id = p.second_language_id
                 WHERE q.test_id = ?1
                 ORDER BY q.id",
            )
            .map_err(backend)?;
        let rows = stmt
            .query_map([test.0], |row| {
                let first = (
                    row.get::<_, String>(4)?,
                    Language {
                        id: LanguageId(row.get(5)?),
                        name: row.get(6)?,
                    },
                );
                let second = (
                    row.get::<_, String>(7)?,
                    Language {
                        id: LanguageId(row.get(8)?),
                        name: row.get(9)?,
                    },
                );
                Ok(SheetEntry::from_sides(
                    QuestionId(row.get(0)?),
                    PairId(row.get(1)?),
                    Direction::from_inverted(row.get(2)?),
                    sqlite_to_verdict(row.get(3)?),
                    first,
                    second,
                ))
            })
            .map_err(backend)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(backend)
    }

    fn result_tallies(&self) -> Result<Vec<ResultTally>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT pair_id, inverted, result, COUNT(*)
                 FROM questions
                 WHERE result IS NOT NULL
                 GROUP BY pair_id, inverted, result
                 ORDER BY pair_id, inverted, result",
            )
            .map_err(backend)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ResultTally {
                    pair: PairId(row.get(0)?),
                    direction: Direction::from_inverted(row.get(1)?),
                    verdict: Verdict::from_correct(row.get(2)?),
                    count: row.get::<_, i64>(3)? as u64,
                })
            })
            .map_err(backend)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(backend)
    }

    fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table_name(kind));
        let n: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(backend)?;
        Ok(n as u64)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.in_transaction() {
            self.conn.execute_batch("COMMIT").map_err(backend)?;
            tracing::info!("committed");
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if self.in_transaction() {
            self.conn.execute_batch("ROLLBACK").map_err(backend)?;
            tracing::warn!("rolled back staged changes");
        }
        Ok(())
    }
}
