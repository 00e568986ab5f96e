//! Database schema: one DDL block per entity, applied in dependency order.

use memo_core::model::EntityKind;
use rusqlite::Connection;

const LANGUAGES: &str = r#"
CREATE TABLE IF NOT EXISTS languages (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
"#;

const PHRASES: &str = r#"
CREATE TABLE IF NOT EXISTS phrases (
    id INTEGER PRIMARY KEY,
    value TEXT NOT NULL UNIQUE
);
"#;

// A pair and its swapped form are the same logical pair. The unique
// constraint catches exact repeats, the trigger catches the swapped form.
const PAIRS: &str = r#"
CREATE TABLE IF NOT EXISTS pairs (
    id INTEGER PRIMARY KEY,
    first_phrase_id INTEGER NOT NULL REFERENCES phrases(id),
    first_language_id INTEGER NOT NULL REFERENCES languages(id),
    second_phrase_id INTEGER NOT NULL REFERENCES phrases(id),
    second_language_id INTEGER NOT NULL REFERENCES languages(id),
    UNIQUE(first_phrase_id, first_language_id, second_phrase_id, second_language_id)
);

CREATE TRIGGER IF NOT EXISTS pairs_reject_swapped
BEFORE INSERT ON pairs
WHEN EXISTS (
    SELECT 1 FROM pairs
    WHERE first_phrase_id = NEW.second_phrase_id
      AND first_language_id = NEW.second_language_id
      AND second_phrase_id = NEW.first_phrase_id
      AND second_language_id = NEW.first_language_id
)
BEGIN
    SELECT RAISE(ABORT, 'pair already exists in swapped form');
END;
"#;

const TESTS: &str = r#"
CREATE TABLE IF NOT EXISTS tests (
    id INTEGER PRIMARY KEY,
    created_at TEXT NOT NULL
);
"#;

// result: NULL while open, 1 correct, 0 incorrect.
const QUESTIONS: &str = r#"
CREATE TABLE IF NOT EXISTS questions (
    id INTEGER PRIMARY KEY,
    pair_id INTEGER NOT NULL REFERENCES pairs(id),
    test_id INTEGER NOT NULL REFERENCES tests(id),
    inverted INTEGER NOT NULL DEFAULT 0 CHECK (inverted IN (0, 1)),
    result INTEGER CHECK (result IN (0, 1)),
    UNIQUE(pair_id, test_id, inverted)
);

CREATE INDEX IF NOT EXISTS idx_questions_test ON questions(test_id);
CREATE INDEX IF NOT EXISTS idx_questions_graded ON questions(pair_id, inverted)
    WHERE result IS NOT NULL;
"#;

/// Every table, in the order it must be created.
pub const TABLES: &[(EntityKind, &str, &str)] = &[
    (EntityKind::Language, "languages", LANGUAGES),
    (EntityKind::Phrase, "phrases", PHRASES),
    (EntityKind::Pair, "pairs", PAIRS),
    (EntityKind::Test, "tests", TESTS),
    (EntityKind::Question, "questions", QUESTIONS),
];

/// Name of the table holding `kind`.
pub fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Language => "languages",
        EntityKind::Phrase => "phrases",
        EntityKind::Pair => "pairs",
        EntityKind::Test => "tests",
        EntityKind::Question => "questions",
    }
}

/// Connection settings applied before the schema. Foreign keys are off by
/// default in SQLite and cannot be switched inside a transaction.
pub fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )
}

/// Create any missing tables.
pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    for (kind, table, sql) in TABLES {
        conn.execute_batch(sql)?;
        tracing::debug!(entity = %kind, table, "ensured table");
    }
    Ok(())
}
