//! Core data model types for memo.
//!
//! Languages, phrases and pairs are reference data. Tests and their questions
//! are created when a quiz is prepared and graded when a reply comes back.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Row id of a [`Language`].
    LanguageId
);
entity_id!(
    /// Row id of a [`Phrase`].
    PhraseId
);
entity_id!(
    /// Row id of a [`Pair`].
    PairId
);
entity_id!(
    /// Row id of a [`Test`].
    TestId
);
entity_id!(
    /// Row id of a [`Question`].
    QuestionId
);

impl FromStr for TestId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(TestId)
            .map_err(|_| format!("invalid test id: {s}"))
    }
}

/// A language, e.g. "polski".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: LanguageId,
    pub name: String,
}

/// A single word or expression in some language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    pub id: PhraseId,
    pub value: String,
}

/// A translation between two (phrase, language) tuples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub id: PairId,
    pub first_phrase: PhraseId,
    pub first_language: LanguageId,
    pub second_phrase: PhraseId,
    pub second_language: LanguageId,
}

/// A pair that has not been stored yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewPair {
    pub first_phrase: PhraseId,
    pub first_language: LanguageId,
    pub second_phrase: PhraseId,
    pub second_language: LanguageId,
}

impl NewPair {
    /// The same pair with its sides exchanged.
    pub fn swapped(self) -> Self {
        Self {
            first_phrase: self.second_phrase,
            first_language: self.second_language,
            second_phrase: self.first_phrase,
            second_language: self.first_language,
        }
    }
}

/// A pair joined with the text of its phrases and languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairView {
    pub id: PairId,
    pub first_phrase: String,
    pub first_language: String,
    pub second_phrase: String,
    pub second_language: String,
}

/// Which way a question asks about its pair.
///
/// `Normal` shows the first phrase and expects the second one. `Inverted`
/// shows the second phrase and expects the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Normal,
    Inverted,
}

impl Direction {
    /// Both directions, in enumeration order.
    pub const ALL: [Direction; 2] = [Direction::Normal, Direction::Inverted];

    pub fn from_inverted(inverted: bool) -> Self {
        if inverted {
            Direction::Inverted
        } else {
            Direction::Normal
        }
    }

    pub fn is_inverted(self) -> bool {
        self == Direction::Inverted
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Normal => write!(f, "normal"),
            Direction::Inverted => write!(f, "inverted"),
        }
    }
}

/// The recorded outcome of a question. A question without a verdict is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }

    pub fn is_correct(self) -> bool {
        self == Verdict::Correct
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Correct => write!(f, "correct"),
            Verdict::Incorrect => write!(f, "incorrect"),
        }
    }
}

/// One quiz session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    pub id: TestId,
    pub created_at: DateTime<Utc>,
}

/// A single prompt within a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub pair: PairId,
    pub test: TestId,
    pub direction: Direction,
    pub result: Option<Verdict>,
}

/// A question that has not been stored yet. Its result starts unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewQuestion {
    pub pair: PairId,
    pub test: TestId,
    pub direction: Direction,
}

/// A question joined with everything needed to ask and grade it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetEntry {
    pub question: QuestionId,
    pub pair: PairId,
    pub direction: Direction,
    /// Phrase shown to the user.
    pub prompt: String,
    /// Phrase the user is expected to write back.
    pub expected: String,
    pub source_language: Language,
    pub target_language: Language,
    pub result: Option<Verdict>,
}

impl SheetEntry {
    /// Build an entry from the two sides of its pair, each given as
    /// `(phrase, language)`. The direction decides which side is asked.
    pub fn from_sides(
        question: QuestionId,
        pair: PairId,
        direction: Direction,
        result: Option<Verdict>,
        first: (String, Language),
        second: (String, Language),
    ) -> Self {
        let (asked, answered) = match direction {
            Direction::Normal => (first, second),
            Direction::Inverted => (second, first),
        };
        Self {
            question,
            pair,
            direction,
            prompt: asked.0,
            expected: answered.0,
            source_language: asked.1,
            target_language: answered.1,
            result,
        }
    }

    /// Grouping key: `(source_language_id, target_language_id)` of the
    /// direction actually being asked.
    pub fn key(&self) -> (LanguageId, LanguageId) {
        (self.source_language.id, self.target_language.id)
    }

    pub fn is_open(&self) -> bool {
        self.result.is_none()
    }
}

/// Number of graded questions on one (pair, direction) with one verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTally {
    pub pair: PairId,
    pub direction: Direction,
    pub verdict: Verdict,
    pub count: u64,
}

/// Entity kinds known to the storage gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Language,
    Phrase,
    Pair,
    Test,
    Question,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Language,
        EntityKind::Phrase,
        EntityKind::Pair,
        EntityKind::Test,
        EntityKind::Question,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Language => "language",
            EntityKind::Phrase => "phrase",
            EntityKind::Pair => "pair",
            EntityKind::Test => "test",
            EntityKind::Question => "question",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
