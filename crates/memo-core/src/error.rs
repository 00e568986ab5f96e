//! Typed error taxonomy.
//!
//! Storage errors are produced by the gateway implementation from structured
//! driver codes, so callers can tell a duplicate from a missing reference
//! without inspecting message text.

use std::fmt;

use thiserror::Error;

use crate::model::EntityKind;

/// Errors reported by a [`Gateway`](crate::gateway::Gateway).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness invariant was violated (including a swapped pair).
    #[error("duplicate {entity}")]
    DuplicateEntity { entity: EntityKind },

    /// A required reference was null or pointed at nothing.
    #[error("{entity} is missing required field `{field}`")]
    MissingRequiredField {
        entity: EntityKind,
        field: &'static str,
    },

    /// A lookup that expected exactly one record found none.
    #[error("{entity} not found: {key}")]
    NotFound { entity: EntityKind, key: String },

    /// Any other storage failure.
    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` for constraint violations a caller may skip or report.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateEntity { .. } | StoreError::MissingRequiredField { .. }
        )
    }
}

/// Why a reply line did not fit the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// An answer line appeared before any language header.
    AnswerOutsideSection,
    /// An unindented line that is neither a header nor a test id.
    UnrecognizedLine,
    /// An indented line without `=`.
    MissingEquals,
    /// An answer line with nothing before `=`.
    EmptyPrompt,
    /// A header whose language names are empty or lack the arrow.
    InvalidHeader,
    /// A `Test ID:` line that is out of place, repeated or not a number.
    InvalidTestId,
    /// The same question was answered twice in one reply.
    DuplicateAnswer,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MalformedReason::AnswerOutsideSection => "answer line outside a language section",
            MalformedReason::UnrecognizedLine => "unrecognized line",
            MalformedReason::MissingEquals => "answer line without `=`",
            MalformedReason::EmptyPrompt => "answer line without a prompt",
            MalformedReason::InvalidHeader => "invalid language header",
            MalformedReason::InvalidTestId => "invalid test id line",
            MalformedReason::DuplicateAnswer => "question answered twice",
        };
        f.write_str(text)
    }
}

/// Errors raised while parsing or grading a reply.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("malformed reply at line {line}: {reason}: {content:?}")]
    Malformed {
        line: usize,
        content: String,
        reason: MalformedReason,
    },

    /// The prompt and direction are not an open question of the test.
    #[error("malformed reply at line {line}: no open question {prompt:?} ({source_language} → {target_language})")]
    UnknownQuestion {
        line: usize,
        prompt: String,
        source_language: String,
        target_language: String,
    },
}

impl ReplyError {
    /// Both variants are malformed replies; `UnknownQuestion` is the
    /// specialization for lines that parse but match nothing.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ReplyError::Malformed { .. } | ReplyError::UnknownQuestion { .. }
        )
    }

    /// 1-based number of the offending line.
    pub fn line(&self) -> usize {
        match self {
            ReplyError::Malformed { line, .. } | ReplyError::UnknownQuestion { line, .. } => *line,
        }
    }
}

/// Why a language name or phrase cannot be stored.
///
/// Every stored value is printed into a rendered test, so it must survive
/// being parsed back from a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTextReason {
    /// Nothing left after trimming.
    Empty,
    /// An `=` would split the answer line at the wrong place.
    ContainsEquals,
    /// A line break would split the line.
    ContainsLineBreak,
    /// An arrow in a language name breaks the section header.
    ContainsArrow,
    /// A language name ending in `:` breaks the section header.
    TrailingColon,
    /// A language name that reads as a `Test ID:` line.
    TestIdPrefix,
}

impl fmt::Display for InvalidTextReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InvalidTextReason::Empty => "empty",
            InvalidTextReason::ContainsEquals => "contains `=`",
            InvalidTextReason::ContainsLineBreak => "contains a line break",
            InvalidTextReason::ContainsArrow => "contains `→`",
            InvalidTextReason::TrailingColon => "ends with `:`",
            InvalidTextReason::TestIdPrefix => "starts with `Test ID:`",
        };
        f.write_str(text)
    }
}

/// Errors from operations that both read replies and touch storage.
#[derive(Debug, Error)]
pub enum MemoError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reply(#[from] ReplyError),

    /// The reply names a different test than the one being graded.
    #[error("reply is for test {found}, expected test {expected}")]
    TestMismatch { expected: i64, found: i64 },

    /// A language name or phrase that a rendered test could not carry.
    #[error("invalid {entity} {value:?}: {reason}")]
    InvalidText {
        entity: EntityKind,
        value: String,
        reason: InvalidTextReason,
    },
}
