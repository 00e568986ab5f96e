//! Translation of SQLite failures into [`StoreError`].
//!
//! Constraint violations are told apart by their extended result code.

use memo_core::error::StoreError;
use memo_core::model::EntityKind;
use rusqlite::{ffi, ErrorCode};

/// Which kind of constraint rejected a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    /// UNIQUE, PRIMARY KEY, or a trigger raising ABORT.
    Duplicate,
    /// NOT NULL or FOREIGN KEY.
    MissingReference,
}

pub(crate) fn classify(err: &rusqlite::Error) -> Option<Violation> {
    let rusqlite::Error::SqliteFailure(failure, _) = err else {
        return None;
    };
    if failure.code != ErrorCode::ConstraintViolation {
        return None;
    }
    match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_UNIQUE
        | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        | ffi::SQLITE_CONSTRAINT_TRIGGER => Some(Violation::Duplicate),
        ffi::SQLITE_CONSTRAINT_NOTNULL | ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
            Some(Violation::MissingReference)
        }
        _ => None,
    }
}

pub(crate) fn backend(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Map an insert failure on `entity`. `field` names the reference that is
/// missing when the failure is a NOT NULL or FOREIGN KEY violation; if that
/// lookup fails itself, its error is returned instead.
pub(crate) fn translate(
    entity: EntityKind,
    err: rusqlite::Error,
    field: impl FnOnce() -> Result<&'static str, StoreError>,
) -> StoreError {
    match classify(&err) {
        Some(Violation::Duplicate) => StoreError::DuplicateEntity { entity },
        Some(Violation::MissingReference) => match field() {
            Ok(field) => StoreError::MissingRequiredField { entity, field },
            Err(lookup) => lookup,
        },
        None => backend(err),
    }
}
