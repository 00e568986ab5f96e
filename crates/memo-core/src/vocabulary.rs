//! Adding phrase pairs.
//!
//! Language names and phrases are trimmed and checked before they are stored,
//! so every pair can be rendered into a test and read back from a reply.

use crate::error::{InvalidTextReason, MemoError};
use crate::gateway::Gateway;
use crate::model::{EntityKind, LanguageId, NewPair, PairId, PhraseId};
use crate::render::{ARROW, TEST_ID_PREFIX};

fn check_line_text(entity: EntityKind, raw: &str) -> Result<&str, MemoError> {
    let value = raw.trim();
    let reason = if value.is_empty() {
        Some(InvalidTextReason::Empty)
    } else if value.contains(['\n', '\r']) {
        Some(InvalidTextReason::ContainsLineBreak)
    } else if value.contains('=') {
        Some(InvalidTextReason::ContainsEquals)
    } else {
        None
    };
    match reason {
        Some(reason) => Err(MemoError::InvalidText {
            entity,
            value: raw.to_string(),
            reason,
        }),
        None => Ok(value),
    }
}

/// Trim a language name and make sure it fits in a section header.
pub fn check_language(raw: &str) -> Result<&str, MemoError> {
    let name = check_line_text(EntityKind::Language, raw)?;
    let reason = if name.contains(ARROW) {
        InvalidTextReason::ContainsArrow
    } else if name.ends_with(':') {
        InvalidTextReason::TrailingColon
    } else if name.starts_with(TEST_ID_PREFIX) {
        InvalidTextReason::TestIdPrefix
    } else {
        return Ok(name);
    };
    Err(MemoError::InvalidText {
        entity: EntityKind::Language,
        value: raw.to_string(),
        reason,
    })
}

/// Trim a phrase and make sure it fits in an answer line.
pub fn check_phrase(raw: &str) -> Result<&str, MemoError> {
    check_line_text(EntityKind::Phrase, raw)
}

/// Look a language up by name, staging it if it does not exist yet.
pub fn language_id<G: Gateway + ?Sized>(gateway: &mut G, name: &str) -> Result<LanguageId, MemoError> {
    let name = check_language(name)?;
    let id = match gateway.find_language(name)? {
        Some(language) => language.id,
        None => gateway.save_language(name)?,
    };
    Ok(id)
}

/// Look a phrase up by value, staging it if it does not exist yet.
pub fn phrase_id<G: Gateway + ?Sized>(gateway: &mut G, value: &str) -> Result<PhraseId, MemoError> {
    let value = check_phrase(value)?;
    let id = match gateway.find_phrase(value)? {
        Some(phrase) => phrase.id,
        None => gateway.save_phrase(value)?,
    };
    Ok(id)
}

/// Stage a pair between two `(language, phrase)` tuples.
///
/// Every value is checked before anything is staged. Languages and phrases
/// are created on first use. Does not commit.
pub fn add_pair<G: Gateway + ?Sized>(
    gateway: &mut G,
    first: (&str, &str),
    second: (&str, &str),
) -> Result<PairId, MemoError> {
    let first = (check_language(first.0)?, check_phrase(first.1)?);
    let second = (check_language(second.0)?, check_phrase(second.1)?);
    let pair = NewPair {
        first_language: language_id(gateway, first.0)?,
        first_phrase: phrase_id(gateway, first.1)?,
        second_language: language_id(gateway, second.0)?,
        second_phrase: phrase_id(gateway, second.1)?,
    };
    let id = gateway.save_pair(pair)?;
    tracing::debug!(pair = %id, first = first.1, second = second.1, "staged pair");
    Ok(id)
}
