//! The `memo add-pair` command.

use anyhow::{bail, Context, Result};
use memo_core::gateway::Gateway;
use memo_core::vocabulary::add_pair;

use super::Globals;

/// Split `language:phrase` at the first colon.
fn parse_side(side: &str) -> Result<(&str, &str)> {
    let Some((language, phrase)) = side.split_once(':') else {
        bail!("expected language:phrase, got {side:?}");
    };
    let (language, phrase) = (language.trim(), phrase.trim());
    if language.is_empty() || phrase.is_empty() {
        bail!("expected language:phrase, got {side:?}");
    }
    Ok((language, phrase))
}

pub fn execute(globals: &Globals, first: &str, second: &str) -> Result<()> {
    let first = parse_side(first)?;
    let second = parse_side(second)?;

    let (_, mut store) = globals.open()?;
    let id = match add_pair(&mut store, first, second) {
        Ok(id) => id,
        Err(e) => {
            store.rollback()?;
            return Err(e).context("failed to add pair");
        }
    };
    store.commit().context("failed to save pair")?;

    println!(
        "Added pair {id}: {} ({}) = {} ({})",
        first.1, first.0, second.1, second.0
    );
    Ok(())
}
