//! The `memo ranking` command.

use std::collections::HashMap;

use anyhow::Result;
use comfy_table::{Cell, Table};
use memo_core::gateway::Gateway;
use memo_core::model::{Direction, PairView};
use memo_core::scoring::rank_from_gateway;

use super::Globals;

/// `prompt (source) → answer (target)` for one direction of a pair.
fn describe(pair: &PairView, direction: Direction) -> String {
    let (asked, asked_in, answer, answer_in) = match direction {
        Direction::Normal => (
            &pair.first_phrase,
            &pair.first_language,
            &pair.second_phrase,
            &pair.second_language,
        ),
        Direction::Inverted => (
            &pair.second_phrase,
            &pair.second_language,
            &pair.first_phrase,
            &pair.first_language,
        ),
    };
    format!("{asked} ({asked_in}) → {answer} ({answer_in})")
}

pub fn execute(globals: &Globals, limit: Option<usize>) -> Result<()> {
    let (_, store) = globals.open()?;
    let candidates = rank_from_gateway(&store)?;

    if candidates.is_empty() {
        println!("No pairs yet. Add one with `memo add-pair`.");
        return Ok(());
    }

    let views: HashMap<_, _> = store
        .pair_views()?
        .into_iter()
        .map(|view| (view.id, view))
        .collect();

    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Wrong", "Right", "Ratio"]);
    let shown = limit.unwrap_or(candidates.len());
    for (rank, candidate) in candidates.iter().take(shown).enumerate() {
        let question = views
            .get(&candidate.pair)
            .map(|view| describe(view, candidate.direction))
            .unwrap_or_else(|| format!("pair {} ({})", candidate.pair, candidate.direction));
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(question),
            Cell::new(candidate.counts.wrong),
            Cell::new(candidate.counts.right),
            Cell::new(format!(
                "{} ({:.2})",
                candidate.ratio,
                candidate.ratio.value()
            )),
        ]);
    }
    println!("{table}");
    Ok(())
}
