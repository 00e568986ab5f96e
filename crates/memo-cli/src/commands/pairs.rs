//! The `memo pairs` command.

use anyhow::Result;
use comfy_table::{Cell, Table};
use memo_core::gateway::Gateway;

use super::Globals;

pub fn execute(globals: &Globals) -> Result<()> {
    let (_, store) = globals.open()?;
    let pairs = store.pair_views()?;

    if pairs.is_empty() {
        println!("No pairs yet. Add one with `memo add-pair`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "First", "Language", "Second", "Language"]);
    for pair in &pairs {
        table.add_row(vec![
            Cell::new(pair.id),
            Cell::new(&pair.first_phrase),
            Cell::new(&pair.first_language),
            Cell::new(&pair.second_phrase),
            Cell::new(&pair.second_language),
        ]);
    }
    println!("{table}");
    Ok(())
}
