//! The `memo show` command.

use anyhow::Result;
use memo_core::gateway::Gateway;
use memo_core::model::TestId;
use memo_core::render::render_test;

use super::{select_test, Globals};

pub fn execute(globals: &Globals, test: Option<TestId>) -> Result<()> {
    let (_, store) = globals.open()?;
    let test = select_test(&store, test)?;
    let sheet = store.test_sheet(test.id)?;
    print!("{}", render_test(test.id, &sheet));
    Ok(())
}
