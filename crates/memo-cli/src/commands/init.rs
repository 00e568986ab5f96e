//! The `memo init` command.

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    if std::path::Path::new("memo.toml").exists() {
        println!("memo.toml already exists, skipping.");
    } else {
        std::fs::write("memo.toml", SAMPLE_CONFIG).context("failed to write memo.toml")?;
        println!("Created memo.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: memo add-pair --first polski:wąż --second español:serpiente");
    println!("  2. Run: memo prepare --output test.txt");
    println!("  3. Fill in the answers, then run: memo grade --input test.txt");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# memo configuration

# SQLite database file. ${VAR} references are expanded.
database = "${HOME}/.memo/db"

# Maximum number of questions in a new test.
questions_per_test = 20

# Accept answers that differ only in letter case.
ignore_case = false
"#;
