//! memo CLI, the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use memo_core::model::TestId;

mod commands;

#[derive(Parser)]
#[command(
    name = "memo",
    version,
    about = "Vocabulary tutor that asks most about the words you miss"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides config and MEMO_DATABASE)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter memo.toml
    Init,

    /// Add a translation pair
    AddPair {
        /// First side as "language:phrase", e.g. "polski:wąż"
        #[arg(long)]
        first: String,

        /// Second side as "language:phrase", e.g. "español:serpiente"
        #[arg(long)]
        second: String,
    },

    /// List all pairs
    Pairs,

    /// Show pairs ranked by how often they were missed
    Ranking {
        /// Show only the first N candidates
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Create a new test from the most missed pairs
    Prepare {
        /// Maximum number of questions (default: from config)
        #[arg(long)]
        questions: Option<usize>,

        /// Write the test to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print a test again
    Show {
        /// Test to print (default: latest)
        #[arg(long)]
        test: Option<TestId>,
    },

    /// Grade a filled-in test
    Grade {
        /// Reply file (default: stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Test to grade (default: the reply's Test ID line, then latest)
        #[arg(long)]
        test: Option<TestId>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Also save the report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("memo=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let globals = commands::Globals {
        config: cli.config,
        database: cli.database,
    };

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::AddPair { first, second } => {
            commands::add_pair::execute(&globals, &first, &second)
        }
        Commands::Pairs => commands::pairs::execute(&globals),
        Commands::Ranking { limit } => commands::ranking::execute(&globals, limit),
        Commands::Prepare { questions, output } => {
            commands::prepare::execute(&globals, questions, output)
        }
        Commands::Show { test } => commands::show::execute(&globals, test),
        Commands::Grade {
            input,
            test,
            format,
            report,
        } => commands::grade::execute(&globals, input, test, format, report),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
