//! Scores a message against a phrase database and prints `SPAM` or
//! `NOT_SPAM`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use chained_hashmap::spam::{self, Verdict, INPUT_ERROR, USAGE};

/// Phrase-score spam detector
#[derive(Parser, Debug)]
#[command(name = "SpamDetector")]
#[command(version)]
#[command(about = "Classifies a message as SPAM or NOT_SPAM using a phrase,score database")]
struct Args {
    /// CSV of `phrase,score` rows
    #[arg(allow_hyphen_values = true)]
    database: PathBuf,

    /// Message to score, one line at a time
    #[arg(allow_hyphen_values = true)]
    message: PathBuf,

    /// Minimum score for a SPAM verdict (positive integer)
    #[arg(allow_hyphen_values = true)]
    threshold: String,
}

fn run(args: &Args) -> spam::Result<Verdict> {
    let threshold = spam::parse_threshold(&args.threshold)?;
    let db = spam::load_database_file(&args.database)?;
    let score = spam::score_message_file(&args.message, &db)?;
    log::debug!(
        "{} phrases, score {} against threshold {}",
        db.len(),
        score,
        threshold
    );
    Ok(spam::classify(score, threshold))
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(verdict) => {
            println!("{verdict}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::debug!("rejected input: {e}");
            eprintln!("{INPUT_ERROR}");
            ExitCode::FAILURE
        }
    }
}
