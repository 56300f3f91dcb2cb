//! Phrase-score spam detection on top of `ChainedHashMap`.
//!
//! The database is a two-column CSV (`phrase,score`). A message scores the
//! sum of every phrase occurrence; each match is replaced by `,` before
//! searching on, so a match is never counted twice or overlapped.

use crate::chained_hash_map::ChainedHashMap;
use crate::error::MapError;
use core::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

pub type Score = u32;
pub type Database = ChainedHashMap<String, Score>;
pub type Result<T> = std::result::Result<T, SpamError>;

pub const USAGE: &str = "Usage: SpamDetector <database path> <message path> <threshold>";
pub const INPUT_ERROR: &str = "Invalid input";

const SEPARATOR: char = ',';
const REPLACEMENT: &[u8] = b",";

#[derive(Error, Debug)]
pub enum SpamError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: expected `phrase,score` with a non-negative integer score")]
    MalformedRow { line: usize },

    #[error("line {line}: empty line in database")]
    EmptyLine { line: usize },

    #[error("threshold must be a positive integer")]
    InvalidThreshold,

    #[error(transparent)]
    Map(#[from] MapError),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    Spam,
    NotSpam,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Spam => "SPAM",
            Verdict::NotSpam => "NOT_SPAM",
        })
    }
}

/// A non-empty run of ASCII digits that fits a `Score`.
pub fn parse_score(s: &str) -> Option<Score> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Like `parse_score`, but zero is rejected.
pub fn parse_threshold(s: &str) -> Result<Score> {
    match parse_score(s) {
        Some(t) if t > 0 => Ok(t),
        _ => Err(SpamError::InvalidThreshold),
    }
}

/// Reads database rows into parallel `(phrases, scores)` vectors, in file
/// order. Phrases are lowercased. Empty `,`-separated tokens are skipped.
pub fn read_rows<R: BufRead>(reader: R) -> Result<(Vec<String>, Vec<Score>)> {
    let mut phrases = Vec::new();
    let mut scores = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        let lineno = i + 1;
        if line.is_empty() {
            return Err(SpamError::EmptyLine { line: lineno });
        }

        let mut tokens = line.split(SEPARATOR).filter(|t| !t.is_empty());
        let phrase = tokens
            .next()
            .ok_or(SpamError::MalformedRow { line: lineno })?;
        let score = tokens
            .next()
            .and_then(parse_score)
            .ok_or(SpamError::MalformedRow { line: lineno })?;
        if tokens.next().is_some() {
            return Err(SpamError::MalformedRow { line: lineno });
        }

        phrases.push(phrase.to_ascii_lowercase());
        scores.push(score);
    }
    Ok((phrases, scores))
}

/// Builds the phrase map. A repeated phrase keeps its last score.
pub fn load_database<R: BufRead>(reader: R) -> Result<Database> {
    let (phrases, scores) = read_rows(reader)?;
    let rows = phrases.len();
    let db = ChainedHashMap::from_parallel(phrases, scores)?;
    log::debug!("loaded {} phrases from {} rows", db.len(), rows);
    Ok(db)
}

pub fn load_database_file<P: AsRef<Path>>(path: P) -> Result<Database> {
    load_database(BufReader::new(File::open(path)?))
}

/// Byte offset of the first `needle` in `haystack` at or after `from`.
fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| from + pos)
}

/// Score of a single line against `db`, in the map's iteration order.
/// The line is raw bytes: only ASCII letters are case-folded and any other
/// byte is matched as-is.
pub fn score_line(line: &[u8], db: &Database) -> u64 {
    let mut line = line.to_vec();
    line.make_ascii_lowercase();
    let mut total: u64 = 0;
    for (phrase, &score) in db {
        let phrase = phrase.as_bytes();
        if phrase.is_empty() {
            continue;
        }
        let mut from = 0;
        while let Some(at) = find_from(&line, phrase, from) {
            line.splice(at..at + phrase.len(), REPLACEMENT.iter().copied());
            total = total.saturating_add(u64::from(score));
            from = at;
        }
    }
    total
}

/// Total score of every non-empty line read from `reader`. Lines are split
/// on `\n` and need not be UTF-8.
pub fn score_message<R: BufRead>(reader: R, db: &Database) -> Result<u64> {
    let mut total: u64 = 0;
    for line in reader.split(b'\n') {
        let line = line?;
        let line = line.strip_suffix(b"\r").unwrap_or(&line);
        if !line.is_empty() {
            total = total.saturating_add(score_line(line, db));
        }
    }
    Ok(total)
}

pub fn score_message_file<P: AsRef<Path>>(path: P, db: &Database) -> Result<u64> {
    score_message(BufReader::new(File::open(path)?), db)
}

pub fn classify(score: u64, threshold: Score) -> Verdict {
    if score >= u64::from(threshold) {
        Verdict::Spam
    } else {
        Verdict::NotSpam
    }
}
