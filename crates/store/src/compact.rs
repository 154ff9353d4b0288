//! Token-lean renderings of match lists.

use crate::matches::MatchRecord;
use pitchside_core::error::StoreError;
use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;

/// Output layout for compacted match data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompactFormat {
    /// Matches grouped under `===== date =====` headers
    #[default]
    Compact,
    /// Fixed-width columns
    Table,
    Csv,
}

impl FromStr for CompactFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "table" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            other => Err(StoreError::Invalid(format!(
                "unknown format '{other}', expected compact, table or csv"
            ))),
        }
    }
}

fn score(record: &MatchRecord) -> Option<String> {
    match (record.home_score, record.away_score) {
        (Some(h), Some(a)) => Some(format!("{h}-{a}")),
        _ => None,
    }
}

fn match_line(record: &MatchRecord) -> String {
    let mut line = match score(record) {
        Some(s) => format!("{} {} {}", record.home_team, s, record.away_team),
        None => format!("{} vs {}", record.home_team, record.away_team),
    };
    if let Some(league) = record.league.as_deref().filter(|l| !l.is_empty()) {
        let _ = write!(line, " ({league})");
    }
    line
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render `records` (already ordered) in the given format.
pub fn render(format: CompactFormat, records: &[MatchRecord]) -> String {
    let mut out = String::new();
    match format {
        CompactFormat::Compact => {
            let mut current: Option<&str> = None;
            for record in records {
                let day = record.day();
                if current != Some(day) {
                    if current.is_some() {
                        out.push('\n');
                    }
                    let _ = writeln!(out, "===== {day} =====");
                    current = Some(day);
                }
                let _ = writeln!(out, "{}", match_line(record));
            }
        }
        CompactFormat::Table => {
            let home_w = records.iter().map(|r| r.home_team.len()).max().unwrap_or(0).max(4);
            let away_w = records.iter().map(|r| r.away_team.len()).max().unwrap_or(0).max(4);
            let _ = writeln!(out, "{:<10}  {:<home_w$}  {:^5}  {:<away_w$}  League", "Date", "Home", "Score", "Away");
            for r in records {
                let _ = writeln!(
                    out,
                    "{:<10}  {:<home_w$}  {:^5}  {:<away_w$}  {}",
                    r.day(),
                    r.home_team,
                    score(r).unwrap_or_else(|| "-".into()),
                    r.away_team,
                    r.league.as_deref().unwrap_or("")
                );
            }
        }
        CompactFormat::Csv => {
            out.push_str("date,home_team,home_score,away_score,away_team,league\n");
            for r in records {
                let _ = writeln!(
                    out,
                    "{},{},{},{},{},{}",
                    r.day(),
                    csv_field(&r.home_team),
                    r.home_score.map(|s| s.to_string()).unwrap_or_default(),
                    r.away_score.map(|s| s.to_string()).unwrap_or_default(),
                    csv_field(&r.away_team),
                    csv_field(r.league.as_deref().unwrap_or(""))
                );
            }
        }
    }
    out
}

/// A compacted dataset with size accounting.
#[derive(Debug, Clone, Serialize)]
pub struct CompactReport {
    pub row_count: usize,
    pub original_size_bytes: u64,
    pub compact_size_bytes: u64,
    /// `original / compact`, two decimals
    pub compression_ratio: f64,
    pub result: String,
}

impl CompactReport {
    pub fn build(records: &[MatchRecord], original_size_bytes: u64, format: CompactFormat) -> Self {
        let result = render(format, records);
        let compact_size_bytes = result.len() as u64;
        let compression_ratio = if compact_size_bytes == 0 {
            0.0
        } else {
            (original_size_bytes as f64 / compact_size_bytes as f64 * 100.0).round() / 100.0
        };
        Self {
            row_count: records.len(),
            original_size_bytes,
            compact_size_bytes,
            compression_ratio,
            result,
        }
    }
}
