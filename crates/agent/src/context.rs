//! The opening user turn: the question plus the facts the model needs
//! before its first tool call.

use chrono::{Months, NaiveDate};
use pitchside_store::ColumnInfo;

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

/// "Columns: date (TEXT), home_team (TEXT), ..."
pub fn schema_summary(schema: &[ColumnInfo]) -> String {
    let columns: Vec<String> = schema
        .iter()
        .map(|c| format!("{} ({})", c.column_name, c.data_type))
        .collect();
    format!("Columns: {}", columns.join(", "))
}

fn month_number(word: &str) -> Option<u32> {
    let word = word.to_lowercase();
    if word.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(word.as_str()))
        .map(|i| i as u32 + 1)
}

/// First and last day of the first "<month> <year>" named in `text`
/// ("March 2025", "Sep 2024").
pub fn month_range(text: &str) -> Option<(NaiveDate, NaiveDate)> {
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    words.windows(2).find_map(|pair| {
        let month = month_number(pair[0])?;
        if pair[1].len() != 4 {
            return None;
        }
        let year: i32 = pair[1].parse().ok()?;
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
        Some((first, last))
    })
}

/// Build the first user message of a new conversation.
pub fn opening_message(question: &str, today: NaiveDate, data_source: &str, schema: &[ColumnInfo]) -> String {
    let mut message = format!(
        "{}\n\nToday's date: {}\nData source: {} (table 'input_data')\n{}",
        question.trim(),
        today.format("%Y-%m-%d"),
        data_source,
        schema_summary(schema)
    );
    if let Some((first, last)) = month_range(question) {
        message.push_str(&format!(
            "\nThe question refers to the period {} to {}.",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ));
    }
    message
}
