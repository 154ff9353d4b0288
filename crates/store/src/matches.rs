//! The match dataset.
//!
//! A dataset file (JSON lines, or one JSON array) is loaded into an
//! in-memory SQLite table named `input_data`. After loading, the connection
//! is switched to `query_only`, so ad-hoc SQL from the model cannot change
//! the data. Team and date filters are always bound parameters.

use chrono::{DateTime, NaiveDate};
use pitchside_core::error::StoreError;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, QueryBuilder, Row, Sqlite, SqlitePool, TypeInfo, ValueRef};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Name of the table every query runs against.
pub const TABLE_NAME: &str = "input_data";

const MATCH_COLUMNS: &str = "date, home_team, away_team, home_score, away_score, league";
const DEFAULT_MAX_ROWS: usize = 200;

/// One match row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// `YYYY-MM-DD`, optionally followed by a time
    #[serde(deserialize_with = "de_date")]
    pub date: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default, deserialize_with = "de_score")]
    pub home_score: Option<i64>,
    #[serde(default, deserialize_with = "de_score")]
    pub away_score: Option<i64>,
    #[serde(default)]
    pub league: Option<String>,
}

impl MatchRecord {
    /// The calendar day part of `date`.
    pub fn day(&self) -> &str {
        self.date.get(..10).unwrap_or(&self.date)
    }

    /// Both scores are known.
    pub fn is_played(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }
}

/// Dates arrive either as strings or as epoch milliseconds.
fn de_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    use serde::de::Error;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {n}"))),
        other => Err(D::Error::custom(format!("invalid date: {other}"))),
    }
}

/// Scores may be integers, floats (`2.0`), numeric strings, or null.
fn de_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    use serde::de::Error;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid score: {n}"))),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid score: {s}"))),
        other => Err(D::Error::custom(format!("invalid score: {other}"))),
    }
}

/// Parse a dataset file body. Malformed JSON lines are skipped with a warning.
pub fn parse_records(content: &str) -> Result<Vec<MatchRecord>, String> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| e.to_string());
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<MatchRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(line = i + 1, error = %e, "Skipping malformed match record");
                skipped += 1;
            }
        }
    }

    if records.is_empty() && skipped > 0 {
        return Err(format!("no valid match records ({skipped} malformed lines)"));
    }
    Ok(records)
}

/// A column of `input_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
}

/// Rows returned by an ad-hoc query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    /// Rows the query produced, before the cap
    pub row_count: usize,
    pub truncated: bool,
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, StoreError> {
        if start > end {
            return Err(StoreError::Invalid(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, StoreError> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| StoreError::Invalid(format!("invalid date '{s}', expected YYYY-MM-DD")))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn contains(&self, day: &str) -> bool {
        NaiveDate::parse_from_str(day.get(..10).unwrap_or(day), "%Y-%m-%d")
            .map(|d| d >= self.start && d <= self.end)
            .unwrap_or(false)
    }

    fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Which team names count as "ours".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamFilter {
    /// Any of these names exactly (team groups)
    Exact(Vec<String>),
    /// Case-insensitive substring, so "Team" also matches "Team (1)"
    Contains(String),
}

impl TeamFilter {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(names) => names.iter().any(|n| n == name),
            Self::Contains(fragment) => name.to_lowercase().contains(&fragment.to_lowercase()),
        }
    }

    fn push_condition(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Self::Exact(names) if names.is_empty() => {
                qb.push("0");
            }
            Self::Exact(names) => {
                qb.push("(home_team IN (");
                push_list(qb, names);
                qb.push(") OR away_team IN (");
                push_list(qb, names);
                qb.push("))");
            }
            Self::Contains(fragment) => {
                let pattern = format!("%{}%", escape_like(fragment));
                qb.push("(home_team LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\' OR away_team LIKE ")
                    .push_bind(pattern)
                    .push(" ESCAPE '\\')");
            }
        }
    }
}

impl std::fmt::Display for TeamFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(names) => write!(f, "{}", names.join(", ")),
            Self::Contains(fragment) => write!(f, "{fragment}"),
        }
    }
}

fn push_list(qb: &mut QueryBuilder<'_, Sqlite>, names: &[String]) {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push_bind(name.clone());
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Accept exactly one read-only statement and return it without the trailing `;`.
fn read_only_statement(sql: &str) -> Result<&str, StoreError> {
    let statement = sql.trim().trim_end_matches(';').trim_end();
    if statement.is_empty() {
        return Err(StoreError::Invalid("empty query".into()));
    }
    if has_statement_separator(statement) {
        return Err(StoreError::Invalid("only a single statement is allowed".into()));
    }
    let keyword: String = statement
        .trim_start_matches('(')
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();
    if !matches!(keyword.as_str(), "select" | "with" | "values") {
        return Err(StoreError::Invalid(format!(
            "only read-only queries (SELECT or WITH) are allowed, got '{keyword}'"
        )));
    }
    Ok(statement)
}

/// A `;` outside string literals and quoted identifiers. Doubled quotes
/// toggle twice, so escapes need no special case.
fn has_statement_separator(statement: &str) -> bool {
    let mut quote: Option<char> = None;
    for c in statement.chars() {
        match (quote, c) {
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, ';') => return true,
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    false
}

fn query_err(e: sqlx::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

fn row_to_json(row: &SqliteRow) -> Result<serde_json::Map<String, serde_json::Value>, StoreError> {
    let mut map = serde_json::Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i).map_err(query_err)?;
        let value = if raw.is_null() {
            serde_json::Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(i).map(serde_json::Value::from),
                "REAL" | "NUMERIC" => row.try_get::<f64, _>(i).map(serde_json::Value::from),
                "BLOB" => Ok(serde_json::Value::String("<blob>".into())),
                _ => row.try_get::<String, _>(i).map(serde_json::Value::from),
            }
            .map_err(query_err)?
        };
        map.insert(column.name().to_string(), value);
    }
    Ok(map)
}

fn record_from_row(row: &SqliteRow) -> Result<MatchRecord, StoreError> {
    Ok(MatchRecord {
        date: row.try_get("date").map_err(query_err)?,
        home_team: row.try_get("home_team").map_err(query_err)?,
        away_team: row.try_get("away_team").map_err(query_err)?,
        home_score: row.try_get("home_score").map_err(query_err)?,
        away_score: row.try_get("away_score").map_err(query_err)?,
        league: row.try_get("league").map_err(query_err)?,
    })
}

/// The match dataset, queryable through SQL.
pub struct MatchStore {
    pool: SqlitePool,
    source: Option<PathBuf>,
    max_rows: usize,
}

impl MatchStore {
    /// Load a dataset file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let load_err = |reason: String| StoreError::Load {
            path: path.display().to_string(),
            reason,
        };

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| load_err(e.to_string()))?;
        let records = parse_records(&content).map_err(load_err)?;

        let mut store = Self::from_records(records).await?;
        store.source = Some(path.to_path_buf());
        info!(path = %path.display(), "Match dataset loaded");
        Ok(store)
    }

    /// Build a store from records already in memory.
    pub async fn from_records(records: Vec<MatchRecord>) -> Result<Self, StoreError> {
        // One connection, kept forever: every connection to
        // `sqlite::memory:` would otherwise see its own empty database.
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::Open(format!("Invalid SQLite options: {e}")))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open SQLite: {e}")))?;

        let store = Self {
            pool,
            source: None,
            max_rows: DEFAULT_MAX_ROWS,
        };
        store.load(&records).await?;
        Ok(store)
    }

    /// Cap the rows returned by [`query_json`](Self::query_json).
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self
    }

    /// The file this store was loaded from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Size of the source file in bytes.
    pub async fn source_size(&self) -> Option<u64> {
        let path = self.source.as_ref()?;
        tokio::fs::metadata(path).await.ok().map(|m| m.len())
    }

    async fn load(&self, records: &[MatchRecord]) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE input_data (
                date        TEXT NOT NULL,
                home_team   TEXT NOT NULL,
                away_team   TEXT NOT NULL,
                home_score  INTEGER,
                away_score  INTEGER,
                league      TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Open(format!("input_data table: {e}")))?;

        for index in [
            "CREATE INDEX idx_input_home ON input_data(home_team)",
            "CREATE INDEX idx_input_away ON input_data(away_team)",
            "CREATE INDEX idx_input_date ON input_data(date)",
        ] {
            sqlx::query(index)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Open(format!("index: {e}")))?;
        }

        let mut tx = self.pool.begin().await.map_err(query_err)?;
        for r in records {
            sqlx::query(
                "INSERT INTO input_data (date, home_team, away_team, home_score, away_score, league) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&r.date)
            .bind(&r.home_team)
            .bind(&r.away_team)
            .bind(r.home_score)
            .bind(r.away_score)
            .bind(r.league.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        }
        tx.commit().await.map_err(query_err)?;

        sqlx::query("PRAGMA query_only = ON")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Open(format!("query_only: {e}")))?;

        debug!(rows = records.len(), "input_data populated");
        Ok(())
    }

    /// Column names and declared types of `input_data`.
    pub async fn schema(&self) -> Result<Vec<ColumnInfo>, StoreError> {
        let rows = sqlx::query("PRAGMA table_info(input_data)")
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;

        rows.iter()
            .map(|row| {
                Ok(ColumnInfo {
                    column_name: row.try_get("name").map_err(query_err)?,
                    data_type: row.try_get("type").map_err(query_err)?,
                })
            })
            .collect()
    }

    /// Run one read-only statement and return its rows as JSON objects.
    pub async fn query_json(&self, sql: &str) -> Result<QueryResult, StoreError> {
        let statement = read_only_statement(sql)?;
        let rows = sqlx::query(statement)
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;

        let columns = rows
            .first()
            .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let row_count = rows.len();
        let json_rows = rows
            .iter()
            .take(self.max_rows)
            .map(row_to_json)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(row_count, "Query executed");
        Ok(QueryResult {
            columns,
            rows: json_rows,
            row_count,
            truncated: row_count > self.max_rows,
        })
    }

    /// Compile a statement without running it.
    pub async fn validate(&self, sql: &str) -> Result<(), StoreError> {
        let statement = read_only_statement(sql)?;
        let explain = format!("EXPLAIN {statement}");
        sqlx::query(&explain)
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        Ok(())
    }

    pub async fn row_count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM input_data")
            .fetch_one(&self.pool)
            .await
            .map_err(query_err)?;
        let n: i64 = row.try_get("n").map_err(query_err)?;
        Ok(n as usize)
    }

    /// Earliest and latest match day, or `None` for an empty dataset.
    pub async fn date_range(&self) -> Result<Option<(String, String)>, StoreError> {
        let row = sqlx::query(
            "SELECT MIN(substr(date, 1, 10)) AS earliest, MAX(substr(date, 1, 10)) AS latest FROM input_data",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(query_err)?;

        let earliest: Option<String> = row.try_get("earliest").map_err(query_err)?;
        let latest: Option<String> = row.try_get("latest").map_err(query_err)?;
        Ok(earliest.zip(latest))
    }

    /// Every distinct team name, sorted.
    pub async fn teams(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT home_team AS team FROM input_data UNION SELECT away_team FROM input_data ORDER BY team",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;

        rows.iter()
            .map(|row| row.try_get("team").map_err(query_err))
            .collect()
    }

    /// All matches, ordered by date, league, home team.
    pub async fn all_matches(&self) -> Result<Vec<MatchRecord>, StoreError> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM {TABLE_NAME} ORDER BY date, league, home_team");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        rows.iter().map(record_from_row).collect()
    }

    /// Matches involving the filtered team(s), optionally within a date range.
    pub async fn matches_for(
        &self,
        filter: &TeamFilter,
        range: Option<&DateRange>,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {MATCH_COLUMNS} FROM {TABLE_NAME} WHERE "
        ));
        filter.push_condition(&mut qb);
        if let Some(range) = range {
            qb.push(" AND substr(date, 1, 10) BETWEEN ")
                .push_bind(range.start_str())
                .push(" AND ")
                .push_bind(range.end_str());
        }
        qb.push(" ORDER BY date, league, home_team");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(query_err)?;
        rows.iter().map(record_from_row).collect()
    }

    /// Write the filtered team's matches to `path` as JSON lines.
    pub async fn export_jsonl(&self, filter: &TeamFilter, path: &Path) -> Result<usize, StoreError> {
        let records = self.matches_for(filter, None).await?;
        if records.is_empty() {
            return Err(StoreError::NotFound(format!("No matches found for team '{filter}'")));
        }

        let mut body = String::new();
        for record in &records {
            let line = serde_json::to_string(record).map_err(|e| StoreError::Invalid(e.to_string()))?;
            body.push_str(&line);
            body.push('\n');
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, body).await?;

        info!(path = %path.display(), rows = records.len(), "Team dataset written");
        Ok(records.len())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(date: &str, home: &str, away: &str, hs: Option<i64>, aws: Option<i64>) -> MatchRecord {
        MatchRecord {
            date: date.into(),
            home_team: home.into(),
            away_team: away.into(),
            home_score: hs,
            away_score: aws,
            league: Some("U12 Premier".into()),
        }
    }

    pub(crate) fn sample_records() -> Vec<MatchRecord> {
        vec![
            record("2025-03-01", "Key West FC", "The Strikers", Some(2), Some(1)),
            record("2025-03-08", "Harbor United", "Key West FC (1)", Some(3), Some(3)),
            record("2025-03-15", "The Strikers", "Harbor United", Some(0), Some(4)),
            record("2025-04-02", "Key West FC", "Harbor United", Some(1), Some(2)),
            record("2025-04-20", "Key West FC", "The Strikers", None, None),
        ]
    }

    async fn store() -> MatchStore {
        MatchStore::from_records(sample_records()).await.unwrap()
    }

    #[test]
    fn parses_json_lines_and_arrays() {
        let lines = "{\"date\":\"2025-03-01\",\"home_team\":\"A\",\"away_team\":\"B\",\"home_score\":1,\"away_score\":0,\"league\":\"L\"}\n\n{\"date\":\"2025-03-02\",\"home_team\":\"B\",\"away_team\":\"A\"}\n";
        let records = parse_records(lines).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].is_played());
        assert!(!records[1].is_played());

        let array = r#"[{"date":"2025-03-01","home_team":"A","away_team":"B","home_score":2.0,"away_score":"1"}]"#;
        let records = parse_records(array).unwrap();
        assert_eq!(records[0].home_score, Some(2));
        assert_eq!(records[0].away_score, Some(1));
    }

    #[test]
    fn epoch_millis_dates_become_days() {
        let line = r#"{"date":1740787200000,"home_team":"A","away_team":"B"}"#;
        let records = parse_records(line).unwrap();
        assert_eq!(records[0].date, "2025-03-01");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let body = "not json\n{\"date\":\"2025-03-01\",\"home_team\":\"A\",\"away_team\":\"B\"}\n";
        assert_eq!(parse_records(body).unwrap().len(), 1);
        assert!(parse_records("garbage\nmore garbage").is_err());
    }

    #[test]
    fn read_only_guard() {
        assert_eq!(read_only_statement("  SELECT 1; ").unwrap(), "SELECT 1");
        assert!(read_only_statement("with t as (select 1) select * from t").is_ok());
        assert!(read_only_statement("DELETE FROM input_data").is_err());
        assert!(read_only_statement("SELECT 1; DROP TABLE input_data").is_err());
        assert_eq!(
            read_only_statement("SELECT * FROM input_data WHERE league = 'a;b';").unwrap(),
            "SELECT * FROM input_data WHERE league = 'a;b'"
        );
        assert!(read_only_statement("SELECT 'it''s;' AS x; DELETE FROM input_data").is_err());
        assert!(read_only_statement("   ").is_err());
    }

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn date_range_validation() {
        let range = DateRange::parse("2025-03-01", "2025-03-31").unwrap();
        assert!(range.contains("2025-03-15"));
        assert!(range.contains("2025-03-31 18:00:00"));
        assert!(!range.contains("2025-04-01"));
        assert!(DateRange::parse("2025-04-01", "2025-03-01").is_err());
        assert!(DateRange::parse("March", "2025-03-01").is_err());
    }

    #[tokio::test]
    async fn schema_lists_columns() {
        let store = store().await;
        let schema = store.schema().await.unwrap();
        let names: Vec<&str> = schema.iter().map(|c| c.column_name.as_str()).collect();
        assert_eq!(names, vec!["date", "home_team", "away_team", "home_score", "away_score", "league"]);
        assert_eq!(schema[3].data_type, "INTEGER");
    }

    #[tokio::test]
    async fn query_json_returns_typed_values() {
        let store = store().await;
        let result = store
            .query_json("SELECT home_team, home_score, COUNT(*) AS n FROM input_data WHERE home_team = 'Key West FC' GROUP BY home_team")
            .await
            .unwrap();
        assert_eq!(result.row_count, 1);
        assert_eq!(result.columns, vec!["home_team", "home_score", "n"]);
        assert_eq!(result.rows[0]["home_team"], "Key West FC");
        assert_eq!(result.rows[0]["n"], 3);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn query_json_caps_rows() {
        let store = store().await.with_max_rows(2);
        let result = store.query_json("SELECT * FROM input_data").await.unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.row_count, 5);
        assert!(result.truncated);
    }

    #[tokio::test]
    async fn missing_table_is_a_query_error() {
        let store = store().await;
        let err = store.query_json("SELECT * FROM missing_table").await.unwrap_err();
        match err {
            StoreError::Query(message) => assert!(message.contains("missing_table")),
            other => panic!("expected query error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn writes_are_refused() {
        let store = store().await;
        assert!(store.query_json("DELETE FROM input_data").await.is_err());
        // Even a CTE-wrapped write is stopped by query_only.
        assert!(
            store
                .query_json("WITH x AS (SELECT 1) DELETE FROM input_data")
                .await
                .is_err()
        );
        assert_eq!(store.row_count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn validate_compiles_without_running() {
        let store = store().await;
        assert!(store.validate("SELECT COUNT(*) FROM input_data").await.is_ok());
        assert!(store.validate("SELECT nope FROM input_data").await.is_err());
        assert!(store.validate("SELEC 1").await.is_err());
    }

    #[tokio::test]
    async fn date_range_and_teams() {
        let store = store().await;
        assert_eq!(
            store.date_range().await.unwrap(),
            Some(("2025-03-01".to_string(), "2025-04-20".to_string()))
        );
        let teams = store.teams().await.unwrap();
        assert_eq!(teams.len(), 4);
        assert!(teams.contains(&"Key West FC (1)".to_string()));

        let empty = MatchStore::from_records(vec![]).await.unwrap();
        assert_eq!(empty.date_range().await.unwrap(), None);
    }

    #[tokio::test]
    async fn contains_filter_catches_name_variants() {
        let store = store().await;
        let matches = store
            .matches_for(&TeamFilter::Contains("key west".into()), None)
            .await
            .unwrap();
        assert_eq!(matches.len(), 4);
    }

    #[tokio::test]
    async fn exact_filter_and_date_range() {
        let store = store().await;
        let range = DateRange::parse("2025-03-01", "2025-03-31").unwrap();
        let matches = store
            .matches_for(&TeamFilter::Exact(vec!["Key West FC".into()]), Some(&range))
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].away_team, "The Strikers");

        let none = store.matches_for(&TeamFilter::Exact(vec![]), None).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn filter_values_are_bound_not_interpolated() {
        let store = store().await;
        let matches = store
            .matches_for(&TeamFilter::Contains("' OR 1=1 --".into()), None)
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn export_writes_json_lines() {
        let store = store().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("strikers.jsonl");
        let n = store
            .export_jsonl(&TeamFilter::Contains("Strikers".into()), &path)
            .await
            .unwrap();
        assert_eq!(n, 3);
        let reloaded = MatchStore::open(&path).await.unwrap();
        assert_eq!(reloaded.row_count().await.unwrap(), 3);
        assert_eq!(reloaded.source(), Some(path.as_path()));

        let err = store
            .export_jsonl(&TeamFilter::Contains("Nobody".into()), &path)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No matches found for team 'Nobody'"));
    }
}
