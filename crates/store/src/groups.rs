//! Named team groups.
//!
//! A group maps one club to every spelling it appears under in the data
//! ("Key West FC", "Key West FC (1)", ...). Stored in SQLite with two tables:
//! - `team_groups` holds the unique group names
//! - `team_group_members` holds one row per team name, deleted with its group

use chrono::Utc;
use pitchside_core::error::StoreError;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// A group and its member team names, sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamGroup {
    pub name: String,
    pub teams: Vec<String>,
}

pub struct TeamGroupStore {
    pool: SqlitePool,
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

fn clean_teams(teams: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = teams
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    cleaned.sort();
    cleaned.dedup();
    cleaned
}

fn clean_name(name: &str) -> Result<&str, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Invalid("group name must not be empty".into()));
    }
    Ok(name)
}

impl TeamGroupStore {
    /// Open (or create) the group database at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!(path = %path.display(), "Team group store ready");
        Ok(store)
    }

    /// An ephemeral store, for tests and dry runs.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::Open(format!("Invalid SQLite options: {e}")))?
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS team_groups (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT UNIQUE NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Open(format!("team_groups table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS team_group_members (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                group_id    INTEGER NOT NULL REFERENCES team_groups(id) ON DELETE CASCADE,
                team_name   TEXT NOT NULL,
                UNIQUE(group_id, team_name)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Open(format!("team_group_members table: {e}")))?;

        debug!("Team group migrations complete");
        Ok(())
    }

    async fn group_id(&self, name: &str) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query("SELECT id FROM team_groups WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| r.try_get::<i64, _>("id").map_err(db_err)).transpose()
    }

    async fn replace_members(&self, group_id: i64, teams: &[String]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        write_members(&mut *tx, group_id, teams).await?;
        tx.commit().await.map_err(db_err)
    }

    /// Create a new group. Fails with `Conflict` if the name is taken.
    pub async fn create(&self, name: &str, teams: &[String]) -> Result<TeamGroup, StoreError> {
        let name = clean_name(name)?;
        if self.group_id(name).await?.is_some() {
            return Err(StoreError::Conflict(format!("team group '{name}' already exists")));
        }

        // Group row and members land together or not at all.
        let teams = clean_teams(teams);
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let result = sqlx::query("INSERT INTO team_groups (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        write_members(&mut *tx, result.last_insert_rowid(), &teams).await?;
        tx.commit().await.map_err(db_err)?;
        info!(group = name, members = teams.len(), "Team group created");
        Ok(TeamGroup {
            name: name.to_string(),
            teams,
        })
    }

    /// Replace the members of an existing group.
    pub async fn update(&self, name: &str, teams: &[String]) -> Result<TeamGroup, StoreError> {
        let name = clean_name(name)?;
        let id = self
            .group_id(name)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("team group '{name}'")))?;

        let teams = clean_teams(teams);
        self.replace_members(id, &teams).await?;
        info!(group = name, members = teams.len(), "Team group updated");
        Ok(TeamGroup {
            name: name.to_string(),
            teams,
        })
    }

    pub async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM team_groups WHERE name = ?")
            .bind(name.trim())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("team group '{}'", name.trim())));
        }
        info!(group = name.trim(), "Team group deleted");
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Result<Option<TeamGroup>, StoreError> {
        let name = name.trim();
        let Some(id) = self.group_id(name).await? else {
            return Ok(None);
        };

        let rows = sqlx::query(
            "SELECT team_name FROM team_group_members WHERE group_id = ? ORDER BY team_name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let teams = rows
            .iter()
            .map(|r| r.try_get::<String, _>("team_name").map_err(db_err))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(TeamGroup {
            name: name.to_string(),
            teams,
        }))
    }

    /// All groups, by name.
    pub async fn list(&self) -> Result<Vec<TeamGroup>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT g.name AS name, m.team_name AS team_name
            FROM team_groups g
            LEFT JOIN team_group_members m ON m.group_id = g.id
            ORDER BY g.name, m.team_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in &rows {
            let name: String = row.try_get("name").map_err(db_err)?;
            let team: Option<String> = row.try_get("team_name").map_err(db_err)?;
            let members = groups.entry(name).or_default();
            if let Some(team) = team {
                members.push(team);
            }
        }

        Ok(groups
            .into_iter()
            .map(|(name, teams)| TeamGroup { name, teams })
            .collect())
    }

    /// Import `{"group": ["team", ...]}`; existing groups are overwritten.
    /// Returns the number of groups written.
    pub async fn import_json(&self, json: &str) -> Result<usize, StoreError> {
        let groups: BTreeMap<String, Vec<String>> = serde_json::from_str(json)
            .map_err(|e| StoreError::Invalid(format!("invalid team group JSON: {e}")))?;

        for (name, teams) in &groups {
            if self.group_id(name.trim()).await?.is_some() {
                self.update(name, teams).await?;
            } else {
                self.create(name, teams).await?;
            }
        }
        Ok(groups.len())
    }

    /// Export every group as `{"group": ["team", ...]}`.
    pub async fn export_json(&self) -> Result<String, StoreError> {
        let groups: BTreeMap<String, Vec<String>> = self
            .list()
            .await?
            .into_iter()
            .map(|g| (g.name, g.teams))
            .collect();
        serde_json::to_string_pretty(&groups).map_err(|e| StoreError::Invalid(e.to_string()))
    }
}

async fn write_members(conn: &mut SqliteConnection, group_id: i64, teams: &[String]) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM team_group_members WHERE group_id = ?")
        .bind(group_id)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
    for team in teams {
        sqlx::query("INSERT OR IGNORE INTO team_group_members (group_id, team_name) VALUES (?, ?)")
            .bind(group_id)
            .bind(team)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
    }
    Ok(())
}
