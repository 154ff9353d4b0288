//! Team record computations: results from one side's perspective,
//! opponent breakdowns, and date presets for reports.

use crate::matches::{DateRange, MatchRecord, TeamFilter};
use chrono::{Datelike, Days, NaiveDate};
use pitchside_core::error::StoreError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

/// A match seen from the filtered team's side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMatch {
    pub date: String,
    pub team: String,
    pub opponent: String,
    pub home: bool,
    pub team_score: Option<i64>,
    pub opponent_score: Option<i64>,
    pub league: Option<String>,
    /// `None` for fixtures without a score
    pub result: Option<MatchResult>,
}

impl TeamMatch {
    /// Take the home side when it matches the filter, otherwise the away
    /// side. `None` when neither side does.
    pub fn from_record(record: &MatchRecord, filter: &TeamFilter) -> Option<Self> {
        let home = if filter.matches(&record.home_team) {
            true
        } else if filter.matches(&record.away_team) {
            false
        } else {
            return None;
        };

        let (team, opponent, team_score, opponent_score) = if home {
            (&record.home_team, &record.away_team, record.home_score, record.away_score)
        } else {
            (&record.away_team, &record.home_team, record.away_score, record.home_score)
        };

        let result = match (team_score, opponent_score) {
            (Some(t), Some(o)) if t > o => Some(MatchResult::Win),
            (Some(t), Some(o)) if t < o => Some(MatchResult::Loss),
            (Some(_), Some(_)) => Some(MatchResult::Draw),
            _ => None,
        };

        Some(Self {
            date: record.day().to_string(),
            team: team.clone(),
            opponent: opponent.clone(),
            home,
            team_score,
            opponent_score,
            league: record.league.clone(),
            result,
        })
    }

    pub fn is_played(&self) -> bool {
        self.result.is_some()
    }
}

/// Matches from `records` involving the filtered team, in input order.
pub fn team_matches(records: &[MatchRecord], filter: &TeamFilter) -> Vec<TeamMatch> {
    records
        .iter()
        .filter_map(|r| TeamMatch::from_record(r, filter))
        .collect()
}

/// Win/loss/draw summary over played matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamReport {
    pub games_played: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub win_rate: f64,
    pub loss_rate: f64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub goal_difference: i64,
    /// Fixtures without a score
    pub upcoming: usize,
}

impl TeamReport {
    pub fn from_matches(matches: &[TeamMatch]) -> Self {
        let mut report = Self::default();
        for m in matches {
            let (Some(result), Some(gf), Some(ga)) = (m.result, m.team_score, m.opponent_score) else {
                report.upcoming += 1;
                continue;
            };
            report.games_played += 1;
            report.goals_for += gf;
            report.goals_against += ga;
            match result {
                MatchResult::Win => report.wins += 1,
                MatchResult::Loss => report.losses += 1,
                MatchResult::Draw => report.draws += 1,
            }
        }
        report.goal_difference = report.goals_for - report.goals_against;
        if report.games_played > 0 {
            let games = report.games_played as f64;
            report.win_rate = report.wins as f64 / games;
            report.loss_rate = report.losses as f64 / games;
        }
        report
    }
}

/// Lower-case ASCII alphanumerics only, so "Harbor Utd." and "harbor utd" group together.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Head-to-head record against one opponent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpponentRecord {
    /// Name as first seen in the data
    pub opponent: String,
    pub games: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub goals_for: i64,
    pub goals_against: i64,
    #[serde(skip)]
    total_abs_margin: i64,
}

impl OpponentRecord {
    fn new(opponent: &str) -> Self {
        Self {
            opponent: opponent.to_string(),
            games: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            goals_for: 0,
            goals_against: 0,
            total_abs_margin: 0,
        }
    }

    pub fn loss_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.losses as f64 / self.games as f64
        }
    }

    /// Mean absolute goal margin per game.
    pub fn avg_abs_margin(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_abs_margin as f64 / self.games as f64
        }
    }
}

/// Per-opponent records over played matches, most games first.
pub fn opponent_stats(matches: &[TeamMatch]) -> Vec<OpponentRecord> {
    let mut by_name: BTreeMap<String, OpponentRecord> = BTreeMap::new();
    for m in matches {
        let (Some(result), Some(gf), Some(ga)) = (m.result, m.team_score, m.opponent_score) else {
            continue;
        };
        let entry = by_name
            .entry(normalize_name(&m.opponent))
            .or_insert_with(|| OpponentRecord::new(&m.opponent));
        entry.games += 1;
        entry.goals_for += gf;
        entry.goals_against += ga;
        entry.total_abs_margin += (gf - ga).abs();
        match result {
            MatchResult::Win => entry.wins += 1,
            MatchResult::Loss => entry.losses += 1,
            MatchResult::Draw => entry.draws += 1,
        }
    }

    let mut stats: Vec<OpponentRecord> = by_name.into_values().collect();
    stats.sort_by(|a, b| b.games.cmp(&a.games).then_with(|| a.opponent.cmp(&b.opponent)));
    stats
}

/// An opponent worth scheduling, with its difficulty score (0-100).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorthyOpponent {
    #[serde(flatten)]
    pub record: OpponentRecord,
    pub score: f64,
}

/// Difficulty of an opponent: 100 if they have beaten the team, otherwise a
/// blend of loss rate (70%) and closeness of games (30%).
pub fn opponent_score(record: &OpponentRecord) -> f64 {
    if record.losses > 0 {
        return 100.0;
    }
    let loss_component = record.loss_rate() * 100.0 * 0.7;
    let closeness = (100.0 - (record.avg_abs_margin() * 20.0).min(100.0)).max(0.0);
    loss_component + closeness * 0.3
}

/// Opponents scoring at least `threshold`, hardest first.
pub fn worthy_opponents(stats: &[OpponentRecord], threshold: f64) -> Vec<WorthyOpponent> {
    let mut worthy: Vec<WorthyOpponent> = stats
        .iter()
        .map(|record| WorthyOpponent {
            record: record.clone(),
            score: opponent_score(record),
        })
        .filter(|w| w.score >= threshold)
        .collect();
    worthy.sort_by(|a, b| b.score.total_cmp(&a.score));
    worthy
}

/// Named report windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePreset {
    Last30Days,
    Last90Days,
    ThisYear,
    LastYear,
    /// Whatever the dataset covers
    AllTime,
    Year(i32),
}

impl FromStr for DatePreset {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "last_30_days" => Ok(Self::Last30Days),
            "last_90_days" => Ok(Self::Last90Days),
            "this_year" => Ok(Self::ThisYear),
            "last_year" => Ok(Self::LastYear),
            "all_time" => Ok(Self::AllTime),
            other => other
                .strip_prefix("year_")
                .and_then(|y| y.parse::<i32>().ok())
                .map(Self::Year)
                .ok_or_else(|| StoreError::Invalid(format!("unknown date preset '{other}'"))),
        }
    }
}

impl DatePreset {
    /// Resolve against `today`. `AllTime` needs the dataset's own range and
    /// is `None` for an empty dataset.
    pub fn range(&self, today: NaiveDate, dataset: Option<(&str, &str)>) -> Option<DateRange> {
        let year_span = |year: i32| {
            Some(DateRange {
                start: NaiveDate::from_ymd_opt(year, 1, 1)?,
                end: NaiveDate::from_ymd_opt(year, 12, 31)?,
            })
        };
        match self {
            Self::Last30Days => Some(DateRange {
                start: today.checked_sub_days(Days::new(30)).unwrap_or(NaiveDate::MIN),
                end: today,
            }),
            Self::Last90Days => Some(DateRange {
                start: today.checked_sub_days(Days::new(90)).unwrap_or(NaiveDate::MIN),
                end: today,
            }),
            Self::ThisYear => Some(DateRange {
                start: NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                end: today,
            }),
            Self::LastYear => year_span(today.year() - 1),
            Self::Year(year) => year_span(*year),
            Self::AllTime => {
                let (earliest, latest) = dataset?;
                DateRange::parse(earliest, latest).ok()
            }
        }
    }
}
