//! `pitchside report` — a team's record, its opponents, and the opponents
//! worth scheduling.

use super::{CliResult, load_config, open_groups, open_matches, team_filter};
use chrono::Local;
use pitchside_store::analytics::{opponent_stats, team_matches, worthy_opponents};
use pitchside_store::{DatePreset, OpponentRecord, TeamReport, WorthyOpponent};
use std::fmt::Write as _;
use std::path::PathBuf;

fn pct(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn render_record(report: &TeamReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  Played {}  W {}  L {}  D {}  (win {}, loss {})",
        report.games_played,
        report.wins,
        report.losses,
        report.draws,
        pct(report.win_rate),
        pct(report.loss_rate)
    );
    let _ = writeln!(
        out,
        "  Goals {}-{}  (difference {:+})",
        report.goals_for, report.goals_against, report.goal_difference
    );
    if report.upcoming > 0 {
        let _ = writeln!(out, "  Upcoming fixtures: {}", report.upcoming);
    }
    out
}

fn render_opponents(stats: &[OpponentRecord]) -> String {
    let width = stats
        .iter()
        .map(|s| s.opponent.chars().count())
        .max()
        .unwrap_or(0)
        .max("Opponent".len());
    let mut out = format!("  {:<width$}  GP  W  L  D  GF  GA  Loss%\n", "Opponent");
    for s in stats {
        let _ = writeln!(
            out,
            "  {:<width$}  {:>2} {:>2} {:>2} {:>2} {:>3} {:>3}  {:>5.1}",
            s.opponent,
            s.games,
            s.wins,
            s.losses,
            s.draws,
            s.goals_for,
            s.goals_against,
            s.loss_rate() * 100.0
        );
    }
    out
}

fn render_worthy(worthy: &[WorthyOpponent]) -> String {
    if worthy.is_empty() {
        return "  None above the threshold.\n".to_string();
    }
    let mut out = String::new();
    for w in worthy {
        let _ = writeln!(
            out,
            "  {:>5.1}  {}  ({}-{}-{}, avg margin {:.1})",
            w.score,
            w.record.opponent,
            w.record.wins,
            w.record.losses,
            w.record.draws,
            w.record.avg_abs_margin()
        );
    }
    out
}

pub async fn run(data: Option<PathBuf>, team: &str, preset: &str, threshold: f64) -> CliResult {
    let preset: DatePreset = preset.parse()?;
    let config = load_config(data)?;
    let store = open_matches(&config).await?;
    let groups = open_groups(&config).await?;

    let filter = team_filter(&groups, team).await?;
    let dataset_range = store.date_range().await?;
    let range = preset.range(
        Local::now().date_naive(),
        dataset_range.as_ref().map(|(a, b)| (a.as_str(), b.as_str())),
    );

    let records = store.matches_for(&filter, range.as_ref()).await?;
    let games = team_matches(&records, &filter);
    let report = TeamReport::from_matches(&games);
    let stats = opponent_stats(&games);
    let worthy = worthy_opponents(&stats, threshold);

    println!("📊 {filter}");
    match &range {
        Some(r) => println!("   {} to {}", r.start, r.end),
        None => println!("   all dates"),
    }
    println!();
    if games.is_empty() {
        println!("  No matches found for team '{filter}' in this period.");
        return Ok(());
    }
    print!("{}", render_record(&report));
    println!();
    println!("Opponents");
    print!("{}", render_opponents(&stats));
    println!();
    println!("Worthy opponents (score >= {threshold})");
    print!("{}", render_worthy(&worthy));
    Ok(())
}
