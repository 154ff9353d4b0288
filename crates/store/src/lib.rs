//! Data layer for pitchside.
//!
//! - [`matches::MatchStore`] — the match dataset, loaded into an in-memory
//!   SQLite table named `input_data`
//! - [`groups::TeamGroupStore`] — named team aggregates, persisted in SQLite
//! - [`conversations::ConversationStore`] — saved transcripts as JSON files
//! - [`analytics`] — team records, opponent tables, competitiveness scoring
//! - [`compact`] — context-friendly renderings of match lists

pub mod analytics;
pub mod compact;
pub mod conversations;
pub mod groups;
pub mod matches;

pub use analytics::{DatePreset, MatchResult, OpponentRecord, TeamMatch, TeamReport, WorthyOpponent};
pub use compact::{CompactFormat, CompactReport};
pub use conversations::{ConversationRecord, ConversationStore, ConversationSummary};
pub use groups::{TeamGroup, TeamGroupStore};
pub use matches::{ColumnInfo, DateRange, MatchRecord, MatchStore, QueryResult, TeamFilter, TABLE_NAME, parse_records};
