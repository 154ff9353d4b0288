//! `pitchside compact` — the dataset in a context-friendly form.

use super::{CliResult, load_config, open_matches};
use pitchside_store::{CompactFormat, CompactReport};
use std::path::PathBuf;

pub async fn run(data: Option<PathBuf>, format: &str) -> CliResult {
    let format: CompactFormat = format.parse()?;
    let config = load_config(data)?;
    let store = open_matches(&config).await?;

    let records = store.all_matches().await?;
    let original_size = store.source_size().await.unwrap_or(0);
    let report = CompactReport::build(&records, original_size, format);

    println!("{}", report.result);
    eprintln!(
        "  {} matches, {} -> {} bytes ({:.2}x)",
        report.row_count, report.original_size_bytes, report.compact_size_bytes, report.compression_ratio
    );
    Ok(())
}
