//! Display strings for moves.
//!
//! Everything here is derived from [`MoveRecord`]s and is meant for people to
//! read. Nothing parses these strings back into moves.

use crate::session::MoveRecord;

/// Long-form coordinate notation: `"e2-e4"`, or `"e4xd5"` for a capture.
pub fn format(record: &MoveRecord) -> String {
    let separator = if record.captured().is_some() { 'x' } else { '-' };
    format!(
        "{}{}{}",
        record.source(),
        separator,
        record.destination()
    )
}

/// A history line such as `"1. White e2-e4"`.
///
/// `ply_index` is the zero-based position of the record in the history.
pub fn numbered(ply_index: usize, record: &MoveRecord) -> String {
    format!(
        "{}. {} {}",
        ply_index / 2 + 1,
        record.side(),
        format(record)
    )
}

pub fn history_lines(history: &[MoveRecord]) -> Vec<String> {
    history
        .iter()
        .enumerate()
        .map(|(index, record)| numbered(index, record))
        .collect()
}
