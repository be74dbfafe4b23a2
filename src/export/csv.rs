use std::fmt::Display;

use anyhow::{anyhow, Result};
use chrono::TimeZone;

use crate::utils::time::{format_hms, to_iso, to_local_string};

use super::Report;

pub const COLUMNS: [&str; 6] = [
    "Title",
    "Start",
    "End",
    "Duration(ms)",
    "Duration(hh:mm:ss)",
    "Tags",
];

/// A few header rows describing the range, then one row per session with its full duration.
/// Tags are joined with `;` so that they stay in a single column.
pub fn render_csv<Tz: TimeZone>(report: &Report, tz: &Tz) -> Result<Vec<u8>>
where
    Tz::Offset: Display,
{
    let mut wtr = ::csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(vec![]);

    let range_start = to_iso(report.window.start);
    let range_end = to_iso(report.window.end);
    let total = format_hms(report.total());
    wtr.write_record(["Time Report"])?;
    wtr.write_record(["Range", range_start.as_str(), range_end.as_str()])?;
    wtr.write_record(["Total", total.as_str()])?;
    wtr.write_record(COLUMNS)?;

    for session in &report.sessions {
        let duration = session.duration();
        wtr.write_record([
            session.title.clone(),
            to_local_string(tz, session.start),
            to_local_string(tz, session.end),
            duration.num_milliseconds().to_string(),
            format_hms(duration),
            session.tags.join(";"),
        ])?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow!("Failed to flush csv export: {}", e.error()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::export::test_data::report;

    use super::render_csv;

    #[test]
    fn csv_has_header_rows_and_quoted_titles() {
        let content = String::from_utf8(render_csv(&report(), &Utc).unwrap()).unwrap();
        let lines = content.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "Time Report");
        assert_eq!(
            lines[1],
            "Range,2024-01-08T09:00:00.000Z,2024-01-08T12:00:00.000Z"
        );
        assert_eq!(lines[2], "Total,01:30:00");
        assert_eq!(
            lines[3],
            "Title,Start,End,Duration(ms),Duration(hh:mm:ss),Tags"
        );
        assert_eq!(
            lines[4],
            "Email,2024-01-08 08:30:00,2024-01-08 09:30:00,3600000,01:00:00,work"
        );
        assert_eq!(
            lines[5],
            "\"Review, notes\",2024-01-08 10:00:00,2024-01-08 11:00:00,3600000,01:00:00,work;deep"
        );
        assert_eq!(lines.len(), 6);
    }
}
