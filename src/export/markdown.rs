use std::fmt::{Display, Write};

use chrono::TimeZone;

use crate::{
    aggregation::Totals,
    utils::time::{format_hms, to_local_string},
};

use super::Report;

/// Report with Summary, Time by Task, Time by Tag and Sessions sections. Group tables are sorted
/// by descending time and use clipped durations, the sessions table shows full durations.
pub fn render_markdown<Tz: TimeZone>(report: &Report, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let mut out = String::new();
    // Writing into a String can't fail.
    let _ = write_report(&mut out, report, tz);
    out
}

fn write_report<Tz: TimeZone>(out: &mut String, report: &Report, tz: &Tz) -> std::fmt::Result
where
    Tz::Offset: Display,
{
    writeln!(out, "# Time Report")?;
    writeln!(out)?;
    writeln!(
        out,
        "**Range:** {} to {}",
        to_local_string(tz, report.window.start),
        to_local_string(tz, report.window.end)
    )?;
    writeln!(out)?;

    writeln!(out, "## Summary")?;
    writeln!(out)?;
    writeln!(out, "- Total time: {}", format_hms(report.total()))?;
    writeln!(out, "- Sessions: {}", report.sessions.len())?;
    writeln!(out)?;

    writeln!(out, "## Time by Task")?;
    writeln!(out)?;
    write_totals(out, "Task", &report.by_title(), "_No sessions_")?;

    writeln!(out, "## Time by Tag")?;
    writeln!(out)?;
    write_totals(out, "Tag", &report.by_tag(), "_No tags_")?;

    writeln!(out, "## Sessions")?;
    writeln!(out)?;
    if report.sessions.is_empty() {
        writeln!(out, "_No sessions_")?;
        return Ok(());
    }
    writeln!(out, "| Title | Start | End | Duration | Tags |")?;
    writeln!(out, "| --- | --- | --- | --- | --- |")?;
    for session in &report.sessions {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            escape_cell(&session.title),
            to_local_string(tz, session.start),
            to_local_string(tz, session.end),
            format_hms(session.duration()),
            escape_cell(&session.tags.join(", ")),
        )?;
    }
    Ok(())
}

fn write_totals(out: &mut String, header: &str, totals: &Totals, empty: &str) -> std::fmt::Result {
    if totals.is_empty() {
        writeln!(out, "{empty}")?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(out, "| {header} | Time |")?;
    writeln!(out, "| --- | --- |")?;
    for (key, duration) in totals.sorted_desc() {
        writeln!(out, "| {} | {} |", escape_cell(&key), format_hms(duration))?;
    }
    writeln!(out)
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
