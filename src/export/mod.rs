//! Projections of the sessions selected for a window into files. Exports only read what
//! [select_in_range] returns, the running timer is not part of them.

pub mod csv;
pub mod json;
pub mod markdown;
pub mod pdf;

use std::{fmt::Display, path::Path};

use anyhow::Result;
use chrono::{Duration, TimeZone};
use clap::ValueEnum;
use tracing::{info, instrument};

use crate::{
    aggregation::{
        overlap_duration, select_in_range, totals_by_tag, totals_by_title, TimeWindow, Totals,
    },
    storage::entities::Session,
    utils::time::local_date,
};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Markdown,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Markdown => write!(f, "markdown"),
            ExportFormat::Pdf => write!(f, "pdf"),
        }
    }
}

/// Sessions of one window, ordered by start.
#[derive(Debug, Clone)]
pub struct Report {
    pub window: TimeWindow,
    pub sessions: Vec<Session>,
}

impl Report {
    pub fn new(sessions: &[Session], window: TimeWindow) -> Self {
        let mut sessions = select_in_range(sessions, &window)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        sessions.sort_by_key(|v| v.start);
        Self { window, sessions }
    }

    /// Clipped time inside the window.
    pub fn total(&self) -> Duration {
        self.sessions
            .iter()
            .fold(Duration::zero(), |acc, v| acc + overlap_duration(v, &self.window))
    }

    pub fn by_title(&self) -> Totals {
        totals_by_title(&self.sessions, &self.window)
    }

    pub fn by_tag(&self) -> Totals {
        totals_by_tag(&self.sessions, &self.window)
    }
}

/// Serializes `report` into the bytes of a file of the given format.
pub fn render<Tz: TimeZone>(format: ExportFormat, report: &Report, tz: &Tz) -> Result<Vec<u8>>
where
    Tz::Offset: Display,
{
    match format {
        ExportFormat::Csv => csv::render_csv(report, tz),
        ExportFormat::Json => json::render_json(report),
        ExportFormat::Markdown => Ok(markdown::render_markdown(report, tz).into_bytes()),
        ExportFormat::Pdf => Ok(pdf::render_pdf(&markdown::render_markdown(report, tz))),
    }
}

/// `time-report_<first day>_<last day>.<ext>`
pub fn default_file_name<Tz: TimeZone>(format: ExportFormat, window: &TimeWindow, tz: &Tz) -> String {
    format!(
        "time-report_{}_{}.{}",
        local_date(tz, window.start).format("%Y-%m-%d"),
        local_date(tz, window.end).format("%Y-%m-%d"),
        format.extension()
    )
}

/// Renders and writes the export. Errors are returned as is, there are no retries.
#[instrument(skip(report, tz))]
pub async fn write_export<Tz: TimeZone>(
    format: ExportFormat,
    report: &Report,
    tz: &Tz,
    path: &Path,
) -> Result<()>
where
    Tz::Offset: Display,
{
    let content = render(format, report, tz)?;
    tokio::fs::write(path, &content).await?;
    info!("Exported {} sessions into {path:?}", report.sessions.len());
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_data {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::{aggregation::TimeWindow, storage::entities::Session};

    use super::Report;

    pub fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, h, m, 0).unwrap()
    }

    /// Window 09:00-12:00 with one session clipped at the start, one inside, one outside.
    pub fn report() -> Report {
        let sessions = vec![
            Session::new("Review, notes", at(10, 0), at(11, 0), vec!["work".into(), "deep".into()])
                .with_id("b"),
            Session::new("Email", at(8, 30), at(9, 30), vec!["work".into()]).with_id("a"),
            Session::new("Gym", at(18, 0), at(19, 0), vec![]).with_id("c"),
        ];
        Report::new(&sessions, TimeWindow::new(at(9, 0), at(12, 0)))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    use super::{default_file_name, test_data::report, write_export, ExportFormat};

    #[test]
    fn report_selects_and_orders_sessions() {
        let report = report();
        let ids = report.sessions.iter().map(|v| v.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(report.total(), Duration::minutes(90));
        assert_eq!(report.by_tag().get("work"), Some(Duration::minutes(90)));
    }

    #[test]
    fn file_name_uses_window_dates() {
        let report = report();
        assert_eq!(
            default_file_name(ExportFormat::Markdown, &report.window, &Utc),
            "time-report_2024-01-08_2024-01-08.md"
        );
    }

    #[tokio::test]
    async fn writes_every_format() -> Result<()> {
        let dir = tempdir()?;
        let report = report();
        for format in [
            ExportFormat::Csv,
            ExportFormat::Json,
            ExportFormat::Markdown,
            ExportFormat::Pdf,
        ] {
            let path = dir.path().join(default_file_name(format, &report.window, &Utc));
            write_export(format, &report, &Utc, &path).await?;
            assert!(std::fs::metadata(&path)?.len() > 0, "{format}");
        }
        Ok(())
    }
}
