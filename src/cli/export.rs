use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{Local, TimeZone};
use clap::Parser;

use crate::{
    aggregation::{filter_by_tag, TimeWindow},
    export::{default_file_name, write_export, ExportFormat, Report},
    storage::state_store::StateStore,
};

use super::{load_tracker, range::RangeArgs};

#[derive(Debug, Parser)]
pub struct ExportCommand {
    #[arg(help = "Format of the exported file")]
    format: ExportFormat,
    #[command(flatten)]
    range: RangeArgs,
    #[arg(long, help = "Only export sessions carrying this tag")]
    tag: Option<String>,
    #[arg(
        long,
        short,
        help = "Output file or directory. By default the file is written into the current directory"
    )]
    out: Option<PathBuf>,
}

pub async fn process_export(store: &impl StateStore, command: ExportCommand) -> Result<()> {
    let tracker = load_tracker(store).await;
    let window = command.range.resolve(&Local, tracker.now())?;
    let sessions = match &command.tag {
        Some(tag) => filter_by_tag(tracker.sessions(), tag),
        None => tracker.sessions().to_vec(),
    };
    let report = Report::new(&sessions, window);

    let path = output_path(command.out.as_deref(), command.format, &window, &Local);
    write_export(command.format, &report, &Local, &path).await?;
    println!("Exported {} sessions to {}", report.sessions.len(), path.display());
    Ok(())
}

/// `--out` naming a directory gets the default file name appended.
fn output_path<Tz: TimeZone>(
    out: Option<&Path>,
    format: ExportFormat,
    window: &TimeWindow,
    tz: &Tz,
) -> PathBuf {
    let file_name = || default_file_name(format, window, tz);
    match out {
        Some(path) if path.is_dir() => path.join(file_name()),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name()),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use anyhow::Result;
    use chrono::{NaiveDate, Utc};
    use tempfile::tempdir;

    use crate::{aggregation::week_bounds, export::ExportFormat};

    use super::output_path;

    #[test]
    fn output_path_defaults_to_file_name() -> Result<()> {
        let window = week_bounds(&Utc, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        let dir = tempdir()?;

        assert_eq!(
            output_path(None, ExportFormat::Csv, &window, &Utc),
            PathBuf::from("time-report_2024-01-08_2024-01-14.csv")
        );
        assert_eq!(
            output_path(Some(dir.path()), ExportFormat::Pdf, &window, &Utc),
            dir.path().join("time-report_2024-01-08_2024-01-14.pdf")
        );
        let explicit = dir.path().join("report.json");
        assert_eq!(
            output_path(Some(&explicit), ExportFormat::Json, &window, &Utc),
            explicit
        );
        Ok(())
    }
}
