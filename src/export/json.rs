use anyhow::Result;
use serde::Serialize;

use crate::{storage::entities::Session, utils::time::to_iso};

use super::Report;

#[derive(Serialize)]
struct JsonExport<'a> {
    #[serde(rename = "startISO")]
    start_iso: String,
    #[serde(rename = "endISO")]
    end_iso: String,
    sessions: &'a [Session],
}

pub fn render_json(report: &Report) -> Result<Vec<u8>> {
    let document = JsonExport {
        start_iso: to_iso(report.window.start),
        end_iso: to_iso(report.window.end),
        sessions: &report.sessions,
    };
    Ok(serde_json::to_vec_pretty(&document)?)
}
