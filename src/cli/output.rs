use std::{fmt::Display, io::IsTerminal};

use ansi_term::Colour;
use chrono::{DateTime, TimeZone, Utc};

use crate::{
    storage::entities::{RunningTimer, Session, TagColors},
    utils::time::{format_hms, to_local_string},
};

/// Fallback colors for tags without an assigned one.
const PALETTE: [(u8, u8, u8); 8] = [
    (0x4e, 0x79, 0xa7),
    (0xf2, 0x8e, 0x2b),
    (0xe1, 0x57, 0x59),
    (0x76, 0xb7, 0xb2),
    (0x59, 0xa1, 0x4f),
    (0xed, 0xc9, 0x48),
    (0xb0, 0x7a, 0xa1),
    (0xff, 0x9d, 0xa7),
];

/// Escape codes are only written when stdout is a terminal.
pub fn colors_enabled() -> bool {
    std::io::stdout().is_terminal()
}

/// Parses `#rrggbb`.
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// The same tag always lands on the same palette entry.
fn palette_color(tag: &str) -> (u8, u8, u8) {
    let hash = tag
        .bytes()
        .fold(0u32, |acc, v| acc.wrapping_mul(31).wrapping_add(v as u32));
    PALETTE[hash as usize % PALETTE.len()]
}

/// Assigned color of `tag`. Invalid assigned values fall back to the palette.
pub fn tag_color(colors: &TagColors, tag: &str) -> Colour {
    let (r, g, b) = colors
        .get(tag)
        .and_then(parse_hex_color)
        .unwrap_or_else(|| palette_color(tag));
    Colour::RGB(r, g, b)
}

pub fn paint_tag(colors: &TagColors, tag: &str, enabled: bool) -> String {
    let label = format!("#{tag}");
    if enabled {
        tag_color(colors, tag).paint(label).to_string()
    } else {
        label
    }
}

pub fn format_tags(colors: &TagColors, tags: &[String], enabled: bool) -> String {
    tags.iter()
        .map(|tag| paint_tag(colors, tag, enabled))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `<id>  <start> - <end>  <hh:mm:ss>  <title> <tags>`, ids are shortened to 8 characters which
/// is enough to address a session in `edit` and `delete`.
pub fn session_line<Tz: TimeZone>(
    tz: &Tz,
    session: &Session,
    colors: &TagColors,
    enabled: bool,
) -> String
where
    Tz::Offset: Display,
{
    let id = session.id.get(..8).unwrap_or(session.id.as_str());
    let line = format!(
        "{id:<8}  {} - {}  {}  {}",
        to_local_string(tz, session.start),
        to_local_string(tz, session.end),
        format_hms(session.duration()),
        session.title
    );
    with_tags(line, colors, &session.tags, enabled)
}

pub fn running_line<Tz: TimeZone>(
    tz: &Tz,
    running: &RunningTimer,
    now: DateTime<Utc>,
    colors: &TagColors,
    enabled: bool,
) -> String
where
    Tz::Offset: Display,
{
    let line = format!(
        "{:<8}  {} - {:<19}  {}  {}",
        "running",
        to_local_string(tz, running.start),
        "now",
        format_hms(running.elapsed(now)),
        running.title
    );
    with_tags(line, colors, &running.tags, enabled)
}

fn with_tags(line: String, colors: &TagColors, tags: &[String], enabled: bool) -> String {
    if tags.is_empty() {
        line
    } else {
        format!("{line} {}", format_tags(colors, tags, enabled))
    }
}

#[cfg(test)]
mod tests {
    use ansi_term::Colour;
    use chrono::{TimeZone, Utc};

    use crate::storage::entities::{Session, TagColors};

    use super::{palette_color, parse_hex_color, session_line, tag_color};

    #[test]
    fn hex_colors_are_parsed() {
        assert_eq!(parse_hex_color("#ff8000"), Some((255, 128, 0)));
        assert_eq!(parse_hex_color("ff8000"), None);
        assert_eq!(parse_hex_color("#ff80"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
        assert_eq!(parse_hex_color("#ффф"), None);
    }

    #[test]
    fn invalid_assigned_colors_fall_back_to_palette() {
        let mut colors = TagColors::default();
        colors.set("work", "#010203".into());
        colors.set("home", "blue".into());

        assert_eq!(tag_color(&colors, "work"), Colour::RGB(1, 2, 3));
        let (r, g, b) = palette_color("home");
        assert_eq!(tag_color(&colors, "home"), Colour::RGB(r, g, b));
        assert_eq!(palette_color("home"), palette_color("home"));
    }

    #[test]
    fn session_line_is_plain_without_colors() {
        let session = Session::new(
            "Write docs",
            Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 8, 10, 30, 0).unwrap(),
            vec!["work".into()],
        )
        .with_id("0123456789");

        assert_eq!(
            session_line(&Utc, &session, &TagColors::default(), false),
            "01234567  2024-01-08 09:00:00 - 2024-01-08 10:30:00  01:30:00  Write docs #work"
        );
    }
}
