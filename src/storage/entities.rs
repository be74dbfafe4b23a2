use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Label given to sessions saved without a title.
pub const UNTITLED_TASK: &str = "Untitled Task";

/// A completed time entry. This is the shape stored under the `sessions` key.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Session {
    pub id: String,
    pub title: String,
    #[serde(rename = "startMs", with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(rename = "endMs", with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "nullable_tags",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
}

impl Session {
    /// Creates a session with a fresh id. The title is normalized, the interval isn't validated
    /// here, see [Tracker](crate::tracker::Tracker) for that.
    pub fn new(
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: normalize_title(title),
            start,
            end,
            tags,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self
        }
    }
}

pub fn normalize_title(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        UNTITLED_TASK.to_string()
    } else {
        title.to_string()
    }
}

/// Older documents may store `"tags": null`.
fn nullable_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Takes whatever is stored in a field and falls back to the default when it has the wrong shape,
/// so one bad field doesn't discard the whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// The single in-progress interval. It becomes a [Session] once closed.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct RunningTimer {
    pub start: DateTime<Utc>,
    pub title: String,
    pub tags: Vec<String>,
}

impl RunningTimer {
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.start).max(Duration::zero())
    }
}

/// Persisted form of the running slot, stored under the `running` key so that a timer survives
/// between invocations.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunningState {
    #[serde(default)]
    pub is_running: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub start_ms: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_tags")]
    pub tags: Vec<String>,
}

impl RunningState {
    pub fn into_timer(self) -> Option<RunningTimer> {
        match self.start_ms {
            Some(start) if self.is_running => Some(RunningTimer {
                start,
                title: self.title,
                tags: self.tags,
            }),
            _ => None,
        }
    }
}

impl From<Option<&RunningTimer>> for RunningState {
    fn from(value: Option<&RunningTimer>) -> Self {
        match value {
            Some(timer) => Self {
                is_running: true,
                start_ms: Some(timer.start),
                title: timer.title.clone(),
                tags: timer.tags.clone(),
            },
            None => Self::default(),
        }
    }
}

pub const TAG_COLORS_VERSION: u32 = 1;

/// Display colors assigned to tags, `#rrggbb` strings.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(from = "TagColorsDocument")]
pub struct TagColors {
    pub version: u32,
    pub colors: BTreeMap<String, String>,
}

impl Default for TagColors {
    fn default() -> Self {
        Self {
            version: TAG_COLORS_VERSION,
            colors: BTreeMap::new(),
        }
    }
}

impl TagColors {
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.colors.get(tag).map(String::as_str)
    }

    pub fn set(&mut self, tag: &str, color: String) {
        self.colors.insert(tag.to_string(), color);
    }

    pub fn remove(&mut self, tag: &str) -> Option<String> {
        self.colors.remove(tag)
    }
}

/// Accepts both the versioned record and the bare tag → color mapping written by earlier
/// versions.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagColorsDocument {
    Bare(BTreeMap<String, String>),
    Versioned {
        #[serde(default, deserialize_with = "lenient")]
        version: u32,
        #[serde(default, deserialize_with = "lenient")]
        colors: BTreeMap<String, String>,
    },
}

impl From<TagColorsDocument> for TagColors {
    fn from(value: TagColorsDocument) -> Self {
        match value {
            TagColorsDocument::Bare(colors) => Self {
                version: TAG_COLORS_VERSION,
                colors,
            },
            TagColorsDocument::Versioned { version, colors } => Self {
                version: version.max(TAG_COLORS_VERSION),
                colors,
            },
        }
    }
}

pub const POMODORO_SETTINGS_VERSION: u32 = 1;
pub const DEFAULT_FOCUS_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

/// Pomodoro configuration. Phase lengths are in minutes. Fields that are missing or have the
/// wrong type take their default.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Copy)]
pub struct PomodoroSettings {
    #[serde(default = "pomodoro_version", deserialize_with = "lenient_version")]
    pub version: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub enabled: bool,
    #[serde(default = "default_focus", deserialize_with = "lenient_minutes_focus")]
    pub focus: u32,
    #[serde(
        rename = "break",
        default = "default_break",
        deserialize_with = "lenient_minutes_break"
    )]
    pub break_minutes: u32,
    #[serde(default = "default_auto", deserialize_with = "lenient_auto")]
    pub auto: bool,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            version: POMODORO_SETTINGS_VERSION,
            enabled: false,
            focus: DEFAULT_FOCUS_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            auto: true,
        }
    }
}

impl PomodoroSettings {
    pub fn focus_duration(&self) -> Duration {
        Duration::minutes(self.focus as i64)
    }

    pub fn break_duration(&self) -> Duration {
        Duration::minutes(self.break_minutes as i64)
    }
}

fn pomodoro_version() -> u32 {
    POMODORO_SETTINGS_VERSION
}

fn default_focus() -> u32 {
    DEFAULT_FOCUS_MINUTES
}

fn default_break() -> u32 {
    DEFAULT_BREAK_MINUTES
}

fn default_auto() -> bool {
    true
}

fn lenient_or<'de, D, T>(deserializer: D, fallback: T) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or(fallback))
}

fn lenient_version<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    lenient_or(deserializer, POMODORO_SETTINGS_VERSION)
}

/// A zero length phase would make the cycle spin, so it's treated as invalid.
fn lenient_minutes_focus<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let minutes = lenient_or(deserializer, DEFAULT_FOCUS_MINUTES)?;
    Ok(if minutes == 0 { DEFAULT_FOCUS_MINUTES } else { minutes })
}

fn lenient_minutes_break<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let minutes = lenient_or(deserializer, DEFAULT_BREAK_MINUTES)?;
    Ok(if minutes == 0 { DEFAULT_BREAK_MINUTES } else { minutes })
}

fn lenient_auto<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    lenient_or(deserializer, true)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{
        PomodoroSettings, RunningState, RunningTimer, Session, TagColors, UNTITLED_TASK,
    };

    #[test]
    fn session_uses_millisecond_field_names() {
        let session = Session::new(
            "Write report",
            Utc.timestamp_millis_opt(1_704_672_000_000).unwrap(),
            Utc.timestamp_millis_opt(1_704_673_800_000).unwrap(),
            vec!["work".into()],
        )
        .with_id("a");
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "a",
                "title": "Write report",
                "startMs": 1_704_672_000_000i64,
                "endMs": 1_704_673_800_000i64,
                "tags": ["work"],
            })
        );
    }

    #[test]
    fn session_accepts_missing_or_null_tags() {
        let absent: Session =
            serde_json::from_str(r#"{"id":"a","title":"x","startMs":0,"endMs":1000}"#).unwrap();
        let null: Session = serde_json::from_str(
            r#"{"id":"a","title":"x","startMs":0,"endMs":1000,"tags":null}"#,
        )
        .unwrap();
        assert!(absent.tags.is_empty());
        assert!(null.tags.is_empty());
    }

    #[test]
    fn blank_titles_are_untitled() {
        let time = Utc.timestamp_millis_opt(0).unwrap();
        assert_eq!(Session::new("  ", time, time, vec![]).title, UNTITLED_TASK);
        assert_eq!(Session::new(" a ", time, time, vec![]).title, "a");
    }

    #[test]
    fn running_state_round_trips_timer() {
        let timer = RunningTimer {
            start: Utc.timestamp_millis_opt(5_000).unwrap(),
            title: "Focus".into(),
            tags: vec![],
        };
        let state = RunningState::from(Some(&timer));
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains(r#""isRunning":true"#));
        assert!(json.contains(r#""startMs":5000"#));
        let parsed: RunningState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.into_timer(), Some(timer));
    }

    #[test]
    fn stopped_running_state_has_no_timer() {
        let parsed: RunningState =
            serde_json::from_str(r#"{"isRunning":false,"startMs":null,"title":""}"#).unwrap();
        assert_eq!(parsed.into_timer(), None);

        let half: RunningState =
            serde_json::from_str(r#"{"isRunning":true,"startMs":null,"title":"x"}"#).unwrap();
        assert_eq!(half.into_timer(), None);
    }

    #[test]
    fn tag_colors_accept_bare_mapping() {
        let colors: TagColors = serde_json::from_str(r##"{"work":"#ff0000"}"##).unwrap();
        assert_eq!(colors.get("work"), Some("#ff0000"));
        assert_eq!(colors.version, 1);

        let versioned: TagColors =
            serde_json::from_str(r##"{"version":1,"colors":{"home":"#00ff00"}}"##).unwrap();
        assert_eq!(versioned.get("home"), Some("#00ff00"));
    }

    #[test]
    fn pomodoro_settings_default_invalid_fields() {
        let settings: PomodoroSettings =
            serde_json::from_str(r#"{"enabled":true,"focus":"abc","break":0}"#).unwrap();
        assert_eq!(
            settings,
            PomodoroSettings {
                enabled: true,
                ..PomodoroSettings::default()
            }
        );

        let custom: PomodoroSettings =
            serde_json::from_str(r#"{"enabled":true,"focus":50,"break":10,"auto":false}"#)
                .unwrap();
        assert_eq!(custom.focus, 50);
        assert_eq!(custom.break_minutes, 10);
        assert!(!custom.auto);
    }

    #[test]
    fn pomodoro_settings_mistyped_version_is_current() {
        let settings: PomodoroSettings =
            serde_json::from_str(r#"{"version":"one","focus":30}"#).unwrap();
        assert_eq!(settings.version, super::POMODORO_SETTINGS_VERSION);
        assert_eq!(settings.focus, 30);
    }
}
