use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

const MICROS_PER_SEC: u32 = 1_000_000;
const FRACTION_DIGITS: usize = 6;

/// A Slack message timestamp (`"1700000000.123456"`).
///
/// Parsed without going through floating point so the full microsecond
/// precision survives and two timestamps compare exactly like the strings
/// Slack uses as message ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: i64,
    micros: u32,
}

impl Timestamp {
    pub const fn new(seconds: i64, micros: u32) -> Self {
        Self {
            seconds: seconds + (micros / MICROS_PER_SEC) as i64,
            micros: micros % MICROS_PER_SEC,
        }
    }

    pub const fn from_secs(seconds: i64) -> Self {
        Self::new(seconds, 0)
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::new(dt.timestamp(), dt.timestamp_subsec_micros())
    }

    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || AppError::InvalidTimestamp(s.to_string());

        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (s, None),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let seconds: i64 = whole.parse().map_err(|_| invalid())?;

        let micros = match fraction {
            None => 0,
            Some(f) if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) => {
                return Err(invalid());
            }
            Some(f) => {
                // digits past microseconds are dropped, shorter fractions are right-padded
                let kept: String = f.chars().take(FRACTION_DIGITS).collect();
                let padded = format!("{:0<width$}", kept, width = FRACTION_DIGITS);
                padded.parse::<u32>().map_err(|_| invalid())?
            }
        };

        Ok(Self { seconds, micros })
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn micros(&self) -> u32 {
        self.micros
    }

    /// The timestamp one microsecond earlier.
    pub fn prev(&self) -> Self {
        if self.micros > 0 {
            Self::new(self.seconds, self.micros - 1)
        } else {
            Self::new(self.seconds.saturating_sub(1), MICROS_PER_SEC - 1)
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.micros * 1000)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.seconds, self.micros)
    }
}

impl FromStr for Timestamp {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Attachment summary. Only the fallback text is interpreted, the rest of
/// the upstream object is carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fallback: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One message of a channel history, as returned by `conversations.history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    pub fn new(ts: impl Into<String>, user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            ts: ts.into(),
            user: Some(user.into()),
            text: text.into(),
            attachments: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_attachment(mut self, fallback: impl Into<String>) -> Self {
        self.attachments.push(Attachment {
            fallback: fallback.into(),
            extra: serde_json::Map::new(),
        });
        self
    }

    pub fn timestamp(&self) -> Result<Timestamp> {
        Timestamp::parse(&self.ts)
    }

    /// The posting account: `user`, or for bot posts `username`/`bot_id`.
    pub fn author(&self) -> &str {
        if let Some(user) = self.user.as_deref() {
            return user;
        }
        ["username", "bot_id"]
            .iter()
            .find_map(|key| self.extra.get(*key).and_then(|v| v.as_str()))
            .unwrap_or("")
    }
}
