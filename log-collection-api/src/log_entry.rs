use chrono::{
    DateTime, NaiveDate, TimeZone, Timelike, Utc, Weekday,
    format::{Parsed, StrftimeItems, parse},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a log file. Decides how the leading timestamp of a line is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    System,
    Wifi,
}

/// Timestamp layout of a [`LogType`].
///
/// `field_count` is the number of whitespace separated tokens the timestamp
/// spans. When `leading_weekday` is set the first of those tokens is a weekday
/// name which is checked for syntax and then dropped. When `millis` is set the
/// last token must end in `.` and exactly three digits. `layout` describes the
/// remaining text. None of the layouts carry a year, parsed timestamps land
/// in year 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatRule {
    pub layout: &'static str,
    pub field_count: usize,
    pub leading_weekday: bool,
    pub millis: bool,
}

/// `Oct 1 13:08:11`
const SYSTEM_FORMAT: FormatRule = FormatRule {
    layout: "%b %d %H:%M:%S",
    field_count: 3,
    leading_weekday: false,
    millis: false,
};

/// `Mon Sep 30 10:27:25.955`
const WIFI_FORMAT: FormatRule = FormatRule {
    layout: "%b %d %H:%M:%S",
    field_count: 4,
    leading_weekday: true,
    millis: true,
};

impl LogType {
    pub const fn format_rule(self) -> FormatRule {
        match self {
            LogType::System => SYSTEM_FORMAT,
            LogType::Wifi => WIFI_FORMAT,
        }
    }

    /// Picks the type from the requested file name, falling back to `System`.
    pub fn for_file(file_name: &str) -> Self {
        if file_name.contains("wifi") {
            LogType::Wifi
        } else {
            LogType::System
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LogType::System => "system",
            LogType::Wifi => "wifi",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One log line as served by `/api/v1/logs` and exchanged between peers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub server: String,
    pub message: String,
    #[serde(rename = "type", with = "log_type_field")]
    pub log_type: Option<LogType>,
}

impl LogEntry {
    /// Wire form of a line that could not be parsed: empty fields and the
    /// lowest timestamp any parsed line can have.
    pub fn unparsed() -> Self {
        Self {
            timestamp: unparsed_timestamp(),
            server: String::new(),
            message: String::new(),
            log_type: None,
        }
    }

    pub fn is_unparsed(&self) -> bool {
        self.log_type.is_none()
    }
}

pub fn unparsed_timestamp() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(0, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Result of running the line parser over one raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Parsed(LogEntry),
    Unparsed,
}

impl ParsedLine {
    pub fn into_entry(self) -> LogEntry {
        match self {
            ParsedLine::Parsed(entry) => entry,
            ParsedLine::Unparsed => LogEntry::unparsed(),
        }
    }
}

/// Parses a raw line. The message is the line with its whitespace collapsed
/// to single spaces.
pub fn parse_line(line: &str, log_type: LogType, server: &str) -> ParsedLine {
    let rule = log_type.format_rule();
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < rule.field_count {
        return ParsedLine::Unparsed;
    }

    let Some(timestamp) = parse_timestamp(&rule, &tokens[..rule.field_count]) else {
        return ParsedLine::Unparsed;
    };

    ParsedLine::Parsed(LogEntry {
        timestamp,
        server: server.to_string(),
        message: tokens.join(" "),
        log_type: Some(log_type),
    })
}

fn parse_timestamp(rule: &FormatRule, tokens: &[&str]) -> Option<DateTime<Utc>> {
    let tokens = if rule.leading_weekday {
        let (weekday, rest) = tokens.split_first()?;
        weekday.parse::<Weekday>().ok()?;
        rest
    } else {
        tokens
    };

    let text = tokens.join(" ");
    let (text, millis) = if rule.millis {
        let (rest, fraction) = text.rsplit_once('.')?;
        (rest.to_string(), parse_millis(fraction)?)
    } else {
        (text, 0)
    };

    let mut parsed = Parsed::new();
    parse(&mut parsed, &text, StrftimeItems::new(rule.layout)).ok()?;
    parsed.set_year(0).ok()?;
    let naive = parsed
        .to_naive_datetime_with_offset(0)
        .ok()?
        .with_nanosecond(millis * 1_000_000)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Exactly three ASCII digits.
fn parse_millis(fraction: &str) -> Option<u32> {
    if fraction.len() != 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    fraction.parse().ok()
}

/// `type` is an empty string for unparsed lines.
mod log_type_field {
    use super::LogType;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Option<LogType>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.map(LogType::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<LogType>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "" => Ok(None),
            "system" => Ok(Some(LogType::System)),
            "wifi" => Ok(Some(LogType::Wifi)),
            other => Err(D::Error::unknown_variant(other, &["", "system", "wifi"])),
        }
    }
}
