//! Response-side serializers for date-like string formats.
//!
//! A tagged schema carries `x-serializer: {"format": "<format>"}`. The
//! validator-building side looks the tag up with [`SerializerTag::from_schema`]
//! and uses [`SerializerTag::serialize`] to turn a rehydrated date value back
//! into its wire string.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Schema keyword the tag is stored under.
pub const SERIALIZER_KEYWORD: &str = "x-serializer";

/// Date-like formats that get a serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[serde(rename = "date-time")]
    DateTime,
    #[serde(rename = "date")]
    Date,
}

impl DateFormat {
    /// Recognize a schema `format` value.
    pub fn from_format(format: &str) -> Option<Self> {
        match format {
            "date-time" => Some(DateFormat::DateTime),
            "date" => Some(DateFormat::Date),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DateFormat::DateTime => "date-time",
            DateFormat::Date => "date",
        }
    }
}

/// Serializer attached to a `date` / `date-time` response schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializerTag {
    pub format: DateFormat,
}

impl SerializerTag {
    pub fn new(format: DateFormat) -> Self {
        Self { format }
    }

    /// Read the tag back from a preprocessed schema.
    pub fn from_schema(schema: &Value) -> Option<Self> {
        serde_json::from_value(schema.get(SERIALIZER_KEYWORD)?.clone()).ok()
    }

    /// JSON form written into the schema.
    pub fn to_value(self) -> Value {
        json!({ "format": self.format.as_str() })
    }

    /// ISO form of `value` in UTC: `2020-01-02T03:04:05.000Z` for date-time,
    /// `2020-01-02` for date.
    pub fn serialize<Tz: TimeZone>(&self, value: &DateTime<Tz>) -> String {
        let utc = value.with_timezone(&Utc);
        match self.format {
            DateFormat::DateTime => utc.to_rfc3339_opts(SecondsFormat::Millis, true),
            DateFormat::Date => utc.format("%Y-%m-%d").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_date_time_serializes_full_timestamp() {
        let tag = SerializerTag::new(DateFormat::DateTime);
        assert_eq!(tag.serialize(&instant()), "2020-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_date_serializes_calendar_date() {
        let tag = SerializerTag::new(DateFormat::Date);
        assert_eq!(tag.serialize(&instant()), "2020-01-02");
    }

    #[test]
    fn test_offsets_are_normalized_to_utc() {
        // 23:30 at -05:00 is already the next day in UTC.
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let late = offset.with_ymd_and_hms(2020, 1, 1, 23, 30, 0).unwrap();
        assert_eq!(SerializerTag::new(DateFormat::Date).serialize(&late), "2020-01-02");
        assert_eq!(
            SerializerTag::new(DateFormat::DateTime).serialize(&late),
            "2020-01-02T04:30:00.000Z"
        );
    }

    #[test]
    fn test_tag_round_trips_through_schema() {
        let tag = SerializerTag::new(DateFormat::Date);
        let schema = json!({ "type": ["object", "string"], "x-serializer": tag.to_value() });
        assert_eq!(SerializerTag::from_schema(&schema), Some(tag));
        assert_eq!(SerializerTag::from_schema(&json!({ "type": "string" })), None);
    }

    #[test]
    fn test_unknown_formats_are_ignored() {
        assert_eq!(DateFormat::from_format("date-time"), Some(DateFormat::DateTime));
        assert_eq!(DateFormat::from_format("time"), None);
        assert_eq!(DateFormat::from_format("email"), None);
    }
}
