//! Timestamp (de)serialization
//!
//! The content API writes offsets without a colon (`2021-03-25T19:27:35+0000`),
//! which plain RFC 3339 parsing rejects. Both spellings are accepted here.

use chrono::{DateTime, Utc};

/// Parse a content API timestamp
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// `#[serde(with = "timestamp::option")]` for `Option<DateTime<Utc>>`
pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_some(&date.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => super::parse(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw))),
            None => Ok(None),
        }
    }
}
