//! Date helper functions

use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;

/// Format a date using a Moment.js-compatible format string in the given
/// language and timezone
///
/// # Examples
/// ```ignore
/// format_date(&date, "DD MMM YYYY", "pt-BR", "America/Sao_Paulo") // -> "25 mar 2021"
/// ```
pub fn format_date(date: &DateTime<Utc>, format: &str, language: &str, timezone: &str) -> String {
    let chrono_format = moment_to_chrono_format(format);
    date.with_timezone(&resolve_timezone(timezone))
        .format_localized(&chrono_format, locale_for(language))
        .to_string()
}

/// Format a date in ISO 8601 / XML format, for `<time datetime="...">`
pub fn date_xml(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Map a language tag such as `pt-BR` to a chrono locale
pub fn locale_for(language: &str) -> Locale {
    let name = language.replace('-', "_");
    if let Ok(locale) = Locale::try_from(name.as_str()) {
        return locale;
    }

    let fallback = match name.split('_').next().unwrap_or_default() {
        "pt" => "pt_BR",
        "en" => "en_US",
        "es" => "es_ES",
        "fr" => "fr_FR",
        "de" => "de_DE",
        _ => "POSIX",
    };
    Locale::try_from(fallback).unwrap_or(Locale::POSIX)
}

/// Resolve an IANA timezone name, UTC when empty or unknown
pub fn resolve_timezone(name: &str) -> Tz {
    if name.is_empty() {
        return Tz::UTC;
    }
    name.parse().unwrap_or_else(|_| {
        tracing::warn!("Unknown timezone {:?}, falling back to UTC", name);
        Tz::UTC
    })
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest patterns first within each category
    let replacements = [
        // Year
        ("YYYY", "%Y"),
        ("YY", "%y"),
        // Month
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        // Day of month, before lowercase d
        ("DDDD", "%j"),
        ("DD", "%d"),
        // Hour 24h
        ("HH", "%H"),
        // Hour 12h
        ("hh", "%I"),
        // Minute, after MM is gone
        ("mm", "%M"),
        // Second
        ("ss", "%S"),
        // Day of week
        ("dddd", "%A"),
        ("ddd", "%a"),
        // Timezone
        ("ZZ", "%z"),
        // Milliseconds
        ("SSS", "%3f"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_date_portuguese() {
        let date = Utc.with_ymd_and_hms(2021, 3, 25, 19, 27, 35).unwrap();
        assert_eq!(format_date(&date, "DD MMM YYYY", "pt-BR", ""), "25 mar 2021");
    }

    #[test]
    fn test_format_date_english() {
        let date = Utc.with_ymd_and_hms(2021, 3, 25, 19, 27, 35).unwrap();
        assert_eq!(format_date(&date, "DD MMM YYYY", "en", ""), "25 Mar 2021");
    }

    #[test]
    fn test_format_time_in_timezone() {
        let date = Utc.with_ymd_and_hms(2021, 3, 25, 19, 27, 35).unwrap();
        assert_eq!(
            format_date(&date, "HH:mm", "pt-BR", "America/Sao_Paulo"),
            "16:27"
        );
    }

    #[test]
    fn test_unknown_timezone_is_utc() {
        assert_eq!(resolve_timezone("Mars/Olympus_Mons"), Tz::UTC);
    }

    #[test]
    fn test_moment_to_chrono() {
        assert_eq!(moment_to_chrono_format("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(moment_to_chrono_format("DD MMM YYYY"), "%d %b %Y");
        assert_eq!(moment_to_chrono_format("HH:mm:ss"), "%H:%M:%S");
    }
}
