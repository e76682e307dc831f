use chrono::DateTime;
use chrono_tz::Tz;

use crate::error::RenderError;

/// Export timestamps: microseconds and a numeric offset, e.g. `2022-04-01T12:00:00.000000+0000`.
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%6f%z";
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Parse an export timestamp and format it in `zone` as `YYYY-MM-DD HH:MM:SS ZONE`.
pub fn render_time(when: &str, zone: Tz) -> Result<String, RenderError> {
    let parsed =
        DateTime::parse_from_str(when, EXPORT_TIMESTAMP_FORMAT).map_err(|source| {
            RenderError::Timestamp {
                input: when.to_owned(),
                source,
            }
        })?;
    Ok(parsed
        .with_timezone(&zone)
        .format(DISPLAY_FORMAT)
        .to_string())
}

/// Zone of the running system, UTC if it can't be determined.
pub fn system_zone() -> Tz {
    if let Some(zone) = std::env::var("TZ").ok().and_then(|tz| parse_zone(&tz)) {
        return zone;
    }
    match iana_time_zone::get_timezone() {
        Ok(name) => parse_zone(&name).unwrap_or_else(|| {
            tracing::warn!(zone = %name, "unknown system time zone, using UTC");
            Tz::UTC
        }),
        Err(e) => {
            tracing::warn!(error = %e, "couldn't determine system time zone, using UTC");
            Tz::UTC
        }
    }
}

pub fn parse_zone(name: &str) -> Option<Tz> {
    // TZ may carry the POSIX `:` prefix
    name.trim_start_matches(':').parse().ok()
}
