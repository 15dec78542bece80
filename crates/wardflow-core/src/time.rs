use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Current UTC timestamp, the only clock source the records use.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Formats a timestamp as RFC 3339 for logs and response payloads.
pub fn format_rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_default()
}
