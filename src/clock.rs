use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// Current UTC time as ISO-8601, used to stamp log entries
pub fn now_iso8601() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("failed to format timestamp")
}

/// Time as accepted by the device's `/settime` endpoint: `YYYY-MM-DDThh:mm:ssZ`
pub fn device_time(at: OffsetDateTime) -> Result<String> {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
    at.to_offset(time::UtcOffset::UTC)
        .format(&format)
        .context("failed to format device time")
}
