use base64::encode;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};

use crate::DarajaApiError;

/// East Africa Time, which the gateway expects request timestamps in.
const EAT_OFFSET_SECONDS: i64 = 3 * 3600;
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Formats `now` as a `YYYYMMDDHHMMSS` request timestamp in East Africa Time.
pub fn timestamp(now: DateTime<Utc>) -> String {
    let eat = now.naive_utc() + Duration::seconds(EAT_OFFSET_SECONDS);
    eat.format(TIMESTAMP_FORMAT).to_string()
}

/// `base64(shortcode + passkey + timestamp)`
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    encode(format!("{shortcode}{passkey}{timestamp}"))
}

/// Parses the `TransactionDate` that callbacks carry (`YYYYMMDDHHMMSS`). The value is treated as UTC.
pub fn parse_transaction_date(value: &str) -> Result<DateTime<Utc>, DarajaApiError> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
        .map(|dt| Utc.from_utc_datetime(&dt))
        .map_err(|e| DarajaApiError::MalformedCallback(format!("Invalid TransactionDate '{value}'. {e}")))
}
