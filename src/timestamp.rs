//! Timestamp decoding
//!
//! The services are inconsistent about time values. Projects and tasks pass
//! through a gRPC gateway and arrive as protobuf `Timestamp` objects
//! (`{"seconds": "1735689600", "nanos": 0}`, int64 rendered as a string),
//! notifications come straight from Go as RFC 3339 strings, and some forms
//! send bare `YYYY-MM-DD` dates.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TaskflowError};

/// Wire form of any timestamp field
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum RawTimestamp {
    Proto {
        #[serde(default)]
        seconds: Value,
        #[serde(default)]
        nanos: Value,
    },
    Text(String),
}

impl RawTimestamp {
    pub fn decode(&self) -> Result<DateTime<Utc>> {
        match self {
            RawTimestamp::Proto { seconds, nanos } => {
                let secs = int_field(seconds).ok_or_else(|| invalid(seconds))?;
                let nanos = int_field(nanos).unwrap_or(0);
                let nanos = u32::try_from(nanos).map_err(|_| invalid(&Value::from(nanos)))?;
                Utc.timestamp_opt(secs, nanos)
                    .single()
                    .ok_or_else(|| invalid(&Value::from(secs)))
            }
            RawTimestamp::Text(text) => parse_text(text),
        }
    }
}

/// Parse an RFC 3339 string or a bare date (midnight UTC)
pub fn parse_text(text: &str) -> Result<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }
    Err(TaskflowError::InvalidTimestamp {
        value: text.to_string(),
    })
}

/// Protobuf JSON renders int64 as a string, int32 as a number
fn int_field(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn invalid(value: &Value) -> TaskflowError {
    TaskflowError::InvalidTimestamp {
        value: value.to_string(),
    }
}

/// Protobuf-style encoding used on outgoing requests
pub fn to_proto(dt: &DateTime<Utc>) -> RawTimestamp {
    RawTimestamp::Proto {
        seconds: Value::String(dt.timestamp().to_string()),
        nanos: Value::from(dt.timestamp_subsec_nanos()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Result<DateTime<Utc>> {
        let raw: RawTimestamp = serde_json::from_value(value)?;
        raw.decode()
    }

    #[test]
    fn test_proto_with_string_seconds() {
        let dt = decode(json!({"seconds": "1735689600", "nanos": 0})).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_proto_with_numeric_seconds_and_no_nanos() {
        let dt = decode(json!({"seconds": 1735689600})).unwrap();
        assert_eq!(dt.timestamp(), 1_735_689_600);
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let dt = decode(json!("2024-12-05T10:30:00+01:00")).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-12-05T09:30:00+00:00");
    }

    #[test]
    fn test_bare_date_is_midnight_utc() {
        let dt = decode(json!("2025-03-01")).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(decode(json!("next tuesday")).is_err());
        assert!(decode(json!({"seconds": "abc"})).is_err());
        assert!(decode(json!({"seconds": 10, "nanos": -1})).is_err());
    }

    #[test]
    fn test_to_proto_decodes_back() {
        let dt = parse_text("2025-06-01T12:00:00Z").unwrap();
        assert_eq!(to_proto(&dt).decode().unwrap(), dt);
    }
}
