use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tokio::task_local;

task_local! {
    pub static FIXED_NOW: DateTime;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTime {
    delegate: chrono::DateTime<chrono::Local>,
}

impl DateTime {
    fn new<T: chrono::TimeZone>(delegate: chrono::DateTime<T>) -> Self {
        Self {
            delegate: delegate.with_timezone(&chrono::Local),
        }
    }

    pub fn now() -> Self {
        FIXED_NOW
            .try_with(|t| *t)
            .unwrap_or_else(|_| chrono::Local::now().into())
    }

    //RFC 3339, or a naive local timestamp as sent by clients that drop the offset
    pub fn from_iso(iso8601: &str) -> anyhow::Result<Self> {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(iso8601) {
            return Ok(dt.into());
        }

        let naive = chrono::NaiveDateTime::parse_from_str(iso8601, "%Y-%m-%dT%H:%M:%S%.f")?;
        naive
            .and_local_timezone(chrono::Local)
            .earliest()
            .map(Into::into)
            .ok_or_else(|| anyhow::anyhow!("Local time {} does not exist", iso8601))
    }

    pub fn to_iso_string(&self) -> String {
        self.delegate.to_rfc3339()
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.delegate.format("%Y-%m-%d %H:%M:%S"))
    }
}

impl<T: chrono::TimeZone> From<chrono::DateTime<T>> for DateTime {
    fn from(val: chrono::DateTime<T>) -> Self {
        DateTime::new(val)
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso_string())
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::from_iso(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = DateTime::from_iso("2024-11-03T15:23:46+01:00").unwrap();
        assert_eq!(dt, DateTime::from_iso("2024-11-03T14:23:46Z").unwrap());
    }

    #[test]
    fn parses_naive_timestamp_with_fraction_as_local_time() {
        let dt = DateTime::from_iso("2024-11-03T15:23:46.1234567").unwrap();
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 11, 3)
            .unwrap()
            .and_hms_opt(15, 23, 46)
            .unwrap();

        assert_eq!(dt.delegate.naive_local().date(), expected.date());
        assert_eq!(dt.delegate.naive_local().format("%H:%M:%S").to_string(), "15:23:46");
    }

    #[test]
    fn rejects_garbage() {
        assert!(DateTime::from_iso("yesterday").is_err());
    }

    #[test]
    fn serde_uses_iso_string() {
        let dt = DateTime::from_iso("2024-11-03T14:23:46Z").unwrap();
        let json = serde_json::to_string(&dt).unwrap();
        let parsed: DateTime = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, dt);
    }

    #[tokio::test]
    async fn now_is_fixed_inside_scope() {
        let fixed = DateTime::from_iso("2024-11-03T14:23:46Z").unwrap();
        let now = FIXED_NOW.scope(fixed, async { DateTime::now() }).await;

        assert_eq!(now, fixed);
    }
}
