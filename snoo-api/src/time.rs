//! The platform sends timestamps as float seconds since the epoch, and
//! `edited` as either `false` or such a timestamp.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use crate::Time;

fn from_secs(secs: f64) -> Option<Time> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round() as u32;
    Utc.timestamp_opt(whole, nanos.min(999_999_999)).single()
}

fn to_secs(t: &Time) -> f64 {
    t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) / 1e9
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Stamp {
    Seconds(f64),
    Flag(bool),
}

pub mod created {
    use super::*;

    pub fn serialize<S: Serializer>(t: &Option<Time>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_f64(to_secs(t)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Time>, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.and_then(from_secs))
    }
}

pub mod edited {
    use super::*;

    pub fn serialize<S: Serializer>(t: &Option<Time>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_f64(to_secs(t)),
            None => s.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Time>, D::Error> {
        Ok(match Option::<Stamp>::deserialize(d)? {
            Some(Stamp::Seconds(secs)) => from_secs(secs),
            Some(Stamp::Flag(_)) | None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize, serde::Serialize)]
    struct Stamped {
        #[serde(default, with = "created")]
        created_utc: Option<Time>,
        #[serde(default, with = "edited")]
        edited: Option<Time>,
    }

    #[test]
    fn float_seconds() {
        let s: Stamped =
            serde_json::from_str(r#"{"created_utc": 1600000000.0, "edited": false}"#).unwrap();
        assert_eq!(s.created_utc, Utc.timestamp_opt(1600000000, 0).single());
        assert_eq!(s.edited, None);

        let s: Stamped =
            serde_json::from_str(r#"{"created_utc": null, "edited": 1600000100.5}"#).unwrap();
        assert_eq!(s.created_utc, None);
        assert_eq!(s.edited, Utc.timestamp_opt(1600000100, 500_000_000).single());
    }

    #[test]
    fn missing_fields() {
        let s: Stamped = serde_json::from_str("{}").unwrap();
        assert_eq!(s.created_utc, None);
        assert_eq!(s.edited, None);
    }

    #[test]
    fn serializes_back_to_wire_shape() {
        let s = Stamped {
            created_utc: Utc.timestamp_opt(1600000000, 0).single(),
            edited: None,
        };
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            serde_json::json!({"created_utc": 1600000000.0, "edited": false})
        );
    }

    #[test]
    fn rejects_strings() {
        assert!(serde_json::from_str::<Stamped>(r#"{"created_utc": "yesterday"}"#).is_err());
    }
}
