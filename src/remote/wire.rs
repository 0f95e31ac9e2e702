//! JSON reply shapes.
//!
//! The engine is loose about numbers: ids, statuses and bounds arrive either as
//! JSON numbers or as numeric strings, so every numeric field is decoded
//! leniently. A missing `status` counts as failure.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Status assumed when a reply carries none.
const MISSING_STATUS: i64 = -1;

fn missing_status() -> i64 {
    MISSING_STATUS
}

fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn value_as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn status<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(value_as_i64(&v).unwrap_or(MISSING_STATUS))
}

fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(value_as_u64(&v))
}

/// Unparsable ids coerce to `0`, the resolution-failed sentinel.
fn u64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(value_as_u64(&v).unwrap_or(0))
}

fn port<'de, D: Deserializer<'de>>(d: D) -> Result<u16, D::Error> {
    let v = Value::deserialize(d)?;
    value_as_u64(&v)
        .and_then(|p| u16::try_from(p).ok())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid segment port: {v}")))
}

/// `{status}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusReply {
    #[serde(default = "missing_status", deserialize_with = "status")]
    pub status: i64,
}

impl StatusReply {
    pub fn ok() -> Self {
        Self { status: 0 }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 0
    }
}

/// One entry of the segment topology.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SegmentInfo {
    #[serde(default, deserialize_with = "opt_u64")]
    pub segment: Option<u64>,
    pub host: String,
    #[serde(deserialize_with = "port")]
    pub sport: u16,
}

/// `{status, segments: [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SegmentsReply {
    #[serde(default = "missing_status", deserialize_with = "status")]
    pub status: i64,
    #[serde(default)]
    pub segments: Vec<SegmentInfo>,
}

impl SegmentsReply {
    pub fn is_ok(&self) -> bool {
        self.status == 0
    }
}

/// `{status, max, min}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemSizeReply {
    #[serde(default = "missing_status", deserialize_with = "status")]
    pub status: i64,
    #[serde(default, deserialize_with = "opt_u64")]
    pub max: Option<u64>,
    #[serde(default, deserialize_with = "opt_u64")]
    pub min: Option<u64>,
}

impl ItemSizeReply {
    pub fn is_ok(&self) -> bool {
        self.status == 0
    }
}

/// `{status, id}` from any of the conversion endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdReply {
    #[serde(default = "missing_status", deserialize_with = "status")]
    pub status: i64,
    #[serde(default, deserialize_with = "opt_u64")]
    pub id: Option<u64>,
}

impl IdReply {
    pub fn found(id: u64) -> Self {
        Self {
            status: 0,
            id: Some(id),
        }
    }

    pub fn failed(status: i64) -> Self {
        Self { status, id: None }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 0
    }

    /// The id, or `0` when the reply carried none.
    pub fn id(&self) -> u64 {
        self.id.unwrap_or(0)
    }
}

/// One match of a receivers query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Receiver {
    #[serde(default)]
    pub class: String,
    #[serde(rename = "type", default, deserialize_with = "u64_or_zero")]
    pub type_id: u64,
    #[serde(default, deserialize_with = "u64_or_zero")]
    pub item: u64,
}

impl Receiver {
    pub fn subject(type_id: u64, item: u64) -> Self {
        Self {
            class: "subject".into(),
            type_id,
            item,
        }
    }

    pub fn object(type_id: u64, item: u64) -> Self {
        Self {
            class: "object".into(),
            type_id,
            item,
        }
    }
}

/// `{status, receivers: [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReceiversReply {
    #[serde(default = "missing_status", deserialize_with = "status")]
    pub status: i64,
    #[serde(default)]
    pub receivers: Vec<Receiver>,
}

impl ReceiversReply {
    pub fn page(receivers: Vec<Receiver>) -> Self {
        Self {
            status: 0,
            receivers,
        }
    }

    pub fn failed(status: i64) -> Self {
        Self {
            status,
            receivers: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_reply_parses() {
        let reply: SegmentsReply = serde_json::from_str(
            r#"{"status":0,"segments":[
                {"segment":0,"host":"h0","sport":4000},
                {"segment":"1","host":"h1","sport":"4001"}]}"#,
        )
        .unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.segments.len(), 2);
        assert_eq!(reply.segments[1].segment, Some(1));
        assert_eq!(reply.segments[1].sport, 4001);
    }

    #[test]
    fn bad_port_is_rejected() {
        let res: Result<SegmentInfo, _> =
            serde_json::from_str(r#"{"host":"h","sport":70000}"#);
        assert!(res.is_err());
    }

    #[test]
    fn missing_status_is_failure() {
        let reply: StatusReply = serde_json::from_str("{}").unwrap();
        assert!(!reply.is_ok());
    }

    #[test]
    fn string_status_and_ids_are_accepted() {
        let reply: IdReply = serde_json::from_str(r#"{"status":"0","id":"17"}"#).unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.id(), 17);
    }

    #[test]
    fn id_reply_without_id_yields_zero() {
        let reply: IdReply = serde_json::from_str(r#"{"status":2}"#).unwrap();
        assert!(!reply.is_ok());
        assert_eq!(reply.id(), 0);
    }

    #[test]
    fn receivers_use_type_key() {
        let reply: ReceiversReply = serde_json::from_str(
            r#"{"status":0,"receivers":[{"class":"object","type":"2","item":20}]}"#,
        )
        .unwrap();
        assert_eq!(reply.receivers, vec![Receiver::object(2, 20)]);
    }

    #[test]
    fn item_size_partial_reply() {
        let reply: ItemSizeReply = serde_json::from_str(r#"{"status":0,"max":1000}"#).unwrap();
        assert_eq!(reply.max, Some(1000));
        assert_eq!(reply.min, None);
    }
}
