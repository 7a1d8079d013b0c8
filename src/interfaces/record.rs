//! Movement records and their wire conversions.

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::geo::Point;
use crate::proto;

/// User identifier as carried on the wire.
pub type UserId = i32;

/// Identifier assigned to a record by the store.
pub type RecordId = i64;

/// One observed displacement segment for a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub user_id: UserId,
    pub a: Point,
    pub b: Point,
    pub timestamp: DateTime<Utc>,
}

impl Record {
    /// Great-circle length of the segment in meters.
    pub fn distance(&self) -> f64 {
        self.a.distance_to(&self.b)
    }
}

/// Input for AddRecord.
#[derive(Debug, Clone, PartialEq)]
pub struct AddRecordRequest {
    pub user_id: UserId,
    pub a: Point,
    pub b: Point,
    pub timestamp: DateTime<Utc>,
}

impl AddRecordRequest {
    pub fn new(user_id: UserId, a: Point, b: Point, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id,
            a,
            b,
            timestamp,
        }
    }

    /// Copy with both points truncated to storage precision.
    pub fn truncated(&self) -> Self {
        Self {
            a: self.a.trunc(),
            b: self.b.trunc(),
            ..self.clone()
        }
    }
}

/// Input for distance aggregation. Absent bounds are unconstrained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceQuery {
    pub user_id: UserId,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// ============================================================================
// Wire conversions
// ============================================================================

impl From<Point> for proto::Point {
    fn from(p: Point) -> Self {
        proto::Point {
            longitude: p.longitude,
            latitude: p.latitude,
        }
    }
}

impl From<proto::Point> for Point {
    fn from(p: proto::Point) -> Self {
        Point::new(p.longitude, p.latitude)
    }
}

pub fn to_proto_timestamp(ts: &DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: ts.timestamp(),
        nanos: ts.timestamp_subsec_nanos() as i32,
    }
}

pub fn from_proto_timestamp(ts: &prost_types::Timestamp) -> Option<DateTime<Utc>> {
    let nanos = u32::try_from(ts.nanos).ok()?;
    DateTime::from_timestamp(ts.seconds, nanos)
}

impl From<&AddRecordRequest> for proto::AddRecordRequest {
    fn from(req: &AddRecordRequest) -> Self {
        proto::AddRecordRequest {
            user_id: req.user_id,
            a: Some(req.a.into()),
            b: Some(req.b.into()),
            timestamp: Some(to_proto_timestamp(&req.timestamp)),
        }
    }
}

/// Inbound request from a caller; missing fields are the caller's fault.
impl TryFrom<proto::AddRecordRequest> for AddRecordRequest {
    type Error = DomainError;

    fn try_from(req: proto::AddRecordRequest) -> Result<Self, Self::Error> {
        let a = req
            .a
            .ok_or_else(|| DomainError::invalid_argument("point a is required"))?;
        let b = req
            .b
            .ok_or_else(|| DomainError::invalid_argument("point b is required"))?;
        let timestamp = req
            .timestamp
            .as_ref()
            .ok_or_else(|| DomainError::invalid_argument("timestamp is required"))?;
        let timestamp = from_proto_timestamp(timestamp).ok_or_else(|| {
            DomainError::invalid_argument(format!(
                "timestamp out of range: seconds={}, nanos={}",
                timestamp.seconds, timestamp.nanos
            ))
        })?;

        Ok(AddRecordRequest::new(req.user_id, a.into(), b.into(), timestamp))
    }
}

impl From<&Record> for proto::Record {
    fn from(record: &Record) -> Self {
        proto::Record {
            id: record.id,
            user_id: record.user_id,
            a: Some(record.a.into()),
            b: Some(record.b.into()),
            timestamp: Some(to_proto_timestamp(&record.timestamp)),
        }
    }
}

/// Response from a remote server; missing fields mean the server misbehaved.
impl TryFrom<proto::Record> for Record {
    type Error = DomainError;

    fn try_from(record: proto::Record) -> Result<Self, Self::Error> {
        let missing = |field: &str| DomainError::internal(format!("record response missing {field}"));

        let a = record.a.ok_or_else(|| missing("a"))?;
        let b = record.b.ok_or_else(|| missing("b"))?;
        let timestamp = record
            .timestamp
            .as_ref()
            .and_then(from_proto_timestamp)
            .ok_or_else(|| missing("timestamp"))?;

        Ok(Record {
            id: record.id,
            user_id: record.user_id,
            a: a.into(),
            b: b.into(),
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_request() -> AddRecordRequest {
        AddRecordRequest::new(
            7,
            Point::new(37.617635123, 55.755814987),
            Point::new(37.6177, 55.7559),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_truncated_request() {
        let req = sample_request().truncated();
        assert_eq!(req.a, Point::new(37.61763512, 55.75581498));
        assert_eq!(req.user_id, 7);
    }

    #[test]
    fn test_request_to_proto_and_back() {
        let req = sample_request();
        let wire = proto::AddRecordRequest::from(&req);
        assert_eq!(wire.user_id, 7);
        assert_eq!(AddRecordRequest::try_from(wire).unwrap(), req);
    }

    #[test]
    fn test_proto_request_missing_fields_is_invalid_argument() {
        let full = proto::AddRecordRequest::from(&sample_request());

        for wire in [
            proto::AddRecordRequest { a: None, ..full.clone() },
            proto::AddRecordRequest { b: None, ..full.clone() },
            proto::AddRecordRequest {
                timestamp: None,
                ..full.clone()
            },
            proto::AddRecordRequest {
                timestamp: Some(prost_types::Timestamp {
                    seconds: 0,
                    nanos: -1,
                }),
                ..full.clone()
            },
        ] {
            let err = AddRecordRequest::try_from(wire).unwrap_err();
            assert!(matches!(err, DomainError::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_proto_record_missing_fields_is_internal() {
        let wire = proto::Record {
            id: 1,
            user_id: 2,
            a: None,
            b: Some(proto::Point::default()),
            timestamp: None,
        };
        assert!(Record::try_from(wire).unwrap_err().is_internal());
    }

    #[test]
    fn test_timestamp_conversion_keeps_nanos() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let wire = to_proto_timestamp(&ts);
        assert_eq!(wire.nanos, 123_456_789);
        assert_eq!(from_proto_timestamp(&wire), Some(ts));
    }
}
