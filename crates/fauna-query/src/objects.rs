//! Wrapped value types that round-trip through the wire format with an
//! identity distinct from plain data.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::codec;
use crate::error::{QueryError, QueryResult};
use crate::expr::Expr;
use crate::value::Value;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Reference to a remote resource: an instance (`classes/widgets/123`), or a
/// class, index or database identifier itself (`classes/widgets`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ref(String);

impl Ref {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Address a resource nested under this one, e.g. an instance of a class.
    pub fn child(&self, id: impl fmt::Display) -> Self {
        Self(format!("{}/{id}", self.0))
    }

    /// Last path component.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The enclosing resource, if this ref has more than one component.
    pub fn parent(&self) -> Option<Ref> {
        self.0.rsplit_once('/').map(|(parent, _)| Ref::new(parent))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A symbolic, possibly unbounded collection of refs.
///
/// A set carries the canonical wire form of the one expression that produced
/// it. Two sets are equal exactly when those forms are structurally equal, so a
/// set decoded from a paginate-with-sources reply compares equal to the same
/// query built locally.
#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    form: Json,
}

impl Set {
    pub fn new(expr: impl Into<Expr>) -> Self {
        Self {
            form: codec::to_json(&expr.into()),
        }
    }

    /// Wrap an already-encoded set description, as found under `@set`.
    pub fn from_wire(form: Json) -> Self {
        Self { form }
    }

    pub fn wire(&self) -> &Json {
        &self.form
    }
}

/// Resolution of an epoch offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Second => "second",
            TimeUnit::Millisecond => "millisecond",
            TimeUnit::Microsecond => "microsecond",
            TimeUnit::Nanosecond => "nanosecond",
        }
    }

    fn nanos(&self) -> i128 {
        match self {
            TimeUnit::Second => NANOS_PER_SECOND,
            TimeUnit::Millisecond => 1_000_000,
            TimeUnit::Microsecond => 1_000,
            TimeUnit::Nanosecond => 1,
        }
    }
}

/// A timestamp with nanosecond resolution.
///
/// Equality and ordering are by instant, so a time parsed from ISO-8601 and
/// one built from an epoch offset compare equal when they denote the same
/// nanosecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaunaTime(DateTime<Utc>);

impl FaunaTime {
    /// Parse an ISO-8601 / RFC 3339 timestamp such as
    /// `1970-01-01T00:00:00.123456789Z`.
    pub fn parse(iso: &str) -> QueryResult<Self> {
        DateTime::parse_from_rfc3339(iso)
            .map(|t| Self(t.with_timezone(&Utc)))
            .map_err(|e| QueryError::InvalidTime(format!("{iso}: {e}")))
    }

    /// Offset from the Unix epoch.
    pub fn from_epoch(amount: i64, unit: TimeUnit) -> QueryResult<Self> {
        let nanos = amount as i128 * unit.nanos();
        let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SECOND))
            .map_err(|_| QueryError::InvalidTime(format!("{amount} {} out of range", unit.as_str())))?;
        let subsec = nanos.rem_euclid(NANOS_PER_SECOND) as u32;

        DateTime::from_timestamp(secs, subsec)
            .map(Self)
            .ok_or_else(|| QueryError::InvalidTime(format!("{amount} {} out of range", unit.as_str())))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// RFC 3339 rendering with as many fractional digits as needed.
    pub fn to_iso(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl From<DateTime<Utc>> for FaunaTime {
    fn from(t: DateTime<Utc>) -> Self {
        Self(t)
    }
}

impl fmt::Display for FaunaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso())
    }
}

// Wrapped values serialize to their special forms, so they can sit inside
// `json!` data passed to `quote`.
macro_rules! impl_special_form_serialize {
    ($($t:ty => $to_expr:expr),+ $(,)?) => {
        $(impl Serialize for $t {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let to_expr: fn(&$t) -> Expr = $to_expr;
                codec::to_json(&to_expr(self)).serialize(serializer)
            }
        })+
    };
}

impl_special_form_serialize! {
    Ref => |r| Expr::Ref(r.clone()),
    Set => |s| Expr::Set(s.clone()),
    FaunaTime => |t| Expr::Time(*t),
}

/// Kind of point mutation recorded by an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Delete => "delete",
        }
    }
}

/// Timestamp of an event: either raw microseconds as reported by the server
/// or a resolved time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTs {
    Int(i64),
    Time(FaunaTime),
}

impl From<i64> for EventTs {
    fn from(ts: i64) -> Self {
        EventTs::Int(ts)
    }
}

impl From<FaunaTime> for EventTs {
    fn from(ts: FaunaTime) -> Self {
        EventTs::Time(ts)
    }
}

/// A point mutation of one resource, fed to `insert`/`remove`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    pub resource: Ref,
    pub ts: EventTs,
    pub action: Action,
}

impl Event {
    pub fn new(resource: Ref, ts: impl Into<EventTs>, action: Action) -> Self {
        Self {
            resource,
            ts: ts.into(),
            action,
        }
    }

    /// Decode the `{"resource", "ts", "action"}` shape found in event pages.
    pub fn from_value(value: &Value) -> QueryResult<Self> {
        let Value::Object(fields) = value else {
            return Err(QueryError::Decode(format!("expected event object, got {value:?}")));
        };

        let resource = match fields.get("resource") {
            Some(Value::Ref(r)) => r.clone(),
            Some(other) => {
                return Err(QueryError::Decode(format!("event resource is not a ref: {other:?}")))
            }
            None => return Err(QueryError::MissingField("resource")),
        };

        let ts = match fields.get("ts") {
            Some(Value::Int(n)) => EventTs::Int(*n),
            Some(Value::Time(t)) => EventTs::Time(*t),
            Some(other) => {
                return Err(QueryError::Decode(format!("event ts is not a timestamp: {other:?}")))
            }
            None => return Err(QueryError::MissingField("ts")),
        };

        let action = match fields.get("action") {
            Some(Value::String(s)) => serde_json::from_value(Json::String(s.clone()))?,
            Some(other) => {
                return Err(QueryError::Decode(format!("event action is not a string: {other:?}")))
            }
            None => return Err(QueryError::MissingField("action")),
        };

        Ok(Self {
            resource,
            ts,
            action,
        })
    }
}
