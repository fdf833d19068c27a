//! Decoded reply values and pages.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{QueryError, QueryResult};
use crate::expr::{Expr, Path, PathSegment};
use crate::objects::{FaunaTime, Ref, Set};

/// A reply fragment with its special forms reconstructed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Ref(Ref),
    Set(Set),
    Time(FaunaTime),
    Date(NaiveDate),
}

impl Value {
    /// Field of an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    /// Follow a path of keys and indices, like the server-side `select`.
    pub fn select(&self, path: impl Into<Path>) -> Option<&Value> {
        path.into().0.iter().try_fold(self, |current, segment| match (current, segment) {
            (Value::Object(fields), PathSegment::Key(key)) => fields.get(key),
            (Value::Array(items), PathSegment::Index(i)) => {
                usize::try_from(*i).ok().and_then(|i| items.get(i))
            }
            _ => None,
        })
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }
}

/// Decoded values feed back into new queries unchanged. Objects become
/// object forms so their fields are evaluated as the literals they hold.
impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Expr::Null,
            Value::Bool(b) => Expr::Bool(b),
            Value::Int(n) => Expr::Int(n),
            Value::Float(f) => Expr::Float(f),
            Value::String(s) => Expr::String(s),
            Value::Array(items) => Expr::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(fields) => {
                Expr::Object(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Ref(r) => Expr::Ref(r),
            Value::Set(s) => Expr::Set(s),
            Value::Time(t) => Expr::Time(t),
            Value::Date(d) => Expr::Date(d),
        }
    }
}

impl From<&Value> for Expr {
    fn from(value: &Value) -> Self {
        value.clone().into()
    }
}

/// One page of a paginated set. Cursors are opaque and only forwarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T = Value> {
    pub data: Vec<T>,
    pub after: Option<Value>,
    pub before: Option<Value>,
}

impl Page<Value> {
    /// Decode `{"data": [...], "after"?: cursor, "before"?: cursor}`.
    pub fn from_value(value: Value) -> QueryResult<Self> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => return Err(QueryError::Decode(format!("expected page object, got {other:?}"))),
        };

        let data = match fields.remove("data") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(QueryError::Decode(format!("page data is not an array: {other:?}")))
            }
            None => return Err(QueryError::MissingField("data")),
        };

        Ok(Page {
            data,
            after: fields.remove("after"),
            before: fields.remove("before"),
        })
    }
}

impl<T> Page<T> {
    pub fn map_data<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            after: self.after,
            before: self.before,
        }
    }

    pub fn try_map_data<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            data: self.data.into_iter().map(f).collect::<Result<_, _>>()?,
            after: self.after,
            before: self.before,
        })
    }
}

/// Page element produced when pagination is asked to include sources.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedValue {
    pub sources: Vec<Set>,
    pub value: Value,
}

impl SourcedValue {
    /// Decode `{"sources": [set, ...], "value": v}`.
    pub fn from_value(value: Value) -> QueryResult<Self> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => return Err(QueryError::Decode(format!("expected sourced value, got {other:?}"))),
        };

        let sources = match fields.remove("sources") {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::Set(set) => Ok(set),
                    other => Err(QueryError::Decode(format!("source is not a set: {other:?}"))),
                })
                .collect::<QueryResult<Vec<_>>>()?,
            Some(other) => {
                return Err(QueryError::Decode(format!("sources is not an array: {other:?}")))
            }
            None => return Err(QueryError::MissingField("sources")),
        };

        let value = fields.remove("value").ok_or(QueryError::MissingField("value"))?;
        Ok(Self { sources, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use serde_json::json;

    #[test]
    fn test_select_path() {
        let value = decode(json!({"a": {"b": [10, 20, 30]}})).unwrap();
        assert!(value.select(["a"]).and_then(|v| v.get("b")).is_some());
        assert_eq!(value.select(("a", "b", 2)), Some(&Value::Int(30)));
        assert_eq!(value.select(("a", "b", 3)), None);
        assert_eq!(value.select(("a", "c")), None);
    }

    #[test]
    fn test_page_without_cursors() {
        let page = Page::from_value(decode(json!({"data": [1, 2]})).unwrap()).unwrap();
        assert_eq!(page.data, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(page.after, None);
        assert_eq!(page.before, None);
    }

    #[test]
    fn test_page_cursor_is_forwarded_opaquely() {
        let reply = json!({
            "data": [{"@ref": "classes/widgets/1"}],
            "after": [{"@ref": "classes/widgets/2"}]
        });
        let page = Page::from_value(decode(reply).unwrap()).unwrap();
        let after = page.after.clone().unwrap();
        assert_eq!(
            crate::codec::to_json(&Expr::from(after)),
            json!([{"@ref": "classes/widgets/2"}])
        );
        let refs = page.map_data(|v| v.as_reference().cloned());
        assert_eq!(refs.data, vec![Some(Ref::new("classes/widgets/1"))]);
    }

    #[test]
    fn test_page_requires_data() {
        let err = Page::from_value(decode(json!({"after": 1})).unwrap()).unwrap_err();
        assert!(matches!(err, QueryError::MissingField("data")));
    }

    #[test]
    fn test_sourced_values() {
        let set = json!({"match": 1, "index": {"@ref": "indexes/widgets_by_n"}});
        let reply = json!({
            "data": [{"sources": [{"@set": set}], "value": {"@ref": "classes/widgets/1"}}]
        });
        let page = Page::from_value(decode(reply).unwrap())
            .unwrap()
            .try_map_data(SourcedValue::from_value)
            .unwrap();
        assert_eq!(page.data[0].sources, vec![Set::from_wire(set)]);
        assert_eq!(page.data[0].value, Value::Ref(Ref::new("classes/widgets/1")));
    }
}
