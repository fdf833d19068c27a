//! Wire format: expression trees to JSON, and JSON replies to [`Value`]s.
//!
//! Each [`Expr`] variant maps to exactly one shape, independent of its
//! siblings:
//!
//! ```text
//! literal      1 | "s" | true | null
//! array        [wire(e), ...]
//! object       {"object": {field: wire(e), ...}}
//! quote        {"quote": <verbatim>}
//! call         {"<op>": wire(arg), "<key>": wire(e), ...}
//! var          {"var": "<name>"}
//! lambda       {"lambda": "<name>" | ["<name>", ...], "expr": wire(body)}
//! let          {"let": {name: wire(e), ...}, "in": wire(body)}
//! ref          {"@ref": "classes/widgets/1"}
//! set          {"@set": wire(e)}
//! time         {"@ts": "1970-01-01T00:00:00.123456789Z"}
//! date         {"@date": "1970-01-01"}
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as Json};

use crate::config::WireStyle;
use crate::error::{QueryError, QueryResult};
use crate::expr::{Expr, Params};
use crate::objects::{FaunaTime, Ref, Set};
use crate::value::Value;

/// Render an expression as its canonical JSON wire form.
pub fn to_json(expr: &Expr) -> Json {
    match expr {
        Expr::Null => Json::Null,
        Expr::Bool(b) => Json::Bool(*b),
        Expr::Int(n) => Json::from(*n),
        Expr::Float(f) => Json::from(*f),
        Expr::String(s) => Json::String(s.clone()),
        Expr::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        Expr::Object(fields) => tagged(
            "object",
            Json::Object(fields.iter().map(|(k, v)| (k.clone(), to_json(v))).collect()),
        ),
        Expr::Quote(data) => tagged("quote", data.clone()),
        Expr::Call(call) => Json::Object(
            call.fields()
                .iter()
                .map(|(k, v)| (k.to_string(), to_json(v)))
                .collect(),
        ),
        Expr::Var(name) => tagged("var", Json::String(name.clone())),
        Expr::Lambda { params, body } => {
            let params = match params {
                Params::One(name) => Json::String(name.clone()),
                Params::Many(names) => Json::Array(names.iter().cloned().map(Json::String).collect()),
            };
            let mut form = Map::new();
            form.insert("lambda".into(), params);
            form.insert("expr".into(), to_json(body));
            Json::Object(form)
        }
        Expr::Let { bindings, body } => {
            let bindings = bindings
                .iter()
                .map(|(name, value)| (name.clone(), to_json(value)))
                .collect();
            let mut form = Map::new();
            form.insert("let".into(), Json::Object(bindings));
            form.insert("in".into(), to_json(body));
            Json::Object(form)
        }
        Expr::Ref(r) => tagged("@ref", Json::String(r.as_str().to_string())),
        Expr::Set(set) => tagged("@set", set.wire().clone()),
        Expr::Time(t) => tagged("@ts", Json::String(t.to_iso())),
        Expr::Date(d) => tagged("@date", Json::String(d.format("%Y-%m-%d").to_string())),
    }
}

fn tagged(tag: &str, inner: Json) -> Json {
    let mut form = Map::with_capacity(1);
    form.insert(tag.to_string(), inner);
    Json::Object(form)
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json(self).serialize(serializer)
    }
}

/// Render an expression as JSON text.
///
/// Fails on NaN or infinite float literals, which JSON cannot carry.
pub fn to_wire_string(expr: &Expr, style: WireStyle) -> QueryResult<String> {
    if let Some(f) = first_non_finite(expr) {
        return Err(QueryError::NonFiniteFloat(f));
    }
    let json = to_json(expr);
    let text = match style {
        WireStyle::Compact => serde_json::to_string(&json)?,
        WireStyle::Pretty => serde_json::to_string_pretty(&json)?,
    };
    Ok(text)
}

fn first_non_finite(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Float(f) if !f.is_finite() => Some(*f),
        Expr::Array(items) => items.iter().find_map(first_non_finite),
        Expr::Object(fields) => fields.values().find_map(first_non_finite),
        Expr::Call(call) => call.fields().iter().find_map(|(_, v)| first_non_finite(v)),
        Expr::Lambda { body, .. } => first_non_finite(body),
        Expr::Let { bindings, body } => bindings
            .iter()
            .find_map(|(_, v)| first_non_finite(v))
            .or_else(|| first_non_finite(body)),
        _ => None,
    }
}

/// Decode a reply fragment, reconstructing refs, sets, times and dates.
pub fn decode(json: Json) -> QueryResult<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if n.is_u64() {
                Err(QueryError::Decode(format!("integer out of i64 range: {n}")))
            } else {
                n.as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| QueryError::Decode(format!("unrepresentable number: {n}")))
            }
        }
        Json::String(s) => Ok(Value::String(s)),
        Json::Array(items) => items
            .into_iter()
            .map(decode)
            .collect::<QueryResult<Vec<_>>>()
            .map(Value::Array),
        Json::Object(fields) => decode_object(fields),
    }
}

/// Parse reply text and decode it.
pub fn decode_str(text: &str) -> QueryResult<Value> {
    decode(serde_json::from_str(text)?)
}

fn decode_object(mut fields: Map<String, Json>) -> QueryResult<Value> {
    if fields.len() == 1 {
        let special = fields
            .keys()
            .next()
            .filter(|k| k.starts_with('@'))
            .cloned();
        if let Some(tag) = special {
            if let Some(inner) = fields.remove(&tag) {
                return decode_special(&tag, inner);
            }
        }
    }

    decode_fields(fields)
}

fn decode_special(tag: &str, inner: Json) -> QueryResult<Value> {
    match (tag, inner) {
        ("@ref", Json::String(path)) => Ok(Value::Ref(Ref::new(path))),
        ("@set", form) => canonical_form(form).map(|form| Value::Set(Set::from_wire(form))),
        ("@ts", Json::String(iso)) => FaunaTime::parse(&iso).map(Value::Time),
        ("@date", Json::String(day)) => parse_date(&day).map(Value::Date),
        ("@obj", Json::Object(fields)) => decode_fields(fields),
        ("@ref" | "@ts" | "@date" | "@obj", other) => Err(QueryError::Decode(format!(
            "malformed {tag} payload: {other}"
        ))),
        (unknown, inner) => {
            tracing::warn!("Unknown special form {unknown}, decoding as a plain object");
            let mut fields = Map::with_capacity(1);
            fields.insert(unknown.to_string(), inner);
            decode_fields(fields)
        }
    }
}

/// Re-render the times and dates inside a set description the way
/// [`to_json`] does, so a decoded set equals the same query built locally.
fn canonical_form(json: Json) -> QueryResult<Json> {
    match json {
        Json::Array(items) => items
            .into_iter()
            .map(canonical_form)
            .collect::<QueryResult<Vec<_>>>()
            .map(Json::Array),
        Json::Object(mut fields) => {
            if fields.len() == 1 {
                if let Some(Json::String(iso)) = fields.get("@ts") {
                    let t = FaunaTime::parse(iso)?;
                    return Ok(tagged("@ts", Json::String(t.to_iso())));
                }
                if let Some(Json::String(day)) = fields.get("@date") {
                    let d = parse_date(day)?;
                    return Ok(tagged("@date", Json::String(d.format("%Y-%m-%d").to_string())));
                }
            }
            let keys: Vec<String> = fields.keys().cloned().collect();
            for key in keys {
                if let Some(inner) = fields.remove(&key) {
                    fields.insert(key, canonical_form(inner)?);
                }
            }
            Ok(Json::Object(fields))
        }
        other => Ok(other),
    }
}

fn parse_date(day: &str) -> QueryResult<NaiveDate> {
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| QueryError::InvalidDate(format!("{day}: {e}")))
}

fn decode_fields(fields: Map<String, Json>) -> QueryResult<Value> {
    fields
        .into_iter()
        .map(|(k, v)| decode(v).map(|v| (k, v)))
        .collect::<QueryResult<BTreeMap<_, _>>>()
        .map(Value::Object)
}
