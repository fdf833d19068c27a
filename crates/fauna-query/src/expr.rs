//! Expression tree produced by the builder.
//!
//! Every node is immutable once a parent incorporates it. The canonical wire
//! shape of each variant lives in [`crate::codec`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value as Json;

use crate::objects::{Action, Event, EventTs, FaunaTime, Ref, Set, TimeUnit};

/// A node in the query tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    /// NaN and infinities are rejected by [`crate::codec::to_wire_string`];
    /// [`crate::codec::to_json`] renders them as `null`.
    Float(f64),
    String(String),
    /// Ordered sequence of expressions.
    Array(Vec<Expr>),
    /// Object whose field values are evaluated server-side.
    Object(BTreeMap<String, Expr>),
    /// Literal data sent verbatim; never interpreted as calls or vars.
    Quote(Json),
    Call(Call),
    /// Reference to a name bound by an enclosing lambda or let.
    Var(String),
    Lambda { params: Params, body: Box<Expr> },
    Let { bindings: Vec<(String, Expr)>, body: Box<Expr> },
    Ref(Ref),
    Set(Set),
    Time(FaunaTime),
    Date(NaiveDate),
}

impl Expr {
    /// The verbatim payload of a quoted node.
    pub fn as_quoted(&self) -> Option<&Json> {
        match self {
            Expr::Quote(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }
}

/// Invocation of one named remote operation.
///
/// The first field is the operation name and its primary argument; any further
/// fields are the operation's named secondary arguments in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    fields: Vec<(&'static str, Expr)>,
}

impl Call {
    pub fn new(op: &'static str, arg: impl Into<Expr>) -> Self {
        Self {
            fields: vec![(op, arg.into())],
        }
    }

    /// Append a named argument.
    pub fn arg(mut self, key: &'static str, value: impl Into<Expr>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    /// Append a named argument only when it is present.
    pub fn opt_arg<T: Into<Expr>>(self, key: &'static str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.arg(key, v),
            None => self,
        }
    }

    pub fn op(&self) -> &'static str {
        self.fields[0].0
    }

    pub fn fields(&self) -> &[(&'static str, Expr)] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Expr> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl From<Call> for Expr {
    fn from(call: Call) -> Self {
        Expr::Call(call)
    }
}

/// Parameter list of a lambda: a bare name, or an ordered list of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    One(String),
    Many(Vec<String>),
}

impl Params {
    /// A single name stays bare; anything else becomes a list.
    pub fn from_names(mut names: Vec<String>) -> Self {
        if names.len() == 1 {
            Params::One(names.remove(0))
        } else {
            Params::Many(names)
        }
    }

    pub fn names(&self) -> &[String] {
        match self {
            Params::One(name) => std::slice::from_ref(name),
            Params::Many(names) => names,
        }
    }
}

impl From<&str> for Params {
    fn from(name: &str) -> Self {
        Params::One(name.to_string())
    }
}

impl From<String> for Params {
    fn from(name: String) -> Self {
        Params::One(name)
    }
}

impl From<Vec<String>> for Params {
    fn from(names: Vec<String>) -> Self {
        Params::Many(names)
    }
}

impl<const N: usize> From<[&str; N]> for Params {
    fn from(names: [&str; N]) -> Self {
        Params::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Arguments of a variadic operation.
///
/// Positional lists, arrays, vectors, tuples and `Expr::Array` all normalize
/// to `List`, so every spelling of the same arguments yields the same tree. A
/// lone non-array expression (typically a var bound to a sequence) is passed
/// through untouched for the server to spread.
#[derive(Debug, Clone, PartialEq)]
pub enum Varargs {
    List(Vec<Expr>),
    Expr(Expr),
}

impl From<Expr> for Varargs {
    fn from(expr: Expr) -> Self {
        match expr {
            Expr::Array(items) => Varargs::List(items),
            other => Varargs::Expr(other),
        }
    }
}

impl<T: Into<Expr>> From<Vec<T>> for Varargs {
    fn from(items: Vec<T>) -> Self {
        Varargs::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Expr>, const N: usize> From<[T; N]> for Varargs {
    fn from(items: [T; N]) -> Self {
        Varargs::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Varargs> for Expr {
    fn from(args: Varargs) -> Self {
        match args {
            Varargs::List(items) => Expr::Array(items),
            Varargs::Expr(expr) => expr,
        }
    }
}

/// One step of a `select`/`contains` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(i64),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<i64> for PathSegment {
    fn from(index: i64) -> Self {
        PathSegment::Index(index)
    }
}

impl From<i32> for PathSegment {
    fn from(index: i32) -> Self {
        PathSegment::Index(index as i64)
    }
}

impl From<PathSegment> for Expr {
    fn from(segment: PathSegment) -> Self {
        match segment {
            PathSegment::Key(key) => Expr::String(key),
            PathSegment::Index(index) => Expr::Int(index),
        }
    }
}

/// Path into an object or array. A single key or index is a one-step path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path(pub Vec<PathSegment>);

impl From<&str> for Path {
    fn from(key: &str) -> Self {
        Path(vec![key.into()])
    }
}

impl From<String> for Path {
    fn from(key: String) -> Self {
        Path(vec![key.into()])
    }
}

impl From<i64> for Path {
    fn from(index: i64) -> Self {
        Path(vec![index.into()])
    }
}

impl From<i32> for Path {
    fn from(index: i32) -> Self {
        Path(vec![index.into()])
    }
}

impl<S: Into<PathSegment>> From<Vec<S>> for Path {
    fn from(segments: Vec<S>) -> Self {
        Path(segments.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<PathSegment>, const N: usize> From<[S; N]> for Path {
    fn from(segments: [S; N]) -> Self {
        Path(segments.into_iter().map(Into::into).collect())
    }
}

impl From<Path> for Expr {
    fn from(path: Path) -> Self {
        Expr::Array(path.0.into_iter().map(Into::into).collect())
    }
}

macro_rules! impl_tuple_args {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Into<Expr>),+> From<($($name,)+)> for Varargs {
            fn from(args: ($($name,)+)) -> Self {
                Varargs::List(vec![$(args.$idx.into()),+])
            }
        }

        impl<$($name: Into<PathSegment>),+> From<($($name,)+)> for Path {
            fn from(segments: ($($name,)+)) -> Self {
                Path(vec![$(segments.$idx.into()),+])
            }
        }
    };
}

impl_tuple_args!(A: 0, B: 1);
impl_tuple_args!(A: 0, B: 1, C: 2);
impl_tuple_args!(A: 0, B: 1, C: 2, D: 3);
impl_tuple_args!(A: 0, B: 1, C: 2, D: 3, E: 4);

/// Target of an insert/remove: explicit positional parts or an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventSpec {
    Explicit {
        resource: Expr,
        ts: Expr,
        action: Expr,
    },
    Event(Event),
}

impl EventSpec {
    pub fn explicit(
        resource: impl Into<Expr>,
        ts: impl Into<Expr>,
        action: impl Into<Expr>,
    ) -> Self {
        EventSpec::Explicit {
            resource: resource.into(),
            ts: ts.into(),
            action: action.into(),
        }
    }

    /// Resolve to `(resource, ts, action)`.
    pub(crate) fn into_parts(self) -> (Expr, Expr, Expr) {
        match self {
            EventSpec::Explicit {
                resource,
                ts,
                action,
            } => (resource, ts, action),
            EventSpec::Event(event) => (event.resource.into(), event.ts.into(), event.action.into()),
        }
    }
}

impl From<Event> for EventSpec {
    fn from(event: Event) -> Self {
        EventSpec::Event(event)
    }
}

// ======================== Conversions ========================

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Expr {
            fn from(n: $t) -> Self {
                Expr::Int(n as i64)
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::Float(n)
    }
}

impl From<f32> for Expr {
    fn from(n: f32) -> Self {
        Expr::Float(n as f64)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Bool(b)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::String(s.to_string())
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::String(s)
    }
}

impl From<&String> for Expr {
    fn from(s: &String) -> Self {
        Expr::String(s.clone())
    }
}

impl<T: Into<Expr>> From<Option<T>> for Expr {
    fn from(value: Option<T>) -> Self {
        value.map_or(Expr::Null, Into::into)
    }
}

impl<T: Into<Expr>> From<Vec<T>> for Expr {
    fn from(items: Vec<T>) -> Self {
        Expr::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Expr>, const N: usize> From<[T; N]> for Expr {
    fn from(items: [T; N]) -> Self {
        Expr::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

impl From<Ref> for Expr {
    fn from(r: Ref) -> Self {
        Expr::Ref(r)
    }
}

impl From<&Ref> for Expr {
    fn from(r: &Ref) -> Self {
        Expr::Ref(r.clone())
    }
}

impl From<Set> for Expr {
    fn from(set: Set) -> Self {
        Expr::Set(set)
    }
}

impl From<FaunaTime> for Expr {
    fn from(t: FaunaTime) -> Self {
        Expr::Time(t)
    }
}

impl From<NaiveDate> for Expr {
    fn from(d: NaiveDate) -> Self {
        Expr::Date(d)
    }
}

impl From<Action> for Expr {
    fn from(action: Action) -> Self {
        Expr::String(action.as_str().to_string())
    }
}

impl From<TimeUnit> for Expr {
    fn from(unit: TimeUnit) -> Self {
        Expr::String(unit.as_str().to_string())
    }
}

impl From<EventTs> for Expr {
    fn from(ts: EventTs) -> Self {
        match ts {
            EventTs::Int(n) => Expr::Int(n),
            EventTs::Time(t) => Expr::Time(t),
        }
    }
}
