//! Smart constructors, one per query operation.
//!
//! Constructors only shape the tree: argument counts and types are not
//! checked here, so `equals(Vec::<Expr>::new())` still builds a call and the
//! server rejects it. Optional arguments that are absent are left out of the
//! call entirely, letting the server apply its own defaults.

use serde_json::Value as Json;

pub use crate::binder::{
    lambda_query, lambda_query2, lambda_query3, lambda_query_n, try_lambda_query,
    try_lambda_query2, try_lambda_query_n,
};
use crate::expr::{Call, EventSpec, Expr, Params, Path, Varargs};
use crate::objects::Event;

fn call(op: &'static str, arg: impl Into<Expr>) -> Call {
    Call::new(op, arg)
}

fn variadic(op: &'static str, args: impl Into<Varargs>) -> Expr {
    let args: Varargs = args.into();
    call(op, args).into()
}

// ======================== Basic forms ========================

/// `{"let": {name: value, ...}, "in": body}`
pub fn let_expr<K, V>(bindings: impl IntoIterator<Item = (K, V)>, body: impl Into<Expr>) -> Expr
where
    K: Into<String>,
    V: Into<Expr>,
{
    Expr::Let {
        bindings: bindings
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
        body: Box::new(body.into()),
    }
}

pub fn var(name: impl Into<String>) -> Expr {
    Expr::Var(name.into())
}

pub fn if_expr(
    condition: impl Into<Expr>,
    then: impl Into<Expr>,
    otherwise: impl Into<Expr>,
) -> Expr {
    call("if", condition)
        .arg("then", then)
        .arg("else", otherwise)
        .into()
}

/// Evaluate each expression in order, yielding the last.
pub fn do_expr(exprs: impl Into<Varargs>) -> Expr {
    variadic("do", exprs)
}

/// An object whose field values are evaluated. See [`quote`] for literal data.
pub fn object<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Expr
where
    K: Into<String>,
    V: Into<Expr>,
{
    Expr::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}

/// Literal data. Nothing inside is read as a call or a var.
pub fn quote(data: impl Into<Json>) -> Expr {
    Expr::Quote(data.into())
}

/// A lambda with caller-chosen parameter names.
pub fn lambda_expr(params: impl Into<Params>, body: impl Into<Expr>) -> Expr {
    Expr::Lambda {
        params: params.into(),
        body: Box::new(body.into()),
    }
}

// ======================== Collections ========================

pub fn map_expr<R: Into<Expr>>(f: impl FnOnce(Expr) -> R, collection: impl Into<Expr>) -> Expr {
    map_with(lambda_query(f), collection)
}

/// `map` with an already-built lambda (or an expression evaluating to one).
pub fn map_with(lambda: impl Into<Expr>, collection: impl Into<Expr>) -> Expr {
    call("map", lambda).arg("collection", collection).into()
}

pub fn foreach<R: Into<Expr>>(f: impl FnOnce(Expr) -> R, collection: impl Into<Expr>) -> Expr {
    foreach_with(lambda_query(f), collection)
}

pub fn foreach_with(lambda: impl Into<Expr>, collection: impl Into<Expr>) -> Expr {
    call("foreach", lambda).arg("collection", collection).into()
}

pub fn filter_expr<R: Into<Expr>>(f: impl FnOnce(Expr) -> R, collection: impl Into<Expr>) -> Expr {
    filter_with(lambda_query(f), collection)
}

pub fn filter_with(lambda: impl Into<Expr>, collection: impl Into<Expr>) -> Expr {
    call("filter", lambda).arg("collection", collection).into()
}

pub fn take(count: impl Into<Expr>, collection: impl Into<Expr>) -> Expr {
    call("take", count).arg("collection", collection).into()
}

pub fn drop(count: impl Into<Expr>, collection: impl Into<Expr>) -> Expr {
    call("drop", count).arg("collection", collection).into()
}

pub fn prepend(elements: impl Into<Expr>, collection: impl Into<Expr>) -> Expr {
    call("prepend", elements).arg("collection", collection).into()
}

pub fn append(elements: impl Into<Expr>, collection: impl Into<Expr>) -> Expr {
    call("append", elements).arg("collection", collection).into()
}

// ======================== Reads ========================

pub fn get(resource: impl Into<Expr>) -> Expr {
    call("get", resource).into()
}

/// Read a resource as of a point in time.
pub fn get_at(resource: impl Into<Expr>, ts: impl Into<Expr>) -> Expr {
    call("get", resource).arg("ts", ts).into()
}

/// Optional arguments of [`paginate_with`]. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginateOptions {
    pub ts: Option<Expr>,
    pub after: Option<Expr>,
    pub before: Option<Expr>,
    pub size: Option<i64>,
    pub events: Option<bool>,
    pub sources: Option<bool>,
}

impl PaginateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ts(mut self, ts: impl Into<Expr>) -> Self {
        self.ts = Some(ts.into());
        self
    }

    /// Resume after a cursor returned by a previous page.
    pub fn after(mut self, cursor: impl Into<Expr>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn before(mut self, cursor: impl Into<Expr>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn events(mut self, events: bool) -> Self {
        self.events = Some(events);
        self
    }

    /// Pair each element with the sets it came from.
    pub fn sources(mut self, sources: bool) -> Self {
        self.sources = Some(sources);
        self
    }
}

pub fn paginate(set: impl Into<Expr>) -> Expr {
    paginate_with(set, PaginateOptions::default())
}

pub fn paginate_with(set: impl Into<Expr>, options: PaginateOptions) -> Expr {
    call("paginate", set)
        .opt_arg("ts", options.ts)
        .opt_arg("after", options.after)
        .opt_arg("before", options.before)
        .opt_arg("size", options.size)
        .opt_arg("events", options.events)
        .opt_arg("sources", options.sources)
        .into()
}

pub fn exists(resource: impl Into<Expr>) -> Expr {
    call("exists", resource).into()
}

pub fn exists_at(resource: impl Into<Expr>, ts: impl Into<Expr>) -> Expr {
    call("exists", resource).arg("ts", ts).into()
}

pub fn count(set: impl Into<Expr>) -> Expr {
    call("count", set).into()
}

/// Count the set's events rather than its members.
pub fn count_events(set: impl Into<Expr>, events: bool) -> Expr {
    call("count", set).arg("events", events).into()
}

// ======================== Writes ========================

pub fn create(class: impl Into<Expr>, params: impl Into<Expr>) -> Expr {
    call("create", class).arg("params", params).into()
}

pub fn update(resource: impl Into<Expr>, params: impl Into<Expr>) -> Expr {
    call("update", resource).arg("params", params).into()
}

pub fn replace(resource: impl Into<Expr>, params: impl Into<Expr>) -> Expr {
    call("replace", resource).arg("params", params).into()
}

pub fn delete(resource: impl Into<Expr>) -> Expr {
    call("delete", resource).into()
}

/// Insert an event into a resource's history.
pub fn insert(
    resource: impl Into<Expr>,
    ts: impl Into<Expr>,
    action: impl Into<Expr>,
    params: impl Into<Expr>,
) -> Expr {
    insert_with(EventSpec::explicit(resource, ts, action), params)
}

pub fn insert_event(event: Event, params: impl Into<Expr>) -> Expr {
    insert_with(event, params)
}

/// Shared by [`insert`] and [`insert_event`]; both spellings yield one tree.
pub fn insert_with(target: impl Into<EventSpec>, params: impl Into<Expr>) -> Expr {
    let target: EventSpec = target.into();
    let (resource, ts, action) = target.into_parts();
    call("insert", resource)
        .arg("ts", ts)
        .arg("action", action)
        .arg("params", params)
        .into()
}

/// Remove an event from a resource's history.
pub fn remove(resource: impl Into<Expr>, ts: impl Into<Expr>, action: impl Into<Expr>) -> Expr {
    remove_with(EventSpec::explicit(resource, ts, action))
}

pub fn remove_event(event: Event) -> Expr {
    remove_with(event)
}

pub fn remove_with(target: impl Into<EventSpec>) -> Expr {
    let target: EventSpec = target.into();
    let (resource, ts, action) = target.into_parts();
    call("remove", resource)
        .arg("ts", ts)
        .arg("action", action)
        .into()
}

// ======================== Sets ========================

/// The set of resources whose `index` terms equal `terms`.
pub fn match_expr(terms: impl Into<Expr>, index: impl Into<Expr>) -> Expr {
    call("match", terms).arg("index", index).into()
}

pub fn union(sets: impl Into<Varargs>) -> Expr {
    variadic("union", sets)
}

pub fn intersection(sets: impl Into<Varargs>) -> Expr {
    variadic("intersection", sets)
}

pub fn difference(sets: impl Into<Varargs>) -> Expr {
    variadic("difference", sets)
}

/// For each member of `source`, the set produced by `f`, all unioned.
pub fn join<R: Into<Expr>>(source: impl Into<Expr>, f: impl FnOnce(Expr) -> R) -> Expr {
    join_with(source, lambda_query(f))
}

/// `join` with an already-built lambda or an index ref.
pub fn join_with(source: impl Into<Expr>, target: impl Into<Expr>) -> Expr {
    call("join", source).arg("with", target).into()
}

// ======================== Strings ========================

pub fn concat(strings: impl Into<Varargs>) -> Expr {
    variadic("concat", strings)
}

pub fn concat_with_separator(strings: impl Into<Varargs>, separator: impl Into<Expr>) -> Expr {
    let strings: Varargs = strings.into();
    call("concat", strings)
        .arg("separator", separator)
        .into()
}

pub fn casefold(string: impl Into<Expr>) -> Expr {
    call("casefold", string).into()
}

// ======================== Time and date ========================

/// A timestamp from an ISO-8601 string, or `"now"`.
pub fn time(string: impl Into<Expr>) -> Expr {
    call("time", string).into()
}

/// A timestamp `amount` units after the Unix epoch.
pub fn epoch(amount: impl Into<Expr>, unit: impl Into<Expr>) -> Expr {
    call("epoch", amount).arg("unit", unit).into()
}

pub fn date(string: impl Into<Expr>) -> Expr {
    call("date", string).into()
}

// ======================== Miscellaneous ========================

pub fn equals(values: impl Into<Varargs>) -> Expr {
    variadic("equals", values)
}

/// Whether `path` exists in `value`. A single key is a one-step path.
pub fn contains(path: impl Into<Path>, value: impl Into<Expr>) -> Expr {
    call("contains", path.into()).arg("in", value).into()
}

pub fn select(path: impl Into<Path>, from: impl Into<Expr>) -> Expr {
    call("select", path.into()).arg("from", from).into()
}

/// Like [`select`], yielding `default` instead of failing when the path is
/// missing.
pub fn select_with_default(
    path: impl Into<Path>,
    from: impl Into<Expr>,
    default: impl Into<Expr>,
) -> Expr {
    call("select", path.into())
        .arg("from", from)
        .arg("default", default)
        .into()
}

pub fn add(values: impl Into<Varargs>) -> Expr {
    variadic("add", values)
}

pub fn multiply(values: impl Into<Varargs>) -> Expr {
    variadic("multiply", values)
}

pub fn subtract(values: impl Into<Varargs>) -> Expr {
    variadic("subtract", values)
}

pub fn divide(values: impl Into<Varargs>) -> Expr {
    variadic("divide", values)
}

pub fn modulo(values: impl Into<Varargs>) -> Expr {
    variadic("modulo", values)
}

pub fn and_expr(values: impl Into<Varargs>) -> Expr {
    variadic("and", values)
}

pub fn or_expr(values: impl Into<Varargs>) -> Expr {
    variadic("or", values)
}

pub fn not_expr(value: impl Into<Expr>) -> Expr {
    call("not", value).into()
}
