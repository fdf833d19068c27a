//! fauna-query: embedded query-expression builder for FaunaDB, with hygienic lambdas, sets, refs and the JSON wire format.

pub mod binder;
pub mod codec;
pub mod config;
pub mod error;
pub mod expr;
pub mod objects;
pub mod query;
pub mod value;

pub use binder::{
    lambda_query, lambda_query2, lambda_query3, lambda_query_n, try_lambda_query,
    try_lambda_query2, try_lambda_query_n, VAR_PREFIX,
};
pub use codec::{decode, decode_str, to_json, to_wire_string};
pub use config::{resolve_wire_style, WireStyle, WIRE_STYLE_ENV};
pub use error::{QueryError, QueryResult};
pub use expr::{Call, EventSpec, Expr, Params, Path, PathSegment, Varargs};
pub use objects::{Action, Event, EventTs, FaunaTime, Ref, Set, TimeUnit};
pub use query::PaginateOptions;
pub use value::{Page, SourcedValue, Value};
