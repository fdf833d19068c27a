//! Translation of host closures into lambda forms with generated names.
//!
//! Each parameter gets a fresh name `auto<N>`. The ordinal keeps increasing
//! across lambdas nested inside one outermost construction, so inner bodies
//! never shadow outer parameters, and is restored to its starting value once
//! the outermost construction exits, whether it returns, fails or unwinds.
//!
//! Naming state is kept per thread. Concurrent constructions on different
//! threads never observe each other's counters, and nothing is locked.

use std::cell::Cell;

use crate::expr::{Expr, Params};

/// Prefix of every generated parameter name.
pub const VAR_PREFIX: &str = "auto";

/// Naming state of one execution context.
#[derive(Debug)]
struct BindingContext {
    next: Cell<u32>,
    depth: Cell<u32>,
}

thread_local! {
    static CONTEXT: BindingContext = const { BindingContext::new() };
}

impl BindingContext {
    const fn new() -> Self {
        Self {
            next: Cell::new(0),
            depth: Cell::new(0),
        }
    }

    /// Open a binding scope. Only the outermost scope saves the counter.
    fn enter(&self) -> ScopeGuard<'_> {
        let depth = self.depth.get();
        let saved = if depth == 0 {
            tracing::trace!(start = self.next.get(), "opening binding scope");
            Some(self.next.get())
        } else {
            None
        };
        self.depth.set(depth + 1);
        ScopeGuard { ctx: self, saved }
    }

    fn next_name(&self) -> String {
        let ordinal = self.next.get();
        self.next.set(ordinal + 1);
        format!("{VAR_PREFIX}{ordinal}")
    }
}

/// Restores the counter when the outermost scope is left, on every exit path.
struct ScopeGuard<'a> {
    ctx: &'a BindingContext,
    saved: Option<u32>,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.ctx.depth.set(self.ctx.depth.get() - 1);
        if let Some(saved) = self.saved {
            self.ctx.next.set(saved);
            tracing::trace!(restored = saved, "closed binding scope");
        }
    }
}

fn scoped<T>(f: impl FnOnce(&BindingContext) -> T) -> T {
    CONTEXT.with(|ctx| {
        let _scope = ctx.enter();
        f(ctx)
    })
}

fn bind_fixed<const N: usize, R>(body: impl FnOnce([Expr; N]) -> R) -> (Params, R) {
    scoped(|ctx| {
        let names: [String; N] = std::array::from_fn(|_| ctx.next_name());
        tracing::debug!(params = ?names, depth = ctx.depth.get(), "binding lambda parameters");
        let out = body(names.clone().map(Expr::Var));
        (Params::from_names(names.to_vec()), out)
    })
}

fn bind_dynamic<R>(arity: usize, body: impl FnOnce(Vec<Expr>) -> R) -> (Params, R) {
    scoped(|ctx| {
        let names: Vec<String> = (0..arity).map(|_| ctx.next_name()).collect();
        tracing::debug!(params = ?names, depth = ctx.depth.get(), "binding lambda parameters");
        let out = body(names.iter().cloned().map(Expr::Var).collect());
        (Params::from_names(names), out)
    })
}

fn lambda_form(params: Params, body: impl Into<Expr>) -> Expr {
    Expr::Lambda {
        params,
        body: Box::new(body.into()),
    }
}

/// Build a one-parameter lambda from a closure.
///
/// ```
/// use fauna_query::{lambda_query, query::add, codec::to_json};
/// use serde_json::json;
///
/// let double = lambda_query(|a| add(vec![a.clone(), a]));
/// assert_eq!(
///     to_json(&double),
///     json!({"lambda": "auto0", "expr": {"add": [{"var": "auto0"}, {"var": "auto0"}]}})
/// );
/// ```
pub fn lambda_query<R: Into<Expr>>(body: impl FnOnce(Expr) -> R) -> Expr {
    let (params, out) = bind_fixed::<1, _>(|[a]| body(a));
    lambda_form(params, out)
}

/// Build a two-parameter lambda; vars are passed in generation order.
pub fn lambda_query2<R: Into<Expr>>(body: impl FnOnce(Expr, Expr) -> R) -> Expr {
    let (params, out) = bind_fixed::<2, _>(|[a, b]| body(a, b));
    lambda_form(params, out)
}

/// Build a three-parameter lambda.
pub fn lambda_query3<R: Into<Expr>>(body: impl FnOnce(Expr, Expr, Expr) -> R) -> Expr {
    let (params, out) = bind_fixed::<3, _>(|[a, b, c]| body(a, b, c));
    lambda_form(params, out)
}

/// Build a lambda whose arity is only known at runtime.
///
/// An arity of one yields a bare parameter name, anything else a list.
pub fn lambda_query_n<R: Into<Expr>>(arity: usize, body: impl FnOnce(Vec<Expr>) -> R) -> Expr {
    let (params, out) = bind_dynamic(arity, body);
    lambda_form(params, out)
}

/// Like [`lambda_query`], for bodies that can fail. The body's error is
/// returned unchanged.
pub fn try_lambda_query<R: Into<Expr>, E>(
    body: impl FnOnce(Expr) -> Result<R, E>,
) -> Result<Expr, E> {
    let (params, out) = bind_fixed::<1, _>(|[a]| body(a));
    Ok(lambda_form(params, out?))
}

/// Like [`lambda_query2`], for bodies that can fail.
pub fn try_lambda_query2<R: Into<Expr>, E>(
    body: impl FnOnce(Expr, Expr) -> Result<R, E>,
) -> Result<Expr, E> {
    let (params, out) = bind_fixed::<2, _>(|[a, b]| body(a, b));
    Ok(lambda_form(params, out?))
}

/// Like [`lambda_query_n`], for bodies that can fail.
pub fn try_lambda_query_n<R: Into<Expr>, E>(
    arity: usize,
    body: impl FnOnce(Vec<Expr>) -> Result<R, E>,
) -> Result<Expr, E> {
    let (params, out) = bind_dynamic(arity, body);
    Ok(lambda_form(params, out?))
}
