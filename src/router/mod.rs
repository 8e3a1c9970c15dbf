//! Method + path-pattern routing.
//!
//! Routes are tried in registration order and the first one whose method
//! matches and whose pattern matches the entire request path handles the
//! request. An earlier `/a/:x` therefore shadows a later `/a/b`.
//!
//! The table is built before the server starts accepting and is never
//! mutated afterwards, so it is shared across connections behind an `Arc`
//! without locking.

pub mod pattern;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use pattern::CompiledPattern;

/// Path parameters captured for one dispatch, keyed by name.
pub type Params = HashMap<String, String>;

pub type Handler =
    Arc<dyn Fn(&Request, &Params) -> Result<Response, HandlerError> + Send + Sync>;

pub struct Route {
    pub method: Method,
    pub pattern: String,
    matcher: CompiledPattern,
    handler: Handler,
}

impl Route {
    pub fn param_names(&self) -> &[String] {
        self.matcher.names()
    }

    fn matches(&self, request: &Request) -> Option<Params> {
        if self.method != request.method {
            return None;
        }

        self.matcher.captures(&request.path).map(|caps| {
            caps.into_iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect()
        })
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("params", &self.param_names())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `pattern` and appends the route.
    ///
    /// A pattern that fails to compile is logged and skipped; the rest of
    /// the table is unaffected.
    pub fn add_route<F>(&mut self, method: Method, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &Params) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        match pattern::compile(pattern) {
            Ok(matcher) => {
                tracing::debug!(method = %method, pattern, "Registered route");
                self.routes.push(Route {
                    method,
                    pattern: pattern.to_string(),
                    matcher,
                    handler: Arc::new(handler),
                });
            }
            Err(e) => {
                tracing::error!(method = %method, pattern, error = %e, "Skipping route with invalid pattern");
            }
        }
        self
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &Params) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.add_route(Method::GET, pattern, handler)
    }

    pub fn post<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &Params) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.add_route(Method::POST, pattern, handler)
    }

    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &Params) -> Result<Response, HandlerError> + Send + Sync + 'static,
    {
        self.add_route(Method::DELETE, pattern, handler)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Runs the first matching route's handler.
    ///
    /// Handler errors are returned as-is. Only an unmatched request becomes
    /// `404 Not Found`.
    pub fn dispatch(&self, request: &Request) -> Result<Response, HandlerError> {
        for route in &self.routes {
            if let Some(params) = route.matches(request) {
                return (route.handler)(request, &params);
            }
        }

        Ok(Response::not_found())
    }
}
