//! Route lookup.
//!
//! # Responsibilities
//! - Hold the static route table
//! - Map (method, path) to a forwarding mode
//!
//! # Design Decisions
//! - Exact match on both method and path, no prefixes or wildcards
//! - Not-found is only returned after every route failed to match
//! - Pure and allocation-free; safe to call from any task

use std::fmt;

/// What the connection handler does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Forward in the background, reply `200` with a JSON `{}` body.
    AckPayment,
    /// Forward in the background, reply a bare `200`.
    AckEmpty,
    /// Forward and relay the backend's response.
    ProxyResponse,
    /// Request line could not be split into method and path.
    Reject,
    /// No route matched.
    NotFound,
}

impl Route {
    /// Whether this route contacts a backend.
    pub fn forwards(self) -> bool {
        matches!(self, Route::AckPayment | Route::AckEmpty | Route::ProxyResponse)
    }

    /// Whether the client waits for the backend's reply.
    pub fn awaits_backend(self) -> bool {
        self == Route::ProxyResponse
    }

    /// Short label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Route::AckPayment => "payments",
            Route::AckEmpty => "purge-payments",
            Route::ProxyResponse => "payments-summary",
            Route::Reject => "reject",
            Route::NotFound => "not-found",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static route table, checked in order.
pub const ROUTES: &[(&str, &str, Route)] = &[
    ("POST", "/payments", Route::AckPayment),
    ("GET", "/payments-summary", Route::ProxyResponse),
    ("POST", "/purge-payments", Route::AckEmpty),
];

/// Map a method and a query-stripped path to a route.
pub fn classify(method: &str, path: &str) -> Route {
    ROUTES
        .iter()
        .find(|(m, p, _)| *m == method && *p == path)
        .map(|(_, _, route)| *route)
        .unwrap_or(Route::NotFound)
}
