//! # Routecore
//!
//! Routecore is an HTTP request router for [hyper](https://hyper.rs).
//!
//! It selects a handler by method and path, hands the path parameters to it,
//! and turns every failure, whether from routing or from the handler, into a
//! well-formed HTTP response. Internally, it uses the
//! [matchit](https://github.com/ibraheemdev/matchit) radix tree.
//!
//! ## Features
//!
//! **Immutable routers:** Registering a route never changes the router it is
//! called on. It returns a new router with its own route table, so routers
//! can be shared between threads without locks, and several routers can be
//! built from a common base.
//!
//! **Host, port and scheme constraints:** A router can be bound to a host,
//! a port and a scheme. Requests addressed elsewhere are answered with
//! `421 Misdirected Request`, or `400 Bad Request` for the wrong scheme.
//! Constraints are checked in that order, before the route table.
//!
//! **Pluggable error translation:** Routing failures, application errors and
//! everything else are translated by an [`ExceptionHandler`]. The
//! [`DefaultExceptionHandler`] answers with plain text responses, never leaks
//! the details of unexpected errors, and lets errors the application raised
//! on purpose ([`ApplicationError`]) through to the caller.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use routecore::{BoxError, RequestExt, Router};
//! use hyper::{Request, Response, Body};
//!
//! async fn index(_: Request<Body>) -> Result<Response<Body>, BoxError> {
//!     Ok(Response::new("Hello, World!".into()))
//! }
//!
//! async fn hello(req: Request<Body>) -> Result<Response<Body>, BoxError> {
//!     let user = req.params().and_then(|params| params.get("user")).unwrap_or_default();
//!     Ok(Response::new(format!("Hello, {}", user).into()))
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::builder()
//!         .host("localhost")
//!         .build()
//!         .get("/", index)
//!         .get("/hello/:user", hello);
//!
//!     hyper::Server::bind(&([127, 0, 0, 1], 3000).into())
//!         .serve(router.into_service())
//!         .await;
//! }
//! ```
//!
//! ### Named parameters
//!
//! As you can see, `:user` is a *named parameter*. The values are accessible
//! via [`RequestExt::params`]. See the [`table`] module for the pattern
//! syntax.
//!
//! ### Errors
//!
//! With the default exception handler:
//!
//! ```ignore
//!  host or port mismatch         421 Misdirected Request
//!  scheme mismatch               400 Bad Request
//!  path registered, method not   405 Method Not Allowed
//!  no route for the path         404 Not Found
//!  handler error or panic        500 Internal Server Error
//!  ApplicationError              returned from Router::handle as Err
//! ```

#![forbid(unsafe_code)]

pub mod cookie;
pub mod error;
pub mod exception;
pub mod params;
pub mod table;

#[doc(hidden)]
pub mod router;

#[doc(inline)]
pub use router::{Handler, HandlerFuture, Router, RouterBuilder};

pub use cookie::{Cookie, CookieError};
pub use error::{
    ApplicationError, BoxError, Context, HandlerPanic, RouteError, RouterError, RouterException,
};
pub use exception::{DefaultExceptionHandler, ExceptionHandler, NullExceptionHandler};
pub use params::{Params, RequestExt, DEFAULT_PARAMS_KEY};
pub use table::{MatchitTable, RouteMatch, RouteTable};

// test the code examples in README.md
#[cfg(doctest)]
mod test_readme {
  macro_rules! doc_comment {
    ($x:expr) => {
        #[doc = $x]
        extern {}
    };
  }

  doc_comment!(include_str!("../README.md"));
}
