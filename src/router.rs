//! [`Router`](crate::Router) dispatches requests to handlers registered per
//! method and path.
//!
//! A router is an immutable value. Registering a route returns a new router
//! holding its own copy of the route table; the router it was called on keeps
//! routing exactly as before. Several routers can therefore branch off a
//! shared base without interfering with each other:
//!
//! ```rust
//! use routecore::{BoxError, Router};
//! use hyper::{Body, Request, Response};
//!
//! async fn ok(_: Request<Body>) -> Result<Response<Body>, BoxError> {
//!     Ok(Response::new(Body::from("ok")))
//! }
//!
//! let base = Router::new().get("/health", ok);
//! let public = base.get("/", ok);
//! let admin = base.get("/admin", ok);
//!
//! assert!(base.lookup(&hyper::Method::GET, "/").is_not_found());
//! assert!(admin.lookup(&hyper::Method::GET, "/").is_not_found());
//! assert!(!public.lookup(&hyper::Method::GET, "/").is_not_found());
//! ```
//!
//! Before matching, requests are checked against the router's host, port and
//! scheme, in that order. Every failure, whether it comes from routing or from
//! a handler, is handed to the router's [`ExceptionHandler`].
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::{self, FutureExt};
use hyper::header::{self, HeaderValue};
use hyper::http::uri::{Authority, Scheme};
use hyper::service::Service;
use hyper::{Body, Method, Request, Response};

use crate::error::{ApplicationError, BoxError, HandlerPanic, RouteError, RouterError};
use crate::exception::{DefaultExceptionHandler, ExceptionHandler};
use crate::params::{Attributes, DEFAULT_PARAMS_KEY};
use crate::table::{MatchitTable, RouteMatch, RouteTable};

/// Router-level settings, shared between a router and its descendants.
#[derive(Debug)]
struct Settings {
    prefix: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    scheme: Option<String>,
    params_key: String,
}

/// Router dispatches requests to different handlers via configurable routes.
pub struct Router<T = MatchitTable> {
    settings: Arc<Settings>,
    exception_handler: Arc<dyn ExceptionHandler>,
    table: T,
}

impl<T: Clone> Clone for Router<T> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            exception_handler: self.exception_handler.clone(),
            table: self.table.clone(),
        }
    }
}

impl<T> fmt::Debug for Router<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.settings.prefix)
            .field("host", &self.settings.host)
            .field("port", &self.settings.port)
            .field("scheme", &self.settings.scheme)
            .field("params_key", &self.settings.params_key)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// A router without host, port or scheme constraints, using the
    /// [`DefaultExceptionHandler`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Configure a router before registering routes.
    /// ```rust
    /// use routecore::{NullExceptionHandler, Router};
    ///
    /// let router = Router::builder()
    ///     .prefix("/api")
    ///     .host("domain.tld")
    ///     .port(443)
    ///     .scheme("https")
    ///     .exception_handler(NullExceptionHandler)
    ///     .build();
    /// ```
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RouteTable> Router<T> {
    /// Returns a new router with `handler` registered for `path` under each
    /// of `methods`. Duplicate methods are ignored.
    ///
    /// If the router has a prefix, it is prepended to `path` verbatim.
    ///
    /// # Panics
    ///
    /// Panics if the route cannot be registered, see
    /// [`try_add_route`](Router::try_add_route).
    /// ```rust
    /// use routecore::Router;
    /// use hyper::{Response, Body, Method};
    ///
    /// let router = Router::new()
    ///     .add_route("/teapot", [Method::GET, Method::POST], |_| async {
    ///         Ok(Response::new(Body::from("I am a teapot!")))
    ///     });
    /// ```
    pub fn add_route(
        &self,
        path: &str,
        methods: impl IntoIterator<Item = Method>,
        handler: impl Handler + 'static,
    ) -> Self {
        match self.try_add_route(path, methods, handler) {
            Ok(router) => router,
            Err(err) => panic!("{}", err),
        }
    }

    /// Like [`add_route`](Router::add_route), but returns an error if
    /// `methods` is empty, a method is already registered for the same
    /// path, or the path is rejected by the route table.
    pub fn try_add_route(
        &self,
        path: &str,
        methods: impl IntoIterator<Item = Method>,
        handler: impl Handler + 'static,
    ) -> Result<Self, RouteError> {
        let mut unique: Vec<Method> = Vec::new();
        for method in methods {
            if !unique.contains(&method) {
                unique.push(method);
            }
        }

        let path = match self.settings.prefix {
            Some(ref prefix) => [prefix.as_str(), path].concat(),
            None => path.to_owned(),
        };

        let mut table = self.table.clone();
        table.register(&unique, &path, Arc::new(handler))?;

        tracing::debug!(path = %path, methods = ?unique, "registered route");

        Ok(Self {
            settings: self.settings.clone(),
            exception_handler: self.exception_handler.clone(),
            table,
        })
    }

    /// Register a handler for `GET` requests
    pub fn get(&self, path: &str, handler: impl Handler + 'static) -> Self {
        self.add_route(path, [Method::GET], handler)
    }

    /// Register a handler for `HEAD` requests
    pub fn head(&self, path: &str, handler: impl Handler + 'static) -> Self {
        self.add_route(path, [Method::HEAD], handler)
    }

    /// Register a handler for `OPTIONS` requests
    pub fn options(&self, path: &str, handler: impl Handler + 'static) -> Self {
        self.add_route(path, [Method::OPTIONS], handler)
    }

    /// Register a handler for `POST` requests
    pub fn post(&self, path: &str, handler: impl Handler + 'static) -> Self {
        self.add_route(path, [Method::POST], handler)
    }

    /// Register a handler for `PUT` requests
    pub fn put(&self, path: &str, handler: impl Handler + 'static) -> Self {
        self.add_route(path, [Method::PUT], handler)
    }

    /// Register a handler for `PATCH` requests
    pub fn patch(&self, path: &str, handler: impl Handler + 'static) -> Self {
        self.add_route(path, [Method::PATCH], handler)
    }

    /// Register a handler for `DELETE` requests
    pub fn delete(&self, path: &str, handler: impl Handler + 'static) -> Self {
        self.add_route(path, [Method::DELETE], handler)
    }

    /// Lookup allows the manual lookup of the route for a specific method and
    /// path, without the host, port and scheme checks.
    /// ```rust
    /// use routecore::{Router, RouteMatch};
    /// use hyper::{Response, Body, Method};
    ///
    /// let router = Router::new()
    ///     .get("/home/:room", |_| async {
    ///         Ok(Response::new(Body::from("Welcome!")))
    ///     });
    ///
    /// match router.lookup(&Method::GET, "/home/kitchen") {
    ///     RouteMatch::Found { params, .. } => assert_eq!(params.get("room"), Some("kitchen")),
    ///     _ => unreachable!(),
    /// }
    /// ```
    pub fn lookup(&self, method: &Method, path: &str) -> RouteMatch {
        self.table.at(method, path)
    }

    /// Dispatches a request and translates every failure into a response.
    ///
    /// Router errors are passed to
    /// [`handle_router_error`](ExceptionHandler::handle_router_error),
    /// [`ApplicationError`]s to
    /// [`handle_application_error`](ExceptionHandler::handle_application_error),
    /// and anything else, including handler panics, to
    /// [`handle_uncaught_error`](ExceptionHandler::handle_uncaught_error).
    /// An `Err` is returned only if the exception handler re-raises.
    pub async fn handle(&self, req: Request<Body>) -> Result<Response<Body>, BoxError> {
        let outcome = AssertUnwindSafe(self.dispatch(req)).catch_unwind().await;

        let err: BoxError = match outcome {
            Ok(Ok(res)) => return Ok(res),
            Ok(Err(err)) => err,
            Err(payload) => {
                let panic = HandlerPanic::new(payload);
                tracing::warn!(panic = %panic.message(), "handler panicked");
                Box::new(panic)
            }
        };

        self.recover(err)
    }

    async fn dispatch(&self, mut req: Request<Body>) -> Result<Response<Body>, BoxError> {
        let target = Target::of(&req);

        tracing::debug!(
            method = %req.method(),
            host = %target.host,
            path = %req.uri().path(),
            "dispatching request"
        );

        if let Some(ref host) = self.settings.host {
            if *host != target.host {
                return Err(RouterError::MisdirectedRequest.into());
            }
        }

        if let Some(port) = self.settings.port {
            if target.port != Some(port) {
                return Err(RouterError::MisdirectedRequest.into());
            }
        }

        if let Some(ref scheme) = self.settings.scheme {
            if *scheme != target.scheme {
                return Err(RouterError::MismatchingScheme {
                    received: target.scheme,
                    expected: scheme.clone(),
                }
                .into());
            }
        }

        match self.table.at(req.method(), req.uri().path()) {
            RouteMatch::Found { handler, params } => {
                Attributes::attach(&mut req, &self.settings.params_key, params);
                handler.handle(req).await
            }
            RouteMatch::MethodNotAllowed { .. } => Err(RouterError::MethodNotAllowed {
                method: req.method().clone(),
            }
            .into()),
            RouteMatch::NotFound => Err(RouterError::RouteNotFound {
                uri: req.uri().clone(),
            }
            .into()),
        }
    }

    fn recover(&self, err: BoxError) -> Result<Response<Body>, BoxError> {
        let err = match err.downcast::<RouterError>() {
            Ok(err) => {
                tracing::debug!(error = %err, "routing failed");
                return self.exception_handler.handle_router_error(*err);
            }
            Err(err) => err,
        };

        let err = match err.downcast::<ApplicationError>() {
            Ok(err) => return self.exception_handler.handle_application_error(*err),
            Err(err) => err,
        };

        tracing::error!(error = %err, "uncaught error while handling request");
        self.exception_handler.handle_uncaught_error(err)
    }
}

/// Configuration of a [`Router`]. Every setting is optional; an unset
/// constraint accepts any request.
pub struct RouterBuilder {
    prefix: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    scheme: Option<String>,
    params_key: String,
    exception_handler: Arc<dyn ExceptionHandler>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self {
            prefix: None,
            host: None,
            port: None,
            scheme: None,
            params_key: DEFAULT_PARAMS_KEY.to_owned(),
            exception_handler: Arc::new(DefaultExceptionHandler),
        }
    }
}

impl RouterBuilder {
    /// Prepended to the path of every route registered on the router.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Only requests for this host are accepted, others are misdirected.
    ///
    /// Hosts are compared case-insensitively.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into().to_ascii_lowercase());
        self
    }

    /// Only requests for this port are accepted, others are misdirected.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Only requests with this scheme are accepted.
    ///
    /// Requests in origin form (`GET /path`) have no scheme of their own; a
    /// [`Scheme`] in their extensions is used, and `http` without one.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// The key under which path parameters are attached to requests.
    pub fn params_key(mut self, key: impl Into<String>) -> Self {
        self.params_key = key.into();
        self
    }

    /// Translates dispatch and handler failures into responses.
    ///
    /// Defaults to [`DefaultExceptionHandler`].
    pub fn exception_handler(mut self, handler: impl ExceptionHandler + 'static) -> Self {
        self.exception_handler = Arc::new(handler);
        self
    }

    /// Shares an exception handler between several routers.
    pub fn shared_exception_handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.exception_handler = handler;
        self
    }

    /// Builds a router dispatching through an empty [`MatchitTable`].
    pub fn build(self) -> Router {
        self.build_with(MatchitTable::new())
    }

    /// Builds a router dispatching through a custom route table.
    pub fn build_with<T: RouteTable>(self, table: T) -> Router<T> {
        Router {
            settings: Arc::new(Settings {
                prefix: self.prefix,
                host: self.host,
                port: self.port,
                scheme: self.scheme,
                params_key: self.params_key,
            }),
            exception_handler: self.exception_handler,
            table,
        }
    }
}

/// Scheme, host and port a request is addressed to.
///
/// Requests in origin form carry no authority in the URI, so the `Host`
/// header is consulted instead. Their scheme is the [`Scheme`] stored in the
/// request extensions by the transport, or `http` if there is none. Hosts are
/// lowercased.
struct Target {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Target {
    fn of<B>(req: &Request<B>) -> Self {
        let uri = req.uri();
        let scheme = match uri.scheme() {
            Some(scheme) => scheme.as_str().to_owned(),
            None => req
                .extensions()
                .get::<Scheme>()
                .map_or("http", Scheme::as_str)
                .to_owned(),
        };

        let header = req
            .headers()
            .get(header::HOST)
            .and_then(|value: &HeaderValue| value.to_str().ok())
            .and_then(|value| value.parse::<Authority>().ok());

        let host = match (uri.host(), &header) {
            (Some(host), _) => host.to_ascii_lowercase(),
            (None, Some(authority)) => authority.host().to_ascii_lowercase(),
            (None, None) => String::new(),
        };

        let port = uri
            .port_u16()
            .or_else(|| header.as_ref().and_then(Authority::port_u16))
            .or(match scheme.as_str() {
                "http" => Some(80),
                "https" => Some(443),
                _ => None,
            });

        Self { scheme, host, port }
    }
}

/// Represents a HTTP handler function.
/// This trait is implemented for asynchronous functions that take a `Request` and return a
/// `Result<Response<Body>, BoxError>`
/// ```rust
/// # use routecore::{BoxError, Handler};
/// # use hyper::{Request, Response, Body};
/// async fn hello(_: Request<Body>) -> Result<Response<Body>, BoxError> {
///     Ok(Response::new(Body::empty()))
/// }
///
/// let handler: Box<dyn Handler> = Box::new(hello);
/// ```
pub trait Handler: Send + Sync {
    fn handle(&self, req: Request<Body>) -> HandlerFuture;
}

/// The future returned by a [`Handler`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response<Body>, BoxError>> + Send>>;

impl<F, R> Handler for F
where
    F: Fn(Request<Body>) -> R + Send + Sync,
    R: Future<Output = Result<Response<Body>, BoxError>> + Send + 'static,
{
    fn handle(&self, req: Request<Body>) -> HandlerFuture {
        Box::pin(self(req))
    }
}

/// Routers nest: a router is itself a handler. The inner router translates
/// its own failures with its own exception handler.
impl<T: RouteTable> Handler for Router<T> {
    fn handle(&self, req: Request<Body>) -> HandlerFuture {
        let router = self.clone();
        Box::pin(async move { router.handle(req).await })
    }
}

#[doc(hidden)]
pub struct MakeRouterService<T = MatchitTable>(RouterService<T>);

impl<T: RouteTable, C> Service<C> for MakeRouterService<T> {
    type Response = RouterService<T>;
    type Error = BoxError;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: C) -> Self::Future {
        let service = self.0.clone();
        future::ok(service)
    }
}

#[doc(hidden)]
pub struct RouterService<T = MatchitTable>(Arc<Router<T>>);

impl<T> Clone for RouterService<T> {
    fn clone(&self) -> Self {
        RouterService(self.0.clone())
    }
}

impl<T: RouteTable> Service<Request<Body>> for RouterService<T> {
    type Response = Response<Body>;
    type Error = BoxError;
    type Future = ResponseFut;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        Router::serve(self.0.clone(), req)
    }
}

impl<T: RouteTable> Router<T> {
    /// Converts the `Router` into a `Service` which you can serve directly with `Hyper`.
    /// If you have an existing `Service` that you want to incorporate a `Router` into, see
    /// [`Router::serve`](crate::Router::serve).
    /// ```rust,no_run
    /// # use routecore::Router;
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// // Our router...
    /// let router = Router::new();
    ///
    /// // Convert it into a service...
    /// let service = router.into_service();
    ///
    /// // Serve with hyper
    /// hyper::Server::bind(&([127, 0, 0, 1], 3030).into())
    ///     .serve(service)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_service(self) -> MakeRouterService<T> {
        MakeRouterService(RouterService(Arc::new(self)))
    }

    /// An owned future resolving to the response for `req`. You will generally not need to use
    /// this function directly, and instead use
    /// [`Router::into_service`](crate::Router::into_service). However, it may be useful when
    /// incorporating the router into a larger service.
    /// ```rust,no_run
    /// # use routecore::Router;
    /// # use hyper::service::{make_service_fn, service_fn};
    /// # use hyper::{Request, Body, Server};
    /// # use std::convert::Infallible;
    /// # use std::sync::Arc;
    ///
    /// # async fn run() {
    /// let router = Arc::new(Router::new());
    ///
    /// let make_svc = make_service_fn(move |_| {
    ///     let router = router.clone();
    ///     async move {
    ///         Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
    ///             Router::serve(router.clone(), req)
    ///         }))
    ///     }
    /// });
    ///
    /// let server = Server::bind(&([127, 0, 0, 1], 3000).into())
    ///     .serve(make_svc)
    ///     .await;
    /// # }
    /// ```
    pub fn serve(router: Arc<Self>, req: Request<Body>) -> ResponseFut {
        ResponseFut {
            inner: Box::pin(async move { router.handle(req).await }),
        }
    }
}

pub struct ResponseFut {
    inner: HandlerFuture,
}

impl Future for ResponseFut {
    type Output = Result<Response<Body>, BoxError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}
