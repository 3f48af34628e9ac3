//! Failures raised while registering routes and dispatching requests.
//!
//! Errors reaching the router boundary are sorted into three tiers:
//!
//! 1. [`RouterError`]: expected routing failures (host, port or scheme
//!    mismatch, method mismatch, no matching path). These are always handed
//!    to [`ExceptionHandler::handle_router_error`](crate::ExceptionHandler::handle_router_error).
//! 2. [`ApplicationError`]: failures a handler wants the embedding
//!    application to deal with. A handler opts in by wrapping its error.
//! 3. Anything else is *uncaught* and goes to
//!    [`ExceptionHandler::handle_uncaught_error`](crate::ExceptionHandler::handle_uncaught_error).
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use hyper::{Method, Uri};

/// A type-erased error, as returned by handlers.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Structured diagnostics attached to a router error.
pub type Context = BTreeMap<String, String>;

/// Capability shared by every router error, including caller-defined ones.
///
/// ```rust
/// use routecore::{Context, RouterError, RouterException};
///
/// #[derive(Debug)]
/// struct Maintenance;
///
/// impl std::fmt::Display for Maintenance {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("Down for maintenance")
///     }
/// }
///
/// impl std::error::Error for Maintenance {}
/// impl RouterException for Maintenance {}
///
/// let err = RouterError::custom(Maintenance);
/// assert_eq!(err.message(), "Down for maintenance");
/// assert!(err.context().is_empty());
/// ```
pub trait RouterException: StdError + Send + Sync + 'static {
    /// The error message in natural language.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Diagnostic context of the failure.
    fn context(&self) -> Context {
        Context::new()
    }
}

/// Router internal failures.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RouterError {
    /// A route matched the path, but not for the requested method.
    #[error("Method \"{method}\" is not allowed for this route")]
    MethodNotAllowed { method: Method },

    /// The request host or port does not belong to this router.
    #[error("The requested site is not hosted on this server")]
    MisdirectedRequest,

    /// The request scheme does not match the scheme of this router.
    #[error("Invalid scheme \"{received}\", expecting \"{expected}\"")]
    MismatchingScheme { received: String, expected: String },

    /// No route matches the request path.
    #[error("No route to path \"{}\"", .uri.path())]
    RouteNotFound { uri: Uri },

    /// A caller-defined router error.
    #[error("{}", .0.message())]
    Custom(Box<dyn RouterException>),
}

impl RouterError {
    /// Wraps a caller-defined router exception.
    pub fn custom(err: impl RouterException) -> Self {
        RouterError::Custom(Box::new(err))
    }

    /// The rendered error message.
    pub fn message(&self) -> String {
        match self {
            RouterError::Custom(err) => err.message(),
            _ => self.to_string(),
        }
    }

    /// Structured diagnostics of the failure.
    pub fn context(&self) -> Context {
        let mut context = Context::new();
        match self {
            RouterError::MethodNotAllowed { method } => {
                context.insert("method".to_owned(), method.to_string());
            }
            RouterError::MisdirectedRequest => {}
            RouterError::MismatchingScheme { received, expected } => {
                context.insert("received_scheme".to_owned(), received.clone());
                context.insert("expected_scheme".to_owned(), expected.clone());
            }
            RouterError::RouteNotFound { uri } => {
                context.insert("uri".to_owned(), uri.to_string());
            }
            RouterError::Custom(err) => return err.context(),
        }
        context
    }
}

/// An error the embedding application handles itself.
///
/// The default exception handler passes these through the router untouched:
///
/// ```rust
/// use routecore::{ApplicationError, BoxError};
/// use hyper::{Body, Request, Response};
///
/// async fn checkout(_: Request<Body>) -> Result<Response<Body>, BoxError> {
///     Err(ApplicationError::new("payment declined").into())
/// }
/// ```
pub struct ApplicationError {
    inner: BoxError,
}

impl ApplicationError {
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self { inner: err.into() }
    }

    /// A reference to the wrapped error.
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.inner
    }

    /// Attempts to downcast the wrapped error to a concrete type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> BoxError {
        self.inner
    }
}

impl fmt::Debug for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApplicationError").field(&self.inner).finish()
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for ApplicationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.inner)
    }
}

/// A handler panicked while producing a response.
#[derive(Debug, thiserror::Error)]
#[error("handler panicked: {message}")]
pub struct HandlerPanic {
    message: String,
}

impl HandlerPanic {
    pub(crate) fn new(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&str>() {
            (*msg).to_owned()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic payload".to_owned()
        };

        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure to register a route.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("route \"{path}\" must be registered for at least one method")]
    NoMethods { path: String },

    #[error("cannot register two routes matching \"{path}\" for method \"{method}\"")]
    Duplicate { path: String, method: Method },

    #[error("invalid route \"{path}\": {source}")]
    Insert {
        path: String,
        #[source]
        source: matchit::InsertError,
    },
}
