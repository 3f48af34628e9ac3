//! Translation of dispatch failures into responses.
//!
//! Every [`Router`](crate::Router) owns an [`ExceptionHandler`]. Returning
//! `Err` from one of its methods re-raises the error past
//! [`Router::handle`](crate::Router::handle).
use hyper::header::{self, HeaderValue};
use hyper::{Body, Response, StatusCode};

use crate::error::{ApplicationError, BoxError, RouterError};

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

const INTERNAL_ERROR_BODY: &str = "500 Internal Server Error\n\
    The server was unable to handle your request due to internal error.";

/// Translates the three failure tiers into responses.
///
/// ```rust
/// use routecore::{ApplicationError, BoxError, ExceptionHandler, RouterError};
/// use hyper::{Body, Response, StatusCode};
///
/// /// Renders application errors as 422 instead of passing them through.
/// struct Unprocessable;
///
/// impl ExceptionHandler for Unprocessable {
///     fn handle_router_error(&self, err: RouterError) -> Result<Response<Body>, BoxError> {
///         Err(err.into())
///     }
///
///     fn handle_application_error(&self, err: ApplicationError) -> Result<Response<Body>, BoxError> {
///         let mut res = Response::new(Body::from(err.to_string()));
///         *res.status_mut() = StatusCode::UNPROCESSABLE_ENTITY;
///         Ok(res)
///     }
///
///     fn handle_uncaught_error(&self, err: BoxError) -> Result<Response<Body>, BoxError> {
///         Err(err)
///     }
/// }
/// ```
pub trait ExceptionHandler: Send + Sync {
    /// Handler for router internal errors.
    fn handle_router_error(&self, err: RouterError) -> Result<Response<Body>, BoxError>;

    /// Handler for errors the application raised on purpose.
    fn handle_application_error(
        &self,
        err: ApplicationError,
    ) -> Result<Response<Body>, BoxError>;

    /// Handler for any other error, including handler panics.
    fn handle_uncaught_error(&self, err: BoxError) -> Result<Response<Body>, BoxError>;
}

/// Answers router errors and uncaught errors with a plain text response,
/// but passes application errors through.
///
/// | Error | Status |
/// |---|---|
/// | [`RouterError::MethodNotAllowed`] | 405 Method Not Allowed |
/// | [`RouterError::MisdirectedRequest`] | 421 Misdirected Request |
/// | [`RouterError::MismatchingScheme`] | 400 Bad Request |
/// | [`RouterError::RouteNotFound`] | 404 Not Found |
/// | [`RouterError::Custom`] | 400 Bad Request |
/// | uncaught | 500 Internal Server Error |
///
/// Router errors are rendered with their message. Uncaught errors get a
/// fixed body that reveals nothing about the error.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultExceptionHandler;

impl ExceptionHandler for DefaultExceptionHandler {
    fn handle_router_error(&self, err: RouterError) -> Result<Response<Body>, BoxError> {
        let status = match err {
            RouterError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RouterError::MisdirectedRequest => StatusCode::MISDIRECTED_REQUEST,
            RouterError::MismatchingScheme { .. } => StatusCode::BAD_REQUEST,
            RouterError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            RouterError::Custom(_) => StatusCode::BAD_REQUEST,
        };

        Ok(plain_text(status, err.message()))
    }

    fn handle_application_error(
        &self,
        err: ApplicationError,
    ) -> Result<Response<Body>, BoxError> {
        Err(err.into())
    }

    fn handle_uncaught_error(&self, _: BoxError) -> Result<Response<Body>, BoxError> {
        Ok(plain_text(
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_ERROR_BODY,
        ))
    }
}

/// Passes every error through. Useful for debugging.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullExceptionHandler;

impl ExceptionHandler for NullExceptionHandler {
    fn handle_router_error(&self, err: RouterError) -> Result<Response<Body>, BoxError> {
        Err(err.into())
    }

    fn handle_application_error(
        &self,
        err: ApplicationError,
    ) -> Result<Response<Body>, BoxError> {
        Err(err.into())
    }

    fn handle_uncaught_error(&self, err: BoxError) -> Result<Response<Body>, BoxError> {
        Err(err)
    }
}

fn plain_text(status: StatusCode, body: impl Into<Body>) -> Response<Body> {
    let mut res = Response::new(body.into());
    *res.status_mut() = status;
    res.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(PLAIN_TEXT));
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Context, RouterException};
    use hyper::{Method, Uri};
    use regex::Regex;
    use std::fmt;

    fn body(res: Response<Body>) -> String {
        let bytes = futures_util::FutureExt::now_or_never(hyper::body::to_bytes(res.into_body()))
            .expect("body is ready")
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_plain_text(res: &Response<Body>, status: u16, reason: &str) {
        assert_eq!(res.status().as_u16(), status);
        assert_eq!(res.status().canonical_reason(), Some(reason));
        assert_eq!(res.headers()[header::CONTENT_TYPE], PLAIN_TEXT);
    }

    #[test]
    fn uncaught() {
        let res = DefaultExceptionHandler
            .handle_uncaught_error("database password is hunter2".into())
            .unwrap();

        assert_plain_text(&res, 500, "Internal Server Error");
        let body = body(res);
        assert_eq!(body, INTERNAL_ERROR_BODY);
        assert!(!body.contains("hunter2"));
    }

    #[test]
    fn method_not_allowed() {
        let res = DefaultExceptionHandler
            .handle_router_error(RouterError::MethodNotAllowed { method: Method::POST })
            .unwrap();

        assert_plain_text(&res, 405, "Method Not Allowed");
        assert!(Regex::new("(?i)method.*post.*allowed").unwrap().is_match(&body(res)));
    }

    #[test]
    fn misdirected_request() {
        let res = DefaultExceptionHandler
            .handle_router_error(RouterError::MisdirectedRequest)
            .unwrap();

        assert_plain_text(&res, 421, "Misdirected Request");
    }

    #[test]
    fn mismatching_scheme() {
        let res = DefaultExceptionHandler
            .handle_router_error(RouterError::MismatchingScheme {
                received: "http".to_owned(),
                expected: "https".to_owned(),
            })
            .unwrap();

        assert_plain_text(&res, 400, "Bad Request");
        assert!(Regex::new("(?i)scheme.*http.*https").unwrap().is_match(&body(res)));
    }

    #[test]
    fn route_not_found() {
        let res = DefaultExceptionHandler
            .handle_router_error(RouterError::RouteNotFound {
                uri: Uri::from_static("https://domain.tld/not/exist"),
            })
            .unwrap();

        assert_plain_text(&res, 404, "Not Found");
        assert!(Regex::new(r"(?i)path.*/not/exist").unwrap().is_match(&body(res)));
    }

    #[derive(Debug)]
    struct Custom;

    impl fmt::Display for Custom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Error 123")
        }
    }

    impl std::error::Error for Custom {}

    impl RouterException for Custom {
        fn context(&self) -> Context {
            Context::new()
        }
    }

    #[test]
    fn custom_router_error() {
        let res = DefaultExceptionHandler
            .handle_router_error(RouterError::custom(Custom))
            .unwrap();

        assert_plain_text(&res, 400, "Bad Request");
        assert_eq!(body(res), "Error 123");
    }

    #[test]
    fn application_errors_pass_through() {
        let err = DefaultExceptionHandler
            .handle_application_error(ApplicationError::new(Custom))
            .unwrap_err();

        let err = err.downcast::<ApplicationError>().unwrap();
        assert!(err.downcast_ref::<Custom>().is_some());
    }

    #[test]
    fn null_handler_passes_everything_through() {
        let err = NullExceptionHandler
            .handle_router_error(RouterError::MisdirectedRequest)
            .unwrap_err();
        assert!(err.is::<RouterError>());

        let err = NullExceptionHandler
            .handle_application_error(ApplicationError::new(Custom))
            .unwrap_err();
        assert!(err.is::<ApplicationError>());

        let err = NullExceptionHandler
            .handle_uncaught_error(Box::new(Custom))
            .unwrap_err();
        assert!(err.is::<Custom>());
    }
}
