//! Path parameters extracted by the router.
//!
//! Each router attaches the parameters of the matched route to the request
//! before invoking the handler, under its parameter key
//! ([`DEFAULT_PARAMS_KEY`] unless configured otherwise):
//!
//! ```rust
//! use routecore::{BoxError, RequestExt};
//! use hyper::{Body, Request, Response};
//!
//! async fn hello(req: Request<Body>) -> Result<Response<Body>, BoxError> {
//!     let user = req.params().and_then(|p| p.get("user")).unwrap_or("stranger");
//!     Ok(Response::new(format!("Hello, {}", user).into()))
//! }
//! ```
use std::collections::HashMap;

use hyper::Request;

/// The key a router attaches its parameters under by default.
pub const DEFAULT_PARAMS_KEY: &str = "ROUTER_PARAMS";

/// Parameters captured from the request path, in pattern order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    /// Returns the value of the first parameter registered under `key`.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'k, 'v> From<matchit::Params<'k, 'v>> for Params {
    fn from(params: matchit::Params<'k, 'v>) -> Self {
        params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Parameter bags attached to a request, keyed by bag name.
///
/// Stored in the request extensions. Nested routers with distinct keys
/// each contribute their own bag.
#[derive(Clone, Debug, Default)]
pub struct Attributes {
    bags: HashMap<String, Params>,
}

impl Attributes {
    pub fn get(&self, key: &str) -> Option<&Params> {
        self.bags.get(key)
    }

    pub(crate) fn attach<B>(req: &mut Request<B>, key: &str, params: Params) {
        let mut attributes = req
            .extensions_mut()
            .remove::<Attributes>()
            .unwrap_or_default();
        attributes.bags.insert(key.to_owned(), params);
        req.extensions_mut().insert(attributes);
    }
}

/// Access to the parameters a router attached to a request.
pub trait RequestExt {
    /// Parameters attached under [`DEFAULT_PARAMS_KEY`].
    fn params(&self) -> Option<&Params> {
        self.params_named(DEFAULT_PARAMS_KEY)
    }

    /// Parameters attached under a custom key.
    fn params_named(&self, key: &str) -> Option<&Params>;
}

impl<B> RequestExt for Request<B> {
    fn params_named(&self, key: &str) -> Option<&Params> {
        self.extensions().get::<Attributes>()?.get(key)
    }
}
