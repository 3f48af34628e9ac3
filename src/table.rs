//! Route registration and lookup.
//!
//! The router does not match paths itself; it delegates to a [`RouteTable`].
//! [`MatchitTable`] is the default table, built on the
//! [matchit](https://github.com/ibraheemdev/matchit) radix tree.
//!
//! The registered path can contain two types of parameters:
//! ```ignore
//!  Syntax    Type
//!  :name     named parameter
//!  *name     catch-all parameter
//! ```
//!
//! Named parameters are dynamic path segments. They match anything until the
//! next '/' or the path end:
//! ```ignore
//!  Path: /blog/:category/:post
//!
//!  Requests:
//!   /blog/rust/request-routers            match: category="rust", post="request-routers"
//!   /blog/rust/                           no match
//!   /blog/rust/request-routers/comments   no match
//! ```
//!
//! Catch-all parameters match anything until the path end. Since they match
//! anything until the end, catch-all parameters must always be the final
//! path element:
//! ```ignore
//!  Path: /files/*filepath
//!
//!  Requests:
//!   /files/LICENSE                      match: filepath="LICENSE"
//!   /files/templates/article.html       match: filepath="templates/article.html"
//! ```
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hyper::Method;

use crate::error::RouteError;
use crate::params::Params;
use crate::router::Handler;

/// The result of looking up a method and path in a [`RouteTable`].
pub enum RouteMatch {
    /// A handler is registered for the method and path.
    Found {
        handler: Arc<dyn Handler>,
        params: Params,
    },
    /// The path is registered, but only for other methods.
    MethodNotAllowed { allowed: Vec<Method> },
    NotFound,
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMatch::Found { params, .. } => f
                .debug_struct("Found")
                .field("params", params)
                .finish_non_exhaustive(),
            RouteMatch::MethodNotAllowed { allowed } => f
                .debug_struct("MethodNotAllowed")
                .field("allowed", allowed)
                .finish(),
            RouteMatch::NotFound => f.write_str("NotFound"),
        }
    }
}

impl RouteMatch {
    /// Whether no route is registered for the path under any method.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RouteMatch::NotFound)
    }
}

/// A set of routes the router dispatches to.
///
/// Tables are cloned before every registration, so a registration on the
/// clone must never be observable through the original.
pub trait RouteTable: Clone + Send + Sync + 'static {
    /// Registers `handler` for `path` under every method in `methods`.
    ///
    /// `methods` is non-empty and free of duplicates. On error the table is
    /// left unchanged.
    fn register(
        &mut self,
        methods: &[Method],
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError>;

    /// Looks up the route for a method and a concrete path.
    fn at(&self, method: &Method, path: &str) -> RouteMatch;
}

#[derive(Clone)]
struct Route {
    methods: Vec<Method>,
    path: String,
    handler: Arc<dyn Handler>,
}

/// The handlers registered for a single path pattern.
#[derive(Default)]
struct Endpoint {
    handlers: Vec<(Method, Arc<dyn Handler>)>,
}

impl Endpoint {
    fn get(&self, method: &Method) -> Option<&Arc<dyn Handler>> {
        self.handlers
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, handler)| handler)
    }
}

/// Compiled, immutable form of a route list.
struct Snapshot {
    tree: matchit::Router<usize>,
    endpoints: Vec<Endpoint>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            tree: matchit::Router::new(),
            endpoints: Vec::new(),
        }
    }

    fn compile(routes: &[Route]) -> Result<Self, RouteError> {
        let mut snapshot = Snapshot::empty();
        let mut indices: HashMap<&str, usize> = HashMap::new();

        for route in routes {
            let index = match indices.get(route.path.as_str()) {
                Some(&index) => index,
                None => {
                    let index = snapshot.endpoints.len();
                    snapshot
                        .tree
                        .insert(route.path.as_str(), index)
                        .map_err(|source| RouteError::Insert {
                            path: route.path.clone(),
                            source,
                        })?;
                    snapshot.endpoints.push(Endpoint::default());
                    indices.insert(route.path.as_str(), index);
                    index
                }
            };

            let endpoint = &mut snapshot.endpoints[index];
            for method in &route.methods {
                if endpoint.get(method).is_some() {
                    return Err(RouteError::Duplicate {
                        path: route.path.clone(),
                        method: method.clone(),
                    });
                }
                endpoint.handlers.push((method.clone(), route.handler.clone()));
            }
        }

        Ok(snapshot)
    }
}

/// The default [`RouteTable`].
///
/// Keeps the registered routes in order and a snapshot compiled from them,
/// both shared between clones. Registration copies the route list and
/// compiles a fresh snapshot, so a clone is never affected by registrations
/// on another clone.
///
/// A `HEAD` request for a pattern without a `HEAD` route is served by the
/// `GET` handler of that pattern.
#[derive(Clone)]
pub struct MatchitTable {
    routes: Arc<Vec<Route>>,
    snapshot: Arc<Snapshot>,
}

impl MatchitTable {
    /// Creates a table without routes.
    pub fn new() -> Self {
        Self {
            routes: Arc::new(Vec::new()),
            snapshot: Arc::new(Snapshot::empty()),
        }
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for MatchitTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable for MatchitTable {
    fn register(
        &mut self,
        methods: &[Method],
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        if methods.is_empty() {
            return Err(RouteError::NoMethods {
                path: path.to_owned(),
            });
        }

        let mut routes = Vec::clone(&self.routes);
        routes.push(Route {
            methods: methods.to_vec(),
            path: path.to_owned(),
            handler,
        });

        let snapshot = Snapshot::compile(&routes)?;
        self.routes = Arc::new(routes);
        self.snapshot = Arc::new(snapshot);
        Ok(())
    }

    fn at(&self, method: &Method, path: &str) -> RouteMatch {
        let matched = match self.snapshot.tree.at(path) {
            Ok(matched) => matched,
            Err(_) => return RouteMatch::NotFound,
        };

        let endpoint = &self.snapshot.endpoints[*matched.value];
        let handler = endpoint.get(method).or_else(|| {
            if method == Method::HEAD {
                endpoint.get(&Method::GET)
            } else {
                None
            }
        });

        match handler {
            Some(handler) => RouteMatch::Found {
                handler: handler.clone(),
                params: matched.params.into(),
            },
            None => RouteMatch::MethodNotAllowed {
                allowed: endpoint.handlers.iter().map(|(m, _)| m.clone()).collect(),
            },
        }
    }
}
