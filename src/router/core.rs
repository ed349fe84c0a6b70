use super::{middleware::Middleware, route::{Handler, Route}};
use crate::{Request, Response, StatusCode};
use std::{error, fmt};

/// Error raised by a middleware to abort the request.
pub type BoxError = Box<dyn error::Error + Send + Sync>;

/// Ordered middleware chain plus ordered, exact-match route table.
///
/// Built once before the server starts and shared read-only afterwards.
pub struct Router {
    middleware: Vec<Box<dyn Middleware>>,
    routes: Vec<Route>,
    not_found: Box<dyn Handler>,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            middleware: Vec::new(),
            routes: Vec::new(),
            not_found: Box::new(|_: &mut Request| Response::empty(StatusCode::NOT_FOUND)),
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("middleware", &self.middleware.len())
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl Router {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a closure to the middleware chain.
    #[inline]
    pub fn use_middleware<F>(self, middleware: F) -> Self
    where
        F: Fn(&mut Request, Next<'_>) -> Result<Response, BoxError> + Send + Sync + 'static,
    {
        self.layer(middleware)
    }

    /// Appends a [`Middleware`] implementation to the chain.
    #[inline]
    pub fn layer<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// Appends a route. Earlier routes win when patterns and methods repeat.
    #[inline]
    pub fn register(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Replaces the handler used when no route pattern equals the path.
    #[inline]
    pub fn not_found<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Request) -> Response + Send + Sync + 'static,
    {
        self.not_found = Box::new(handler);
        self
    }

    #[inline]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Runs the middleware chain and the matching handler.
    ///
    /// ```
    /// use rawhttp::{router::{get, Router}, uri::parse_request_uri, Method, Request, Response, StatusCode};
    ///
    /// let router = Router::new().register(get("/hello", |_| Response::empty(StatusCode::OK)));
    ///
    /// let mut req = Request::new(Method::Post, parse_request_uri("/hello").unwrap());
    /// assert_eq!(router.serve(&mut req).unwrap().status(), StatusCode::METHOD_NOT_ALLOWED);
    /// ```
    pub fn serve(&self, request: &mut Request) -> Result<Response, BoxError> {
        Next {
            router: self,
            index: 0,
        }
        .run(request)
    }

    fn resolve(&self, request: &mut Request) -> Response {
        let path = request.path();
        let method = request.method();

        let mut path_matched = false;
        let mut found = None;
        for route in &self.routes {
            if route.pattern() != path {
                continue;
            }
            if route.method() == method {
                found = Some(route);
                break;
            }
            path_matched = true;
        }

        match found {
            Some(route) => route.handler().handle(request),
            None if path_matched => Response::empty(StatusCode::METHOD_NOT_ALLOWED),
            None => self.not_found.handle(request),
        }
    }
}

/// Continuation handed to a middleware: the rest of the chain followed by
/// route resolution.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    router: &'a Router,
    index: usize,
}

impl Next<'_> {
    /// Invokes the next middleware, or resolves the route when the chain is
    /// exhausted.
    pub fn run(self, request: &mut Request) -> Result<Response, BoxError> {
        match self.router.middleware.get(self.index) {
            Some(middleware) => middleware.handle(
                request,
                Next {
                    router: self.router,
                    index: self.index + 1,
                },
            ),
            None => Ok(self.router.resolve(request)),
        }
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").field("index", &self.index).finish()
    }
}
