use crate::{Method, Request, Response};
use std::fmt;

/// Produces the response for a routed request.
///
/// Handlers cannot fail: errors are reported to the client as responses
/// (for example a `400` with a message). Implemented for every
/// `Fn(&mut Request) -> Response`.
///
/// ```
/// use rawhttp::{router::{Handler, Route}, Method, Request, Response, StatusCode};
///
/// struct Version;
///
/// impl Handler for Version {
///     fn handle(&self, _req: &mut Request) -> Response {
///         Response::text(StatusCode::OK, env!("CARGO_PKG_VERSION"))
///     }
/// }
///
/// let route = Route::new(Method::Get, "/version", Version);
/// assert_eq!(route.pattern(), "/version");
/// ```
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &mut Request) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&mut Request) -> Response + Send + Sync + 'static,
{
    #[inline]
    fn handle(&self, request: &mut Request) -> Response {
        self(request)
    }
}

/// Method, exact path pattern and handler.
pub struct Route {
    method: Method,
    pattern: String,
    handler: Box<dyn Handler>,
}

impl Route {
    pub fn new<H: Handler>(method: Method, pattern: impl Into<String>, handler: H) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            handler: Box::new(handler),
        }
    }

    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    #[inline]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[inline]
    pub(crate) fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

macro_rules! route_constructors {
    ($($name:ident => $method:ident;)*) => {$(
        #[doc = concat!("Route answering `", stringify!($method), "` requests for `pattern`.")]
        pub fn $name<F>(pattern: impl Into<String>, handler: F) -> Route
        where
            F: Fn(&mut Request) -> Response + Send + Sync + 'static,
        {
            Route::new(Method::$method, pattern, handler)
        }
    )*};
}

route_constructors! {
    get => Get;
    head => Head;
    post => Post;
    put => Put;
    patch => Patch;
    delete => Delete;
    connect => Connect;
    options => Options;
    trace => Trace;
}

#[cfg(test)]
mod route_tests {
    use super::*;
    use crate::StatusCode;

    #[test]
    fn constructors() {
        fn ok(_: &mut Request) -> Response {
            Response::empty(StatusCode::OK)
        }

        #[rustfmt::skip]
        let cases = [
            (get("/", ok),     Method::Get),
            (head("/", ok),    Method::Head),
            (post("/", ok),    Method::Post),
            (put("/", ok),     Method::Put),
            (patch("/", ok),   Method::Patch),
            (delete("/", ok),  Method::Delete),
            (connect("/", ok), Method::Connect),
            (options("/", ok), Method::Options),
            (trace("/", ok),   Method::Trace),
        ];

        for (route, method) in cases {
            assert_eq!(route.method(), method);
            assert_eq!(route.pattern(), "/");
        }
    }

    #[test]
    fn closure_handler() {
        let greeting = String::from("hi");
        let route = get("/greet", move |_req| Response::text(StatusCode::OK, greeting.as_str()));

        let resp = route.handler().handle(&mut Request::default());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(format!("{route:?}"), r#"Route { method: Get, pattern: "/greet", .. }"#);
    }
}
