//! Request routing and the middleware chain.
//!
//! A [`Router`] holds an ordered list of middleware and an ordered list of
//! [`Route`]s. [`Router::serve`] runs every middleware in registration order,
//! then picks the first route whose pattern equals the request path exactly.
//!
//! | Outcome                                   | Response                     |
//! |-------------------------------------------|------------------------------|
//! | path and method match a route             | the route's handler          |
//! | path matches, no route for the method     | `405`, empty body            |
//! | no route for the path                     | the not-found handler (`404`)|
//! | a middleware returns `Err`                | `Err`, the server sends `500`|
//!
//! # Examples
//! ```
//! use rawhttp::{router::{get, post, Router, TrimTrailingSlash}, Response, StatusCode};
//!
//! let router = Router::new()
//!     .layer(TrimTrailingSlash)
//!     .use_middleware(|req, next| {
//!         req.headers_mut().add("X-Seen", "yes");
//!         next.run(req)
//!     })
//!     .register(get("/hello", |_req| Response::text(StatusCode::OK, "Hello")))
//!     .register(post("/hello", |req| {
//!         let name = req.parse_form().ok().and_then(|f| f.first("name")).unwrap_or("stranger");
//!         Response::text(StatusCode::OK, format!("Hello, {name}!"))
//!     }));
//! ```

mod core;
mod middleware;
mod route;

pub use self::core::{BoxError, Next, Router};
pub use self::middleware::{Middleware, TrimTrailingSlash};
pub use self::route::{
    connect, delete, get, head, options, patch, post, put, trace, Handler, Route,
};
