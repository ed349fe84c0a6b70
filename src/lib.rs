//! rawhttp - a small HTTP/1.1 server written directly on top of TCP sockets
//!
//! Every accepted connection carries exactly one request. The request head is
//! parsed by hand, passed through a [`Router`] (an ordered middleware chain
//! followed by exact-path routes) and the [`Response`] is streamed back chunk
//! by chunk before the connection is shut down.
//!
//! # Building blocks
//!
//! - [`query`] and [`uri`]: URL-encoded query strings and absolute or
//!   origin-form URIs
//! - [`Values`] / [`Headers`]: ordered multi-valued maps
//! - [`Request`] and [`Response`], with a streamed [`Body`]
//! - [`router`]: routes, handlers and middleware
//! - [`Server`]: the accept loop
//! - [`limits`]: timeouts and size limits
//!
//! Nothing here installs a `tracing` subscriber; the library only emits
//! events (the listen address at `info`, connections and requests at
//! `debug`, rejected requests at `warn`).
//!
//! # Examples
//!
//! ```no_run
//! use rawhttp::{router::{get, post, TrimTrailingSlash}, Response, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::new()
//!         .layer(TrimTrailingSlash)
//!         .register(get("/hello", |_| Response::text(StatusCode::OK, "Hello world!")))
//!         .register(post("/", |req| {
//!             let name = match req.parse_form() {
//!                 Ok(form) => form.first("name").unwrap_or("stranger").to_owned(),
//!                 Err(err) => return Response::text(StatusCode::BAD_REQUEST, err.to_string()),
//!             };
//!             Response::text(StatusCode::OK, format!("Hello, {name}!"))
//!         }));
//!
//!     Server::bind("127.0.0.1:8080", router)
//!         .await
//!         .unwrap()
//!         .launch()
//!         .await
//!         .unwrap();
//! }
//! ```

pub(crate) mod http {
    pub(crate) mod body;
    pub mod query;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
    pub mod uri;
    pub(crate) mod values;
}
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod server_impl;
}
pub(crate) mod errors;
pub mod limits;
pub mod router;

pub use crate::{
    http::{
        body::{Body, BodyError, BodyReceiver, BodySender, WriteBuffer},
        query,
        request::Request,
        response::{Response, ResponseBuilder},
        types::{Method, StatusCode, Version},
        uri::{self, Uri},
        values::{Headers, Values},
    },
    router::Router,
    server::server_impl::{Server, ServerBuilder, ServerError},
};
