//! HTTP response returned by handlers.

use crate::{Body, Headers, StatusCode, Version, WriteBuffer};
use serde::Serialize;

/// HTTP response: status, version, headers and a streamed [`Body`].
///
/// The connection writes the head as soon as the router returns, then drains
/// the body until it is finished. A response whose body is never finished
/// keeps the connection open, so handlers that stream with
/// [`Response::new`] or [`ResponseBuilder::stream`] must call
/// [`Body::finish`] eventually.
///
/// On the wire only the numeric status is written, without a reason phrase:
///
/// ```text
/// HTTP/1.1 200\r\n
/// Content-Type: text/plain\r\n
/// \r\n
/// Hello world!
/// ```
///
/// # Examples
/// ```
/// use rawhttp::{Response, StatusCode};
///
/// let resp = Response::builder()
///     .status(StatusCode::CREATED)
///     .header("Content-Type", "text/html")
///     .header("X-Request-Id", 128)
///     .body("<h1>Hello World</h1>");
///
/// assert_eq!(resp.status(), StatusCode::CREATED);
/// assert_eq!(resp.header("X-Request-Id"), Some("128"));
/// assert!(resp.body().is_finished());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: Headers,
    body: Body,
}

impl Response {
    /// `200`, HTTP/1.1, no headers and an open body to be written and finished
    /// by the caller.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder {
            response: Response::new(),
        }
    }

    /// Response without body.
    pub fn empty(status: StatusCode) -> Self {
        Self::builder().status(status).empty()
    }

    /// Plain-text response with `Content-Type: text/plain`.
    ///
    /// ```
    /// use rawhttp::{Response, StatusCode};
    ///
    /// let resp = Response::text(StatusCode::OK, "Hello world!");
    /// assert_eq!(resp.header("Content-Type"), Some("text/plain"));
    /// ```
    pub fn text<T: WriteBuffer>(status: StatusCode, body: T) -> Self {
        Self::builder()
            .status(status)
            .header("Content-Type", "text/plain")
            .body(body)
    }

    /// Serializes `value` to JSON with `Content-Type: application/json`.
    ///
    /// A serialization failure produces a `500` response whose body is the
    /// error message.
    ///
    /// ```
    /// use rawhttp::{Response, StatusCode};
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Greeting<'a> {
    ///     message: &'a str,
    /// }
    ///
    /// let resp = Response::json(&Greeting { message: "Hello" });
    /// assert_eq!(resp.status(), StatusCode::OK);
    /// assert_eq!(resp.header("Content-Type"), Some("application/json"));
    /// ```
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        let builder = Self::builder().header("Content-Type", "application/json");

        match serde_json::to_vec(value) {
            Ok(bytes) => builder.body(bytes),
            Err(err) => builder
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(err.to_string()),
        }
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    #[inline]
    pub fn version(&self) -> &Version {
        &self.version
    }

    #[inline]
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    #[inline]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// First value of the header `name` (case-sensitive).
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.first(name)
    }

    /// Replaces every value of the header `name` with `value`.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value: String = value.into();
        self.headers.set(name, [value]);
    }

    /// Adds `value` to the header `name`, keeping existing values.
    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.add(name, value);
    }

    #[inline]
    pub fn body(&self) -> &Body {
        &self.body
    }

    #[inline]
    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Serializes the status line, the headers and the blank line.
    pub(crate) fn write_head(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(b"HTTP/");
        buffer.extend_from_slice(self.version.as_str().as_bytes());
        buffer.push(b' ');
        self.status.as_u16().write_to(buffer);
        buffer.extend_from_slice(b"\r\n");

        for (name, values) in self.headers.iter() {
            buffer.extend_from_slice(name.as_bytes());
            buffer.extend_from_slice(b": ");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    buffer.extend_from_slice(b", ");
                }
                buffer.extend_from_slice(value.as_bytes());
            }
            buffer.extend_from_slice(b"\r\n");
        }

        buffer.extend_from_slice(b"\r\n");
    }
}

/// Fluent construction of a [`Response`], see [`Response::builder`].
///
/// Every finishing method ([`body`](Self::body), [`empty`](Self::empty),
/// [`stream`](Self::stream)) returns the response.
#[derive(Debug)]
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    #[inline]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.response.status = status;
        self
    }

    #[inline]
    pub fn version(mut self, version: Version) -> Self {
        self.response.version = version;
        self
    }

    /// Appends a header value. Numbers and booleans are accepted as well as
    /// strings.
    pub fn header<V: WriteBuffer>(mut self, name: impl Into<String>, value: V) -> Self {
        let mut buffer = Vec::new();
        value.write_to(&mut buffer);
        self.response
            .headers
            .add(name, String::from_utf8_lossy(&buffer));
        self
    }

    /// Finishes the response with a single-chunk, finished body.
    pub fn body<T: WriteBuffer>(mut self, value: T) -> Response {
        self.response.body = Body::from_value(value);
        self.response
    }

    /// Finishes the response with an empty, finished body.
    pub fn empty(mut self) -> Response {
        self.response.body = Body::empty();
        self.response
    }

    /// Finishes the response with an open body. Write chunks through
    /// [`Response::body`] and finish it.
    ///
    /// ```
    /// use rawhttp::Response;
    ///
    /// let resp = Response::builder().header("Content-Type", "text/csv").stream();
    /// let sender = resp.body().sender();
    /// sender.write("a,b\n").unwrap();
    /// sender.finish();
    /// ```
    pub fn stream(self) -> Response {
        self.response
    }
}
