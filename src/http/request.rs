use crate::{
    errors::ErrorKind,
    http::{
        types::slice_to_usize,
        uri::{parse_request_uri, Uri},
    },
    limits::ReqLimits,
    query::{parse_query, QueryError},
    Headers, Method, Values, Version,
};
use memchr::{memchr, memmem};
use std::{io, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    time::sleep,
};

/// HTTP request as read from a connection.
///
/// # Accepted format
///
/// ```text
/// [METHOD] SP [TARGET] SP [VERSION] CRLF
/// [NAME]: [VALUE], [VALUE] CRLF
/// CRLF
/// [BODY]
/// ```
///
/// - `[METHOD]`: one of the [`Method`] tokens, uppercase.
/// - `[TARGET]`: origin-form (`/path?query#fragment`), absolute-form or `*`,
///   see [`parse_request_uri`](crate::uri::parse_request_uri).
/// - `[VERSION]`: any non-empty token, the `HTTP/` prefix is stripped.
/// - Lines may end with `\n` alone.
/// - Header values are split on `,` and trimmed, so `Accept: a, b` is stored
///   as two values. Names are kept as received.
///
/// The host and port of [`uri`](Self::uri) come from `X-Forwarded-Host`, or
/// from `Host` when the former is absent.
///
/// The body is read up to `Content-Length`. Without that header the body is
/// whatever arrived together with the head. `Transfer-Encoding: chunked` is
/// not supported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: Headers,
    body: Vec<u8>,

    params: Option<Values>,
}

impl Request {
    /// Creates a request with HTTP/1.1, no headers and an empty body.
    ///
    /// ```
    /// use rawhttp::{uri::parse_request_uri, Method, Request};
    ///
    /// let mut req = Request::new(Method::Post, parse_request_uri("/login").unwrap());
    /// req.set_body("user=ann");
    /// assert_eq!(req.parse_form().unwrap().first("user"), Some("ann"));
    /// ```
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            ..Self::default()
        }
    }

    #[inline]
    pub const fn method(&self) -> Method {
        self.method
    }

    #[inline]
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[inline]
    pub fn uri_mut(&mut self) -> &mut Uri {
        &mut self.uri
    }

    /// Decoded request path, shorthand for `self.uri().path()`.
    #[inline]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    #[inline]
    pub fn version(&self) -> &Version {
        &self.version
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

    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as an [`io::Read`](std::io::Read) implementation.
    #[inline]
    pub fn body_reader(&self) -> io::Cursor<&[u8]> {
        io::Cursor::new(self.body.as_slice())
    }

    /// Replaces the body and drops previously parsed form parameters.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
        self.params = None;
    }

    /// Query parameters of the request target, see [`Uri::query`].
    #[inline]
    pub fn query(&mut self) -> &Values {
        self.uri.query()
    }

    #[inline]
    pub fn query_mut(&mut self) -> &mut Values {
        self.uri.query_mut()
    }

    /// Parses the first line of the body as a query string.
    ///
    /// The result is cached: later calls return the same parameters, also
    /// available through [`params`](Self::params).
    ///
    /// ```
    /// use rawhttp::{uri::parse_request_uri, Method, Request};
    ///
    /// let mut req = Request::new(Method::Post, parse_request_uri("/").unwrap());
    /// req.set_body("name=Jo+Doe&age=7\r\nignored=1");
    ///
    /// let form = req.parse_form().unwrap();
    /// assert_eq!(form.first("name"), Some("Jo Doe"));
    /// assert!(!form.has("ignored"));
    /// assert_eq!(req.params().and_then(|p| p.first("age")), Some("7"));
    /// ```
    pub fn parse_form(&mut self) -> Result<&Values, QueryError> {
        if self.params.is_none() {
            let line = match memchr(b'\n', &self.body) {
                Some(end) => &self.body[..end],
                None => &self.body[..],
            };
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let line = simdutf8::basic::from_utf8(line).map_err(|_| QueryError::InvalidEncoding)?;

            self.params = Some(parse_query(line)?);
        }

        Ok(self.params.get_or_insert_with(Values::new))
    }

    /// Form parameters computed by [`parse_form`](Self::parse_form), if it
    /// has been called.
    #[inline]
    pub fn params(&self) -> Option<&Values> {
        self.params.as_ref()
    }
}

/// Reads requests from a connection.
///
/// Owns the read buffer of one connection.
#[derive(Debug)]
pub(crate) struct Parser {
    buffer: Vec<u8>,
    limits: ReqLimits,
}

impl Parser {
    pub(crate) fn new(limits: &ReqLimits) -> Self {
        Self {
            buffer: Vec::with_capacity(limits.read_chunk),
            limits: limits.clone(),
        }
    }

    /// Reads one request. Returns `None` when the peer closes the connection
    /// without sending a single byte.
    pub(crate) async fn read_request<S: AsyncRead + Unpin>(
        &mut self,
        stream: &mut S,
        read_timeout: Duration,
    ) -> Result<Option<Request>, ErrorKind> {
        self.buffer.clear();

        let head_end = loop {
            if let Some(end) = find_head_end(&self.buffer) {
                if end > self.limits.header_size {
                    return Err(ErrorKind::HeadersTooLarge);
                }
                break end;
            }
            if self.buffer.len() >= self.limits.header_size {
                return Err(ErrorKind::HeadersTooLarge);
            }

            if self.fill_buffer(stream, read_timeout).await? == 0 {
                return match self.buffer.is_empty() {
                    true => Ok(None),
                    false => Err(ErrorKind::TruncatedHeaders),
                };
            }
        };

        let mut request = parse_head(&self.buffer[..head_end])?;

        let body = match content_length(&request.headers)? {
            Some(len) if len > self.limits.body_size => return Err(ErrorKind::BodyTooLarge),
            Some(len) => {
                while self.buffer.len() - head_end < len {
                    if self.fill_buffer(stream, read_timeout).await? == 0 {
                        return Err(ErrorKind::TruncatedBody);
                    }
                }
                &self.buffer[head_end..head_end + len]
            }
            None => &self.buffer[head_end..],
        };
        request.body = body.to_vec();

        Ok(Some(request))
    }

    async fn fill_buffer<S: AsyncRead + Unpin>(
        &mut self,
        stream: &mut S,
        time: Duration,
    ) -> Result<usize, io::Error> {
        let start = self.buffer.len();
        self.buffer.resize(start + self.limits.read_chunk.max(1), 0);

        let result = tokio::select! {
            biased;

            read_result = stream.read(&mut self.buffer[start..]) => read_result,
            _ = sleep(time) => {
                Err(io::Error::new(io::ErrorKind::TimedOut, "read timeout"))
            },
        };

        let n = *result.as_ref().unwrap_or(&0);
        self.buffer.truncate(start + n);
        result
    }
}

/// Index just past the blank line that ends the head (`\r\n\r\n` or `\n\n`).
fn find_head_end(buffer: &[u8]) -> Option<usize> {
    let crlf = memmem::find(buffer, b"\n\r\n").map(|i| i + 3);
    let lf = memmem::find(buffer, b"\n\n").map(|i| i + 2);

    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Parses the request line and headers. `head` ends with the blank line.
pub(crate) fn parse_head(head: &[u8]) -> Result<Request, ErrorKind> {
    let head = simdutf8::basic::from_utf8(head).map_err(|_| ErrorKind::InvalidEncoding)?;
    let mut lines = head
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line));

    let first = lines.next().unwrap_or_default();

    let space = memchr(b' ', first.as_bytes()).ok_or(ErrorKind::InvalidMethod)?;
    let method = Method::from_bytes(first[..space].trim().as_bytes())?;

    let rest = &first[space + 1..];
    let space = memchr(b' ', rest.as_bytes()).ok_or(ErrorKind::InvalidVersion)?;
    let mut uri = parse_request_uri(&rest[..space])?;
    let version = Version::from_token(&rest[space + 1..])?;

    let mut headers = Headers::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        parse_header(line, &mut headers)?;
    }

    resolve_host(&headers, &mut uri)?;

    Ok(Request {
        method,
        uri,
        version,
        headers,
        ..Request::default()
    })
}

fn parse_header(line: &str, headers: &mut Headers) -> Result<(), ErrorKind> {
    let colon = memchr(b':', line.as_bytes()).ok_or(ErrorKind::InvalidHeader)?;

    let name = line[..colon].trim();
    if name.is_empty() {
        return Err(ErrorKind::InvalidHeader);
    }

    headers.append(name, line[colon + 1..].split(',').map(str::trim));
    Ok(())
}

/// Copies host and port from `X-Forwarded-Host` or `Host` into `uri`.
fn resolve_host(headers: &Headers, uri: &mut Uri) -> Result<(), ErrorKind> {
    let value = match headers.has("X-Forwarded-Host") {
        true => headers.first("X-Forwarded-Host"),
        false => headers.first("Host"),
    };
    let Some(value) = value else {
        return Ok(());
    };

    let (host, port) = match value.strip_prefix('[') {
        Some(bracketed) => {
            let close = memchr(b']', bracketed.as_bytes()).ok_or(ErrorKind::InvalidHeader)?;
            (&bracketed[..close], bracketed[close + 1..].strip_prefix(':'))
        }
        None => match value.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (value, None),
        },
    };

    uri.set_host(host);
    if let Some(port) = port {
        let port = slice_to_usize(port.as_bytes())
            .and_then(|port| u16::try_from(port).ok())
            .ok_or(ErrorKind::InvalidPort)?;
        uri.set_port(port);
    }
    Ok(())
}

fn content_length(headers: &Headers) -> Result<Option<usize>, ErrorKind> {
    match headers.get_ignore_case("Content-Length") {
        None => Ok(None),
        Some([value]) => slice_to_usize(value.as_bytes())
            .map(Some)
            .ok_or(ErrorKind::InvalidContentLength),
        Some(_) => Err(ErrorKind::InvalidContentLength),
    }
}
