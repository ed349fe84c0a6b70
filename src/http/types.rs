use crate::errors::ErrorKind;
use std::{borrow::Cow, fmt};

/// Parses an unsigned decimal number made of ASCII digits only.
///
/// Unlike `str::parse`, a leading `+` and the empty string are both rejected.
pub(crate) fn slice_to_usize(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }

    let mut result: usize = 0;
    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return None;
        }

        result = result
            .checked_mul(10)?
            .checked_add((byte - b'0') as usize)?;
    }

    Some(result)
}

// METHOD

/// HTTP request methods
///
/// # References
///
/// - [RFC 9110, Section 9](https://datatracker.ietf.org/doc/html/rfc9110#section-9)
/// - [RFC 5789](https://datatracker.ietf.org/doc/html/rfc5789) (PATCH method)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// Transfer a current representation of the target resource
    #[default]
    Get,
    /// Same as GET but without response body
    Head,
    /// Perform resource-specific processing on the request payload
    Post,
    /// Replace all current representations of the target resource
    Put,
    /// Apply partial modifications to a resource
    Patch,
    /// Remove all current representations of the target resource
    Delete,
    /// Establish a tunnel to the server identified by the target resource
    Connect,
    /// Describe the communication options for the target resource
    Options,
    /// Perform a message loop-back test along the path to the target resource
    Trace,
}

impl Method {
    #[inline]
    pub(crate) fn from_bytes(src: &[u8]) -> Result<Self, ErrorKind> {
        match src {
            b"GET" => Ok(Method::Get),
            b"HEAD" => Ok(Method::Head),
            b"POST" => Ok(Method::Post),
            b"PUT" => Ok(Method::Put),
            b"PATCH" => Ok(Method::Patch),
            b"DELETE" => Ok(Method::Delete),
            b"CONNECT" => Ok(Method::Connect),
            b"OPTIONS" => Ok(Method::Options),
            b"TRACE" => Ok(Method::Trace),
            _ => Err(ErrorKind::InvalidMethod),
        }
    }

    /// Returns the method token as it appears on the request line.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// VERSION

/// HTTP protocol version, stored without the `HTTP/` prefix.
///
/// Any non-empty token is accepted on the request line; the two common
/// versions are available as constants and do not allocate.
///
/// ```
/// use rawhttp::Version;
///
/// assert_eq!(Version::default(), Version::HTTP_11);
/// assert_eq!(Version::HTTP_11.to_string(), "1.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(Cow<'static, str>);

impl Version {
    /// `HTTP/1.0` - [RFC 1945](https://tools.ietf.org/html/rfc1945)
    pub const HTTP_10: Version = Version(Cow::Borrowed("1.0"));
    /// `HTTP/1.1` - [RFC 9112](https://tools.ietf.org/html/rfc9112)
    pub const HTTP_11: Version = Version(Cow::Borrowed("1.1"));

    /// Builds a version from its number, e.g. `"2"` or `"1.1"`.
    pub fn new(number: impl Into<Cow<'static, str>>) -> Self {
        Version(number.into())
    }

    pub(crate) fn from_token(token: &str) -> Result<Self, ErrorKind> {
        let token = token.trim();
        let number = token.strip_prefix("HTTP/").unwrap_or(token);

        match number {
            "" => Err(ErrorKind::InvalidVersion),
            "1.1" => Ok(Self::HTTP_11),
            "1.0" => Ok(Self::HTTP_10),
            other => Ok(Version(Cow::Owned(other.to_owned()))),
        }
    }

    /// The version number, e.g. `"1.1"`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::HTTP_11
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// STATUS_CODE

/// HTTP status code
///
/// Any `u16` is representable; the codes registered in
/// [RFC 9110](https://datatracker.ietf.org/doc/html/rfc9110#section-15)
/// are available as constants. On the wire only the number is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(u16);

macro_rules! set_status_codes {
    ($(
        $name:ident = ($num:literal, $str:literal);
    )+) => {
        impl StatusCode { $(
            #[doc = concat!("`", stringify!($num), " ", $str, "`")]
            pub const $name: StatusCode = StatusCode($num);
        )+

            /// Returns the reason phrase registered for this code, if any.
            ///
            /// ```
            /// use rawhttp::StatusCode;
            ///
            /// assert_eq!(StatusCode::NOT_FOUND.canonical_reason(), Some("Not Found"));
            /// assert_eq!(StatusCode::new(599).canonical_reason(), None);
            /// ```
            pub const fn canonical_reason(&self) -> Option<&'static str> {
                match self.0 { $(
                    $num => Some($str),
                )+
                    _ => None,
                }
            }
        }
    }
}

set_status_codes! {
    CONTINUE = (100, "Continue");
    SWITCHING_PROTOCOLS = (101, "Switching Protocols");

    OK = (200, "OK");
    CREATED = (201, "Created");
    ACCEPTED = (202, "Accepted");
    NON_AUTHORITATIVE_INFORMATION = (203, "Non Authoritative Information");
    NO_CONTENT = (204, "No Content");
    RESET_CONTENT = (205, "Reset Content");
    PARTIAL_CONTENT = (206, "Partial Content");

    MULTIPLE_CHOICES = (300, "Multiple Choices");
    MOVED_PERMANENTLY = (301, "Moved Permanently");
    FOUND = (302, "Found");
    SEE_OTHER = (303, "See Other");
    NOT_MODIFIED = (304, "Not Modified");
    TEMPORARY_REDIRECT = (307, "Temporary Redirect");
    PERMANENT_REDIRECT = (308, "Permanent Redirect");

    BAD_REQUEST = (400, "Bad Request");
    UNAUTHORIZED = (401, "Unauthorized");
    PAYMENT_REQUIRED = (402, "Payment Required");
    FORBIDDEN = (403, "Forbidden");
    NOT_FOUND = (404, "Not Found");
    METHOD_NOT_ALLOWED = (405, "Method Not Allowed");
    NOT_ACCEPTABLE = (406, "Not Acceptable");
    REQUEST_TIMEOUT = (408, "Request Timeout");
    CONFLICT = (409, "Conflict");
    GONE = (410, "Gone");
    LENGTH_REQUIRED = (411, "Length Required");
    PAYLOAD_TOO_LARGE = (413, "Payload Too Large");
    URI_TOO_LONG = (414, "URI Too Long");
    UNSUPPORTED_MEDIA_TYPE = (415, "Unsupported Media Type");
    UNPROCESSABLE_ENTITY = (422, "Unprocessable Entity");
    TOO_MANY_REQUESTS = (429, "Too Many Requests");
    REQUEST_HEADER_FIELDS_TOO_LARGE = (431, "Request Header Fields Too Large");

    INTERNAL_SERVER_ERROR = (500, "Internal Server Error");
    NOT_IMPLEMENTED = (501, "Not Implemented");
    BAD_GATEWAY = (502, "Bad Gateway");
    SERVICE_UNAVAILABLE = (503, "Service Unavailable");
    GATEWAY_TIMEOUT = (504, "Gateway Timeout");
    HTTP_VERSION_NOT_SUPPORTED = (505, "HTTP Version Not Supported");
}

impl StatusCode {
    /// Wraps an arbitrary numeric code.
    pub const fn new(code: u16) -> Self {
        StatusCode(code)
    }

    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::OK
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn methods() {
        #[rustfmt::skip]
        let cases = [
            ("GET", Method::Get), ("HEAD", Method::Head), ("POST", Method::Post),
            ("PUT", Method::Put), ("PATCH", Method::Patch), ("DELETE", Method::Delete),
            ("CONNECT", Method::Connect), ("OPTIONS", Method::Options), ("TRACE", Method::Trace),
        ];

        for (token, method) in cases {
            assert_eq!(Method::from_bytes(token.as_bytes()), Ok(method));
            assert_eq!(method.to_string(), token);
        }

        for token in ["get", "", "GETS", " GET", "BREW"] {
            assert_eq!(
                Method::from_bytes(token.as_bytes()),
                Err(ErrorKind::InvalidMethod),
                "{token:?}"
            );
        }
    }

    #[test]
    fn versions() {
        #[rustfmt::skip]
        let cases = [
            ("HTTP/1.1",     Ok("1.1")),
            ("HTTP/1.0",     Ok("1.0")),
            (" HTTP/2 ",     Ok("2")),
            ("1.1",          Ok("1.1")),
            ("",             Err(ErrorKind::InvalidVersion)),
            ("HTTP/",        Err(ErrorKind::InvalidVersion)),
        ];

        for (token, expected) in cases {
            let version = Version::from_token(token);
            assert_eq!(version.as_ref().map(Version::as_str), expected.as_ref().map(|v| *v));
        }
    }

    #[test]
    fn status_codes() {
        assert_eq!(StatusCode::OK.to_string(), "200");
        assert_eq!(StatusCode::from(418).as_u16(), 418);
        assert_eq!(StatusCode::METHOD_NOT_ALLOWED.canonical_reason(), Some("Method Not Allowed"));
        assert_eq!(StatusCode::default(), StatusCode::OK);
    }

    #[test]
    fn decimal_numbers() {
        #[rustfmt::skip]
        let cases: [(&[u8], Option<usize>); 6] = [
            (b"0",     Some(0)),
            (b"8080",  Some(8080)),
            (b"",      None),
            (b"+1",    None),
            (b"12a",   None),
            (b"99999999999999999999999", None),
        ];

        for (input, expected) in cases {
            assert_eq!(slice_to_usize(input), expected);
        }
    }
}
