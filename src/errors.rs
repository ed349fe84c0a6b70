use crate::uri::UriError;
use std::{error, fmt, io};

/// Request-level failures. Every variant except `Io` answers the client with
/// a static status line before the connection is closed.
#[derive(Debug, PartialEq)]
pub(crate) enum ErrorKind {
    InvalidMethod,
    InvalidUri(UriError),
    InvalidVersion,

    InvalidHeader,
    InvalidPort,
    InvalidEncoding,
    TruncatedHeaders,
    HeadersTooLarge,

    InvalidContentLength,
    BodyTooLarge,
    TruncatedBody,

    Io(IoError),
}

/// Written when the router itself fails (a middleware returned an error).
pub(crate) const INTERNAL_ERROR: &[u8] = b"HTTP/1.1 500 Internal Server Error\r\n\r\n";

macro_rules! http_errors {
    ($($name:ident: $status_code:literal;)*) => {
        pub(crate) const fn as_http(&self) -> Option<&'static [u8]> {
            match self {
                $(Self::$name { .. } => Some(
                    concat!("HTTP/1.1 ", $status_code, "\r\n\r\n").as_bytes()
                ),)*
                Self::Io(_) => None,
            }
        }
    };
}

impl ErrorKind {
    http_errors! {
        InvalidMethod: "400 Bad Request";
        InvalidUri: "400 Bad Request";
        InvalidVersion: "400 Bad Request";

        InvalidHeader: "400 Bad Request";
        InvalidPort: "400 Bad Request";
        InvalidEncoding: "400 Bad Request";
        TruncatedHeaders: "400 Bad Request";
        HeadersTooLarge: "431 Request Header Fields Too Large";

        InvalidContentLength: "400 Bad Request";
        BodyTooLarge: "413 Payload Too Large";
        TruncatedBody: "400 Bad Request";
    }
}

impl error::Error for ErrorKind {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::InvalidUri(err) => Some(err),
            Self::Io(err) => Some(&err.0),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMethod => f.write_str("invalid request method"),
            Self::InvalidUri(err) => write!(f, "invalid request target: {err}"),
            Self::InvalidVersion => f.write_str("missing protocol version"),
            Self::InvalidHeader => f.write_str("malformed header line"),
            Self::InvalidPort => f.write_str("invalid port in host header"),
            Self::InvalidEncoding => f.write_str("request head is not valid UTF-8"),
            Self::TruncatedHeaders => f.write_str("connection closed inside the request head"),
            Self::HeadersTooLarge => f.write_str("request head exceeds the size limit"),
            Self::InvalidContentLength => f.write_str("invalid Content-Length"),
            Self::BodyTooLarge => f.write_str("request body exceeds the size limit"),
            Self::TruncatedBody => f.write_str("connection closed inside the request body"),
            Self::Io(err) => write!(f, "i/o error: {}", err.0),
        }
    }
}

impl From<UriError> for ErrorKind {
    fn from(err: UriError) -> Self {
        ErrorKind::InvalidUri(err)
    }
}
impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

#[derive(Debug)]
pub(crate) struct IoError(pub(crate) io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn status_lines() {
        #[rustfmt::skip]
        let cases: [(ErrorKind, &[u8]); 5] = [
            (ErrorKind::InvalidMethod,  b"HTTP/1.1 400 Bad Request\r\n\r\n"),
            (ErrorKind::InvalidUri(UriError::Empty), b"HTTP/1.1 400 Bad Request\r\n\r\n"),
            (ErrorKind::HeadersTooLarge, b"HTTP/1.1 431 Request Header Fields Too Large\r\n\r\n"),
            (ErrorKind::BodyTooLarge,   b"HTTP/1.1 413 Payload Too Large\r\n\r\n"),
            (ErrorKind::TruncatedBody,  b"HTTP/1.1 400 Bad Request\r\n\r\n"),
        ];

        for (kind, expected) in cases {
            assert_eq!(kind.as_http(), Some(expected), "{kind}");
        }
    }

    #[test]
    fn io_errors_have_no_response() {
        let kind = ErrorKind::from(io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(kind.as_http(), None);
        assert_eq!(kind, ErrorKind::Io(IoError(io::ErrorKind::TimedOut.into())));
    }
}
