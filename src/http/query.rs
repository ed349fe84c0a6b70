//! URL query string parser with percent-decoding.
//!
//! Query strings (and `application/x-www-form-urlencoded` bodies) are parsed
//! into [`Values`], keeping parameters in the order they appear.
//!
//! ```
//! use rawhttp::query::{parse_query, QueryError};
//!
//! let values = parse_query("name=John+Doe&tag=a&tag=b&email=user%40example.com").unwrap();
//! assert_eq!(values.first("name"), Some("John Doe"));
//! assert_eq!(values.get("tag"), ["a", "b"]);
//! assert_eq!(values.first("email"), Some("user@example.com"));
//!
//! assert_eq!(parse_query("a=1;b=2"), Err(QueryError::Semicolon));
//! ```

use crate::Values;
use memchr::memchr;
use std::{borrow::Cow, error, fmt};

/// Query string parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A parameter contains `;`, which is not a valid separator.
    Semicolon,
    /// A `%` is not followed by two hexadecimal digits. Holds the bad escape.
    InvalidEscape(String),
    /// The decoded bytes are not valid UTF-8.
    InvalidEncoding,
}

impl error::Error for QueryError {}
impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semicolon => f.write_str("invalid semicolon separator in query"),
            Self::InvalidEscape(escape) => write!(f, "invalid URL escape {escape:?}"),
            Self::InvalidEncoding => f.write_str("decoded query is not valid UTF-8"),
        }
    }
}

/// Parses a query string into a new [`Values`].
///
/// Parameters are separated by `&` and split on the first `=`. Keys and
/// values are percent-decoded (`+` decodes to a space) and values are
/// trimmed. Empty parameters and parameters whose key decodes to an empty
/// string are skipped.
///
/// # Examples
/// ```
/// use rawhttp::query::parse_query;
///
/// assert!(parse_query("").unwrap().is_empty());
///
/// let values = parse_query("flag&&=skipped&a= 1 &a=2").unwrap();
/// assert_eq!(values.first("flag"), Some(""));
/// assert_eq!(values.get("a"), ["1", "2"]);
/// assert_eq!(values.len(), 2);
/// ```
#[inline]
pub fn parse_query(query: &str) -> Result<Values, QueryError> {
    let mut result = Values::new();
    parse_query_into(&mut result, query)?;
    Ok(result)
}

/// Parses a query string into an existing [`Values`], appending to it.
///
/// On error the parameters decoded before the failing one stay in `result`.
///
/// ```
/// use rawhttp::{query::parse_query_into, Values};
///
/// let mut values = Values::new();
/// parse_query_into(&mut values, "a=1").unwrap();
/// parse_query_into(&mut values, "a=2&b=3").unwrap();
/// assert_eq!(values.get("a"), ["1", "2"]);
/// ```
pub fn parse_query_into(result: &mut Values, query: &str) -> Result<(), QueryError> {
    let data = query.as_bytes();

    let mut start = 0;
    while start < data.len() {
        let end = memchr(b'&', &data[start..])
            .map(|pos| start + pos)
            .unwrap_or(data.len());
        let segment = &query[start..end];
        start = end + 1;

        if memchr(b';', segment.as_bytes()).is_some() {
            return Err(QueryError::Semicolon);
        }
        if segment.is_empty() {
            continue;
        }

        let (key, value) = match memchr(b'=', segment.as_bytes()) {
            Some(index) => (&segment[..index], &segment[index + 1..]),
            None => (segment, ""),
        };

        let key = percent_decode(key, true)?;
        if key.is_empty() {
            continue;
        }
        let value = percent_decode(value, true)?;

        result.add(key, value.trim());
    }

    Ok(())
}

#[inline]
const fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decodes `%XX` escapes, and `+` as a space when `plus_as_space` is set.
///
/// Borrows the input when there is nothing to decode.
pub(crate) fn percent_decode(src: &str, plus_as_space: bool) -> Result<Cow<'_, str>, QueryError> {
    let bytes = src.as_bytes();
    if !bytes.iter().any(|&b| b == b'%' || (plus_as_space && b == b'+')) {
        return Ok(Cow::Borrowed(src));
    }

    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escape = bytes.get(i + 1..i + 3);
                let byte = escape.and_then(|pair| Some(hex_digit(pair[0])? << 4 | hex_digit(pair[1])?));

                match byte {
                    Some(byte) => decoded.push(byte),
                    None => {
                        let bad = src.get(i..(i + 3).min(src.len())).unwrap_or("%");
                        return Err(QueryError::InvalidEscape(bad.to_owned()));
                    }
                }
                i += 3;
            }
            b'+' if plus_as_space => {
                decoded.push(b' ');
                i += 1;
            }
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }

    String::from_utf8(decoded)
        .map(Cow::Owned)
        .map_err(|_| QueryError::InvalidEncoding)
}

#[cfg(test)]
mod query_tests {
    use super::*;

    #[test]
    fn parse_cases() {
        #[rustfmt::skip]
        let cases: [(&str, &[(&str, &[&str])]); 9] = [
            ("",                     &[]),
            ("key=value",            &[("key", &["value"])]),
            ("a=1&a=2",              &[("a", &["1", "2"])]),
            ("a=1&b=2&a=3",          &[("a", &["1", "3"]), ("b", &["2"])]),
            ("flag",                 &[("flag", &[""])]),
            ("&&a=1&&",              &[("a", &["1"])]),
            ("=orphan&b=2",          &[("b", &["2"])]),
            ("k=+spaced+out+",       &[("k", &["spaced out"])]),
            ("%6Bey=%7E%20x",        &[("key", &["~ x"])]),
        ];

        for (input, expected) in cases {
            let values = parse_query(input).unwrap();
            assert_eq!(values.len(), expected.len(), "{input:?}");

            for ((key, got), (expected_key, expected_values)) in values.iter().zip(expected) {
                assert_eq!(key, *expected_key, "{input:?}");
                assert_eq!(got, *expected_values, "{input:?}");
            }
        }
    }

    #[test]
    fn parse_errors() {
        #[rustfmt::skip]
        let cases = [
            ("a=1;b=2",    QueryError::Semicolon),
            ("a=1&;",      QueryError::Semicolon),
            ("a=%zz",      QueryError::InvalidEscape("%zz".into())),
            ("a=%4",       QueryError::InvalidEscape("%4".into())),
            ("%g1=x",      QueryError::InvalidEscape("%g1".into())),
            ("a=%",        QueryError::InvalidEscape("%".into())),
            ("a=%ff",      QueryError::InvalidEncoding),
        ];

        for (input, expected) in cases {
            assert_eq!(parse_query(input), Err(expected), "{input:?}");
        }
    }

    #[test]
    fn decode_borrows_when_clean() {
        assert!(matches!(percent_decode("/plain/path", false), Ok(Cow::Borrowed(_))));
        assert_eq!(percent_decode("a+b", false).unwrap(), "a+b");
        assert_eq!(percent_decode("a+b", true).unwrap(), "a b");
        assert_eq!(percent_decode("caf%C3%A9", false).unwrap(), "café");
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            QueryError::InvalidEscape("%zz".into()).to_string(),
            r#"invalid URL escape "%zz""#
        );
    }
}
