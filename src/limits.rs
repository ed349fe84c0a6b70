//! Server configuration limits and timeouts
//!
//! All limits are plain structs with conservative defaults. Override the
//! fields you care about and fill in the rest with `..Default::default()`.
//!
//! # Examples
//!
//! ```no_run
//! use rawhttp::{Router, Server, limits::{ConnLimits, ReqLimits, ServerLimits}};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     Server::builder()
//!         .address("127.0.0.1:8080")
//!         .router(Router::new())
//!         .server_limits(ServerLimits {
//!             listen_backlog: 2048,
//!             ..ServerLimits::default()
//!         })
//!         .connection_limits(ConnLimits {
//!             socket_read_timeout: Duration::from_secs(5),
//!             ..ConnLimits::default()
//!         })
//!         .request_limits(ReqLimits {
//!             body_size: 64 * 1024, // 64KB for form uploads
//!             ..ReqLimits::default()
//!         })
//!         .build()
//!         .await
//!         .unwrap()
//!         .launch()
//!         .await
//!         .unwrap();
//! }
//! ```

use std::{io, time::Duration};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    time::timeout,
};

/// Listening socket configuration.
#[derive(Debug, Clone)]
pub struct ServerLimits {
    /// Length of the kernel accept queue passed to `listen(2)` (default: `1024`).
    ///
    /// Only used when the server binds the socket itself, see
    /// [`ServerBuilder::address`](crate::ServerBuilder::address).
    pub listen_backlog: i32,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            listen_backlog: 1024,

            _priv: (),
        }
    }
}

/// Connection-level timeouts
///
/// A connection serves exactly one request, so these bound every socket
/// operation of its lifetime. A timeout drops the connection without a response.
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Maximum duration to wait for a single read from the socket (default: `2 seconds`)
    ///
    /// Cleans up peers that open a connection and never finish their request.
    pub socket_read_timeout: Duration,

    /// Maximum duration of a single write to the socket (default: `3 seconds`)
    ///
    /// Applies to the response head and to every body chunk separately.
    pub socket_write_timeout: Duration,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ConnLimits {
    #[inline(always)]
    fn default() -> Self {
        Self {
            socket_read_timeout: Duration::from_secs(2),
            socket_write_timeout: Duration::from_secs(3),

            _priv: (),
        }
    }
}

impl ConnLimits {
    pub(crate) async fn write_bytes<S: AsyncWrite + Unpin>(
        &self,
        stream: &mut S,
        bytes: &[u8],
    ) -> io::Result<()> {
        timeout(self.socket_write_timeout, stream.write_all(bytes)).await?
    }
}

/// Request parsing limits
///
/// The request head is read in chunks of `read_chunk` bytes until the blank
/// line that ends it shows up. The body is then read up to its
/// `Content-Length`.
///
/// # Example
/// ```
/// use rawhttp::limits::ReqLimits;
///
/// let limits = ReqLimits {
///     header_size: 16 * 1024,
///     ..ReqLimits::default()
/// };
/// assert_eq!(limits.read_chunk, 1024);
/// ```
#[derive(Debug, Clone)]
pub struct ReqLimits {
    /// Number of bytes requested from the socket per read (default: `1024 B`)
    pub read_chunk: usize,

    /// Maximum size of the request line plus headers (default: `8 KB`)
    ///
    /// A head that does not terminate within this many bytes is answered
    /// with `431 Request Header Fields Too Large`.
    pub header_size: usize,

    /// Maximum request body size announced by `Content-Length` (default: `1 MB`)
    ///
    /// Larger bodies are answered with `413 Payload Too Large`.
    pub body_size: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            read_chunk: 1024,
            header_size: 8 * 1024,
            body_size: 1024 * 1024,

            _priv: (),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct AllLimits {
    pub(crate) server: ServerLimits,
    pub(crate) conn: ConnLimits,
    pub(crate) req: ReqLimits,
}
