use crate::{
    limits::{AllLimits, ConnLimits, ReqLimits, ServerLimits},
    server::connection::HttpConnection,
    Router,
};
use socket2::{Domain, Protocol, Socket, Type};
use std::{error, fmt, io, net::SocketAddr, sync::Arc};
use tokio::net::{lookup_host, TcpListener};
use tracing::{debug, error, info};

/// Failure to start or keep running a [`Server`].
#[derive(Debug)]
pub enum ServerError {
    /// The listen address could not be resolved or bound.
    Bind(io::Error),
    /// Accepting a connection failed. This ends [`Server::launch`].
    Accept(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind(err) => write!(f, "failed to bind listener: {err}"),
            Self::Accept(err) => write!(f, "failed to accept connection: {err}"),
        }
    }
}

impl error::Error for ServerError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Bind(err) | Self::Accept(err) => Some(err),
        }
    }
}

/// An HTTP server answering one request per connection.
///
/// Every accepted connection is served on its own task: the request is
/// parsed, passed through the [`Router`] and the response is streamed back
/// before the connection is shut down.
///
/// # Examples
///
/// ```no_run
/// use rawhttp::{router::get, Response, Router, Server, StatusCode};
///
/// #[tokio::main]
/// async fn main() {
///     let router = Router::new()
///         .register(get("/hello", |_| Response::text(StatusCode::OK, "Hello world!")));
///
///     Server::bind("127.0.0.1:8080", router)
///         .await
///         .unwrap()
///         .launch()
///         .await
///         .unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    limits: AllLimits,
}

impl Server {
    /// Creates a new builder for configuring the server instance.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # #[tokio::main]
    /// # async fn main() {
    /// use rawhttp::{Router, Server};
    /// use tokio::net::TcpListener;
    ///
    /// let server = Server::builder()
    ///     .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
    ///     .router(Router::new())
    ///     .build()
    ///     .await
    ///     .unwrap();
    /// # }
    /// ```
    #[inline]
    pub fn builder() -> ServerBuilder {
        ServerBuilder {
            listener: None,
            address: None,
            router: None,

            server_limits: None,
            connection_limits: None,
            request_limits: None,
        }
    }

    /// Binds `address` with default limits.
    ///
    /// A leading `:` (as in `":8080"`) listens on every interface.
    pub async fn bind(address: &str, router: Router) -> Result<Self, ServerError> {
        Self::builder().address(address).router(router).build().await
    }

    /// Address the listener is bound to. Useful after binding port `0`.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until accepting fails.
    ///
    /// Connection-level failures (malformed requests, timeouts, resets) are
    /// logged and never stop the loop.
    pub async fn launch(self) -> Result<(), ServerError> {
        let local = self.listener.local_addr().map_err(ServerError::Bind)?;
        info!("Listening on http://{}", display_addr(local));

        loop {
            let (mut stream, peer) = match self.listener.accept().await {
                Ok(value) => value,
                Err(err) => {
                    error!(error = %err, "accept failed, stopping server");
                    return Err(ServerError::Accept(err));
                }
            };
            debug!(%peer, "connection accepted");

            let mut conn = HttpConnection::new(self.router.clone(), &self.limits);
            tokio::spawn(async move {
                if let Err(err) = conn.run(&mut stream).await {
                    debug!(%peer, error = %err, "connection dropped");
                }
            });
        }
    }
}

/// `host:port` with `localhost` in place of an unspecified address.
fn display_addr(addr: SocketAddr) -> String {
    match addr {
        _ if addr.ip().is_unspecified() => format!("localhost:{}", addr.port()),
        SocketAddr::V4(v4) => format!("{}:{}", v4.ip(), v4.port()),
        SocketAddr::V6(v6) => format!("[{}]:{}", v6.ip(), v6.port()),
    }
}

async fn bind_address(address: &str, limits: &ServerLimits) -> io::Result<TcpListener> {
    let address = match address.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => address.to_owned(),
    };

    let mut last_err = None;
    for addr in lookup_host(address.as_str()).await? {
        match bind_socket(addr, limits.listen_backlog) {
            Ok(listener) => return Ok(listener),
            Err(err) => last_err = Some(err),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{address} did not resolve to any address"),
        )
    }))
}

fn bind_socket(addr: SocketAddr, backlog: i32) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    TcpListener::from_std(socket.into())
}

//

/// Builder for configuring and creating [`Server`] instances.
///
/// A router and one of [`listener`](Self::listener) or
/// [`address`](Self::address) are required.
#[derive(Debug)]
pub struct ServerBuilder {
    listener: Option<TcpListener>,
    address: Option<String>,
    router: Option<Router>,

    server_limits: Option<ServerLimits>,
    connection_limits: Option<ConnLimits>,
    request_limits: Option<ReqLimits>,
}

impl ServerBuilder {
    /// Serves on an already bound listener. Takes precedence over
    /// [`address`](Self::address).
    #[inline(always)]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Address bound by [`build`](Self::build), with `SO_REUSEADDR` and the
    /// backlog from [`ServerLimits`].
    #[inline(always)]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Sets the router answering every request.
    ///
    /// **This is a required component.**
    #[inline(always)]
    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    #[inline(always)]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.server_limits = Some(limits);
        self
    }

    #[inline(always)]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    #[inline(always)]
    pub fn request_limits(mut self, limits: ReqLimits) -> Self {
        self.request_limits = Some(limits);
        self
    }

    /// Binds the listener if needed and creates the [`Server`].
    ///
    /// # Panics
    ///
    /// Panics if [`router`](Self::router) was not called, or if neither
    /// [`listener`](Self::listener) nor [`address`](Self::address) was.
    pub async fn build(self) -> Result<Server, ServerError> {
        let (source, router, limits) = self.get_all_parts();

        let listener = match source {
            ListenerSource::Bound(listener) => listener,
            ListenerSource::Address(address) => bind_address(&address, &limits.server)
                .await
                .map_err(ServerError::Bind)?,
        };

        Ok(Server {
            listener,
            router: Arc::new(router),
            limits,
        })
    }

    #[track_caller]
    #[inline(always)]
    fn get_all_parts(self) -> (ListenerSource, Router, AllLimits) {
        let source = match (self.listener, self.address) {
            (Some(listener), _) => ListenerSource::Bound(listener),
            (None, Some(address)) => ListenerSource::Address(address),
            (None, None) => panic!("The `listener` or `address` method must be called to create"),
        };

        (
            source,
            self.router
                .expect("The `router` method must be called to create"),
            AllLimits {
                server: self.server_limits.unwrap_or_default(),
                conn: self.connection_limits.unwrap_or_default(),
                req: self.request_limits.unwrap_or_default(),
            },
        )
    }
}

enum ListenerSource {
    Bound(TcpListener),
    Address(String),
}

#[cfg(test)]
mod server_tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV6};

    #[test]
    fn listen_line_address() {
        #[rustfmt::skip]
        let cases = [
            (SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),   "127.0.0.1:8080"),
            (SocketAddr::from((Ipv4Addr::UNSPECIFIED, 80)),   "localhost:80"),
            (SocketAddr::from((Ipv6Addr::UNSPECIFIED, 443)),  "localhost:443"),
            (SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::LOCALHOST, 8080, 0, 0)), "[::1]:8080"),
        ];

        for (addr, expected) in cases {
            assert_eq!(display_addr(addr), expected);
        }
    }

    #[tokio::test]
    async fn bind_ephemeral_port() {
        let server = Server::bind("127.0.0.1:0", Router::new()).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn bind_errors() {
        let err = Server::bind("not an address", Router::new()).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind(_)));
        assert!(err.to_string().starts_with("failed to bind listener: "));
        assert!(error::Error::source(&err).is_some());
    }

    #[tokio::test]
    #[should_panic(expected = "The `router` method must be called to create")]
    async fn build_without_router() {
        let _ = Server::builder().address("127.0.0.1:0").build().await;
    }
}
