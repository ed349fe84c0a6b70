use crate::{
    errors::{ErrorKind, INTERNAL_ERROR},
    http::{request::Parser, response::Response},
    limits::{AllLimits, ConnLimits},
    Router,
};
use std::{io, sync::Arc};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Serves the single request of one accepted connection.
pub(crate) struct HttpConnection {
    router: Arc<Router>,
    parser: Parser,
    conn_limits: ConnLimits,
}

impl HttpConnection {
    #[inline]
    pub(crate) fn new(router: Arc<Router>, limits: &AllLimits) -> Self {
        Self {
            router,
            parser: Parser::new(&limits.req),
            conn_limits: limits.conn.clone(),
        }
    }

    /// Reads the request, answers it and shuts the stream down.
    ///
    /// Malformed requests are answered with a static status line. I/O errors
    /// (including timeouts) are returned without writing anything.
    pub(crate) async fn run<S>(&mut self, stream: &mut S) -> Result<(), io::Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let result = match self.impl_run(stream).await {
            Ok(()) => Ok(()),
            Err(ErrorKind::Io(e)) => Err(e.0),
            Err(err) => {
                warn!(error = %err, "rejecting request");
                match err.as_http() {
                    Some(status_line) => self.conn_limits.write_bytes(stream, status_line).await,
                    None => Ok(()),
                }
            }
        };

        let _ = stream.shutdown().await;
        result
    }

    async fn impl_run<S>(&mut self, stream: &mut S) -> Result<(), ErrorKind>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(mut request) = self
            .parser
            .read_request(stream, self.conn_limits.socket_read_timeout)
            .await?
        else {
            debug!("connection closed before sending a request");
            return Ok(());
        };

        debug!(method = %request.method(), path = request.path(), "request received");

        let response = match self.router.serve(&mut request) {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, path = request.path(), "middleware failed");
                self.conn_limits.write_bytes(stream, INTERNAL_ERROR).await?;
                return Ok(());
            }
        };

        self.write_response(stream, &response).await?;
        Ok(())
    }

    async fn write_response<S>(&self, stream: &mut S, response: &Response) -> Result<(), io::Error>
    where
        S: AsyncWrite + Unpin,
    {
        let mut head = Vec::with_capacity(128);
        response.write_head(&mut head);
        self.conn_limits.write_bytes(stream, &head).await?;

        let mut body = response.body().receiver();
        while let Some(chunk) = body.recv().await {
            if !chunk.is_empty() {
                self.conn_limits.write_bytes(stream, &chunk).await?;
            }
        }

        debug!(status = response.status().as_u16(), "response sent");
        stream.flush().await
    }
}

#[cfg(test)]
mod connection_tests {
    use super::*;
    use crate::{
        router::{get, post},
        Response, StatusCode,
    };
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    fn router() -> Router {
        Router::new()
            .use_middleware(|req, next| match req.header("X-Fail") {
                Some(_) => Err("middleware refused".into()),
                None => next.run(req),
            })
            .register(get("/hello", |_| {
                Response::text(StatusCode::OK, "Hello world!")
            }))
            .register(post("/echo", |req| {
                let resp = Response::builder()
                    .version(req.version().clone())
                    .header("Content-Type", "application/octet-stream")
                    .stream();
                for chunk in req.body().chunks(4) {
                    let _ = resp.body().write(chunk);
                }
                resp.body().finish();
                resp
            }))
    }

    async fn exchange(request: &[u8]) -> Vec<u8> {
        let (mut client, mut server) = tokio::io::duplex(64 * 1024);
        let mut conn = HttpConnection::new(Arc::new(router()), &AllLimits::default());

        client.write_all(request).await.unwrap();
        client.shutdown().await.unwrap();

        let task = tokio::spawn(async move { conn.run(&mut server).await });

        let mut response = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut response))
            .await
            .unwrap()
            .unwrap();
        task.await.unwrap().unwrap();
        response
    }

    #[tokio::test]
    async fn responses() {
        #[rustfmt::skip]
        let cases: [(&[u8], &[u8]); 8] = [
            (
                b"GET /hello HTTP/1.1\r\nHost: x\r\n\r\n",
                b"HTTP/1.1 200\r\nContent-Type: text/plain\r\n\r\nHello world!",
            ),
            (
                b"POST /echo HTTP/1.0\r\nContent-Length: 10\r\n\r\n0123456789",
                b"HTTP/1.0 200\r\nContent-Type: application/octet-stream\r\n\r\n0123456789",
            ),
            (b"GET /missing HTTP/1.1\r\n\r\n",             b"HTTP/1.1 404\r\n\r\n"),
            (b"DELETE /hello HTTP/1.1\r\n\r\n",            b"HTTP/1.1 405\r\n\r\n"),
            (b"BREW /hello HTTP/1.1\r\n\r\n",              b"HTTP/1.1 400 Bad Request\r\n\r\n"),
            (b"GET /hello HTTP/1.1\r\nHost: x:y\r\n\r\n",  b"HTTP/1.1 400 Bad Request\r\n\r\n"),
            (b"GET /hello HTTP/1.1\r\nX-Fail: 1\r\n\r\n",  b"HTTP/1.1 500 Internal Server Error\r\n\r\n"),
            (b"",                                          b""),
        ];

        for (request, expected) in cases {
            let response = exchange(request).await;
            assert_eq!(
                String::from_utf8_lossy(&response),
                String::from_utf8_lossy(expected),
                "{:?}",
                String::from_utf8_lossy(request)
            );
        }
    }

    #[tokio::test]
    async fn size_limits() {
        let body = vec![b'x'; 2 * 1024 * 1024];
        let mut request = b"POST /echo HTTP/1.1\r\nContent-Length: 2097152\r\n\r\n".to_vec();
        request.extend_from_slice(&body[..16]);
        assert_eq!(exchange(&request).await, b"HTTP/1.1 413 Payload Too Large\r\n\r\n");

        let mut request = b"GET /hello HTTP/1.1\r\nX-Long: ".to_vec();
        request.extend_from_slice(&body[..16 * 1024]);
        assert_eq!(
            exchange(&request).await,
            b"HTTP/1.1 431 Request Header Fields Too Large\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn idle_peer_times_out() {
        let (_client, mut server) = tokio::io::duplex(1024);
        let limits = AllLimits {
            conn: ConnLimits {
                socket_read_timeout: Duration::from_millis(20),
                ..ConnLimits::default()
            },
            ..AllLimits::default()
        };
        let mut conn = HttpConnection::new(Arc::new(router()), &limits);

        let err = conn.run(&mut server).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
