use rawhttp::{
    limits::ReqLimits,
    router::{get, post, TrimTrailingSlash},
    Response, Router, Server, StatusCode,
};
use std::{net::SocketAddr, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};

fn router() -> Router {
    Router::new()
        .layer(TrimTrailingSlash)
        .use_middleware(|req, next| match req.header("X-Fail") {
            Some(_) => Err("refused".into()),
            None => next.run(req),
        })
        .register(get("/hello", |_| Response::text(StatusCode::OK, "Hello world!")))
        .register(get("/greet", |req| {
            let name = req.query().first("name").unwrap_or("world");
            Response::text(StatusCode::OK, format!("Hello {name}!"))
        }))
        .register(post("/", |req| match req.parse_form() {
            Ok(form) => {
                let name = form.first("hello").unwrap_or("world");
                Response::text(StatusCode::OK, format!("Hello {name}!"))
            }
            Err(err) => Response::text(StatusCode::BAD_REQUEST, err.to_string()),
        }))
        .register(get("/stream", |_| {
            let resp = Response::builder().stream();
            let sender = resp.body().sender();
            tokio::spawn(async move {
                for part in ["one ", "two ", "three"] {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    let _ = sender.write(part);
                }
                sender.finish();
            });
            resp
        }))
}

async fn start() -> SocketAddr {
    let server = Server::builder()
        .address("127.0.0.1:0")
        .router(router())
        .request_limits(ReqLimits {
            body_size: 1024,
            ..ReqLimits::default()
        })
        .build()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.launch());
    addr
}

async fn send(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    String::from_utf8(response).unwrap()
}

#[tokio::test]
async fn loopback_requests() {
    let addr = start().await;

    #[rustfmt::skip]
    let cases: [(&[u8], &str); 10] = [
        (b"GET /hello HTTP/1.1\r\nHost: x\r\n\r\n",         "HTTP/1.1 200\r\nContent-Type: text/plain\r\n\r\nHello world!"),
        (b"GET /hello/ HTTP/1.1\r\n\r\n",                   "HTTP/1.1 200\r\nContent-Type: text/plain\r\n\r\nHello world!"),
        (b"GET /greet?name=rust HTTP/1.0\r\n\r\n",          "HTTP/1.1 200\r\nContent-Type: text/plain\r\n\r\nHello rust!"),
        (b"GET /missing HTTP/1.1\r\n\r\n",                  "HTTP/1.1 404\r\n\r\n"),
        (b"PUT /hello HTTP/1.1\r\n\r\n",                    "HTTP/1.1 405\r\n\r\n"),
        (b"FETCH /hello HTTP/1.1\r\n\r\n",                  "HTTP/1.1 400 Bad Request\r\n\r\n"),
        (b"GET /hello HTTP/1.1\r\nX-Fail: 1\r\n\r\n",       "HTTP/1.1 500 Internal Server Error\r\n\r\n"),
        (
            b"POST / HTTP/1.1\r\nContent-Length: 9\r\n\r\nhello=you",
            "HTTP/1.1 200\r\nContent-Type: text/plain\r\n\r\nHello you!",
        ),
        (
            b"POST / HTTP/1.1\r\nContent-Length: 4096\r\n\r\n",
            "HTTP/1.1 413 Payload Too Large\r\n\r\n",
        ),
        (
            b"GET /stream HTTP/1.1\r\n\r\n",
            "HTTP/1.1 200\r\n\r\none two three",
        ),
    ];

    for (request, expected) in cases {
        let response = send(addr, request).await;
        assert_eq!(response, expected, "{:?}", String::from_utf8_lossy(request));
    }
}

#[tokio::test]
async fn silent_client_gets_no_response() {
    let addr = start().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut response = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    assert!(response.is_empty());
}

#[tokio::test]
async fn concurrent_connections() {
    let addr = start().await;

    let clients: Vec<_> = (0..16)
        .map(|i| {
            tokio::spawn(async move {
                let request = format!("GET /greet?name=c{i} HTTP/1.1\r\n\r\n");
                send(addr, request.as_bytes()).await
            })
        })
        .collect();

    for (i, client) in clients.into_iter().enumerate() {
        let response = client.await.unwrap();
        assert!(response.ends_with(&format!("Hello c{i}!")), "{response}");
    }
}
