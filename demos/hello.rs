//! Greeting server.
//!
//! ```text
//! cargo run --example hello -- 127.0.0.1:8080
//! curl localhost:8080/hello/
//! curl localhost:8080/hello.json
//! curl -d 'hello=you' localhost:8080/
//! ```

use rawhttp::{
    router::{get, post, TrimTrailingSlash},
    Response, Router, Server, StatusCode,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct Greeting<'a> {
    hello: &'a str,
}

fn router() -> Router {
    Router::new()
        .layer(TrimTrailingSlash)
        .use_middleware(|req, next| {
            req.query_mut().set("hello", ["middleware"]);
            next.run(req)
        })
        .register(post("/", |req| {
            if let Err(err) = req.parse_form() {
                return Response::text(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
            }

            let greet = req
                .params()
                .and_then(|form| form.first("hello"))
                .unwrap_or("world");
            Response::text(StatusCode::OK, format!("Hello {greet}!"))
        }))
        .register(get("/hello", |req| {
            let greet = req.query().first("hello").unwrap_or("world");
            Response::text(StatusCode::OK, format!("Hello {greet}!"))
        }))
        .register(get("/hello.json", |req| {
            let hello = req.query().first("hello").unwrap_or("world");
            Response::json(&Greeting { hello })
        }))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let address = std::env::args().nth(1).unwrap_or_else(|| ":8080".to_owned());

    let server = match Server::bind(&address, router()).await {
        Ok(server) => server,
        Err(err) => {
            tracing::error!(%err, "startup failed");
            std::process::exit(1);
        }
    };

    if let Err(err) = server.launch().await {
        tracing::error!(%err, "server stopped");
        std::process::exit(1);
    }
}
