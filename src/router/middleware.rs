use super::core::{BoxError, Next};
use crate::{Request, Response};

/// Request wrapper in the router's chain.
///
/// A middleware may inspect or rewrite the request, then either continue
/// with `next.run(request)`, answer on its own, or fail. Returning `Err`
/// stops the chain and the client receives `500 Internal Server Error`.
///
/// Implemented for every `Fn(&mut Request, Next<'_>) -> Result<Response, BoxError>`,
/// register closures with [`Router::use_middleware`](super::Router::use_middleware)
/// and types with [`Router::layer`](super::Router::layer).
///
/// ```
/// use rawhttp::{router::{BoxError, Middleware, Next, Router}, Request, Response, StatusCode};
///
/// struct RequireToken(&'static str);
///
/// impl Middleware for RequireToken {
///     fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response, BoxError> {
///         match req.header("Authorization") {
///             Some(token) if token == self.0 => next.run(req),
///             _ => Ok(Response::empty(StatusCode::UNAUTHORIZED)),
///         }
///     }
/// }
///
/// let router = Router::new().layer(RequireToken("secret"));
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, request: &mut Request, next: Next<'_>) -> Result<Response, BoxError>;
}

impl<F> Middleware for F
where
    F: Fn(&mut Request, Next<'_>) -> Result<Response, BoxError> + Send + Sync + 'static,
{
    #[inline]
    fn handle(&self, request: &mut Request, next: Next<'_>) -> Result<Response, BoxError> {
        self(request, next)
    }
}

/// Strips one trailing `/` from every path except `/` itself, so `/hello/`
/// is routed like `/hello`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimTrailingSlash;

impl Middleware for TrimTrailingSlash {
    fn handle(&self, request: &mut Request, next: Next<'_>) -> Result<Response, BoxError> {
        let path = request.path();
        if path.len() > 1 {
            if let Some(trimmed) = path.strip_suffix('/') {
                let trimmed = trimmed.to_owned();
                request.uri_mut().set_path(trimmed);
            }
        }
        next.run(request)
    }
}
