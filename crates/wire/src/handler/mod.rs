//! Request handlers for the server side.
//!
//! A handler turns one decoded [`Request`] into one [`Response`]. Plain async
//! functions become handlers through [`make_handler`].

use std::error::Error;
use std::future::Future;

use crate::protocol::{Request, Response};

/// Error a handler may fail with; the server answers it with a 500.
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// Produces the response to a request.
///
/// [`Handler`] is the `Send` variant required by the multi-threaded server;
/// `LocalHandler` is the same trait without that bound.
#[trait_variant::make(Handler: Send)]
pub trait LocalHandler {
    async fn call(&self, request: Request) -> Result<Response, HandlerError>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F, Fut, Err> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, Err>> + Send,
    Err: Into<HandlerError>,
{
    async fn call(&self, request: Request) -> Result<Response, HandlerError> {
        (self.f)(request).await.map_err(Into::into)
    }
}

pub fn make_handler<F, Fut, Err>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut,
    Fut: Future<Output = Result<Response, Err>>,
    Err: Into<HandlerError>,
{
    HandlerFn { f }
}
