//! Request logging middleware.
//!
//! Emits one structured event per request once the response head is ready.
//! Streaming bodies keep flowing after this point, so the duration covers
//! time to first byte rather than the full transfer.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

/// Request logger middleware service.
pub struct RequestLoggerMiddleware<S> {
    service: S,
}

/// Request fields captured before the request is handed on.
struct RequestLine {
    method: String,
    path: String,
    query: String,
    remote_addr: String,
}

impl RequestLine {
    fn capture(req: &ServiceRequest) -> Self {
        Self {
            method: req.method().to_string(),
            path: req.path().to_string(),
            query: req.query_string().to_string(),
            remote_addr: req
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_string(),
        }
    }
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let line = RequestLine::capture(&req);

        debug!(
            target: "api",
            method = %line.method,
            path = %line.path,
            query = %line.query,
            remote_addr = %line.remote_addr,
            "request received"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status();
            let duration_ms = start.elapsed().as_millis() as u64;

            if status.is_server_error() {
                error!(
                    target: "api",
                    method = %line.method,
                    path = %line.path,
                    query = %line.query,
                    remote_addr = %line.remote_addr,
                    status = status.as_u16(),
                    duration_ms,
                    "request failed"
                );
            } else if status.is_client_error() {
                warn!(
                    target: "api",
                    method = %line.method,
                    path = %line.path,
                    query = %line.query,
                    remote_addr = %line.remote_addr,
                    status = status.as_u16(),
                    duration_ms,
                    "request rejected"
                );
            } else {
                info!(
                    target: "api",
                    method = %line.method,
                    path = %line.path,
                    query = %line.query,
                    remote_addr = %line.remote_addr,
                    status = status.as_u16(),
                    duration_ms,
                    "request served"
                );
            }

            Ok(res)
        })
    }
}
