//! Per-request completion logging.

use std::time::Instant;

use tracing::{debug, warn};

use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::Response;

/// Runs `handler` and logs the outcome. Server errors log at `warn`.
pub(crate) async fn traced(handler: BoxedHandler, req: Request) -> Response {
    let method = req.method();
    let path = req.path().to_owned();
    let started = Instant::now();

    let response = handler.call(req).await;

    let status = response.status_code().code();
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    if status >= 500 {
        warn!(%method, %path, status, elapsed_ms, "request failed");
    } else {
        debug!(%method, %path, status, elapsed_ms, "request completed");
    }
    response
}
