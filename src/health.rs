//! Liveness and readiness probes.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Is the document store connected and answering? |

use tracing::warn;

use crate::connection::Connection;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// `200 OK` with body `"ready"` once `connection` is established and the
/// store answers a ping; `503 Service Unavailable` otherwise.
pub fn readiness(connection: Connection) -> impl Handler {
    move |_req: Request| {
        let connection = connection.clone();
        async move {
            let Some(store) = connection.store() else {
                return Response::status(Status::ServiceUnavailable);
            };
            match store.ping().await {
                Ok(()) => Response::text("ready"),
                Err(e) => {
                    warn!("readiness ping failed: {e}");
                    Response::status(Status::ServiceUnavailable)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::router::Router;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn readiness_follows_the_connection() {
        let connection = Connection::absent();
        let router = Router::new()
            .get("/healthz", liveness)
            .get("/readyz", readiness(connection.clone()));

        let res = router.call(Request::new(Method::Get, "/healthz", "")).await;
        assert_eq!(res.body(), b"ok");

        let res = router.call(Request::new(Method::Get, "/readyz", "")).await;
        assert_eq!(res.status_code(), Status::ServiceUnavailable);

        connection.establish(InMemoryStore::new()).unwrap();
        let res = router.call(Request::new(Method::Get, "/readyz", "")).await;
        assert_eq!(res.status_code(), Status::Ok);
        assert_eq!(res.body(), b"ready");
    }
}
