//! Route handlers for `/collections`.
//!
//! Every handler performs exactly one store call against the collection the
//! resolver bound onto the request, and maps the outcome onto a response:
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/` | [`index`] |
//! | GET | `/collections/{name}` | [`list`] |
//! | GET | `/collections/{name}/{max}/{sortField}/{direction}` | [`list_sorted`] |
//! | GET | `/collections/{name}/{id}` | [`get_one`] |
//! | POST | `/collections/{name}` | [`insert`] |
//! | POST | `/collections/orders` | [`insert_order`] |
//! | DELETE | `/collections/{name}/{id}` | [`delete_one`] |
//! | PUT | `/collections/{name}/{id}` | [`update`] |
//! | PUT | `/collections/orders/{id}` | [`update_order`] |
//!
//! The router ranks the static `orders` segment above `{name}`, so the
//! order-specific handlers always win for that collection.

use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::NotFoundPolicy;
use crate::connection::{Collection, Connection};
use crate::error::Error;
use crate::health;
use crate::middleware::CollectionResolver;
use crate::orders::{self, ORDERS};
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;
use crate::status::Status;
use crate::store::{Document, SortDirection, SortedQuery};

const HELP: &str = "Select a collection, e.g. /collections/lessons";

/// Builds the gateway's route table over `connection`.
pub fn routes(connection: Connection, policy: NotFoundPolicy) -> Router {
    let resolver = CollectionResolver::new(connection.clone(), policy);

    // matchit allows one parameter name per position in a tree, so the
    // sorted listing takes its limit from the `{id}` segment.
    Router::new()
        .get("/", index)
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness(connection))
        .get("/collections/{name}", resolver.from_param("name", list))
        .get("/collections/{name}/{id}", resolver.from_param("name", get_one))
        .get("/collections/{name}/{id}/{sortField}/{direction}", resolver.from_param("name", list_sorted))
        .post("/collections/{name}", resolver.from_param("name", insert))
        .post("/collections/orders", resolver.fixed(ORDERS, insert_order))
        .delete("/collections/{name}/{id}", resolver.from_param("name", delete_one))
        .put("/collections/{name}/{id}", resolver.from_param("name", update))
        .put("/collections/orders/{id}", resolver.fixed(ORDERS, update_order))
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Handler failures and the responses they turn into.
#[derive(Debug)]
pub enum ApiError {
    /// The route was registered without the resolver.
    Unbound,
    /// Malformed input; the message is shown to the client.
    BadRequest(String),
    /// A missing document reported as `404`.
    NotFound(Value),
    /// An error passed through from the store, message included.
    Propagated(Error),
    /// A failed store operation; the client sees only `message`.
    Store { message: &'static str },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unbound => Json(json!({ "error": "collection not resolved" }))
                .with_status(Status::InternalServerError),
            Self::BadRequest(msg) => Json(json!({ "error": msg })).with_status(Status::BadRequest),
            Self::NotFound(body) => Json(body).with_status(Status::NotFound),
            Self::Propagated(e) => Json(json!({ "error": e.to_string() }))
                .with_status(Status::InternalServerError),
            Self::Store { message } => Json(json!({ "error": message }))
                .with_status(Status::InternalServerError),
        }
    }
}

type ApiResult = Result<Response, ApiError>;

fn collection(req: &Request) -> Result<Collection, ApiError> {
    req.extension::<Collection>().cloned().ok_or(ApiError::Unbound)
}

fn policy(req: &Request) -> NotFoundPolicy {
    req.extension::<NotFoundPolicy>().copied().unwrap_or_default()
}

fn id_param(req: &Request) -> &str {
    req.param("id").unwrap_or_default()
}

/// Logs a failed store call and hides its detail from the client. Malformed
/// identifiers are the exception: those reach the client as-is.
fn store_failure<'a>(coll: &'a Collection, message: &'static str) -> impl FnOnce(Error) -> ApiError + 'a {
    move |e| match e {
        Error::InvalidId(_) => ApiError::Propagated(e),
        e => {
            error!(collection = %coll.name(), error = %e, "{message}");
            ApiError::Store { message }
        }
    }
}

/// The request body as a document. An empty body is an empty document;
/// anything but a JSON object is rejected.
fn body_document(req: &Request) -> Result<Document, ApiError> {
    if req.body().iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::new());
    }
    match req.json::<Value>() {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(ApiError::BadRequest("request body must be a JSON object".to_owned())),
        Err(e) => Err(ApiError::BadRequest(format!("invalid JSON body: {e}"))),
    }
}

/// `{"msg":"success"}` when exactly one document was affected; otherwise
/// the not-found body, as `200` or `404` depending on `policy`.
fn outcome(affected: u64, policy: NotFoundPolicy) -> ApiResult {
    if affected == 1 {
        return Ok(Json(json!({ "msg": "success" })).into_response());
    }
    let body = json!({ "msg": "not found" });
    match policy {
        NotFoundPolicy::Lenient => Ok(Json(body).into_response()),
        NotFoundPolicy::Strict => Err(ApiError::NotFound(body)),
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /`
pub async fn index(_req: Request) -> Response {
    Response::text(HELP)
}

/// `GET /collections/{name}`: every document, in store order.
pub async fn list(req: Request) -> ApiResult {
    let coll = collection(&req)?;
    let docs = coll.find_all().await
        .map_err(store_failure(&coll, "error retrieving documents"))?;
    Ok(Json(docs).into_response())
}

/// `GET /collections/{name}/{max}/{sortField}/{direction}`: at most `max`
/// documents ordered by `sortField`, descending only for `desc`.
pub async fn list_sorted(req: Request) -> ApiResult {
    let coll = collection(&req)?;
    let max = id_param(&req);
    let limit = match max.parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => return Err(ApiError::BadRequest(format!("`max` must be a positive integer, got `{max}`"))),
    };
    let query = SortedQuery {
        limit,
        field: req.param("sortField").unwrap_or_default().to_owned(),
        direction: SortDirection::from_token(req.param("direction").unwrap_or_default()),
    };

    let docs = coll.find_sorted(&query).await
        .map_err(store_failure(&coll, "error retrieving documents"))?;
    Ok(Json(docs).into_response())
}

/// `GET /collections/{name}/{id}`: the document, or `null` when missing.
pub async fn get_one(req: Request) -> ApiResult {
    let coll = collection(&req)?;
    let found = coll.find_by_id(id_param(&req)).await
        .map_err(store_failure(&coll, "error retrieving document"))?;

    match (found, policy(&req)) {
        (Some(doc), _) => Ok(Json(doc).into_response()),
        (None, NotFoundPolicy::Lenient) => Ok(Json(Value::Null).into_response()),
        (None, NotFoundPolicy::Strict) => Err(ApiError::NotFound(json!({ "error": "document not found" }))),
    }
}

/// `POST /collections/{name}`: stores the body as a new document.
pub async fn insert(req: Request) -> ApiResult {
    let coll = collection(&req)?;
    let doc = body_document(&req)?;
    insert_document(&coll, doc).await
}

/// `POST /collections/orders`: like [`insert`], after the order checks pass.
pub async fn insert_order(req: Request) -> ApiResult {
    let coll = collection(&req)?;
    let doc = body_document(&req)?;
    if let Err(e) = orders::validate_new(&doc) {
        debug!("order rejected: {e}");
        return Err(ApiError::BadRequest(e.to_string()));
    }
    insert_document(&coll, doc).await
}

async fn insert_document(coll: &Collection, doc: Document) -> ApiResult {
    let outcome = coll.insert_one(doc).await
        .map_err(store_failure(coll, "error inserting document"))?;
    Ok(Json(outcome).with_status(Status::Created))
}

/// `DELETE /collections/{name}/{id}`
pub async fn delete_one(req: Request) -> ApiResult {
    let coll = collection(&req)?;
    let result = coll.delete_by_id(id_param(&req)).await
        .map_err(store_failure(&coll, "error deleting document"))?;
    outcome(result.deleted, policy(&req))
}

/// `PUT /collections/{name}/{id}`: sets the body's fields on the document.
pub async fn update(req: Request) -> ApiResult {
    let coll = collection(&req)?;
    let fields = body_document(&req)?;
    let result = coll.update_by_id(id_param(&req), fields).await
        .map_err(store_failure(&coll, "error updating document"))?;
    outcome(result.matched, policy(&req))
}

/// `PUT /collections/orders/{id}`: like [`update`], but an empty body is a
/// `400` and a missing order is always a `404`.
pub async fn update_order(req: Request) -> ApiResult {
    let coll = collection(&req)?;
    let fields = body_document(&req)?;
    orders::validate_update(&fields).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let result = coll.update_by_id(id_param(&req), fields).await
        .map_err(store_failure(&coll, "error updating order"))?;
    if result.matched == 0 {
        return Err(ApiError::NotFound(json!({ "error": "order not found" })));
    }
    Ok(Json(json!({ "msg": "success" })).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    #[test]
    fn empty_and_blank_bodies_are_empty_documents() {
        for body in ["", "  \n"] {
            let req = Request::new(Method::Post, "/", body);
            assert!(body_document(&req).unwrap().is_empty());
        }
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        for body in ["[1,2]", "\"text\"", "{not json"] {
            let req = Request::new(Method::Post, "/", body);
            assert!(matches!(body_document(&req), Err(ApiError::BadRequest(_))), "{body}");
        }
    }

    #[test]
    fn outcome_respects_policy() {
        let res = outcome(0, NotFoundPolicy::Lenient).into_response();
        assert_eq!(res.status_code(), Status::Ok);
        assert_eq!(res.body(), br#"{"msg":"not found"}"#);

        let res = outcome(0, NotFoundPolicy::Strict).into_response();
        assert_eq!(res.status_code(), Status::NotFound);

        let res = outcome(1, NotFoundPolicy::Strict).into_response();
        assert_eq!(res.body(), br#"{"msg":"success"}"#);
    }

    #[test]
    fn store_errors_hide_detail_but_invalid_ids_pass_through() {
        let conn = Connection::connected(crate::store::InMemoryStore::new());
        let coll = conn.collection("products").unwrap();

        let err = store_failure(&coll, "error updating document")(Error::Store("boom".to_owned()));
        let res = err.into_response();
        assert_eq!(res.status_code(), Status::InternalServerError);
        assert_eq!(res.body(), br#"{"error":"error updating document"}"#);

        let err = store_failure(&coll, "error updating document")(Error::InvalidId("x".to_owned()));
        assert!(matches!(err, ApiError::Propagated(Error::InvalidId(_))));
    }

    #[tokio::test]
    async fn handlers_without_a_resolver_fail_closed() {
        let res = list(Request::new(Method::Get, "/collections/x", "")).await.into_response();
        assert_eq!(res.status_code(), Status::InternalServerError);
    }
}
