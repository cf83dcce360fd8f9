use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{self, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use parking_lot::Mutex;
use snoo_client::api::{self, FullId, Listing, Thing};

use crate::{MockServer, PageQuery, RecordedRequest};

pub type SharedMock = Arc<Mutex<MockServer>>;

#[derive(Debug)]
pub struct Error(api::Error);

impl From<api::Error> for Error {
    fn from(e: api::Error) -> Error {
        Error(e)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.0.status_code().unwrap_or(400);
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
        let message = match self.0 {
            api::Error::Api { message, .. } => message,
            e => e.to_string(),
        };
        tracing::info!(%status, %message, "returning error to client");
        let body = serde_json::json!({
            "message": message,
            "error": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

fn header(req: &Request<impl Sized>, name: http::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Records the request, then rejects it if a failure was injected or if the
/// token is wrong
async fn gate<B>(
    State(mock): State<SharedMock>,
    req: Request<B>,
    next: Next<B>,
) -> Result<Response, Error> {
    let authorization = header(&req, http::header::AUTHORIZATION);
    {
        let mut mock = mock.lock();
        mock.record(RecordedRequest {
            path: req.uri().path().to_string(),
            query: req.uri().query().map(|q| q.to_string()),
            user_agent: header(&req, http::header::USER_AGENT),
            authorization: authorization.clone(),
        });
        if let Some(err) = mock.take_failure() {
            return Err(Error(err));
        }
        if let Some(token) = mock.token() {
            let given = authorization.as_deref().and_then(|a| {
                a.strip_prefix("Bearer ")
                    .or_else(|| a.strip_prefix("bearer "))
            });
            if given != Some(token) {
                return Err(Error(api::Error::Api {
                    status: 401,
                    message: String::from("Unauthorized"),
                }));
            }
        }
    }
    Ok(next.run(req).await)
}

async fn new_posts(
    State(mock): State<SharedMock>,
    Path(sub): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Listing>, Error> {
    Ok(Json(mock.lock().new_posts(&sub, &q)?))
}

async fn subreddit_comments(
    State(mock): State<SharedMock>,
    Path(sub): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Listing>, Error> {
    Ok(Json(mock.lock().subreddit_comments(&sub, &q)?))
}

async fn subreddit_about(
    State(mock): State<SharedMock>,
    Path(sub): Path<String>,
) -> Result<Json<Thing>, Error> {
    Ok(Json(Thing::Subreddit(mock.lock().subreddit(&sub)?)))
}

async fn user_about(
    State(mock): State<SharedMock>,
    Path(name): Path<String>,
) -> Result<Json<Thing>, Error> {
    Ok(Json(Thing::User(mock.lock().user(&name)?)))
}

async fn trophies(
    State(mock): State<SharedMock>,
    Path(name): Path<String>,
) -> Result<Json<Thing>, Error> {
    Ok(Json(Thing::TrophyList(mock.lock().trophies(&name)?)))
}

async fn post_and_comments(
    State(mock): State<SharedMock>,
    Path(id): Path<String>,
) -> Result<Json<(Listing, Listing)>, Error> {
    Ok(Json(mock.lock().post_and_comments(&id)?))
}

#[derive(serde::Deserialize)]
struct MoreQuery {
    link_id: String,
    children: String,
}

async fn more_children(
    State(mock): State<SharedMock>,
    Query(q): Query<MoreQuery>,
) -> Result<Json<serde_json::Value>, Error> {
    let children = q.children.split(',').filter(|c| !c.is_empty()).collect::<Vec<_>>();
    let things = mock
        .lock()
        .more_children(&FullId(q.link_id), &children)?;
    Ok(Json(serde_json::json!({
        "json": {
            "errors": [],
            "data": { "things": things },
        },
    })))
}

/// The endpoints the client consumes, served out of `mock`
pub fn router(mock: SharedMock) -> Router {
    Router::new()
        .route("/r/:sub/new", get(new_posts))
        .route("/r/:sub/comments", get(subreddit_comments))
        .route("/r/:sub/about", get(subreddit_about))
        .route("/user/:name/about", get(user_about))
        .route("/api/v1/user/:name/trophies", get(trophies))
        .route("/comments/:id", get(post_and_comments))
        .route("/api/morechildren", get(more_children))
        .route_layer(axum::middleware::from_fn_with_state(mock.clone(), gate))
        .with_state(mock)
}

/// Serves `mock` on an ephemeral local port, until the runtime shuts down
pub async fn serve(mock: MockServer) -> Result<(SocketAddr, SharedMock), hyper::Error> {
    let mock = Arc::new(Mutex::new(mock));
    let server = axum::Server::try_bind(&SocketAddr::from(([127, 0, 0, 1], 0)))?
        .serve(router(mock.clone()).into_make_service());
    let addr = server.local_addr();
    tracing::info!("mock server listening on {}", addr);
    tokio::spawn(async move {
        if let Err(err) = server.await {
            tracing::error!(?err, "mock server failed");
        }
    });
    Ok((addr, mock))
}
