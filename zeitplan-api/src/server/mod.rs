use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use json::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::error;
use zeitplan_common::{
    calendar::CalendarError,
    compose::ComposeError,
    model::{Id, post::PostMarker},
};
use zeitplan_store::PostStore;

mod json;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub store: Arc<Mutex<PostStore>>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("Invalid date, expected YYYY-MM-DD: {0}")]
    InvalidDate(String),
    #[error("Invalid month: {0}")]
    InvalidMonth(u8),
    #[error("Calendar could not be built: {0}")]
    Calendar(#[from] CalendarError),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostByIdNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::JsonRejection(_)
            | ServerError::Compose(_)
            | ServerError::InvalidDate(_)
            | ServerError::InvalidMonth(_)
            | ServerError::Calendar(_) => StatusCode::BAD_REQUEST,
            ServerError::JsonResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::server::{ServerState, routes};
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use time::macros::{offset, utc_datetime};
    use tokio::sync::Mutex;
    use tower::ServiceExt;
    use zeitplan_store::{MemoryStorage, PostStore, StoreConfig, store::FixedClock};

    fn app() -> (Router, Arc<Mutex<PostStore>>) {
        app_with(StoreConfig::default())
    }

    fn app_with(config: StoreConfig) -> (Router, Arc<Mutex<PostStore>>) {
        let store = PostStore::open_with_clock(
            MemoryStorage::new(),
            config,
            FixedClock(utc_datetime!(2026-10-16 10:00)),
        );
        let store = Arc::new(Mutex::new(store));
        let state = ServerState {
            store: Arc::clone(&store),
        };

        (routes().with_state(state), store)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    #[tokio::test]
    async fn lists_seeded_posts() {
        let (app, _) = app();

        let (status, posts) = send(&app, Method::GET, "/posts", None).await;

        assert_eq!(status, StatusCode::OK);
        let posts = posts.as_array().unwrap();
        assert_eq!(posts.len(), 10);
        assert_eq!(posts[0]["status"], "published");
        assert_eq!(posts[0]["scheduled_date"], "2026-10-16T10:00:00Z");
    }

    #[tokio::test]
    async fn create_validates_form() {
        let (app, store) = app();

        let (status, error) = send(
            &app,
            Method::POST,
            "/posts/create",
            Some(json!({
                "image": "https://example.com/a.jpg",
                "caption": "",
                "date": "2026-10-20",
                "time": "18:30",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["status"], 400);
        assert_eq!(error["message"], "Please add a caption");
        assert_eq!(store.lock().await.get_all_posts().len(), 10);
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let (app, store) = app();

        let (status, created) = send(
            &app,
            Method::POST,
            "/posts/create",
            Some(json!({
                "image": "https://example.com/a.jpg",
                "caption": "Launch day",
                "date": "2026-10-20",
                "time": "18:30",
                "status": "draft",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["status"], "draft");
        assert_eq!(created["scheduled_date"], "2026-10-20T18:30:00Z");
        assert_eq!(created["created_at"], "2026-10-16T10:00:00Z");

        let uri = format!("/posts/{}", created["id"]);
        let (status, fetched) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (_, analytics) = send(&app, Method::GET, "/analytics", None).await;
        assert_eq!(analytics["scheduled"], 15);
        assert_eq!(store.lock().await.get_all_posts().len(), 11);
    }

    #[tokio::test]
    async fn form_prefills_existing_post() {
        let (app, store) = app();
        let id = store.lock().await.get_all_posts()[1].id;

        let (status, form) = send(&app, Method::GET, &format!("/posts/{id}/form"), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(form["date"], "2026-10-17");
        assert_eq!(form["time"], "10:00");
        assert_eq!(form["status"], "scheduled");
    }

    #[tokio::test]
    async fn patch_updates_caption() {
        let (app, store) = app();
        let id = store.lock().await.get_all_posts()[2].id;

        let (status, updated) = send(
            &app,
            Method::PATCH,
            &format!("/posts/{id}"),
            Some(json!({ "caption": "x" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["caption"], "x");
        assert_eq!(store.lock().await.find_post(id).unwrap().caption, "x");
    }

    #[tokio::test]
    async fn patch_past_year_9999_is_rejected() {
        let (app, store) = app();
        let id = store.lock().await.get_all_posts()[2].id;
        let before = store.lock().await.find_post(id).cloned();

        let (status, error) = send(
            &app,
            Method::PATCH,
            &format!("/posts/{id}"),
            Some(json!({ "scheduled_date": "9999-12-31T23:30:00-02:00" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["status"], 400);
        assert_eq!(store.lock().await.find_post(id).cloned(), before);
    }

    #[tokio::test]
    async fn create_past_year_9999_is_rejected() {
        let (app, store) = app_with(StoreConfig {
            zone: offset!(-2),
            ..StoreConfig::default()
        });

        let (status, error) = send(
            &app,
            Method::POST,
            "/posts/create",
            Some(json!({
                "image": "https://example.com/a.jpg",
                "caption": "Far future",
                "date": "9999-12-31",
                "time": "23:30",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            error["message"],
            "Invalid date, expected YYYY-MM-DD: 9999-12-31"
        );
        assert_eq!(store.lock().await.get_all_posts().len(), 10);
    }

    #[tokio::test]
    async fn patch_unknown_post_is_not_found() {
        let (app, _) = app();

        let (status, error) = send(
            &app,
            Method::PATCH,
            "/posts/1",
            Some(json!({ "caption": "x" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["message"], "Post with id 1 was not found.");
    }

    #[tokio::test]
    async fn delete_then_delete_again() {
        let (app, store) = app();
        let id = store.lock().await.get_all_posts()[5].id;
        let uri = format!("/posts/{id}");

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let store = store.lock().await;
        assert_eq!(store.get_all_posts().len(), 9);
        assert_eq!(store.analytics().scheduled, 12);
    }

    #[tokio::test]
    async fn posts_on_day() {
        let (app, _) = app();

        let (status, posts) = send(&app, Method::GET, "/posts/on/2026-10-18", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(posts.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::GET, "/posts/on/18.10.2026", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn board_and_recent() {
        let (app, _) = app();

        let (_, board) = send(&app, Method::GET, "/posts/board", None).await;
        assert_eq!(board["scheduled"].as_array().unwrap().len(), 6);
        assert_eq!(board["published"].as_array().unwrap().len(), 4);
        assert!(board["drafts"].as_array().unwrap().is_empty());
        assert_eq!(board["published"][0]["scheduled_date"], "2026-10-25T10:00:00Z");

        let (_, recent) = send(&app, Method::GET, "/posts/recent", None).await;
        let recent = recent.as_array().unwrap();
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0]["scheduled_date"], "2026-10-25T10:00:00Z");
    }

    #[tokio::test]
    async fn calendar_month() {
        let (app, _) = app();

        let (status, month) = send(&app, Method::GET, "/calendar/2026/10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(month["month"], 10);
        let days: Vec<&Value> = month["weeks"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|week| week.as_array().unwrap())
            .collect();
        assert_eq!(days.len() % 7, 0);
        let today = days.iter().find(|day| day["is_today"] == true).unwrap();
        assert_eq!(today["date"], "2026-10-16");
        assert_eq!(today["posts"].as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::GET, "/calendar/2026/13", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_restores_samples() {
        let (app, store) = app();
        let id = store.lock().await.get_all_posts()[0].id;
        send(&app, Method::DELETE, &format!("/posts/{id}"), None).await;

        let (status, snapshot) = send(&app, Method::POST, "/store/reset", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["posts"].as_array().unwrap().len(), 10);
        assert_eq!(snapshot["analytics"]["scheduled"], 14);
    }

    #[tokio::test]
    async fn unknown_route() {
        let (app, _) = app();

        let (status, error) = send(&app, Method::GET, "/nope", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["status"], 404);
    }
}
