use crate::server::{ServerError, ServerRouter, json::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use zeitplan_store::{PostStore, StoreSnapshot};

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_post(reset_store)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/store/reset", rejection(ServerError))]
struct ResetStorePath();

async fn reset_store(
    ResetStorePath(): ResetStorePath,
    State(store): State<Arc<Mutex<PostStore>>>,
) -> Json<StoreSnapshot> {
    let mut store = store.lock().await;
    store.reset();
    info!("Store reset to sample posts");

    Json(StoreSnapshot::clone(&store.snapshot()))
}
