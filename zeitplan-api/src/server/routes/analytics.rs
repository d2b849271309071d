use crate::server::{ServerError, ServerRouter, json::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use zeitplan_common::model::analytics::AnalyticsData;
use zeitplan_store::PostStore;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(get_analytics)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/analytics", rejection(ServerError))]
struct AnalyticsPath();

async fn get_analytics(
    AnalyticsPath(): AnalyticsPath,
    State(store): State<Arc<Mutex<PostStore>>>,
) -> Json<AnalyticsData> {
    Json(store.lock().await.analytics())
}
