use crate::server::{Result, ServerError, ServerRouter, json::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use time::Month;
use tokio::sync::Mutex;
use zeitplan_common::calendar::CalendarMonth;
use zeitplan_store::PostStore;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(get_calendar_month)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/calendar/{year}/{month}", rejection(ServerError))]
struct CalendarMonthPath {
    year: i32,
    month: u8,
}

async fn get_calendar_month(
    CalendarMonthPath { year, month }: CalendarMonthPath,
    State(store): State<Arc<Mutex<PostStore>>>,
) -> Result<Json<CalendarMonth>> {
    let month = Month::try_from(month).map_err(|_| ServerError::InvalidMonth(month))?;
    let store = store.lock().await;
    let calendar = store.calendar_month(year, month, store.today())?;

    Ok(Json(calendar))
}
