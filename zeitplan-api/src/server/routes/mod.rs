use crate::server::ServerRouter;
use axum::Router;

mod analytics;
mod calendar;
mod posts;
mod store;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(posts::routes())
        .merge(calendar::routes())
        .merge(analytics::routes())
        .merge(store::routes())
}
