use crate::server::{Result, ServerError, ServerRouter, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use time::{Date, macros::format_description};
use tokio::sync::Mutex;
use zeitplan_common::{
    compose::PostForm,
    model::{
        Id,
        post::{Post, PostMarker, PostPatch},
    },
    views::{PostBoard, RECENT_POSTS, recent_posts},
};
use zeitplan_store::PostStore;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_posts)
        .typed_get(get_post)
        .typed_patch(update_post)
        .typed_delete(delete_post)
        .typed_get(get_post_form)
        .typed_get(get_board)
        .typed_get(get_recent)
        .typed_get(get_posts_on)
        .typed_post(create_post)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct PostsPath();

async fn get_posts(
    PostsPath(): PostsPath,
    State(store): State<Arc<Mutex<PostStore>>>,
) -> Json<Vec<Post>> {
    Json(store.lock().await.get_all_posts().to_vec())
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

async fn get_post(
    PostPath { id }: PostPath,
    State(store): State<Arc<Mutex<PostStore>>>,
) -> Result<Json<Post>> {
    let store = store.lock().await;
    let post = store.find_post(id).ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post.clone()))
}

async fn update_post(
    PostPath { id }: PostPath,
    State(store): State<Arc<Mutex<PostStore>>>,
    Json(patch): Json<PostPatch>,
) -> Result<Json<Post>> {
    let post = store
        .lock()
        .await
        .update_post(id, patch)
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(store): State<Arc<Mutex<PostStore>>>,
) -> Result<StatusCode> {
    store
        .lock()
        .await
        .delete_post(id)
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/form", rejection(ServerError))]
struct PostFormPath {
    id: Id<PostMarker>,
}

async fn get_post_form(
    PostFormPath { id }: PostFormPath,
    State(store): State<Arc<Mutex<PostStore>>>,
) -> Result<Json<PostForm>> {
    let store = store.lock().await;
    let post = store.find_post(id).ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(PostForm::from_post(post, store.config().zone)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/board", rejection(ServerError))]
struct BoardPath();

async fn get_board(
    BoardPath(): BoardPath,
    State(store): State<Arc<Mutex<PostStore>>>,
) -> Json<PostBoard> {
    Json(PostBoard::from_posts(store.lock().await.get_all_posts()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/recent", rejection(ServerError))]
struct RecentPath();

async fn get_recent(
    RecentPath(): RecentPath,
    State(store): State<Arc<Mutex<PostStore>>>,
) -> Json<Vec<Post>> {
    Json(recent_posts(store.lock().await.get_all_posts(), RECENT_POSTS))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/on/{date}", rejection(ServerError))]
struct PostsOnPath {
    date: String,
}

async fn get_posts_on(
    PostsOnPath { date }: PostsOnPath,
    State(store): State<Arc<Mutex<PostStore>>>,
) -> Result<Json<Vec<Post>>> {
    let day = Date::parse(&date, format_description!("[year]-[month]-[day]"))
        .map_err(|_| ServerError::InvalidDate(date.clone()))?;

    Ok(Json(store.lock().await.posts_on(day)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/create", rejection(ServerError))]
struct CreatePostPath();

async fn create_post(
    CreatePostPath(): CreatePostPath,
    State(store): State<Arc<Mutex<PostStore>>>,
    Json(form): Json<PostForm>,
) -> Result<Json<Post>> {
    let mut store = store.lock().await;
    let post = form.validate(store.config().zone)?;

    Ok(Json(store.add_post(post)))
}
