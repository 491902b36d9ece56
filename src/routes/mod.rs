pub mod about;
pub mod assets;
pub mod auth;
pub mod follow;
pub mod posts;

use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;

use crate::db::models::Post;
use crate::db::posts::{self as post_queries, PostFilter};
use crate::error::{self, AppResult};
use crate::pagination::{Page, PageRequest};
use crate::state::AppState;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => html_body(body),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// A 200 response around an already rendered page.
pub fn html_body(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}

/// Count and load one page of a post listing.
pub fn load_post_page(
    conn: &rusqlite::Connection,
    filter: PostFilter,
    raw_page: Option<&str>,
    per_page: usize,
) -> AppResult<Page<Post>> {
    let total = post_queries::count(conn, filter)? as usize;
    let request = PageRequest::resolve(raw_page, total, per_page);
    let items = post_queries::list(conn, filter, request.limit(), request.offset())?;
    Ok(Page::new(items, request, total))
}

async fn not_found() -> Response {
    error::not_found_page()
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/assets/{*path}", get(assets::serve))
        .nest_service("/media", ServeDir::new(state.config.uploads_path()))
        .merge(posts::router(state.config.storage.upload_limit_bytes()))
        .merge(follow::router())
        .merge(auth::router())
        .merge(about::router())
        .fallback(not_found)
}
