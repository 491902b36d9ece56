use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;

use crate::db::models::Post;
use crate::db::posts::PostFilter;
use crate::db::{follows, users};
use crate::error::{AppResult, OptionalRow};
use crate::extractors::CurrentUser;
use crate::pagination::{Page, PageQuery};
use crate::routes::posts::profile_url;
use crate::routes::{load_post_page, Html};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FollowTemplate {
    pub viewer: Option<String>,
    pub page: Page<Post>,
    pub no_follow: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route(
            "/profile/{username}/follow/",
            get(profile_follow).post(profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            get(profile_unfollow).post(profile_unfollow),
        )
}

/// Posts by every author the viewer follows.
async fn follow_index(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<FollowTemplate>> {
    let conn = state.db.get()?;
    let page = load_post_page(
        &conn,
        PostFilter::FollowedBy(user.id),
        query.page.as_deref(),
        state.config.feed.page_size,
    )?;

    Ok(Html(FollowTemplate {
        viewer: Some(user.username),
        no_follow: page.total == 0,
        page,
    }))
}

async fn profile_follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username).or_not_found()?;

    // Following yourself is silently ignored.
    if author.id != user.id && follows::follow(&conn, user.id, author.id)? {
        tracing::info!("{} now follows {}", user.username, author.username);
    }

    Ok(Redirect::to(&profile_url(&author.username)))
}

async fn profile_unfollow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username).or_not_found()?;

    if follows::unfollow(&conn, user.id, author.id)? {
        tracing::info!("{} unfollowed {}", user.username, author.username);
    }

    Ok(Redirect::to("/"))
}
