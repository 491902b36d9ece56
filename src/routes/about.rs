use askama::Template;
use axum::routing::get;
use axum::Router;

use crate::extractors::MaybeUser;
use crate::routes::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "about/author.html")]
pub struct AuthorTemplate {
    pub viewer: Option<String>,
}

#[derive(Template)]
#[template(path = "about/tech.html")]
pub struct TechTemplate {
    pub viewer: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about/author/", get(author))
        .route("/about/tech/", get(tech))
}

async fn author(user: MaybeUser) -> Html<AuthorTemplate> {
    Html(AuthorTemplate {
        viewer: user.username(),
    })
}

async fn tech(user: MaybeUser) -> Html<TechTemplate> {
    Html(TechTemplate {
        viewer: user.username(),
    })
}
