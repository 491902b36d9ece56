use askama::Template;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, OriginalUri, Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use validator::Validate;

use crate::cache;
use crate::db::models::{Comment, Group, Post, User};
use crate::db::posts::{NewPost, PostFilter};
use crate::db::{comments, follows, groups, posts, users};
use crate::error::{AppError, AppResult, OptionalRow};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{CommentForm, FormErrors, PostForm, INVALID_CHOICE};
use crate::media::{self, Upload};
use crate::pagination::{Page, PageQuery};
use crate::routes::{html_body, load_post_page, Html};
use crate::state::AppState;

// --- Templates ---

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub viewer: Option<String>,
    pub page: Page<Post>,
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupTemplate {
    pub viewer: Option<String>,
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub viewer: Option<String>,
    pub author_name: String,
    pub author: User,
    pub page: Page<Post>,
    pub following: bool,
    pub can_follow: bool,
    pub follower_count: i64,
    pub following_count: i64,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub viewer: Option<String>,
    pub post: Post,
    pub author_post_count: i64,
    pub comments: Vec<Comment>,
    pub is_author: bool,
}

pub struct GroupOption {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

/// Shared by create and edit; `is_edit` switches the copy.
#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormTemplate {
    pub viewer: Option<String>,
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub groups: Vec<GroupOption>,
    pub current_image: Option<String>,
    pub errors: FormErrors,
}

// --- Router ---

/// `upload_limit` caps the body of the create and edit forms.
pub fn router(upload_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route(
            "/create/",
            get(create_page)
                .post(create_post)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/posts/{post_id}/", get(post_detail))
        .route(
            "/posts/{post_id}/edit/",
            get(edit_page)
                .post(edit_post)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/posts/{post_id}/delete/", post(delete_post))
        .route("/posts/{post_id}/comment/", post(add_comment))
}

// --- Listings ---

async fn index(
    State(state): State<AppState>,
    user: MaybeUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let key = cache::viewer_key(&uri.to_string(), user.id());
    if let Some(body) = state.index_cache.lock().await.get(&key) {
        tracing::debug!("Serving cached index for {}", key);
        return Ok(html_body(body));
    }

    let page = {
        let conn = state.db.get()?;
        load_post_page(
            &conn,
            PostFilter::All,
            query.page.as_deref(),
            state.config.feed.page_size,
        )?
    };

    let body = IndexTemplate {
        viewer: user.username(),
        page,
    }
    .render()?;
    state.index_cache.lock().await.insert(key, body.clone());

    Ok(html_body(body))
}

async fn group_posts(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<GroupTemplate>> {
    let conn = state.db.get()?;
    let group = groups::find_by_slug(&conn, &slug).or_not_found()?;
    let page = load_post_page(
        &conn,
        PostFilter::Group(group.id),
        query.page.as_deref(),
        state.config.feed.page_size,
    )?;

    Ok(Html(GroupTemplate {
        viewer: user.username(),
        group,
        page,
    }))
}

async fn profile(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<ProfileTemplate>> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username).or_not_found()?;
    let page = load_post_page(
        &conn,
        PostFilter::Author(author.id),
        query.page.as_deref(),
        state.config.feed.page_size,
    )?;

    let following = match user.id() {
        Some(viewer_id) => follows::is_following(&conn, viewer_id, author.id)?,
        None => false,
    };
    let can_follow = user.id().is_some_and(|id| id != author.id);

    Ok(Html(ProfileTemplate {
        viewer: user.username(),
        author_name: author.display_name(),
        follower_count: follows::follower_count(&conn, author.id)?,
        following_count: follows::following_count(&conn, author.id)?,
        author,
        page,
        following,
        can_follow,
    }))
}

// --- Detail and comments ---

async fn post_detail(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(post_id): Path<i64>,
) -> AppResult<Html<PostDetailTemplate>> {
    let conn = state.db.get()?;
    let post = posts::find(&conn, post_id).or_not_found()?;
    let author_post_count = posts::count(&conn, PostFilter::Author(post.author_id))?;
    let comments = comments::list_for_post(&conn, post.id)?;
    let is_author = user.id() == Some(post.author_id);

    Ok(Html(PostDetailTemplate {
        viewer: user.username(),
        post,
        author_post_count,
        comments,
        is_author,
    }))
}

async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let post = posts::find(&conn, post_id).or_not_found()?;

    if form.validate().is_ok() {
        let comment_id = comments::create(&conn, post.id, user.id, form.text.trim())?;
        tracing::info!("{} commented on post {} ({})", user.username, post.id, comment_id);
    }

    Ok(Redirect::to(&detail_url(post.id)).into_response())
}

// --- Create / edit / delete ---

async fn create_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<PostFormTemplate>> {
    let conn = state.db.get()?;
    Ok(Html(PostFormTemplate {
        viewer: Some(user.username),
        is_edit: false,
        action: "/create/".to_string(),
        text: String::new(),
        groups: group_options(&groups::list_all(&conn)?, None),
        current_image: None,
        errors: FormErrors::default(),
    }))
}

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let (form, upload) = read_post_form(multipart).await?;

    let group_id = {
        let conn = state.db.get()?;
        match check_post_form(&conn, &form, upload.as_ref())? {
            Ok(group_id) => group_id,
            Err(errors) => {
                return Ok(Html(PostFormTemplate {
                    viewer: Some(user.username),
                    is_edit: false,
                    action: "/create/".to_string(),
                    groups: group_options(&groups::list_all(&conn)?, form.group_id().ok().flatten()),
                    text: form.text,
                    current_image: None,
                    errors,
                })
                .into_response());
            }
        }
    };

    let image = match upload {
        Some(ref upload) => Some(media::save_image(&state.config.uploads_path(), upload).await?),
        None => None,
    };

    let post_id = {
        let conn = state.db.get()?;
        posts::create(
            &conn,
            &NewPost {
                author_id: user.id,
                text: form.text.trim(),
                group_id,
                image: image.as_deref(),
            },
        )?
    };
    tracing::info!("{} published post {}", user.username, post_id);

    Ok(Redirect::to(&profile_url(&user.username)).into_response())
}

async fn edit_page(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(post_id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let post = posts::find(&conn, post_id).or_not_found()?;
    if user.id() != Some(post.author_id) {
        return Ok(Redirect::to(&detail_url(post.id)).into_response());
    }

    Ok(Html(PostFormTemplate {
        viewer: user.username(),
        is_edit: true,
        action: edit_url(post.id),
        groups: group_options(&groups::list_all(&conn)?, post.group_id()),
        current_image: post.image_url(),
        text: post.text,
        errors: FormErrors::default(),
    })
    .into_response())
}

async fn edit_post(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(post_id): Path<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    let post = {
        let conn = state.db.get()?;
        posts::find(&conn, post_id).or_not_found()?
    };
    if user.id() != Some(post.author_id) {
        return Ok(Redirect::to(&detail_url(post.id)).into_response());
    }

    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let (form, upload) = read_post_form(multipart).await?;

    let group_id = {
        let conn = state.db.get()?;
        match check_post_form(&conn, &form, upload.as_ref())? {
            Ok(group_id) => group_id,
            Err(errors) => {
                return Ok(Html(PostFormTemplate {
                    viewer: user.username(),
                    is_edit: true,
                    action: edit_url(post.id),
                    groups: group_options(&groups::list_all(&conn)?, form.group_id().ok().flatten()),
                    text: form.text,
                    current_image: post.image_url(),
                    errors,
                })
                .into_response());
            }
        }
    };

    let media_root = state.config.uploads_path();
    let image = match upload {
        Some(ref upload) => Some(media::save_image(&media_root, upload).await?),
        None => post.image.clone(),
    };

    {
        let conn = state.db.get()?;
        posts::update(&conn, post.id, form.text.trim(), group_id, image.as_deref())?;
    }

    if let Some(old) = post.image.as_deref() {
        if image.as_deref() != Some(old) {
            media::remove_image(&media_root, old).await?;
        }
    }
    tracing::info!("Post {} edited by its author", post.id);

    Ok(Redirect::to(&detail_url(post.id)).into_response())
}

async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<i64>,
) -> AppResult<Response> {
    let post = {
        let conn = state.db.get()?;
        let post = posts::find(&conn, post_id).or_not_found()?;
        if post.author_id != user.id {
            return Ok(Redirect::to(&detail_url(post.id)).into_response());
        }
        posts::delete(&conn, post.id)?;
        post
    };

    if let Some(image) = post.image.as_deref() {
        media::remove_image(&state.config.uploads_path(), image).await?;
    }
    tracing::info!("{} deleted post {}", user.username, post.id);

    Ok(Redirect::to(&profile_url(&user.username)).into_response())
}

// --- Helpers ---

pub fn detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

fn edit_url(post_id: i64) -> String {
    format!("/posts/{}/edit/", post_id)
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

fn group_options(all: &[Group], selected: Option<i64>) -> Vec<GroupOption> {
    all.iter()
        .map(|g| GroupOption {
            id: g.id,
            title: g.title.clone(),
            selected: Some(g.id) == selected,
        })
        .collect()
}

/// Validate the post form. The inner `Ok` carries the chosen group.
fn check_post_form(
    conn: &rusqlite::Connection,
    form: &PostForm,
    upload: Option<&Upload>,
) -> AppResult<Result<Option<i64>, FormErrors>> {
    let mut errors = match form.validate() {
        Ok(()) => FormErrors::default(),
        Err(e) => FormErrors::from(e),
    };

    let group_id = match form.group_id() {
        Ok(None) => None,
        Ok(Some(id)) if groups::exists(conn, id)? => Some(id),
        Ok(Some(_)) | Err(_) => {
            errors.add("group", INVALID_CHOICE);
            None
        }
    };

    if let Some(upload) = upload {
        if let Err(message) = upload.image_extension() {
            errors.add("image", message);
        }
    }

    Ok(errors.into_result().map(|()| group_id))
}

/// Pull the post form fields and the optional image out of a multipart body.
async fn read_post_form(mut multipart: Multipart) -> AppResult<(PostForm, Option<Upload>)> {
    let mut form = PostForm::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("text") => form.text = field.text().await?,
            Some("group") => form.group = field.text().await?,
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?.to_vec();
                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() || !bytes.is_empty() {
                    upload = Some(Upload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            }
            _ => {}
        }
    }

    Ok((form, upload))
}
