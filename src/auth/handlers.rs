use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use validator::Validate;

use crate::auth::cookies::{clear_session_cookie, get_cookie_value, session_cookie};
use crate::auth::{password, session};
use crate::db::users::{self, NewUser};
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::forms::{safe_next, FormErrors, LoginForm, SignupForm, NON_FIELD};
use crate::routes::Html;
use crate::state::AppState;

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

// -- Templates --

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub viewer: Option<String>,
    pub form: SignupForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub viewer: Option<String>,
    pub username: String,
    pub next: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/logged_out.html")]
pub struct LoggedOutTemplate {
    pub viewer: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

// -- Signup --

pub async fn signup_page(user: MaybeUser) -> Html<SignupTemplate> {
    Html(SignupTemplate {
        viewer: user.username(),
        form: SignupForm::default(),
        errors: FormErrors::default(),
    })
}

pub async fn signup(
    State(state): State<AppState>,
    user: MaybeUser,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let form = form.normalized();

    let mut errors = match form.validate() {
        Ok(()) => FormErrors::default(),
        Err(e) => FormErrors::from(e),
    };
    {
        let conn = state.db.get()?;
        if !errors.has("username") && users::username_taken(&conn, &form.username)? {
            errors.add("username", USERNAME_TAKEN);
        }
    }

    if let Err(errors) = errors.into_result() {
        return Ok(signup_form_page(user, form, errors));
    }

    let cost = state.config.auth.bcrypt_cost;
    let plain = form.password1.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&plain, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let created = {
        let conn = state.db.get()?;
        users::create(
            &conn,
            &NewUser {
                username: &form.username,
                email: &form.email,
                first_name: &form.first_name,
                last_name: &form.last_name,
                password_hash: &password_hash,
            },
        )
    };

    match created {
        Ok(user_id) => {
            tracing::info!("Registered user {} ({})", form.username, user_id);
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if users::is_duplicate_username(&e) => {
            let mut errors = FormErrors::default();
            errors.add("username", USERNAME_TAKEN);
            Ok(signup_form_page(user, form, errors))
        }
        Err(e) => Err(e.into()),
    }
}

/// Re-render signup with errors. Passwords are never echoed back.
fn signup_form_page(user: MaybeUser, form: SignupForm, errors: FormErrors) -> Response {
    Html(SignupTemplate {
        viewer: user.username(),
        form: SignupForm {
            password1: String::new(),
            password2: String::new(),
            ..form
        },
        errors,
    })
    .into_response()
}

// -- Login --

pub async fn login_page(user: MaybeUser, Query(query): Query<LoginQuery>) -> Html<LoginTemplate> {
    Html(LoginTemplate {
        viewer: user.username(),
        username: String::new(),
        next: query.next.unwrap_or_default(),
        errors: FormErrors::default(),
    })
}

pub async fn login(
    State(state): State<AppState>,
    user: MaybeUser,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let user_id = match check_credentials(&state, &form).await? {
        Some(id) => id,
        None => {
            let mut errors = FormErrors::default();
            errors.add(NON_FIELD, BAD_CREDENTIALS);
            return Ok(Html(LoginTemplate {
                viewer: user.username(),
                username: form.username,
                next: form.next,
                errors,
            })
            .into_response());
        }
    };

    let auth = &state.config.auth;
    let conn = state.db.get()?;
    let purged = session::purge_expired(&conn)?;
    if purged > 0 {
        tracing::debug!("Purged {} expired sessions", purged);
    }
    let token = session::create_session(&conn, user_id, auth.session_hours)?;

    tracing::info!("User {} logged in", form.username);

    let target = safe_next(&form.next).unwrap_or("/");
    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            session_cookie(&auth.cookie_name, &token, auth.session_hours),
        )]),
        Redirect::to(target),
    )
        .into_response())
}

/// Returns the user id when the username exists and the password matches.
async fn check_credentials(state: &AppState, form: &LoginForm) -> AppResult<Option<i64>> {
    let found = {
        let conn = state.db.get()?;
        users::credentials(&conn, form.username.trim())?
    };
    let Some((user_id, hash)) = found else {
        return Ok(None);
    };

    let plain = form.password.clone();
    let matches = tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(matches.then_some(user_id))
}

// -- Logout --

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(token) = get_cookie_value(&headers, cookie_name) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
        tracing::info!("Session ended");
    }

    Ok((
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie(cookie_name))]),
        Html(LoggedOutTemplate { viewer: None }),
    )
        .into_response())
}
