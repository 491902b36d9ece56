use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    /// The route needs a logged-in user; `next` is where to return after login.
    #[error("Login required")]
    LoginRequired { next: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Template)]
#[template(path = "core/404.html")]
pub struct NotFoundTemplate {
    pub viewer: Option<String>,
}

/// Build the login URL that sends the user back to `next` afterwards.
pub fn login_url(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/auth/login/?next={}", encoded)
}

pub fn not_found_page() -> Response {
    match (NotFoundTemplate { viewer: None }).render() {
        Ok(body) => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match self {
            AppError::NotFound => return not_found_page(),
            AppError::LoginRequired { next } => {
                return Redirect::to(&login_url(&next)).into_response();
            }
            AppError::BadRequest(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Database(e) => format!("Database error: {}", e),
            AppError::Pool(e) => format!("Pool error: {}", e),
            AppError::Template(e) => format!("Template error: {}", e),
            AppError::Io(e) => format!("I/O error: {}", e),
            AppError::Multipart(e) => {
                // Oversized or malformed bodies are the client's fault.
                tracing::warn!("Rejected multipart body: {}", e);
                return (e.status(), e.body_text()).into_response();
            }
            AppError::Password(e) => format!("Password hashing error: {}", e),
            AppError::Internal(msg) => format!("Internal error: {}", msg),
        };

        tracing::error!("{}", message);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Map "no rows" to a 404, keeping every other database failure as-is.
pub trait OptionalRow<T> {
    fn or_not_found(self) -> AppResult<T>;
}

impl<T> OptionalRow<T> for Result<Option<T>, rusqlite::Error> {
    fn or_not_found(self) -> AppResult<T> {
        self?.ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn response_status(err: AppError) -> StatusCode {
        let response = err.into_response();
        response.status()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(response_status(AppError::NotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn login_required_redirects_with_next() {
        let response = AppError::LoginRequired {
            next: "/create/".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert_eq!(location, "/auth/login/?next=%2Fcreate%2F");
    }

    #[test]
    fn bad_request_returns_400() {
        assert_eq!(
            response_status(AppError::BadRequest("oops".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_returns_500() {
        assert_eq!(
            response_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn missing_row_becomes_not_found() {
        let missing: Result<Option<i64>, rusqlite::Error> = Ok(None);
        assert!(matches!(missing.or_not_found(), Err(AppError::NotFound)));

        let present: Result<Option<i64>, rusqlite::Error> = Ok(Some(7));
        assert_eq!(present.or_not_found().unwrap(), 7);
    }
}
