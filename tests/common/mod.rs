//! Shared harness: a migrated temp database and the full router, driven
//! in-process with `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use yatube::auth::session;
use yatube::config::Config;
use yatube::db::posts::NewPost;
use yatube::db::{self, groups, posts, users};
use yatube::state::{AppState, DbPool};

pub const BOUNDARY: &str = "yatube-test-boundary";

pub struct TestApp {
    pub state: AppState,
    _tmp: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Start from the test defaults, then let the caller adjust the config.
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.auth.bcrypt_cost = 4;
        adjust(&mut config);
        config.resolve_paths(tmp.path());
        std::fs::create_dir_all(config.uploads_path()).unwrap();

        let pool = db::create_pool(&config.db_path()).unwrap();
        db::run_migrations(&pool).unwrap();

        TestApp {
            state: AppState::new(pool, config),
            _tmp: tmp,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.state.db
    }

    pub fn router(&self) -> Router {
        yatube::app(self.state.clone())
    }

    /// Insert a user directly and return `(id, session cookie header)`.
    pub fn user(&self, username: &str) -> (i64, String) {
        let conn = self.pool().get().unwrap();
        let id = users::create(
            &conn,
            &users::NewUser {
                username,
                email: "user@example.com",
                first_name: "",
                last_name: "",
                password_hash: "not-a-real-hash",
            },
        )
        .unwrap();
        let token = session::create_session(&conn, id, 1).unwrap();
        let cookie = format!("{}={}", self.state.config.auth.cookie_name, token);
        (id, cookie)
    }

    pub fn group(&self, title: &str, slug: &str) -> i64 {
        let conn = self.pool().get().unwrap();
        groups::create(&conn, title, slug, "").unwrap()
    }

    pub fn post(&self, author_id: i64, text: &str, group_id: Option<i64>) -> i64 {
        let conn = self.pool().get().unwrap();
        posts::create(
            &conn,
            &NewPost {
                author_id,
                text,
                group_id,
                image: None,
            },
        )
        .unwrap()
    }

    pub fn post_count(&self) -> i64 {
        let conn = self.pool().get().unwrap();
        conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
            .unwrap()
    }

    pub fn comment_count(&self) -> i64 {
        let conn = self.pool().get().unwrap();
        conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))
            .unwrap()
    }

    pub fn post_image(&self, post_id: i64) -> Option<String> {
        let conn = self.pool().get().unwrap();
        conn.query_row(
            "SELECT image FROM posts WHERE id = ?1",
            [post_id],
            |row| row.get(0),
        )
        .unwrap()
    }

    /// Stored media files under `posts/`.
    pub fn stored_images(&self) -> Vec<String> {
        let dir = self.state.config.uploads_path().join("posts");
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn post_text(&self, post_id: i64) -> String {
        let conn = self.pool().get().unwrap();
        conn.query_row(
            "SELECT text FROM posts WHERE id = ?1",
            [post_id],
            |row| row.get(0),
        )
        .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
    ) -> Response<Body> {
        let body: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut builder = Request::post(uri).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        body: Vec<u8>,
    ) -> Response<Body> {
        let mut builder = Request::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }
}

/// Builds a `multipart/form-data` body using [`BOUNDARY`].
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.bytes
    }
}

pub const SMALL_GIF: &[u8] = b"GIF89a\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\xff\xff\xff\x21\xf9\x04\x00\x00\x00\x00\x00\x2c\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0c\x0a\x00\x3b";

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
}

/// Number of post cards rendered on a listing page.
pub fn card_count(html: &str) -> usize {
    html.matches("class=\"card post\"").count()
}
