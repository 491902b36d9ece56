//! Following authors and the personal feed.

mod common;

use axum::http::StatusCode;
use common::{body_text, card_count, location, TestApp};
use yatube::db::follows;

#[tokio::test]
async fn follow_and_unfollow_author() {
    let app = TestApp::new();
    let (reader, cookie) = app.user("reader");
    let (author, _) = app.user("author");

    let response = app.get("/profile/author/follow/", Some(&cookie)).await;
    assert_eq!(location(&response), "/profile/author/");
    {
        let conn = app.pool().get().unwrap();
        assert!(follows::is_following(&conn, reader, author).unwrap());
    }

    // A second follow is a no-op.
    let response = app.post_form("/profile/author/follow/", Some(&cookie), &[]).await;
    assert_eq!(location(&response), "/profile/author/");
    {
        let conn = app.pool().get().unwrap();
        assert_eq!(follows::follower_count(&conn, author).unwrap(), 1);
    }

    let html = body_text(app.get("/profile/author/", Some(&cookie)).await).await;
    assert!(html.contains("/profile/author/unfollow/"));

    let response = app.get("/profile/author/unfollow/", Some(&cookie)).await;
    assert_eq!(location(&response), "/");
    let conn = app.pool().get().unwrap();
    assert!(!follows::is_following(&conn, reader, author).unwrap());
}

#[tokio::test]
async fn cannot_follow_yourself() {
    let app = TestApp::new();
    let (me, cookie) = app.user("me");

    let response = app.get("/profile/me/follow/", Some(&cookie)).await;
    assert_eq!(location(&response), "/profile/me/");

    let conn = app.pool().get().unwrap();
    assert!(!follows::is_following(&conn, me, me).unwrap());
    drop(conn);

    let html = body_text(app.get("/profile/me/", Some(&cookie)).await).await;
    assert!(!html.contains("/profile/me/follow/"));
}

#[tokio::test]
async fn following_unknown_user_is_not_found() {
    let app = TestApp::new();
    let (_, cookie) = app.user("reader");

    let response = app.get("/profile/ghost/follow/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.get("/profile/ghost/unfollow/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guests_cannot_follow() {
    let app = TestApp::new();
    app.user("author");

    let response = app.get("/profile/author/follow/", None).await;
    assert_eq!(
        location(&response),
        "/auth/login/?next=%2Fprofile%2Fauthor%2Ffollow%2F"
    );
}

#[tokio::test]
async fn feed_shows_only_followed_authors() {
    let app = TestApp::new();
    let (_, follower) = app.user("follower");
    let (_, bystander) = app.user("bystander");
    let (author, _) = app.user("author");
    app.post(author, "News from the followed author", None);

    app.get("/profile/author/follow/", Some(&follower)).await;

    let html = body_text(app.get("/follow/", Some(&follower)).await).await;
    assert!(html.contains("News from the followed author"));
    assert_eq!(card_count(&html), 1);

    let html = body_text(app.get("/follow/", Some(&bystander)).await).await;
    assert!(!html.contains("News from the followed author"));
    assert_eq!(card_count(&html), 0);
    assert!(html.contains("Follow some authors"));
}

#[tokio::test]
async fn feed_is_paginated() {
    let app = TestApp::new();
    let (_, follower) = app.user("follower");
    let (author, _) = app.user("author");
    for i in 0..13 {
        app.post(author, &format!("Post number {}", i), None);
    }
    app.get("/profile/author/follow/", Some(&follower)).await;

    let first = body_text(app.get("/follow/", Some(&follower)).await).await;
    assert_eq!(card_count(&first), 10);
    let second = body_text(app.get("/follow/?page=2", Some(&follower)).await).await;
    assert_eq!(card_count(&second), 3);
}
