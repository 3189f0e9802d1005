//! Integration Tests: page views
//!
//! Coverage:
//! - Listings (index, group, profile) and their pagination
//! - Post detail with comments
//! - Creating and editing posts through the form
//! - Comments
//! - Login redirects, 404 pages and the CSRF failure page
//! - Health and metrics endpoints

mod common;

use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use blog_service::create_app;
use blog_service::db::{BlogStore, PostScope};
use blog_service::forms::TEXT_NULL_CHARACTERS;
use common::{body_text, location, post_cards, TestContext, PAGE_SIZE};

#[actix_web::test]
async fn test_index_lists_posts_with_group_link() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let group = ctx.group("test_slug", "Test group").await;
    ctx.post(&author, "Test post text", Some(&group)).await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(&app, TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let html = body_text(test::read_body(resp).await);
    assert!(html.contains("Test post text"));
    assert!(html.contains("Test group"));
    assert_eq!(post_cards(&html), 1);
}

#[actix_web::test]
async fn test_listings_paginate_by_page_size() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let group = ctx.group("test_slug", "Test group").await;
    for i in 0..12 {
        ctx.post(&author, &format!("Post number {}", i), Some(&group))
            .await;
    }
    let app = test::init_service(create_app(ctx.state.clone())).await;

    for base in ["/", "/group/test_slug/", "/profile/auth/"] {
        let first = test::call_service(&app, TestRequest::get().uri(base).to_request()).await;
        assert_eq!(first.status(), StatusCode::OK, "{}", base);
        let html = body_text(test::read_body(first).await);
        assert_eq!(post_cards(&html), PAGE_SIZE as usize, "{}", base);

        let uri = format!("{}?page=2", base);
        let second = test::call_service(&app, TestRequest::get().uri(&uri).to_request()).await;
        let html = body_text(test::read_body(second).await);
        assert_eq!(post_cards(&html), 2, "{}", uri);
    }
}

#[actix_web::test]
async fn test_out_of_range_page_shows_last_page() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    for i in 0..12 {
        ctx.post(&author, &format!("Post number {}", i), None).await;
    }
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/profile/auth/?page=99").to_request(),
    )
    .await;
    let html = body_text(test::read_body(resp).await);
    assert_eq!(post_cards(&html), 2);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/profile/auth/?page=abc").to_request(),
    )
    .await;
    let html = body_text(test::read_body(resp).await);
    assert_eq!(post_cards(&html), PAGE_SIZE as usize);
}

#[actix_web::test]
async fn test_repeated_page_parameter_uses_last_value() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    for i in 0..12 {
        ctx.post(&author, &format!("Post number {}", i), None).await;
    }
    let app = test::init_service(create_app(ctx.state.clone())).await;

    for uri in ["/?page=1&page=2", "/profile/auth/?page=1&page=2"] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        let html = body_text(test::read_body(resp).await);
        assert_eq!(post_cards(&html), 2, "{}", uri);
    }
}

#[actix_web::test]
async fn test_group_page_only_shows_group_posts() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let group = ctx.group("test_slug", "Test group").await;
    let other = ctx.group("other_slug", "Other group").await;
    ctx.post(&author, "In the test group", Some(&group)).await;
    ctx.post(&author, "In the other group", Some(&other)).await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/group/test_slug/").to_request(),
    )
    .await;
    let html = body_text(test::read_body(resp).await);
    assert!(html.contains("In the test group"));
    assert!(!html.contains("In the other group"));
}

#[actix_web::test]
async fn test_missing_objects_render_not_found_page() {
    let ctx = TestContext::new();
    let app = test::init_service(create_app(ctx.state.clone())).await;

    for uri in [
        "/group/missing/",
        "/profile/ghost/",
        "/posts/999/",
        "/posts/not-a-number/",
        "/unexisting_page/",
    ] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        let html = body_text(test::read_body(resp).await);
        assert!(html.contains("Page not found"), "{}", uri);
    }
}

#[actix_web::test]
async fn test_post_detail_shows_comments_and_author_count() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let post = ctx.post(&author, "Detailed post", None).await;
    ctx.post(&author, "Another post", None).await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        ctx.post_form_as(
            &author,
            &format!("/posts/{}/comment/", post.id),
            &[("text", "First comment")],
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(test::read_body(resp).await);
    assert!(html.contains("Detailed post"));
    assert!(html.contains("First comment"));
    assert!(html.contains("Author's posts: 2"));
}

#[actix_web::test]
async fn test_login_required_views_redirect_anonymous() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let post = ctx.post(&author, "Post", None).await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let edit = format!("/posts/{}/edit/", post.id);
    for uri in ["/create/", "/follow/", "/profile/auth/follow/", edit.as_str()] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", uri);
        assert_eq!(location(&resp), format!("/auth/login/?next={}", uri));
    }

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri(&format!("/posts/{}/comment/", post.id))
            .set_form([("text", "anonymous")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/?next="));
    assert_eq!(ctx.store.count_comments(post.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_create_post_redirects_to_profile() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let group = ctx.group("test_slug", "Test group").await;
    let app = test::init_service(create_app(ctx.state.clone())).await;
    let before = ctx.store.count_posts(PostScope::All).await.unwrap();

    let group_id = group.id.to_string();
    let resp = test::call_service(
        &app,
        ctx.post_form_as(
            &author,
            "/create/",
            &[("text", "Данные из формы"), ("group", group_id.as_str())],
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");

    let follow = test::call_service(&app, ctx.get_as(&author, "/profile/auth/").to_request()).await;
    assert_eq!(follow.status(), StatusCode::OK);

    assert_eq!(ctx.store.count_posts(PostScope::All).await.unwrap(), before + 1);
    let posts = ctx.store.list_posts(PostScope::All, 1, 0).await.unwrap();
    assert_eq!(posts[0].text, "Данные из формы");
    assert_eq!(posts[0].author_id, author.id);
    assert_eq!(posts[0].group_id, Some(group.id));
}

#[actix_web::test]
async fn test_create_form_renders_for_user() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    ctx.group("test_slug", "Test group").await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(&app, ctx.get_as(&author, "/create/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .response()
        .cookies()
        .any(|c| c.name() == "csrftoken" && c.value().len() == 32));

    let html = body_text(test::read_body(resp).await);
    assert!(html.contains("name=\"text\""));
    assert!(html.contains("name=\"group\""));
    assert!(html.contains("name=\"image\""));
    assert!(html.contains("Test group"));
    assert!(html.contains("csrfmiddlewaretoken"));
}

#[actix_web::test]
async fn test_invalid_post_rerenders_form() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        ctx.post_form_as(&author, "/create/", &[("text", "")]).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(test::read_body(resp).await);
    assert!(html.contains(blog_service::forms::POST_TEXT_REQUIRED));
    assert_eq!(ctx.store.count_posts(PostScope::All).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_author_edits_post_in_place() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let post = ctx.post(&author, "Original text", None).await;
    let app = test::init_service(create_app(ctx.state.clone())).await;
    let edit = format!("/posts/{}/edit/", post.id);

    let form = test::call_service(&app, ctx.get_as(&author, &edit).to_request()).await;
    assert_eq!(form.status(), StatusCode::OK);
    let html = body_text(test::read_body(form).await);
    assert!(html.contains("Original text"));
    assert!(html.contains("Edit post"));

    let resp = test::call_service(
        &app,
        ctx.post_form_as(&author, &edit, &[("text", "Edited text")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    assert_eq!(ctx.store.count_posts(PostScope::All).await.unwrap(), 1);
    let stored = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Edited text");
}

#[actix_web::test]
async fn test_non_author_cannot_edit() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let stranger = ctx.user("stranger").await;
    let post = ctx.post(&author, "Original text", None).await;
    let app = test::init_service(create_app(ctx.state.clone())).await;
    let edit = format!("/posts/{}/edit/", post.id);

    let resp = test::call_service(&app, ctx.get_as(&stranger, &edit).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let resp = test::call_service(
        &app,
        ctx.post_form_as(&stranger, &edit, &[("text", "Hijacked")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let stored = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Original text");
}

#[actix_web::test]
async fn test_edit_missing_post_is_not_found() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(&app, ctx.get_as(&author, "/posts/77/edit/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_comment_flow() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let reader = ctx.user("reader").await;
    let post = ctx.post(&author, "Commentable", None).await;
    let app = test::init_service(create_app(ctx.state.clone())).await;
    let uri = format!("/posts/{}/comment/", post.id);

    let resp = test::call_service(
        &app,
        ctx.post_form_as(&reader, &uri, &[("text", "Nice post")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(ctx.store.count_comments(post.id).await.unwrap(), 1);

    // Invalid comments are dropped silently.
    let resp = test::call_service(
        &app,
        ctx.post_form_as(&reader, &uri, &[("text", "")]).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(ctx.store.count_comments(post.id).await.unwrap(), 1);

    let resp = test::call_service(
        &app,
        ctx.post_form_as(&reader, "/posts/4040/comment/", &[("text", "Lost")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_long_comment_is_accepted() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let post = ctx.post(&author, "Commentable", None).await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let text = "a".repeat(20_000);
    let resp = test::call_service(
        &app,
        ctx.post_form_as(&author, &format!("/posts/{}/comment/", post.id), &[("text", text.as_str())])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let comments = ctx.store.list_comments(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text.len(), 20_000);
}

#[actix_web::test]
async fn test_null_characters_are_rejected() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let post = ctx.post(&author, "Commentable", None).await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        ctx.post_form_as(&author, "/create/", &[("text", "bad\0text")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(test::read_body(resp).await);
    assert!(html.contains(TEXT_NULL_CHARACTERS));
    assert_eq!(ctx.store.count_posts(PostScope::All).await.unwrap(), 1);

    let resp = test::call_service(
        &app,
        ctx.post_form_as(&author, &format!("/posts/{}/comment/", post.id), &[("text", "a\0")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(ctx.store.count_comments(post.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_cookie_post_without_csrf_token_is_rejected() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        ctx.get_as(&author, "/create/")
            .method(actix_web::http::Method::POST)
            .set_form([("text", "No token")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let html = body_text(test::read_body(resp).await);
    assert!(html.contains("Request rejected"));
    assert_eq!(ctx.store.count_posts(PostScope::All).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_bearer_post_is_exempt_from_csrf() {
    let ctx = TestContext::new();
    let author = ctx.user("auth").await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/create/")
            .insert_header((AUTHORIZATION, format!("Bearer {}", ctx.token(&author))))
            .set_form([("text", "Via API")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(ctx.store.count_posts(PostScope::All).await.unwrap(), 1);
}

#[actix_web::test]
async fn test_invalid_token_is_anonymous() {
    let ctx = TestContext::new();
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/create/")
            .insert_header((AUTHORIZATION, "Bearer not-a-token"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/"));
}

#[actix_web::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new();
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let ready: serde_json::Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/health/ready").to_request(),
    )
    .await;
    assert_eq!(ready["ready"], true);
    assert_eq!(ready["checks"]["store"]["status"], "healthy");
    assert_eq!(ready["checks"]["page_cache"]["status"], "healthy");

    let live: serde_json::Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/health/live").to_request(),
    )
    .await;
    assert_eq!(live["alive"], true);

    let resp = test::call_service(&app, TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
