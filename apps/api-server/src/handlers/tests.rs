use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{Value, json};
use uuid::Uuid;

use blog_core::RepoError;
use blog_core::domain::{NewPostLike, NewUser, Post, PostLike};
use blog_core::ports::{BaseRepository, PostLikeRepository};
use blog_infra::{Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService};

use super::configure_routes;
use crate::state::AppState;

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn test_state() -> AppState {
    let tokens = JwtTokenService::new(JwtConfig {
        secret: "handler-test-secret".to_string(),
        expiration_hours: 1,
        issuer: "handler-tests".to_string(),
    });

    AppState::in_memory(Arc::new(tokens), Arc::new(Argon2PasswordService::new()))
}

/// State whose likes go through `likes` while everything else shares `store`.
fn state_with_likes(store: Arc<InMemoryStore>, likes: Arc<dyn PostLikeRepository>) -> AppState {
    AppState {
        users: store.clone(),
        posts: store.clone(),
        comments: store,
        likes,
        ..test_state()
    }
}

/// Likes whose existence check never sees a stored row, as when a concurrent
/// request inserts between the check and the write.
struct StaleLikeLookups {
    store: Arc<InMemoryStore>,
}

#[async_trait]
impl BaseRepository<PostLike, i64> for StaleLikeLookups {
    async fn find_by_id(&self, id: i64) -> Result<Option<PostLike>, RepoError> {
        <InMemoryStore as BaseRepository<PostLike, i64>>::find_by_id(&self.store, id).await
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        <InMemoryStore as BaseRepository<PostLike, i64>>::delete(&self.store, id).await
    }
}

#[async_trait]
impl PostLikeRepository for StaleLikeLookups {
    async fn create(&self, like: NewPostLike) -> Result<PostLike, RepoError> {
        <InMemoryStore as PostLikeRepository>::create(&self.store, like).await
    }

    async fn find_by_user_and_post(
        &self,
        _user_id: Uuid,
        _post_id: i64,
    ) -> Result<Option<PostLike>, RepoError> {
        Ok(None)
    }

    async fn count_for_post(&self, post_id: i64) -> Result<u64, RepoError> {
        <InMemoryStore as PostLikeRepository>::count_for_post(&self.store, post_id).await
    }
}

/// Likes whose target post is deleted just before the insert.
struct PostVanishesBeforeInsert {
    store: Arc<InMemoryStore>,
}

#[async_trait]
impl BaseRepository<PostLike, i64> for PostVanishesBeforeInsert {
    async fn find_by_id(&self, id: i64) -> Result<Option<PostLike>, RepoError> {
        <InMemoryStore as BaseRepository<PostLike, i64>>::find_by_id(&self.store, id).await
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        <InMemoryStore as BaseRepository<PostLike, i64>>::delete(&self.store, id).await
    }
}

#[async_trait]
impl PostLikeRepository for PostVanishesBeforeInsert {
    async fn create(&self, like: NewPostLike) -> Result<PostLike, RepoError> {
        <InMemoryStore as BaseRepository<Post, i64>>::delete(&self.store, like.post_id).await?;
        <InMemoryStore as PostLikeRepository>::create(&self.store, like).await
    }

    async fn find_by_user_and_post(
        &self,
        user_id: Uuid,
        post_id: i64,
    ) -> Result<Option<PostLike>, RepoError> {
        <InMemoryStore as PostLikeRepository>::find_by_user_and_post(&self.store, user_id, post_id)
            .await
    }

    async fn count_for_post(&self, post_id: i64) -> Result<u64, RepoError> {
        <InMemoryStore as PostLikeRepository>::count_for_post(&self.store, post_id).await
    }
}

async fn create_post(app_state: &AppState, title: &str) -> i64 {
    let (_, author) = sign_in(app_state, &format!("author-of-{title}")).await;
    let app = test_app!(app_state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/")
            .insert_header(author)
            .set_json(json!({"title": title}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    body["id"].as_i64().unwrap()
}

/// Seed a user directly in storage and return a bearer header for them.
async fn sign_in(state: &AppState, username: &str) -> (Uuid, (header::HeaderName, String)) {
    let user = state
        .users
        .create(NewUser::new(username.to_string(), "unused-hash".to_string()))
        .await
        .unwrap();
    let token = state.tokens.generate_token(user.id, &user.username).unwrap();

    (user.id, (header::AUTHORIZATION, format!("Bearer {token}")))
}

#[actix_web::test]
async fn test_routes_require_authentication() {
    let state = test_state();
    let app = test_app!(state);

    let requests = [
        test::TestRequest::get().uri("/posts/"),
        test::TestRequest::post().uri("/posts/").set_json(json!({"title": "x"})),
        test::TestRequest::get().uri("/posts/1/"),
        test::TestRequest::get().uri("/comments/1/"),
        test::TestRequest::post().uri("/likes/1/"),
        test::TestRequest::delete().uri("/likes/1/"),
    ];

    for req in requests {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/posts/")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_token_from_another_issuer_is_rejected() {
    let state = test_state();
    let app = test_app!(state);

    let foreign = JwtTokenService::new(JwtConfig::default());
    let token = blog_core::ports::TokenService::generate_token(&foreign, Uuid::new_v4(), "eve")
        .unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/posts/")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_create_post_ignores_spoofed_author() {
    let state = test_state();
    let app = test_app!(state);
    let (alice_id, alice) = sign_in(&state, "alice").await;
    sign_in(&state, "mallory").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/")
            .insert_header(alice.clone())
            .set_json(json!({
                "title": "First",
                "content": "Hello",
                "author": "mallory",
                "published_date": "2024-03-01T12:00:00Z"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["author"], "alice");
    assert_eq!(body["title"], "First");
    assert_eq!(body["content"], "Hello");
    assert_eq!(body["like_count"], 0);
    assert_eq!(body["published_date"], "2024-03-01T12:00:00Z");

    let id = body["id"].as_i64().unwrap();
    let stored = state.posts.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.author_id, alice_id);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/posts/")
            .insert_header(alice)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let list: Value = test::read_body_json(resp).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["author"], "alice");
}

#[actix_web::test]
async fn test_create_post_validation() {
    let state = test_state();
    let app = test_app!(state);
    let (_, alice) = sign_in(&state, "alice").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/")
            .insert_header(alice.clone())
            .set_json(json!({"title": "   "}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);
    assert!(body["detail"].as_str().unwrap().contains("title"));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/")
            .insert_header(alice.clone())
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/")
            .insert_header(alice)
            .set_json(json!({"title": "x".repeat(201)}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_get_missing_post() {
    let state = test_state();
    let app = test_app!(state);
    let (_, alice) = sign_in(&state, "alice").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/posts/42/")
            .insert_header(alice.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/posts/abc/")
            .insert_header(alice)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_only_author_may_update_or_delete() {
    let state = test_state();
    let app = test_app!(state);
    let (_, alice) = sign_in(&state, "alice").await;
    let (_, bob) = sign_in(&state, "bob").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/")
            .insert_header(alice.clone())
            .set_json(json!({"title": "P1", "content": "original"}))
            .to_request(),
    )
    .await;
    let created: Value = test::read_body_json(resp).await;
    let uri = format!("/posts/{}/", created["id"]);

    // Reads are open to any authenticated user.
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&uri).insert_header(bob.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header(bob.clone())
            .set_json(json!({"title": "Hijacked"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete().uri(&uri).insert_header(bob).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&uri).insert_header(alice.clone()).to_request(),
    )
    .await;
    let unchanged: Value = test::read_body_json(resp).await;
    assert_eq!(unchanged["title"], "P1");

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header(alice)
            .set_json(json!({"title": "P1 (edited)", "author": "bob"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["title"], "P1 (edited)");
    assert_eq!(updated["content"], "original");
    assert_eq!(updated["author"], "alice");
}

#[actix_web::test]
async fn test_like_unlike_scenario() {
    let state = test_state();
    let app = test_app!(state);
    let (_, alice) = sign_in(&state, "alice").await;
    let (bob_id, bob) = sign_in(&state, "bob").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/")
            .insert_header(alice.clone())
            .set_json(json!({"title": "P1"}))
            .to_request(),
    )
    .await;
    let created: Value = test::read_body_json(resp).await;
    let post_id = created["id"].as_i64().unwrap();
    let like_uri = format!("/likes/{post_id}/");
    let post_uri = format!("/posts/{post_id}/");

    let like_count = |body: Value| body["like_count"].as_u64().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri(&like_uri).insert_header(bob.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let like: Value = test::read_body_json(resp).await;
    assert_eq!(like["post"], post_id);
    assert_eq!(like["user"], bob_id.to_string());

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&post_uri).insert_header(alice.clone()).to_request(),
    )
    .await;
    assert_eq!(like_count(test::read_body_json(resp).await), 1);

    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri(&like_uri).insert_header(bob.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "You already liked this post");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&post_uri).insert_header(alice.clone()).to_request(),
    )
    .await;
    assert_eq!(like_count(test::read_body_json(resp).await), 1);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete().uri(&like_uri).insert_header(bob.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&post_uri).insert_header(alice).to_request(),
    )
    .await;
    assert_eq!(like_count(test::read_body_json(resp).await), 0);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete().uri(&like_uri).insert_header(bob).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "You haven't liked this post");
}

#[actix_web::test]
async fn test_like_missing_post_is_bad_request() {
    let state = test_state();
    let app = test_app!(state);
    let (_, bob) = sign_in(&state, "bob").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri("/likes/999/").insert_header(bob.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Post not found");

    let resp = test::call_service(
        &app,
        test::TestRequest::delete().uri("/likes/999/").insert_header(bob).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_comments_list_and_create() {
    let state = test_state();
    let app = test_app!(state);
    let (_, alice) = sign_in(&state, "alice").await;
    let (_, bob) = sign_in(&state, "bob").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/")
            .insert_header(alice.clone())
            .set_json(json!({"title": "P1"}))
            .to_request(),
    )
    .await;
    let created: Value = test::read_body_json(resp).await;
    let post_id = created["id"].as_i64().unwrap();
    let uri = format!("/comments/{post_id}/");

    // A post without comments lists as empty, not 404.
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&uri).insert_header(bob.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!([]));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&uri)
            .insert_header(bob.clone())
            .set_json(json!({"text": "Nice post", "author": "alice", "post": 999}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comment: Value = test::read_body_json(resp).await;
    assert_eq!(comment["author"], "bob");
    assert_eq!(comment["text"], "Nice post");
    assert_eq!(comment["post"], post_id);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&uri).insert_header(alice).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], comment["id"]);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/comments/999/").insert_header(bob.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/comments/999/")
            .insert_header(bob)
            .set_json(json!({"text": "orphan"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_delete_post_cascades_to_children() {
    let state = test_state();
    let app = test_app!(state);
    let (_, alice) = sign_in(&state, "alice").await;
    let (bob_id, bob) = sign_in(&state, "bob").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/")
            .insert_header(alice.clone())
            .set_json(json!({"title": "Doomed"}))
            .to_request(),
    )
    .await;
    let created: Value = test::read_body_json(resp).await;
    let post_id = created["id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/comments/{post_id}/"))
            .insert_header(bob.clone())
            .set_json(json!({"text": "first!"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/likes/{post_id}/"))
            .insert_header(bob.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/posts/{post_id}/"))
            .insert_header(alice.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{post_id}/"))
            .insert_header(alice)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/comments/{post_id}/"))
            .insert_header(bob.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert!(state.comments.list_by_post(post_id).await.unwrap().is_empty());
    assert!(
        state
            .likes
            .find_by_user_and_post(bob_id, post_id)
            .await
            .unwrap()
            .is_none()
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/likes/{post_id}/"))
            .insert_header(bob)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_register_login_and_me() {
    let state = test_state();
    let app = test_app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/register/")
            .set_json(json!({"username": "carol", "password": "hunter2hunter2"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let registered: Value = test::read_body_json(resp).await;
    assert_eq!(registered["token_type"], "Bearer");
    assert_eq!(registered["expires_in"], 3600);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/register/")
            .set_json(json!({"username": "carol", "password": "another-password"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/register/")
            .set_json(json!({"username": "dave", "password": "short"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(json!({"username": "carol", "password": "wrong-password"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(json!({"username": "carol", "password": "hunter2hunter2"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: Value = test::read_body_json(resp).await;
    let token = login["access_token"].as_str().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/me/")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = test::read_body_json(resp).await;
    assert_eq!(me["username"], "carol");
}

#[actix_web::test]
async fn test_health_is_public() {
    let state = test_state();
    let app = test_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[actix_web::test]
async fn test_token_of_deleted_user_is_rejected() {
    let state = test_state();
    let app = test_app!(state);
    let post_id = create_post(&state, "Still here").await;
    let (ghost_id, ghost) = sign_in(&state, "ghost").await;

    state.users.delete(ghost_id).await.unwrap();

    let requests = [
        test::TestRequest::get().uri("/posts/"),
        test::TestRequest::post().uri("/posts/").set_json(json!({"title": "Boo"})),
        test::TestRequest::post().uri(&format!("/likes/{post_id}/")),
        test::TestRequest::get().uri("/auth/me/"),
    ];

    for req in requests {
        let resp = test::call_service(&app, req.insert_header(ghost.clone()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(state.likes.count_for_post(post_id).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_update_can_clear_content() {
    let state = test_state();
    let app = test_app!(state);
    let (_, alice) = sign_in(&state, "alice").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/")
            .insert_header(alice.clone())
            .set_json(json!({"title": "Draft", "content": "to be removed"}))
            .to_request(),
    )
    .await;
    let created: Value = test::read_body_json(resp).await;
    let uri = format!("/posts/{}/", created["id"]);

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header(alice.clone())
            .set_json(json!({"title": "Draft 2"}))
            .to_request(),
    )
    .await;
    let kept: Value = test::read_body_json(resp).await;
    assert_eq!(kept["content"], "to be removed");

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header(alice)
            .set_json(json!({"content": null}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared: Value = test::read_body_json(resp).await;
    assert!(cleared["content"].is_null());
    assert_eq!(cleared["title"], "Draft 2");
}

#[actix_web::test]
async fn test_concurrent_likes_create_one_row() {
    let state = test_state();
    let app = test_app!(state);
    let post_id = create_post(&state, "Popular").await;
    let (_, bob) = sign_in(&state, "bob").await;
    let uri = format!("/likes/{post_id}/");

    let calls = (0..8).map(|_| {
        test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&uri)
                .insert_header(bob.clone())
                .to_request(),
        )
    });
    let statuses: Vec<StatusCode> = join_all(calls)
        .await
        .iter()
        .map(|resp| resp.status())
        .collect();

    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    assert_eq!(created, 1);
    assert!(
        statuses
            .iter()
            .all(|s| *s == StatusCode::CREATED || *s == StatusCode::BAD_REQUEST)
    );
    assert_eq!(state.likes.count_for_post(post_id).await.unwrap(), 1);
}

#[actix_web::test]
async fn test_like_losing_insert_race_is_already_liked() {
    let store = Arc::new(InMemoryStore::new());
    let state = state_with_likes(
        store.clone(),
        Arc::new(StaleLikeLookups {
            store: store.clone(),
        }),
    );
    let app = test_app!(state);
    let post_id = create_post(&state, "Contested").await;
    let (_, bob) = sign_in(&state, "bob").await;
    let uri = format!("/likes/{post_id}/");

    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri(&uri).insert_header(bob.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // The existence check passes again; the storage constraint rejects the row.
    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri(&uri).insert_header(bob).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "You already liked this post");
    assert_eq!(state.likes.count_for_post(post_id).await.unwrap(), 1);
}

#[actix_web::test]
async fn test_like_on_post_deleted_mid_request_is_post_not_found() {
    let store = Arc::new(InMemoryStore::new());
    let state = state_with_likes(
        store.clone(),
        Arc::new(PostVanishesBeforeInsert {
            store: store.clone(),
        }),
    );
    let app = test_app!(state);
    let post_id = create_post(&state, "Short-lived").await;
    let (_, bob) = sign_in(&state, "bob").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/likes/{post_id}/"))
            .insert_header(bob)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Post not found");
}
