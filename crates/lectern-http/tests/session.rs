//! Bootstrap, login and logout flows of the session manager.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lectern_core::{Error, LoginCredentials, SessionEvent, SessionState};
use lectern_http::AmbientSession;

use common::*;

fn drain(events: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

#[tokio::test]
async fn bootstrap_with_valid_credential() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer tok-A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_envelope("ada")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_envelope("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let store = store(Some("tok-A"));
    let session = manager(&server, &store);

    let state = session.bootstrap().await.unwrap();
    assert!(state.is_authenticated());
    assert_eq!(session.profile().unwrap().username, "ada");
    assert_eq!(stored(&store).await.as_deref(), Some("tok-A"));
}

#[tokio::test]
async fn bootstrap_refreshes_expired_credential() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer tok-A"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer tok-B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_envelope("ada")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_envelope("tok-B")))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(Some("tok-A"));
    let session = manager(&server, &store);

    let state = session.bootstrap().await.unwrap();
    assert!(state.is_authenticated());
    assert_eq!(stored(&store).await.as_deref(), Some("tok-B"));
}

#[tokio::test]
async fn bootstrap_resumes_from_ambient_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_envelope("tok-C")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer tok-C"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_envelope("grace")))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(None);
    let session = manager(&server, &store);

    let state = session.bootstrap().await.unwrap();
    assert_eq!(state.profile().unwrap().username, "grace");
    assert_eq!(stored(&store).await.as_deref(), Some("tok-C"));
}

#[tokio::test]
async fn bootstrap_without_any_session_ends_unauthenticated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(failure("no session")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_envelope("nobody")))
        .expect(0)
        .mount(&server)
        .await;

    let store = store(None);
    let session = manager(&server, &store);

    let state = session.bootstrap().await.unwrap();
    assert_eq!(state, SessionState::Unauthenticated);
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(stored(&store).await, None);
}

#[tokio::test]
async fn bootstrap_with_unrefreshable_credential_clears_it() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(Some("tok-A"));
    let cache = Arc::new(CountingCache::default());
    let session = builder(&server, &store).cache(cache.clone()).build().unwrap();

    let state = session.bootstrap().await.unwrap();
    assert_eq!(state, SessionState::Unauthenticated);
    assert_eq!(stored(&store).await, None);
    assert_eq!(cache.count(), 1);
}

#[tokio::test]
async fn bootstrap_gives_up_when_refreshed_credential_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_envelope("tok-B")))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(Some("tok-A"));
    let session = manager(&server, &store);

    let state = session.bootstrap().await.unwrap();
    assert_eq!(state, SessionState::Unauthenticated);
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(stored(&store).await, None);
}

#[tokio::test]
async fn bootstrap_keeps_credential_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(503).set_body_json(failure("maintenance")))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(Some("tok-A"));
    let session = manager(&server, &store);

    let err = session.bootstrap().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(stored(&store).await.as_deref(), Some("tok-A"));
}

#[tokio::test]
async fn login_stores_credential_and_publishes_state() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "identifier": "ada@example.edu", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_envelope("tok-L")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer tok-L"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_envelope("ada")))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(None);
    let session = manager(&server, &store);
    let mut subscription = session.subscribe();
    let mut events = session.events();

    let profile = session
        .login(LoginCredentials::new("ada@example.edu", "hunter2"))
        .await
        .unwrap();

    assert_eq!(profile.username, "ada");
    assert!(profile.has_role("student"));
    assert_eq!(stored(&store).await.as_deref(), Some("tok-L"));
    assert!(subscription.current().is_authenticated());
    assert!(subscription.changed().await.unwrap().is_authenticated());

    let states: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            SessionEvent::StateChanged(state) => Some(state.name()),
            _ => None,
        })
        .collect();
    assert_eq!(states, vec!["authenticating", "authenticated"]);
}

#[tokio::test]
async fn login_rejected_profile_leaves_no_credential() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_envelope("tok-L")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(403).set_body_json(failure("account disabled")))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(None);
    let session = manager(&server, &store);

    let err = session
        .login(LoginCredentials::new("ada", "hunter2"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(stored(&store).await, None);
    assert_eq!(session.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn login_without_token_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_envelope("")))
        .mount(&server)
        .await;

    let store = store(None);
    let session = manager(&server, &store);

    let err = session
        .login(LoginCredentials::new("ada", "hunter2"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(lectern_core::AuthError::MissingToken)));
    assert_eq!(stored(&store).await, None);
}

#[tokio::test]
async fn logout_clears_local_state_even_when_server_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer tok-A"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(Some("tok-A"));
    let cache = Arc::new(CountingCache::default());
    let session = builder(&server, &store).cache(cache.clone()).build().unwrap();
    let mut events = session.events();

    session.logout().await;

    assert_eq!(stored(&store).await, None);
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(cache.count(), 1);
    assert!(drain(&mut events).contains(&SessionEvent::LoggedOut));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn logout_discards_refresh_still_in_flight() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/courses"))
        .and(header("authorization", "Bearer tok-A"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/courses"))
        .and(header("authorization", "Bearer tok-B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_envelope("tok-B"))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(Some("tok-A"));
    let session = manager(&server, &store);
    let mut events = session.events();

    let client = session.client().clone();
    let request = tokio::spawn(async move { client.get::<serde_json::Value>("/courses").await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    session.logout().await;
    assert_eq!(stored(&store).await, None);

    let err = request.await.unwrap().unwrap_err();
    assert!(err.is_refresh_failure(), "unexpected error: {err}");

    assert_eq!(stored(&store).await, None);
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(
        !drain(&mut events)
            .iter()
            .any(|event| matches!(event, SessionEvent::Terminated { .. }))
    );
}

#[tokio::test]
async fn logout_with_unreachable_server_still_clears() {
    let store = store(Some("tok-A"));
    let cache = Arc::new(CountingCache::default());
    let session = lectern_http::SessionManager::builder(unreachable_config(), store.clone())
        .cache(cache.clone())
        .build()
        .unwrap();

    session.logout().await;
    assert_eq!(stored(&store).await, None);
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(cache.count(), 1);
}

#[tokio::test]
async fn ambient_cookie_is_sent_with_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sid=abc; Path=/; HttpOnly")
                .set_body_json(token_envelope("tok-A")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_envelope("ada")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("cookie", "sid=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_envelope("tok-B")))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(None);
    let ambient = AmbientSession::new();
    let session = builder(&server, &store)
        .ambient(ambient.clone())
        .build()
        .unwrap();

    session
        .login(LoginCredentials::new("ada", "hunter2"))
        .await
        .unwrap();

    let base = mock_base_url(&server);
    assert_eq!(ambient.cookie_header(&base).as_deref(), Some("sid=abc"));

    let token = session.refresh().await.unwrap();
    assert_eq!(token.as_str(), "tok-B");
    assert_eq!(stored(&store).await.as_deref(), Some("tok-B"));
}

#[tokio::test]
async fn restored_ambient_cookie_resumes_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("cookie", "sid=persisted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_envelope("tok-R")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer tok-R"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_envelope("ada")))
        .expect(1)
        .mount(&server)
        .await;

    let base = mock_base_url(&server);
    let ambient = AmbientSession::new();
    ambient.restore(&base, "sid=persisted");

    let store = store(None);
    let session = builder(&server, &store).ambient(ambient).build().unwrap();

    assert!(session.bootstrap().await.unwrap().is_authenticated());
}
