//! Integration tests for the optimistic toggle protocol: flip the marker
//! synchronously, settle against a mocked server, compensate only on an
//! explicit `success: false`.
//!
//! Each test drives the same path the event loop does — optimistic
//! mutation, one request, then confirm or rollback — with wiremock
//! standing in for the reader server.

use lurk::api::{ApiClient, Flag};
use lurk::app::App;
use lurk::form::FilterForm;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED: &str = r#"
    <div class="post not-read" data-id="t3_a" data-subreddit="rust">
      <a class="reddit-link" href="https://example.com/a">First</a>
    </div>
    <div class="post read-it saved" data-id="t3_b">
      <a class="reddit-link" href="https://example.com/b">Second</a>
    </div>
"#;

async fn app_against(server: &MockServer) -> App {
    let api = ApiClient::new(reqwest::Client::new(), &server.uri()).unwrap();
    let mut app = App::new(api, FilterForm::default());
    app.replace_feed(FEED.to_string());
    app
}

/// Runs one full toggle round against the mocked server: optimistic
/// flip, request, then the settle step the event handler would apply.
async fn toggle_round(app: &mut App, post_id: &str, flag: Flag) {
    let (prior, state) = app.toggle_marker(post_id, flag).unwrap();
    match app.api.toggle(flag, post_id).await {
        Ok(true) => app.confirm_marker(post_id, flag, state),
        Ok(false) => app.rollback_markers(post_id, prior),
        Err(_) => {} // transport failure: optimistic state stays
    }
}

#[tokio::test]
async fn toggle_off_to_on_confirmed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/readit/t3_a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_against(&server).await;
    toggle_round(&mut app, "t3_a", Flag::Read).await;

    assert!(app.posts[0].markers.read);
    assert!(!app.posts[0].markers.not_read);
}

#[tokio::test]
async fn toggle_on_to_off_confirmed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/readit/t3_b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
        .mount(&server)
        .await;

    let mut app = app_against(&server).await;
    assert!(app.posts[1].markers.read); // starts read
    toggle_round(&mut app, "t3_b", Flag::Read).await;

    assert!(!app.posts[1].markers.read);
    assert!(app.posts[1].markers.not_read);
}

#[tokio::test]
async fn every_flag_reverts_on_rejection() {
    for flag in [Flag::Read, Flag::Saved, Flag::Loved] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": false}"#))
            .mount(&server)
            .await;

        let mut app = app_against(&server).await;
        let before = app.posts[0].markers;
        toggle_round(&mut app, "t3_a", flag).await;

        assert_eq!(
            app.posts[0].markers, before,
            "flag {:?} did not revert to its pre-toggle state",
            flag
        );
    }
}

#[tokio::test]
async fn rejected_read_toggle_restores_not_read_too() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/readit/t3_a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": false}"#))
        .mount(&server)
        .await;

    let mut app = app_against(&server).await;

    // Optimistic step is visible before the request settles.
    let (prior, _) = app.toggle_marker("t3_a", Flag::Read).unwrap();
    assert!(app.posts[0].markers.read);
    assert!(!app.posts[0].markers.not_read);

    // Server rejects; both markers return to the snapshot.
    let success = app.api.toggle(Flag::Read, "t3_a").await.unwrap();
    assert!(!success);
    app.rollback_markers("t3_a", prior);

    assert!(!app.posts[0].markers.read);
    assert!(app.posts[0].markers.not_read);
}

#[tokio::test]
async fn transport_failure_leaves_optimistic_state() {
    // A server that is immediately shut down: connections are refused.
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let api = ApiClient::new(reqwest::Client::new(), &uri).unwrap();
    let mut app = App::new(api, FilterForm::default());
    app.replace_feed(FEED.to_string());

    toggle_round(&mut app, "t3_a", Flag::Loved).await;

    // No rollback on a transport failure: the marker keeps the
    // optimistic (possibly wrong) state.
    assert!(app.posts[0].markers.loved);
}

#[tokio::test]
async fn double_toggle_with_confirmations_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/saveit/t3_a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
        .expect(2)
        .mount(&server)
        .await;

    let mut app = app_against(&server).await;
    let before = app.posts[0].markers;

    toggle_round(&mut app, "t3_a", Flag::Saved).await;
    assert!(app.posts[0].markers.saved);
    toggle_round(&mut app, "t3_a", Flag::Saved).await;

    assert_eq!(app.posts[0].markers, before);
}
