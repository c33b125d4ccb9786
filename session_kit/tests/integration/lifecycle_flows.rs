use chrono::Duration;
use http::HeaderMap;
use serde_json::json;
use session_kit::{SessionConfig, SessionError, SessionStore, StorageError};
use uuid::Uuid;

use crate::common::mock_browser::set_cookies;
use crate::common::{MockBrowser, TestApp};

/// End-to-end session lifecycle flows
///
/// Anonymous visit → login with token rotation → logout, plus fingerprint
/// replay protection, each driven through cookies only.

/// Flow: first visit creates an anonymous session; the next visit gets the same one back
#[tokio::test]
async fn test_anonymous_visit_then_return() -> Result<(), Box<dyn std::error::Error>> {
    let app = TestApp::new(SessionConfig::default())?;
    let mut browser = MockBrowser::new();

    // Step 1: first visit without cookies
    let mut response = HeaderMap::new();
    let first = app.manager.ensure(&browser.request(), &mut response).await?;
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1, "Exactly one cookie should be set");
    assert!(cookies[0].starts_with("sid="));
    assert!(!first.is_authenticated());
    browser.receive(&response);

    // Step 2: return visit with the cookie
    let mut response = HeaderMap::new();
    let second = app.manager.ensure(&browser.request(), &mut response).await?;
    assert_eq!(second.id(), first.id(), "Same session should be returned");
    assert!(set_cookies(&response).is_empty());

    Ok(())
}

/// Flow: login rotates the token; the pre-login cookie is dead afterwards
#[tokio::test]
async fn test_login_rotates_token() -> Result<(), Box<dyn std::error::Error>> {
    let app = TestApp::new(SessionConfig::default())?;
    let mut browser = MockBrowser::new();

    // Step 1: anonymous session S1 with token T1
    let mut response = HeaderMap::new();
    let anonymous = app.manager.ensure(&browser.request(), &mut response).await?;
    browser.receive(&response);
    let pre_login = browser.clone();

    // Step 2: authenticate as U
    let user = Uuid::new_v4();
    let mut response = HeaderMap::new();
    let authenticated = app
        .manager
        .authenticate(&browser.request(), &mut response, user)
        .await?;
    browser.receive(&response);
    assert_ne!(authenticated.token, anonymous.token);

    // Step 3: the old cookie no longer resolves
    assert_eq!(
        app.manager.get(&pre_login.request()).await,
        Err(SessionError::SessionNotFound)
    );
    assert_eq!(
        app.store.get(&anonymous.token).await,
        Err(StorageError::NotFound)
    );

    // Step 4: the new cookie yields the authenticated session
    let current = app.manager.get(&browser.request()).await?;
    assert!(current.is_authenticated());
    assert_eq!(current.user_id, Some(user));

    Ok(())
}

/// Flow: a cookie replayed from another client is rejected by get and replaced by ensure
#[tokio::test]
async fn test_fingerprint_replay_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let app = TestApp::with_user_agent_fingerprint(SessionConfig::default())?;
    let mut browser = MockBrowser::with_user_agent("fp-A");

    let mut response = HeaderMap::new();
    let original = app.manager.ensure(&browser.request(), &mut response).await?;
    browser.receive(&response);

    // Same cookie, different client
    let mut attacker = browser.clone();
    attacker.set_user_agent("fp-B");

    match app.manager.get(&attacker.request()).await {
        Err(e @ SessionError::InvalidSession(_)) => assert!(e.is_client_error()),
        other => panic!("Expected InvalidSession, got {other:?}"),
    }

    let mut response = HeaderMap::new();
    let replacement = app
        .manager
        .ensure(&attacker.request(), &mut response)
        .await?;
    assert_ne!(replacement.id(), original.id());
    assert!(!replacement.is_authenticated());

    // The legitimate client is unaffected
    assert_eq!(app.manager.get(&browser.request()).await?.id(), original.id());

    Ok(())
}

/// Flow: logout expires the cookie and removes the record
#[tokio::test]
async fn test_logout_destroys_session() -> Result<(), Box<dyn std::error::Error>> {
    let app = TestApp::new(SessionConfig::default())?;
    let mut browser = MockBrowser::new();

    let mut response = HeaderMap::new();
    app.manager
        .authenticate(&browser.request(), &mut response, Uuid::new_v4())
        .await?;
    browser.receive(&response);
    let before_logout = browser.clone();

    let mut response = HeaderMap::new();
    app.manager.destroy(&browser.request(), &mut response).await?;

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("sid=;"));
    assert!(cookies[0].contains("Max-Age=0"));

    browser.receive(&response);
    assert_eq!(browser.cookie("sid"), None);

    assert_eq!(
        app.manager.get(&before_logout.request()).await,
        Err(SessionError::SessionNotFound)
    );
    assert_eq!(app.store.stats().await.total, 0);

    Ok(())
}

/// Flow: shopping-cart style data survives login
#[tokio::test]
async fn test_session_data_survives_login() -> Result<(), Box<dyn std::error::Error>> {
    let app = TestApp::new(SessionConfig::default())?;
    let mut browser = MockBrowser::new();

    let mut response = HeaderMap::new();
    app.manager
        .set(&browser.request(), &mut response, "cart", json!(["tea", "cups"]))
        .await?;
    browser.receive(&response);

    let mut response = HeaderMap::new();
    app.manager
        .authenticate(&browser.request(), &mut response, Uuid::new_v4())
        .await?;
    browser.receive(&response);

    assert_eq!(
        app.manager.get_value(&browser.request(), "cart").await,
        Some(json!(["tea", "cups"]))
    );

    Ok(())
}

/// Flow: a custom cookie name is used for every write
#[tokio::test]
async fn test_custom_cookie_name() -> Result<(), Box<dyn std::error::Error>> {
    let config = SessionConfig::default()
        .with_cookie_name("app_session")
        .with_secure_cookie(true);
    let app = TestApp::new(config)?;
    let mut browser = MockBrowser::new();

    let mut response = HeaderMap::new();
    app.manager.ensure(&browser.request(), &mut response).await?;
    let cookies = set_cookies(&response);
    assert!(cookies[0].starts_with("app_session="));
    assert!(cookies[0].contains("Secure"));

    browser.receive(&response);
    assert!(browser.cookie("app_session").is_some());
    assert!(app.manager.get(&browser.request()).await.is_ok());

    Ok(())
}

/// Flow: logging out everywhere kills sessions on every device
#[tokio::test]
async fn test_logout_everywhere() -> Result<(), Box<dyn std::error::Error>> {
    let app = TestApp::new(SessionConfig::default())?;
    let user = Uuid::new_v4();
    let mut laptop = MockBrowser::new();
    let mut phone = MockBrowser::new();

    for browser in [&mut laptop, &mut phone] {
        let mut response = HeaderMap::new();
        app.manager
            .authenticate(&browser.request(), &mut response, user)
            .await?;
        browser.receive(&response);
    }

    assert_eq!(app.manager.delete_user_sessions(user).await?, 2);
    assert!(app.manager.get(&laptop.request()).await.is_err());
    assert!(app.manager.get(&phone.request()).await.is_err());

    Ok(())
}

/// Flow: a short-lived anonymous session expires and is replaced
#[tokio::test]
async fn test_expired_session_is_replaced() -> Result<(), Box<dyn std::error::Error>> {
    let config = SessionConfig::default()
        .with_anonymous_timeouts(Duration::milliseconds(50), Duration::hours(1));
    let app = TestApp::new(config)?;
    let mut browser = MockBrowser::new();

    let mut response = HeaderMap::new();
    let first = app.manager.ensure(&browser.request(), &mut response).await?;
    browser.receive(&response);

    tokio::time::sleep(std::time::Duration::from_millis(80)).await;

    assert_eq!(
        app.manager.get(&browser.request()).await,
        Err(SessionError::SessionExpired)
    );

    let mut response = HeaderMap::new();
    let second = app.manager.ensure(&browser.request(), &mut response).await?;
    assert_ne!(second.id(), first.id());

    Ok(())
}
