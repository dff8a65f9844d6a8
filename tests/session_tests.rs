//! Session store tests: resolution, refresh, logout

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum_extra::extract::CookieJar;

use common::{jar_for_grant, store, MockProvider};
use porchlight::auth::cookies::{ACCESS_COOKIE, LEGACY_COOKIE_NAMES, REFRESH_COOKIE};

#[tokio::test]
async fn test_resolve_without_cookies_is_anonymous() {
    let provider = Arc::new(MockProvider::new("me@example.com"));
    let store = store(&provider);

    let (_jar, session) = store.resolve(CookieJar::new()).await;
    assert!(session.is_none());
}

#[tokio::test]
async fn test_resolve_valid_cookies() {
    let provider = Arc::new(MockProvider::new("me@example.com"));
    let store = store(&provider);
    let grant = provider.issue_grant();

    let (_jar, session) = store.resolve(jar_for_grant(&grant)).await;
    let session = session.expect("valid cookies should resolve");
    assert_eq!(session.user.email, "me@example.com");
    assert_eq!(session.access_token, grant.access_token);
}

#[tokio::test]
async fn test_session_survives_cookie_round_trip() {
    let provider = Arc::new(MockProvider::new("me@example.com"));
    let store = store(&provider);
    let grant = provider.issue_grant();

    // First page load
    let (jar, session) = store.resolve(jar_for_grant(&grant)).await;
    let session = session.expect("first resolve");

    // Simulated reload: the browser sends back whatever the last response
    // set; no login prompt should be needed
    let jar = store.write_session(jar, &session);
    let (_jar, again) = store.resolve(jar).await;
    assert_eq!(again.expect("second resolve").user.email, "me@example.com");
}

#[tokio::test]
async fn test_revoked_access_token_refreshes() {
    let provider = Arc::new(MockProvider::new("me@example.com"));
    let store = store(&provider);
    let grant = provider.issue_grant();
    provider.revoke_access(&grant.access_token);

    let (jar, session) = store.resolve(jar_for_grant(&grant)).await;
    let session = session.expect("refresh should recover the session");
    assert_ne!(session.access_token, grant.access_token);

    // The rewritten cookies carry the new pair
    assert_eq!(
        jar.get(ACCESS_COOKIE).map(|c| c.value().to_string()),
        Some(session.access_token.clone())
    );
    assert_eq!(
        jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()),
        Some(session.refresh_token.clone())
    );
}

#[tokio::test]
async fn test_dead_refresh_token_is_anonymous() {
    let provider = Arc::new(MockProvider::new("me@example.com"));
    let store = store(&provider);
    let grant = provider.issue_grant();
    provider.revoke_access(&grant.access_token);

    // Burn the refresh token too
    provider.revoke_refresh(&grant.refresh_token);

    let (_jar, session) = store.resolve(jar_for_grant(&grant)).await;
    assert!(session.is_none());
}

#[tokio::test]
async fn test_provider_outage_fails_closed() {
    let provider = Arc::new(MockProvider::new("me@example.com"));
    let store = store(&provider);
    let grant = provider.issue_grant();

    provider.fail_network.store(true, Ordering::SeqCst);
    let (_jar, session) = store.resolve(jar_for_grant(&grant)).await;
    assert!(session.is_none(), "network failure must never authenticate");
}

#[tokio::test]
async fn test_logout_clears_all_cookie_names() {
    let provider = Arc::new(MockProvider::new("me@example.com"));
    let store = store(&provider);
    let grant = provider.issue_grant();

    let jar = store.logout(jar_for_grant(&grant)).await;

    // Primary and legacy names all come back as expired removals
    for name in [ACCESS_COOKIE, REFRESH_COOKIE].iter().chain(LEGACY_COOKIE_NAMES) {
        let cookie = jar.get(name).expect("removal cookie must be present");
        assert_eq!(cookie.value(), "", "{} should be cleared", name);
    }

    assert_eq!(provider.sign_out_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_logout_revokes_globally() {
    let provider = Arc::new(MockProvider::new("me@example.com"));
    let store = store(&provider);
    let here = provider.issue_grant();
    let other_device = provider.issue_grant();

    store.logout(jar_for_grant(&here)).await;

    // The other device's cookies are dead too
    let (_jar, session) = store.resolve(jar_for_grant(&other_device)).await;
    assert!(session.is_none());
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let provider = Arc::new(MockProvider::new("me@example.com"));
    let store = store(&provider);
    let grant = provider.issue_grant();

    let jar = store.logout(jar_for_grant(&grant)).await;
    let jar = store.logout(jar).await;

    assert_eq!(jar.get(ACCESS_COOKIE).map(|c| c.value().to_string()), Some(String::new()));

    let (_jar, session) = store.resolve(jar).await;
    assert!(session.is_none());
}

#[tokio::test]
async fn test_logout_without_session_still_clears() {
    let provider = Arc::new(MockProvider::new("me@example.com"));
    let store = store(&provider);

    let jar = store.logout(CookieJar::new()).await;
    assert!(jar.get(ACCESS_COOKIE).is_some());
    // Nothing to revoke upstream
    assert_eq!(provider.sign_out_calls.load(Ordering::SeqCst), 0);
}
