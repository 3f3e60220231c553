mod common;

use anyhow::Result;
use reqwest::StatusCode;

/// GET /login/ issues a fresh CSRF token and pins a session cookie.
#[tokio::test]
async fn login_page_issues_csrf_token_and_session_cookie() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/login/", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let set_cookie = res
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(set_cookie.contains("catalog_session="), "missing session cookie: {}", set_cookie);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    let token = body["data"]["csrf_token"].as_str().unwrap_or_default();
    assert_eq!(token.len(), 32);
    assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    Ok(())
}

/// Two renders of a mutating form yield different tokens (last-issued-wins).
#[tokio::test]
async fn reissued_tokens_differ() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::builder().cookie_store(true).build()?;

    let first = client
        .get(format!("{}/login/", server.base_url))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    let second = client
        .get(format!("{}/login/", server.base_url))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;

    assert_ne!(first["data"]["csrf_token"], second["data"]["csrf_token"]);
    Ok(())
}

/// Mutations without a logged-in session are refused before anything else.
#[tokio::test]
async fn unauthenticated_mutations_are_refused() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/category/new/", server.base_url))
        .json(&serde_json::json!({ "name": "Books", "csrf_token": "whatever" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let res = client
        .post(format!("{}/category/1/delete", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/item/1/delete", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

/// The OAuth callback refuses a state token that was never issued to the
/// session.
#[tokio::test]
async fn gconnect_with_foreign_state_token_is_refused() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::builder().cookie_store(true).build()?;

    // Establish a session and a real token, then submit a different one.
    let res = client
        .get(format!("{}/login/", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/gconnect?state=not-the-issued-token", server.base_url))
        .body("fake-authorization-code")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "CSRF_MISMATCH");
    Ok(())
}
