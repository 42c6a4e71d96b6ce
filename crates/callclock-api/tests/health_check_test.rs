//! Health and liveness endpoint tests.

use anyhow::Result;
use axum::http::{Method, StatusCode};
use callclock_testing::TestEnv;

#[tokio::test]
async fn health_check_returns_success_when_store_is_up() -> Result<()> {
    let env = TestEnv::new();

    let response = env.request(Method::GET, "/health").await?;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json()?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["store"]["status"], "up");
    assert_eq!(body["checks"]["store"]["backend"], "memory");
    assert!(body["checks"]["store"].get("message").is_none());
    assert!(body["version"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_check_reports_unavailable_store() -> Result<()> {
    let env = TestEnv::new();
    env.store.fail_reads(true);

    let response = env.request(Method::GET, "/health").await?;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    let body = response.json()?;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["store"]["status"], "down");
    assert!(body["checks"]["store"]["message"]
        .as_str()
        .is_some_and(|message| message.starts_with("Store unavailable")));
    Ok(())
}

#[tokio::test]
async fn liveness_ignores_store_state() -> Result<()> {
    let env = TestEnv::new();
    env.store.fail_reads(true);

    let response = env.request(Method::GET, "/live").await?;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json()?;
    assert_eq!(body["status"], "alive");
    assert_eq!(body["service"], "callclock");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_not_found() -> Result<()> {
    let env = TestEnv::new();

    let response = env.request(Method::GET, "/webhooks").await?;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    Ok(())
}
