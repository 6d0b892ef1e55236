mod common;

use axum::extract::State;
use cafe_orders_api::routes::health::health_check;

#[tokio::test]
async fn health_check_reports_database_and_sms_mode() -> anyhow::Result<()> {
    let state = common::setup_state().await?;

    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");

    let data = serde_json::to_value(response.0.data.expect("health data"))?;
    assert_eq!(data["status"], "healthy");
    assert_eq!(data["database"], "connected");
    assert_eq!(data["environment"], "development");
    assert_eq!(data["sms"], "local");
    Ok(())
}
