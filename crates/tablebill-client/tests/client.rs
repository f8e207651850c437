//! Client tests against a mocked tablebill service.

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tablebill_client::{
    ActivateSubscriptionRequest, ChangePlanRequest, ClientError, ClientOptions,
    ProrationPreviewRequest, TablebillClient,
};
use tablebill_core::{BillingCycle, CurrencyCode, Money, PlanId, SubscriberId};

const API_KEY: &str = "test-service-key";
const SUBSCRIBER: &str = "6f1c1f8e-2f44-4a7b-9b0e-3d2a1c5e7f90";

fn client(server: &MockServer) -> TablebillClient {
    TablebillClient::with_options(
        server.uri(),
        API_KEY,
        ClientOptions::with_service_name("dashboard"),
    )
    .unwrap()
}

fn subscriber() -> SubscriberId {
    SUBSCRIBER.parse().unwrap()
}

/// A January period whose plan took effect at `effective_from`.
fn period_json(id: &str, revision: u32, plan_id: &str, effective_from: &str) -> serde_json::Value {
    json!({
        "id": id,
        "subscriber_id": SUBSCRIBER,
        "revision": revision,
        "supersedes": null,
        "plan_id": plan_id,
        "cycle": "monthly",
        "currency": "USD",
        "start": "2025-01-01T00:00:00Z",
        "end": "2025-02-01T00:00:00Z",
        "effective_from": effective_from,
        "created_at": effective_from,
        "price_minor": 7900,
        "price_formatted": "$79.00",
    })
}

fn upgrade_proration_json() -> serde_json::Value {
    json!({
        "currency": "USD",
        "current_plan_price": 2900,
        "new_plan_price": 7900,
        "unused_credit": 1450,
        "new_plan_cost": 3950,
        "proration_amount": 2500,
        "remaining_fraction": 0.5,
        "is_upgrade": true,
        "is_downgrade": false,
        "message": "You will be charged $25.00 today for the upgrade, covering the rest of your current billing period.",
        "amount_formatted": "$25.00",
        "calculated_at": "2025-01-16T12:00:00Z",
    })
}

fn error_json(code: &str, message: &str, details: serde_json::Value) -> serde_json::Value {
    json!({ "error": { "code": code, "message": message, "details": details } })
}

#[tokio::test]
async fn list_plans_sends_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/plans"))
        .and(header("x-api-key", API_KEY))
        .and(header("x-service-name", "dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "plans": [{
                "plan_id": "starter",
                "name": "Starter",
                "prices": [{
                    "currency": "USD",
                    "monthly_minor": 2900,
                    "yearly_minor": 29000,
                    "monthly_formatted": "$29.00",
                    "yearly_formatted": "$290.00",
                    "yearly_discount_percent": 16,
                }],
            }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let plans = client(&server).list_plans().await.unwrap();

    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].plan_id, PlanId::new("starter"));
    let usd = plans[0].price_in(CurrencyCode::USD).unwrap();
    assert_eq!(usd.monthly_minor, 2900);
    assert_eq!(usd.yearly_discount_percent, Some(16));
    assert!(plans[0].price_in(CurrencyCode::EUR).is_none());
}

#[tokio::test]
async fn preview_proration_round_trips_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/proration/preview"))
        .and(body_json(json!({
            "current_plan": "starter",
            "new_plan": "pro",
            "current_cycle": "monthly",
            "currency": "USD",
            "period_start": "2025-01-01T00:00:00Z",
            "period_end": "2025-01-31T00:00:00Z",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(upgrade_proration_json()))
        .mount(&server)
        .await;

    let request = ProrationPreviewRequest {
        current_plan: PlanId::new("starter"),
        new_plan: PlanId::new("pro"),
        current_cycle: BillingCycle::Monthly,
        new_cycle: None,
        currency: CurrencyCode::USD,
        period_start: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        period_end: Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap(),
        now: None,
    };

    let proration = client(&server).preview_proration(&request).await.unwrap();

    assert_eq!(proration.amount(), Money::new(2500, CurrencyCode::USD));
    assert!(proration.result.is_upgrade);
    assert_eq!(proration.amount_formatted, "$25.00");
}

#[tokio::test]
async fn unknown_currency_maps_to_typed_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/proration/preview"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_json(
            "unknown_currency",
            "plan pro has no price in JPY",
            json!({ "plan_id": "pro", "currency": "JPY" }),
        )))
        .mount(&server)
        .await;

    let request = ProrationPreviewRequest {
        current_plan: PlanId::new("starter"),
        new_plan: PlanId::new("pro"),
        current_cycle: BillingCycle::Monthly,
        new_cycle: None,
        currency: CurrencyCode::JPY,
        period_start: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        period_end: Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap(),
        now: None,
    };

    let err = client(&server).preview_proration(&request).await.unwrap_err();

    match err {
        ClientError::UnknownCurrency { plan_id, currency } => {
            assert_eq!(plan_id, "pro");
            assert_eq!(currency, "JPY");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn activate_subscription_returns_period() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/subscriptions"))
        .and(body_json(json!({
            "subscriber_id": SUBSCRIBER,
            "plan_id": "pro",
            "cycle": "monthly",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(period_json(
            "01JGQ5Z9Y8X7W6V5T4S3R2Q1P0",
            1,
            "pro",
            "2025-01-01T00:00:00Z",
        )))
        .mount(&server)
        .await;

    let request = ActivateSubscriptionRequest {
        subscriber_id: subscriber(),
        plan_id: PlanId::new("pro"),
        cycle: Some(BillingCycle::Monthly),
        currency: None,
    };

    let period = client(&server).activate_subscription(&request).await.unwrap();

    assert_eq!(period.period.revision, 1);
    assert_eq!(period.period.subscriber_id, subscriber());
    assert_eq!(
        period.period.end,
        Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(period.price_formatted.as_deref(), Some("$79.00"));
}

#[tokio::test]
async fn get_subscription_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/subscriptions/{SUBSCRIBER}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(error_json(
            "not_found",
            "no subscription",
            serde_json::Value::Null,
        )))
        .mount(&server)
        .await;

    let err = client(&server)
        .get_subscription(&subscriber())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::NotFound { .. }));
}

#[tokio::test]
async fn list_periods_passes_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/subscriptions/{SUBSCRIBER}/periods")))
        .and(query_param("limit", "1"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "periods": [period_json(
                "01JGQ5Z9Y8X7W6V5T4S3R2Q1P1",
                2,
                "pro",
                "2025-01-16T12:00:00Z",
            )],
            "has_more": true,
        })))
        .mount(&server)
        .await;

    let page = client(&server)
        .list_periods(&subscriber(), 1, 0)
        .await
        .unwrap();

    assert_eq!(page.periods.len(), 1);
    assert_eq!(page.periods[0].revision, 2);
    assert!(page.has_more);
}

#[tokio::test]
async fn change_plan_returns_proration_and_new_period() {
    let server = MockServer::start().await;
    let previous = "01JGQ5Z9Y8X7W6V5T4S3R2Q1P0";
    let mut period = period_json("01JGQ5Z9Y8X7W6V5T4S3R2Q1P1", 2, "pro", "2025-01-16T12:00:00Z");
    period["supersedes"] = json!(previous);

    Mock::given(method("POST"))
        .and(path(format!("/v1/subscriptions/{SUBSCRIBER}/change")))
        .and(body_json(json!({ "plan_id": "pro" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "proration": upgrade_proration_json(),
            "previous_period_id": previous,
            "period": period,
        })))
        .mount(&server)
        .await;

    let change = client(&server)
        .change_plan(&subscriber(), &ChangePlanRequest::to_plan("pro"))
        .await
        .unwrap();

    assert_eq!(change.proration.result.proration_amount, 2500);
    assert_eq!(change.previous_period_id.to_string(), previous);
    assert_eq!(change.period.period.supersedes, Some(change.previous_period_id));
    assert_eq!(change.period.period.plan_id, PlanId::new("pro"));
    assert_eq!(
        change.period.period.start,
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(
        change.period.period.effective_from,
        Utc.with_ymd_and_hms(2025, 1, 16, 12, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn preview_change_sends_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/subscriptions/{SUBSCRIBER}/change/preview")))
        .and(body_json(json!({ "plan_id": "starter", "cycle": "yearly" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(upgrade_proration_json()))
        .expect(1)
        .mount(&server)
        .await;

    let request = ChangePlanRequest::to_plan("starter").with_cycle(BillingCycle::Yearly);
    client(&server)
        .preview_change(&subscriber(), &request)
        .await
        .unwrap();
}

#[tokio::test]
async fn renew_too_early_is_a_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/subscriptions/{SUBSCRIBER}/renew")))
        .respond_with(ResponseTemplate::new(409).set_body_json(error_json(
            "conflict",
            "current period runs until 2025-02-01T00:00:00+00:00",
            serde_json::Value::Null,
        )))
        .mount(&server)
        .await;

    let err = client(&server).renew(&subscriber()).await.unwrap_err();

    match err {
        ClientError::Conflict { message } => assert!(message.contains("2025-02-01")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn rejected_api_key_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/plans"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_json(
            "unauthorized",
            "unauthorized",
            serde_json::Value::Null,
        )))
        .mount(&server)
        .await;

    let err = client(&server).list_plans().await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized));
}

#[tokio::test]
async fn non_json_error_falls_back_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/plans"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server).list_plans().await.unwrap_err();

    match err {
        ClientError::Api { code, status, .. } => {
            assert_eq!(code, "unknown");
            assert_eq!(status, 502);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
