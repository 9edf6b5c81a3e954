mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::*;
use serde_json::{json, Value};
use tower::ServiceExt;

use stayhub::{api, domain::UserRole};

fn router(app: &TestApp) -> Router {
    api::create_app(app.ctx.clone(), app.settings.clone())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let response = router(&app)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn booking_routes_require_identity_header() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let response = router(&app)
        .oneshot(
            Request::post("/api/bookings")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_lifecycle_over_http() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let listing = create_listing(&app, &host).await;
    let router = router(&app);

    // Guest requests the stay
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/bookings")
                .header("content-type", "application/json")
                .header("x-user-id", guest.id.to_string())
                .body(Body::from(
                    json!({
                        "listing_id": listing.id,
                        "checkin_date": "2025-03-20",
                        "checkout_date": "2025-03-22",
                        "guest_count": 2
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let booking = body_json(response).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();
    assert_eq!(booking["status"], "requested");
    assert_eq!(booking["pricing"]["total"], 1_207_500);

    // A guest cannot hit the host decision route
    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/api/bookings/{booking_id}/host-accept"))
                .header("content-type", "application/json")
                .header("x-user-id", guest.id.to_string())
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The host accepts
    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/api/bookings/{booking_id}/host-accept"))
                .header("content-type", "application/json")
                .header("x-user-id", host.id.to_string())
                .body(Body::from(json!({ "expires_in_minutes": 30 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "awaiting_payment");

    // Guest initiates payment
    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/api/bookings/{booking_id}/pay/initiate"))
                .header("content-type", "application/json")
                .header("x-user-id", guest.id.to_string())
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let initiation = body_json(response).await;
    let order_code = initiation["order_code"].as_str().unwrap().to_string();
    assert!(initiation["checkout_url"].as_str().unwrap().contains(&order_code));

    // Signed provider webhook lands without any identity header
    let webhook_body = success_webhook(&order_code);
    let signature = sign_body(&webhook_body);
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/bookings/webhook")
                .header("content-type", "application/json")
                .header("x-payos-signature", signature)
                .body(Body::from(webhook_body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ok"], true);

    // Tampered signature is a 400
    let webhook_body = success_webhook(&order_code);
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/bookings/webhook")
                .header("content-type", "application/json")
                .header("x-payos-signature", "deadbeef")
                .body(Body::from(webhook_body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The booking is paid, visible to the guest
    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/api/bookings/{booking_id}"))
                .header("x-user-id", guest.id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let paid = body_json(response).await;
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["payment"]["status"], "succeeded");
}

#[tokio::test]
async fn admin_routes_reject_non_admins() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest = create_user(&app, UserRole::Guest, false).await;
    let admin = create_user(&app, UserRole::Admin, false).await;
    let router = router(&app);

    let response = router
        .clone()
        .oneshot(
            Request::get("/admin/payouts/batch/latest")
                .header("x-user-id", guest.id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .clone()
        .oneshot(
            Request::get("/admin/payouts/batch/latest")
                .header("x-user-id", admin.id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let batch = body_json(response).await;
    assert_eq!(batch["month"], 2);
    assert_eq!(batch["year"], 2025);
}
