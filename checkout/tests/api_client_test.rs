//! HTTP client behaviour against a local mock server.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use serde_json::json;
use std::time::Duration;
use std::sync::Arc;
use storefront_checkout::api::{ApiErrorDetail, PromoCodeCheck};
use storefront_checkout::types::OrderRequestItem;
use storefront_checkout::{
    ApiError, EventId, Money, OrderId, OrderRequest, PaymentMethod, PaymentStatus, PromoCodeValidator,
    PromoError, StorefrontApi, StorefrontClient, TicketTypeId,
};
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> StorefrontClient {
    StorefrontClient::new(format!("{}/api", server.uri()), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn fetch_order_decodes_camel_case() {
    let server = MockServer::start().await;
    let order_id = OrderId::new();
    let type_id = TicketTypeId::new();

    Mock::given(method("GET"))
        .and(path(format!("/api/orders/{order_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": order_id.to_string(),
            "items": [{
                "typeId": type_id.to_string(),
                "quantity": 2,
                "ticketTitle": "General",
                "finalPrice": 40.0
            }],
            "totalAmount": 40.0,
            "paymentStatus": "PAID",
            "paymentMethod": "CARD",
            "createdAt": "2025-01-01T10:00:00Z",
            "event": { "title": "Spring Gala", "venue": "Main Hall" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let order = client_for(&server).fetch_order(&order_id).await.unwrap();

    assert_eq!(order.id, order_id);
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.total_amount, Money::from_dollars(40));
    assert_eq!(order.items[0].type_id, type_id);
    assert_eq!(
        order.event.unwrap().title.as_deref(),
        Some("Spring Gala")
    );
}

#[tokio::test]
async fn numeric_order_ids_are_accepted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/orders/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "items": [{ "typeId": 5, "quantity": 1, "finalPrice": 25 }],
            "totalAmount": 25,
            "paymentStatus": "PENDING"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let order = client_for(&server).fetch_order(&OrderId::from(42)).await.unwrap();

    assert_eq!(order.id, OrderId::from(42));
    assert_eq!(order.items[0].type_id, TicketTypeId::from(5));
    assert_eq!(order.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn create_order_posts_request_body() {
    let server = MockServer::start().await;
    let order_id = OrderId::new();
    let event_id = EventId::new();
    let type_id = TicketTypeId::new();

    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(body_json(json!({
            "eventId": event_id.to_string(),
            "paymentMethod": "CARD",
            "items": [{
                "typeId": type_id.to_string(),
                "quantity": 2,
                "ticketTitle": "General"
            }],
            "promoCode": "SPRING20"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": order_id.to_string(),
            "totalAmount": "40.00",
            "paymentStatus": "PENDING"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = OrderRequest {
        event_id,
        payment_method: PaymentMethod::new("CARD"),
        items: vec![OrderRequestItem {
            type_id,
            quantity: 2,
            ticket_title: "General".to_string(),
        }],
        promo_code: Some("SPRING20".to_string()),
    };

    let order = client_for(&server).create_order(request).await.unwrap();

    assert_eq!(order.id, order_id);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert!(order.items.is_empty());
}

#[tokio::test]
async fn rejection_carries_error_entries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "errors": [
                { "code": "SOLD_OUT", "message": "General is sold out" }
            ]
        })))
        .mount(&server)
        .await;

    let request = OrderRequest {
        event_id: EventId::new(),
        payment_method: PaymentMethod::new("CARD"),
        items: vec![],
        promo_code: None,
    };

    let error = client_for(&server).create_order(request).await.unwrap_err();

    assert_eq!(
        error,
        ApiError::Rejected {
            status: 409,
            errors: vec![ApiErrorDetail::coded("SOLD_OUT", "General is sold out")],
        }
    );
}

#[tokio::test]
async fn plain_text_server_error_is_kept_as_message() {
    let server = MockServer::start().await;
    let order_id = OrderId::new();

    Mock::given(method("GET"))
        .and(path(format!("/api/orders/{order_id}")))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway"))
        .mount(&server)
        .await;

    let error = client_for(&server).fetch_order(&order_id).await.unwrap_err();

    assert_eq!(error.status(), Some(502));
    assert_eq!(error.messages(), vec!["Bad gateway"]);
}

#[tokio::test]
async fn malformed_success_body_is_a_parse_failure() {
    let server = MockServer::start().await;
    let order_id = OrderId::new();

    Mock::given(method("GET"))
        .and(path(format!("/api/orders/{order_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": order_id.to_string(),
            "paymentStatus": "SETTLED"
        })))
        .mount(&server)
        .await;

    let error = client_for(&server).fetch_order(&order_id).await.unwrap_err();

    assert!(matches!(error, ApiError::ResponseParseFailed(_)));
}

#[tokio::test]
async fn slow_server_hits_request_timeout() {
    let server = MockServer::start().await;
    let order_id = OrderId::new();

    Mock::given(method("GET"))
        .and(path(format!("/api/orders/{order_id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client =
        StorefrontClient::new(format!("{}/api", server.uri()), Duration::from_millis(200)).unwrap();
    let error = client.fetch_order(&order_id).await.unwrap_err();

    assert!(matches!(error, ApiError::RequestFailed(_)));
}

#[tokio::test]
async fn promo_validation_round_trip() {
    let server = MockServer::start().await;
    let event_id = EventId::new();

    Mock::given(method("POST"))
        .and(path("/api/promo-codes/validate"))
        .and(body_partial_json(json!({ "code": "SPRING20" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promoCode": { "code": "SPRING20", "discountPercent": 20 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/promo-codes/validate"))
        .and(body_partial_json(json!({ "code": "OLDCODE" })))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [{ "code": "PROMO_CODE_NOT_APPLICABLE", "message": "Not valid for this event" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/promo-codes/validate"))
        .and(body_partial_json(json!({ "code": "MISSING" })))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let api: Arc<dyn StorefrontApi> = Arc::new(client_for(&server));
    let validator = PromoCodeValidator::new(api.clone());

    let discount = validator.validate(&event_id, " SPRING20 ").await.unwrap();
    assert!((discount.percent() - 20.0).abs() < 1e-9);

    assert_eq!(
        validator.validate(&event_id, "OLDCODE").await,
        Err(PromoError::NotApplicableToEvent)
    );
    assert_eq!(
        validator.validate(&event_id, "MISSING").await,
        Err(PromoError::NotFound)
    );

    // Raw check goes through the same endpoint.
    let raw = api
        .validate_promo_code(PromoCodeCheck {
            event_id,
            code: "MISSING".to_string(),
        })
        .await;
    assert_eq!(raw.unwrap_err().status(), Some(404));
}
