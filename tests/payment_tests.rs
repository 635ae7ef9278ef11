use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use scholarship_portal::payment::{
    MockPaymentGateway, PaymentError, PaymentGateway, StripeGateway, to_minor_units,
};
use serde_json::json;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;

// --- Fake Stripe API ---

#[derive(Clone, Default)]
struct FakeStripe {
    decline: bool,
    seen: Arc<Mutex<Vec<(Option<String>, HashMap<String, String>)>>>,
}

async fn create_intent(
    State(fake): State<FakeStripe>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    fake.seen.lock().unwrap().push((auth, form.clone()));

    if fake.decline {
        return (
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({ "error": { "message": "Your card was declined." } })),
        )
            .into_response();
    }

    let amount: i64 = form["amount"].parse().unwrap();
    Json(json!({
        "id": "pi_test_123",
        "object": "payment_intent",
        "client_secret": "pi_test_123_secret_abc",
        "amount": amount,
        "currency": form["currency"],
        "status": "requires_payment_method"
    }))
    .into_response()
}

async fn spawn_fake_stripe(fake: FakeStripe) -> String {
    let router = Router::new()
        .route("/v1/payment_intents", post(create_intent))
        .with_state(fake);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://127.0.0.1:{port}")
}

// --- Stripe Client ---

#[tokio::test]
async fn test_stripe_gateway_sends_form_request() {
    let fake = FakeStripe::default();
    let base = spawn_fake_stripe(fake.clone()).await;
    let gateway = StripeGateway::new(&base, "sk_test_abc");

    let intent = gateway.create_payment_intent(1999, "usd").await.unwrap();

    assert_eq!(intent.client_secret, "pi_test_123_secret_abc");
    assert_eq!(intent.amount, 1999);

    let seen = fake.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (auth, form) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk_test_abc"));
    assert_eq!(form["amount"], "1999");
    assert_eq!(form["currency"], "usd");
    assert_eq!(form["payment_method_types[]"], "card");
}

#[tokio::test]
async fn test_stripe_gateway_surfaces_decline() {
    let fake = FakeStripe {
        decline: true,
        ..FakeStripe::default()
    };
    let base = spawn_fake_stripe(fake).await;
    let gateway = StripeGateway::new(&format!("{base}/"), "sk_test_abc");

    let result = gateway.create_payment_intent(500, "usd").await;

    match result {
        Err(PaymentError::Gateway(message)) => {
            assert!(message.contains("Your card was declined."));
        }
        other => panic!("expected a gateway error, got {other:?}"),
    }
}

// --- Mock Gateway ---

#[tokio::test]
async fn test_mock_gateway_records_requests() {
    let mock = MockPaymentGateway::new();

    mock.create_payment_intent(100, "usd").await.unwrap();
    mock.create_payment_intent(250, "usd").await.unwrap();

    assert_eq!(
        mock.requests(),
        vec![(100, "usd".to_string()), (250, "usd".to_string())]
    );
}

#[tokio::test]
async fn test_mock_gateway_failure() {
    let mock = MockPaymentGateway::new_failing();
    let result = mock.create_payment_intent(100, "usd").await;
    assert!(matches!(result, Err(PaymentError::Gateway(_))));
}

// --- Minor Units ---

#[test]
fn test_minor_units_absorb_float_noise() {
    assert_eq!(to_minor_units(19.99).unwrap(), 1999);
    assert_eq!(to_minor_units(0.29).unwrap(), 29);
    assert_eq!(to_minor_units(1.15).unwrap(), 115);
}

#[test]
fn test_minor_units_truncate_fractions_of_a_cent() {
    assert_eq!(to_minor_units(10.009).unwrap(), 1000);
    assert_eq!(to_minor_units(0.0).unwrap(), 0);
    assert_eq!(to_minor_units(25.0).unwrap(), 2500);
}

#[test]
fn test_minor_units_reject_invalid_amounts() {
    assert!(matches!(
        to_minor_units(-0.01),
        Err(PaymentError::InvalidAmount(_))
    ));
    assert!(to_minor_units(f64::NAN).is_err());
    assert!(to_minor_units(f64::INFINITY).is_err());
}
