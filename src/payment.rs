use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Every intent is charged in US dollars.
pub const CURRENCY: &str = "usd";

/// PaymentError
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    InvalidAmount(String),
    #[error("{0}")]
    Gateway(String),
}

/// to_minor_units
///
/// Converts a decimal fee to the gateway's integer minor units (cents),
/// truncating fractions of a cent. The product is first rounded to 1e-6 so
/// binary representation noise does not cost a cent: 19.99 * 100 evaluates to
/// 1998.9999999999998 and must still charge 1999.
pub fn to_minor_units(amount: f64) -> Result<i64, PaymentError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(PaymentError::InvalidAmount(
            "applicationFees must be a non-negative number".to_string(),
        ));
    }
    let cents = ((amount * 100.0 * 1e6).round() / 1e6).trunc();
    if cents > i64::MAX as f64 {
        return Err(PaymentError::InvalidAmount(
            "applicationFees is too large".to_string(),
        ));
    }
    Ok(cents as i64)
}

/// PaymentIntent
///
/// The subset of the gateway's intent object the API relays.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
}

// 1. PaymentGateway Contract
/// PaymentGateway
///
/// Abstract contract for the external payment processor, so handlers can be
/// exercised against [`MockPaymentGateway`] without network access.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Requests a card payment intent for `amount` minor units of `currency`.
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError>;
}

// 2. The Real Implementation (Stripe)
/// StripeGateway
///
/// Talks to the Stripe REST API with form-encoded requests authenticated by
/// the secret key. The base URL is configurable so tests can point it at a
/// local stand-in.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: String,
}

impl StripeGateway {
    pub fn new(api_base: &str, secret_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let url = format!("{}/v1/payment_intents", self.api_base);
        let amount_field = amount.to_string();
        let form = [
            ("amount", amount_field.as_str()),
            ("currency", currency),
            ("payment_method_types[]", "card"),
        ];

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<StripeErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "unreadable error body".to_string());
            return Err(PaymentError::Gateway(format!("{status}: {message}")));
        }

        response
            .json::<PaymentIntent>()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))
    }
}

// 3. The Mock Implementation (For Tests)
/// MockPaymentGateway
///
/// Records every requested (amount, currency) pair and answers with a
/// deterministic client secret.
#[derive(Default)]
pub struct MockPaymentGateway {
    /// When true, every request fails with a gateway error.
    pub should_fail: bool,
    requests: Mutex<Vec<(i64, String)>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Every (amount, currency) pair requested so far, oldest first.
    pub fn requests(&self) -> Vec<(i64, String)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((amount, currency.to_string()));

        if self.should_fail {
            return Err(PaymentError::Gateway(
                "Mock Gateway Error: Simulation requested".to_string(),
            ));
        }

        Ok(PaymentIntent {
            id: format!("pi_mock_{amount}"),
            client_secret: format!("pi_mock_{amount}_secret_{currency}"),
            amount,
            currency: currency.to_string(),
        })
    }
}

/// PaymentState
///
/// The concrete type used to share the gateway across the application state.
pub type PaymentState = Arc<dyn PaymentGateway>;
