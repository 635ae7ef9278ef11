use axum::{Json, extract::State};

use super::AppJson;
use crate::{
    AppState,
    errors::AppError,
    models::{PaymentIntentRequest, PaymentIntentResponse},
    payment::{self, CURRENCY},
};

/// create_payment_intent
///
/// [Public Route] Converts the fee to cents and asks the gateway for a card
/// payment intent. The client secret is relayed verbatim; nothing is stored.
#[utoipa::path(
    post,
    path = "/create-payment-intent",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Intent created", body = PaymentIntentResponse),
        (status = 400, description = "Invalid amount", body = crate::errors::ErrorBody),
        (status = 500, description = "Gateway failure", body = crate::errors::ErrorBody)
    )
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    AppJson(payload): AppJson<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, AppError> {
    let amount = payment::to_minor_units(payload.application_fees)?;
    let intent = state
        .payments
        .create_payment_intent(amount, CURRENCY)
        .await?;
    tracing::info!(intent_id = %intent.id, amount, "payment intent created");
    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}
