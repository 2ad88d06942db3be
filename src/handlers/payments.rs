use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::Booking;
use crate::services::bookings::{self, CaptureOutcome};
use crate::services::notify;
use crate::state::AppState;

// POST /api/payments/capture
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    pub order_id: String,
    pub status: String,
    pub capture_id: Option<String>,
}

pub async fn capture_payment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CaptureRequest>,
) -> Result<Json<Booking>, AppError> {
    let outcome = CaptureOutcome {
        completed: body.status == "COMPLETED",
        capture_id: body.capture_id.clone(),
    };

    let (booking, already_captured) = {
        let db = state.db.lock().unwrap();
        bookings::capture_payment(&db, &body.order_id, &outcome)?
    };

    if !already_captured {
        notify::notify_booking_confirmed(Arc::clone(&state), booking.clone());
    }

    Ok(Json(booking))
}

// POST /api/payments/:order_id/cancel, abandons a pending online payment.
pub async fn cancel_payment(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    {
        let db = state.db.lock().unwrap();
        bookings::cancel_pending_payment(&db, &order_id)?;
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}
