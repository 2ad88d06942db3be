use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::errors::AppError;
use crate::models::{Booking, BookedBy, PaymentStatus};
use crate::services::bookings::{self, NewBooking};
use crate::state::AppState;

// POST /api/bookings/check, validates a request without reserving anything.
pub async fn check_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewBooking>,
) -> Result<Json<serde_json::Value>, AppError> {
    let today = Utc::now().date_naive();
    {
        let db = state.db.lock().unwrap();
        bookings::check_booking(&db, &body, today)?;
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

// POST /api/bookings, customer-facing create; payment is captured later by
// order reference, so the booking starts out pending.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let today = Utc::now().date_naive();
    let booking = {
        let db = state.db.lock().unwrap();
        bookings::create_booking(
            &db,
            &body,
            BookedBy::Customer,
            PaymentStatus::Pending,
            today,
        )?
    };
    Ok((StatusCode::CREATED, Json(booking)))
}
