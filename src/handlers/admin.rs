use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookedBy, PaymentMethod, PaymentStatus};
use crate::services::bookings::{self, BookingPatch, NewBooking};
use crate::services::{allocator, notify};
use crate::state::AppState;

use super::check_auth;

// GET /api/admin/bookings?page=&limit=&search=
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsPage {
    pub bookings: Vec<Booking>,
    pub total_bookings: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<BookingsPage>, AppError> {
    check_auth(&headers, &state.config)?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let search = query.search.as_deref().filter(|s| !s.is_empty());

    let (bookings, total) = {
        let db = state.db.lock().unwrap();
        let bookings = queries::list_bookings(&db, search, limit, (page - 1) * limit)?;
        let total = queries::count_bookings(&db, search)?;
        (bookings, total)
    };

    Ok(Json(BookingsPage {
        bookings,
        total_bookings: total,
        total_pages: (total + limit - 1) / limit,
        current_page: page,
    }))
}

// GET /api/admin/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config)?;

    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, &id)?
    }
    .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    Ok(Json(booking))
}

// POST /api/admin/bookings, an offline booking paid in cash, no capture step.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    check_auth(&headers, &state.config)?;

    let mut input = body;
    input.payment_method = Some(PaymentMethod::Cash.as_str().to_string());

    let today = Utc::now().date_naive();
    let booking = {
        let db = state.db.lock().unwrap();
        bookings::create_booking(&db, &input, BookedBy::Admin, PaymentStatus::Completed, today)?
    };

    notify::notify_booking_confirmed(Arc::clone(&state), booking.clone());

    Ok((StatusCode::CREATED, Json(booking)))
}

// PUT /api/admin/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<BookingPatch>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config)?;

    let today = Utc::now().date_naive();
    let booking = {
        let db = state.db.lock().unwrap();
        bookings::update_booking(&db, &id, &patch, today)?
    };
    Ok(Json(booking))
}

// DELETE /api/admin/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config)?;

    {
        let db = state.db.lock().unwrap();
        bookings::cancel_booking(&db, &id)?;
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

// POST /api/admin/slots/block and /api/admin/slots/unblock
#[derive(Deserialize)]
pub struct SlotSelection {
    pub date: String,
    pub slots: Vec<String>,
}

fn parse_selection(body: &SlotSelection) -> Result<NaiveDate, AppError> {
    if body.slots.is_empty() {
        return Err(AppError::Validation(
            "please provide a date and an array of slots".to_string(),
        ));
    }
    NaiveDate::parse_from_str(&body.date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("invalid date format, expected YYYY-MM-DD".to_string()))
}

pub async fn block_slots(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SlotSelection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor_id = check_auth(&headers, &state.config)?;
    let date = parse_selection(&body)?;

    // All requested slots block together or not at all.
    {
        let db = state.db.lock().unwrap();
        let tx = db.unchecked_transaction()?;
        for slot in &body.slots {
            allocator::block(&tx, date, slot, &actor_id)?;
        }
        tx.commit()?;
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn unblock_slots(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SlotSelection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor_id = check_auth(&headers, &state.config)?;
    let date = parse_selection(&body)?;

    {
        let db = state.db.lock().unwrap();
        let tx = db.unchecked_transaction()?;
        for slot in &body.slots {
            allocator::unblock(&tx, date, slot, &actor_id)?;
        }
        tx.commit()?;
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}
