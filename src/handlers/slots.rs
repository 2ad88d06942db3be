use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::SlotView;
use crate::services::availability;
use crate::state::AppState;

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("invalid date format, expected YYYY-MM-DD".to_string()))
}

// GET /api/slots?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: String,
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<SlotView>>, AppError> {
    let date = parse_date(&query.date)?;

    let slots = {
        let db = state.db.lock().unwrap();
        availability::slots_for_date(&db, date)?
    };
    Ok(Json(slots))
}

// GET /api/slots/disabled-dates?year=YYYY&month=M
#[derive(Deserialize)]
pub struct DisabledDatesQuery {
    pub year: i32,
    pub month: u32,
}

pub async fn get_disabled_dates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DisabledDatesQuery>,
) -> Result<Json<Vec<NaiveDate>>, AppError> {
    let dates = {
        let db = state.db.lock().unwrap();
        availability::disabled_dates_for_month_window(&db, query.year, query.month)?
    };
    Ok(Json(dates))
}
