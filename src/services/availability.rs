//! Read-side projections over the slot calendar.

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{SlotView, TIME_SLOTS};
use crate::services::allocator;

pub fn slots_for_date(conn: &Connection, date: NaiveDate) -> Result<Vec<SlotView>, AppError> {
    allocator::query_day_status(conn, date)
}

/// Yields `(year, month)` for the month before, the given month, and the
/// month after, handling year boundaries. The arithmetic runs in i64 so an
/// extreme caller-supplied year cannot overflow; out-of-range results are
/// rejected later when the month bounds fail to resolve.
pub fn month_window(year: i32, month: u32) -> impl Iterator<Item = (i32, u32)> {
    (-1i64..=1).map(move |offset| {
        let total = i64::from(year) * 12 + (i64::from(month) - 1) + offset;
        (total.div_euclid(12) as i32, (total.rem_euclid(12) + 1) as u32)
    })
}

fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next_month.pred_opt()?))
}

/// Dates in the three-month window around `(year, month)` that are wholly
/// unavailable: every canonical label blocked by an admin. Days filled with
/// bookings never count as disabled.
pub fn disabled_dates_for_month_window(
    conn: &Connection,
    year: i32,
    month: u32,
) -> Result<Vec<NaiveDate>, AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::Validation(format!("invalid month: {month}")));
    }

    let mut dates = vec![];
    for (y, m) in month_window(year, month) {
        let (start, end) = month_bounds(y, m)
            .ok_or_else(|| AppError::Validation(format!("invalid year or month: {y}-{m}")))?;
        dates.extend(queries::fully_blocked_dates_in_range(
            conn,
            start,
            end,
            TIME_SLOTS.len() as i64,
        )?);
    }

    Ok(dates)
}
