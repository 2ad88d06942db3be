//! The single authority for taking and releasing `(date, time)` slots.
//!
//! Reservation and blocking go through a conditional upsert keyed on the slot
//! carrying no reference, so concurrent attempts on the same slot cannot both
//! succeed.

use chrono::{Datelike, NaiveDate, Weekday};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::slot::is_recognized_slot;
use crate::models::{SlotStatus, SlotView, TIME_SLOTS};

/// Validates a requested `(date, time)` pair against the booking rules.
/// `today` is passed in rather than read ambiently so the rules are testable.
pub fn validate_booking_request(
    date_str: &str,
    time: &str,
    today: NaiveDate,
) -> Result<NaiveDate, AppError> {
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
        AppError::Validation("invalid date format, expected YYYY-MM-DD".to_string())
    })?;

    if date == today {
        return Err(AppError::BusinessRule(
            "bookings for today are not allowed".to_string(),
        ));
    }

    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return Err(AppError::BusinessRule(
            "bookings are only allowed from Monday to Friday".to_string(),
        ));
    }

    if !is_recognized_slot(time) {
        return Err(AppError::Validation(format!(
            "unrecognized time slot: {time}"
        )));
    }

    Ok(date)
}

/// Takes the slot for a booking, lazily creating the day record.
pub fn reserve(
    conn: &Connection,
    date: NaiveDate,
    time: &str,
    booking_id: &str,
) -> Result<(), AppError> {
    queries::ensure_day(conn, date)?;

    if !queries::try_reserve_slot(conn, date, time, booking_id)? {
        return Err(AppError::SlotUnavailable(
            "the selected time slot is not available".to_string(),
        ));
    }

    tracing::info!(%date, time, booking_id, "slot reserved");
    Ok(())
}

/// Releases a slot held by a booking. The booking reference is advisory: a
/// mismatch is logged but the slot is still freed, matching the cancellation
/// paths that clear whatever booking currently holds the slot.
pub fn release(
    conn: &Connection,
    date: NaiveDate,
    time: &str,
    booking_id: &str,
) -> Result<(), AppError> {
    if !queries::day_exists(conn, date)? {
        return Err(AppError::NotFound(
            "no time slots found for the given date".to_string(),
        ));
    }

    let entry = queries::get_slot_entry(conn, date, time)?
        .ok_or_else(|| AppError::NotFound(format!("slot {time} not found on this date")))?;

    match entry.booked_by {
        Some(holder) => {
            if holder != booking_id {
                tracing::warn!(%date, time, %holder, booking_id, "releasing slot held by a different booking");
            }
            queries::delete_slot_entry(conn, date, time)?;
            tracing::info!(%date, time, booking_id, "slot released");
            Ok(())
        }
        None => Err(AppError::BusinessRule(format!(
            "slot {time} is not booked"
        ))),
    }
}

/// Places an administrative hold on a slot.
pub fn block(
    conn: &Connection,
    date: NaiveDate,
    time: &str,
    actor_id: &str,
) -> Result<(), AppError> {
    if !is_recognized_slot(time) {
        return Err(AppError::Validation(format!(
            "unrecognized time slot: {time}"
        )));
    }

    queries::ensure_day(conn, date)?;

    if !queries::try_block_slot(conn, date, time, actor_id)? {
        return Err(AppError::SlotUnavailable(format!(
            "slot {time} is already booked or blocked"
        )));
    }

    tracing::info!(%date, time, actor_id, "slot blocked");
    Ok(())
}

/// Lifts a hold. Only the admin who placed the block may remove it.
pub fn unblock(
    conn: &Connection,
    date: NaiveDate,
    time: &str,
    actor_id: &str,
) -> Result<(), AppError> {
    if !queries::day_exists(conn, date)? {
        return Err(AppError::NotFound(
            "no time slots found for the given date".to_string(),
        ));
    }

    let entry = queries::get_slot_entry(conn, date, time)?
        .ok_or_else(|| AppError::NotFound(format!("slot {time} not found on this date")))?;

    match entry.blocked_by {
        Some(blocker) => {
            if blocker != actor_id {
                return Err(AppError::Forbidden(
                    "you cannot unblock a slot you didn't block".to_string(),
                ));
            }
            queries::delete_slot_entry(conn, date, time)?;
            tracing::info!(%date, time, actor_id, "slot unblocked");
            Ok(())
        }
        None => Err(AppError::BusinessRule(format!(
            "slot {time} is not blocked"
        ))),
    }
}

/// Projects the canonical menu for a date. A missing day record or slot entry
/// means the label is available.
pub fn query_day_status(conn: &Connection, date: NaiveDate) -> Result<Vec<SlotView>, AppError> {
    let mut views = Vec::with_capacity(TIME_SLOTS.len());

    for label in TIME_SLOTS {
        let status = match queries::get_slot_entry(conn, date, label)? {
            Some(entry) => entry.status(),
            None => SlotStatus::Available,
        };
        views.push(SlotView {
            time: label.to_string(),
            status,
        });
    }

    Ok(views)
}
