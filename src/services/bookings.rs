//! Booking lifecycle: create / update / cancel / capture. Every flow that
//! touches both the booking record and its slot runs inside one transaction,
//! so a failure leaves no partial state behind.

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookedBy, PaymentMethod, PaymentStatus, VehicleClass};
use crate::services::allocator;

/// Incoming booking payload. Fields are optional at the edge; completeness is
/// enforced here, not by the deserializer.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub selected_date: Option<String>,
    pub selected_time_slot: Option<String>,
    pub total_price: Option<String>,
    pub make_and_model: Option<String>,
    pub registration_no: Option<String>,
    pub class_selection: Option<String>,
    pub payment_method: Option<String>,
}

/// Partial update. Absent fields are untouched; this path cannot clear a
/// field to empty.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub selected_date: Option<String>,
    pub selected_time_slot: Option<String>,
    pub total_price: Option<String>,
    pub make_and_model: Option<String>,
    pub registration_no: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub completed: bool,
    pub capture_id: Option<String>,
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

struct ValidatedRequest {
    date: NaiveDate,
    time: String,
    class: VehicleClass,
    method: PaymentMethod,
}

fn validate_new_booking(input: &NewBooking, today: NaiveDate) -> Result<ValidatedRequest, AppError> {
    let required = [
        &input.first_name,
        &input.last_name,
        &input.contact_number,
        &input.selected_date,
        &input.selected_time_slot,
        &input.make_and_model,
        &input.registration_no,
    ];
    if required.iter().any(|f| present(f).is_none()) {
        return Err(AppError::Validation("required fields are missing".to_string()));
    }

    match present(&input.total_price) {
        Some(price) if price != "00.00" => {}
        _ => {
            return Err(AppError::Validation(
                "please select a valid price".to_string(),
            ))
        }
    }

    let class = present(&input.class_selection)
        .and_then(VehicleClass::parse)
        .ok_or_else(|| AppError::Validation("a valid vehicle class is required".to_string()))?;

    let method = present(&input.payment_method)
        .and_then(PaymentMethod::parse)
        .ok_or_else(|| AppError::Validation("a valid payment method is required".to_string()))?;

    let date_str = present(&input.selected_date).unwrap_or_default();
    let time = present(&input.selected_time_slot).unwrap_or_default();
    let date = allocator::validate_booking_request(date_str, time, today)?;

    Ok(ValidatedRequest {
        date,
        time: time.to_string(),
        class,
        method,
    })
}

fn new_order_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), &suffix[..6])
}

/// Validates a booking request without persisting anything. Mirrors the
/// pre-checkout probe the payment flow runs before creating an order.
pub fn check_booking(conn: &Connection, input: &NewBooking, today: NaiveDate) -> Result<(), AppError> {
    let req = validate_new_booking(input, today)?;

    if let Some(entry) = queries::get_slot_entry(conn, req.date, &req.time)? {
        if entry.booked_by.is_some() || entry.blocked_by.is_some() {
            return Err(AppError::SlotUnavailable(
                "the selected time slot is not available".to_string(),
            ));
        }
    }

    Ok(())
}

/// Creates a booking: validation, then slot reservation and record insertion
/// in one transaction. On any failure nothing is persisted.
pub fn create_booking(
    conn: &Connection,
    input: &NewBooking,
    booked_by: BookedBy,
    initial_status: PaymentStatus,
    today: NaiveDate,
) -> Result<Booking, AppError> {
    let req = validate_new_booking(input, today)?;
    let now = Utc::now().naive_utc();

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        first_name: present(&input.first_name).unwrap_or_default().to_string(),
        last_name: present(&input.last_name).unwrap_or_default().to_string(),
        email: present(&input.email).map(str::to_string),
        contact_number: present(&input.contact_number).unwrap_or_default().to_string(),
        test_date: req.date,
        time_slot: req.time.clone(),
        total_price: present(&input.total_price).unwrap_or_default().to_string(),
        make_and_model: present(&input.make_and_model).unwrap_or_default().to_string(),
        registration_no: present(&input.registration_no).unwrap_or_default().to_string(),
        class_selection: req.class,
        payment_method: req.method,
        payment_status: initial_status,
        order_id: new_order_id(),
        capture_id: None,
        refund_id: None,
        refund_status: None,
        refund_amount: None,
        refund_reason: None,
        refund_date: None,
        booked_by,
        created_at: now,
        updated_at: now,
    };

    let tx = conn.unchecked_transaction()?;
    allocator::reserve(&tx, req.date, &req.time, &booking.id)?;
    queries::insert_booking(&tx, &booking)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        date = %booking.test_date,
        time = %booking.time_slot,
        booked_by = booked_by.as_str(),
        "booking created"
    );
    Ok(booking)
}

/// Applies a partial update. A date or time change is re-validated against
/// the new date and moves the slot: the old one is released and the new one
/// reserved inside the same transaction as the record update.
pub fn update_booking(
    conn: &Connection,
    id: &str,
    patch: &BookingPatch,
    today: NaiveDate,
) -> Result<Booking, AppError> {
    let mut booking = queries::get_booking_by_id(conn, id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    let new_time = present(&patch.selected_time_slot)
        .unwrap_or(&booking.time_slot)
        .to_string();
    let new_date = match present(&patch.selected_date) {
        Some(date_str) => allocator::validate_booking_request(date_str, &new_time, today)?,
        None => {
            if let Some(time) = present(&patch.selected_time_slot) {
                if !crate::models::slot::is_recognized_slot(time) {
                    return Err(AppError::Validation(format!(
                        "unrecognized time slot: {time}"
                    )));
                }
            }
            booking.test_date
        }
    };

    let slot_changed = new_date != booking.test_date || new_time != booking.time_slot;
    if slot_changed
        && matches!(
            booking.payment_status,
            PaymentStatus::Cancelled | PaymentStatus::Failed
        )
    {
        return Err(AppError::BusinessRule(
            "cannot reschedule a cancelled or failed booking".to_string(),
        ));
    }

    let tx = conn.unchecked_transaction()?;

    if slot_changed {
        allocator::release(&tx, booking.test_date, &booking.time_slot, &booking.id)?;
        allocator::reserve(&tx, new_date, &new_time, &booking.id)?;
        booking.test_date = new_date;
        booking.time_slot = new_time;
    }

    if let Some(v) = present(&patch.first_name) {
        booking.first_name = v.to_string();
    }
    if let Some(v) = present(&patch.last_name) {
        booking.last_name = v.to_string();
    }
    if let Some(v) = present(&patch.email) {
        booking.email = Some(v.to_string());
    }
    if let Some(v) = present(&patch.contact_number) {
        booking.contact_number = v.to_string();
    }
    if let Some(v) = present(&patch.total_price) {
        booking.total_price = v.to_string();
    }
    if let Some(v) = present(&patch.make_and_model) {
        booking.make_and_model = v.to_string();
    }
    if let Some(v) = present(&patch.registration_no) {
        booking.registration_no = v.to_string();
    }
    if let Some(v) = present(&patch.payment_method) {
        booking.payment_method = PaymentMethod::parse(v)
            .ok_or_else(|| AppError::Validation("a valid payment method is required".to_string()))?;
    }

    booking.updated_at = Utc::now().naive_utc();
    queries::update_booking(&tx, &booking)?;
    tx.commit()?;

    tracing::info!(booking_id = %booking.id, "booking updated");
    Ok(booking)
}

/// Deletes a booking and frees its slot in one transaction; a missing day or
/// slot record fails the whole operation with nothing removed.
pub fn cancel_booking(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    let booking = queries::get_booking_by_id(conn, id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    let tx = conn.unchecked_transaction()?;
    allocator::release(&tx, booking.test_date, &booking.time_slot, &booking.id)?;
    queries::delete_booking(&tx, id)?;
    tx.commit()?;

    tracing::info!(booking_id = %booking.id, "booking cancelled");
    Ok(booking)
}

/// Settles an external payment by order reference. Re-capturing a completed
/// booking is a no-op (the returned flag tells the caller it was a replay);
/// a failed capture marks the booking failed but does not cancel it or touch
/// its slot.
pub fn capture_payment(
    conn: &Connection,
    order_id: &str,
    outcome: &CaptureOutcome,
) -> Result<(Booking, bool), AppError> {
    let mut booking = queries::get_booking_by_order_id(conn, order_id)?
        .ok_or_else(|| AppError::NotFound("booking not found for order".to_string()))?;

    if booking.payment_status == PaymentStatus::Completed {
        tracing::info!(order_id, "payment already captured");
        return Ok((booking, true));
    }

    if outcome.completed {
        booking.payment_status = PaymentStatus::Completed;
        booking.capture_id = outcome.capture_id.clone();
        booking.updated_at = Utc::now().naive_utc();
        queries::update_booking(conn, &booking)?;
        tracing::info!(order_id, booking_id = %booking.id, "payment captured");
        Ok((booking, false))
    } else {
        booking.payment_status = PaymentStatus::Failed;
        booking.updated_at = Utc::now().naive_utc();
        queries::update_booking(conn, &booking)?;
        tracing::warn!(order_id, booking_id = %booking.id, "payment capture failed");
        Err(AppError::Payment("payment capture failed".to_string()))
    }
}

/// Abandons a pending online payment: the booking is removed and its slot
/// freed, atomically. Only pending bookings qualify.
pub fn cancel_pending_payment(conn: &Connection, order_id: &str) -> Result<Booking, AppError> {
    let booking = queries::get_booking_by_order_id(conn, order_id)?
        .ok_or_else(|| AppError::NotFound("booking not found for order".to_string()))?;

    if booking.payment_status != PaymentStatus::Pending {
        return Err(AppError::BusinessRule(
            "this booking's payment has already been processed or cancelled".to_string(),
        ));
    }

    let tx = conn.unchecked_transaction()?;
    allocator::release(&tx, booking.test_date, &booking.time_slot, &booking.id)?;
    queries::delete_booking(&tx, &booking.id)?;
    tx.commit()?;

    tracing::info!(order_id, booking_id = %booking.id, "pending payment cancelled");
    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::SlotStatus;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn today() -> NaiveDate {
        date("2024-06-03")
    }

    fn valid_input() -> NewBooking {
        NewBooking {
            first_name: Some("Alice".to_string()),
            last_name: Some("Smith".to_string()),
            email: Some("alice@example.com".to_string()),
            contact_number: Some("07700900000".to_string()),
            selected_date: Some("2024-06-10".to_string()),
            selected_time_slot: Some("10:00".to_string()),
            total_price: Some("54.85".to_string()),
            make_and_model: Some("Ford Transit".to_string()),
            registration_no: Some("AB12 CDE".to_string()),
            class_selection: Some("class7".to_string()),
            payment_method: Some("Cash".to_string()),
        }
    }

    fn slot_status(conn: &Connection, date_s: &str, time: &str) -> SlotStatus {
        allocator::query_day_status(conn, date(date_s))
            .unwrap()
            .into_iter()
            .find(|v| v.time == time)
            .unwrap()
            .status
    }

    #[test]
    fn test_create_booking_persists_record_and_slot() {
        let conn = setup_db();
        let booking = create_booking(
            &conn,
            &valid_input(),
            BookedBy::Customer,
            PaymentStatus::Pending,
            today(),
        )
        .unwrap();

        assert_eq!(booking.customer_name(), "Alice Smith");
        assert!(booking.order_id.starts_with("ORD-"));

        let stored = queries::get_booking_by_id(&conn, &booking.id).unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
        assert_eq!(
            slot_status(&conn, "2024-06-10", "10:00"),
            SlotStatus::Booked {
                booked_by: booking.id
            }
        );
    }

    #[test]
    fn test_create_booking_missing_field_leaves_nothing() {
        let conn = setup_db();
        let mut input = valid_input();
        input.registration_no = None;

        let err = create_booking(
            &conn,
            &input,
            BookedBy::Customer,
            PaymentStatus::Pending,
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert_eq!(queries::count_bookings(&conn, None).unwrap(), 0);
        assert_eq!(slot_status(&conn, "2024-06-10", "10:00"), SlotStatus::Available);
    }

    #[test]
    fn test_create_booking_rejects_sentinel_price() {
        let conn = setup_db();
        let mut input = valid_input();
        input.total_price = Some("00.00".to_string());

        let err = create_booking(
            &conn,
            &input,
            BookedBy::Admin,
            PaymentStatus::Completed,
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_create_booking_taken_slot_persists_nothing() {
        let conn = setup_db();
        create_booking(
            &conn,
            &valid_input(),
            BookedBy::Customer,
            PaymentStatus::Pending,
            today(),
        )
        .unwrap();

        let mut second = valid_input();
        second.first_name = Some("Bob".to_string());
        let err = create_booking(
            &conn,
            &second,
            BookedBy::Customer,
            PaymentStatus::Pending,
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::SlotUnavailable(_)));
        assert_eq!(queries::count_bookings(&conn, None).unwrap(), 1);
    }

    #[test]
    fn test_check_booking_does_not_reserve() {
        let conn = setup_db();
        check_booking(&conn, &valid_input(), today()).unwrap();
        assert_eq!(slot_status(&conn, "2024-06-10", "10:00"), SlotStatus::Available);

        allocator::block(&conn, date("2024-06-10"), "10:00", "admin").unwrap();
        let err = check_booking(&conn, &valid_input(), today()).unwrap_err();
        assert!(matches!(err, AppError::SlotUnavailable(_)));
    }

    #[test]
    fn test_update_reschedule_moves_slot() {
        let conn = setup_db();
        let booking = create_booking(
            &conn,
            &valid_input(),
            BookedBy::Admin,
            PaymentStatus::Completed,
            today(),
        )
        .unwrap();

        let patch = BookingPatch {
            selected_date: Some("2024-06-11".to_string()),
            selected_time_slot: Some("14:00".to_string()),
            ..Default::default()
        };
        let updated = update_booking(&conn, &booking.id, &patch, today()).unwrap();
        assert_eq!(updated.test_date, date("2024-06-11"));
        assert_eq!(updated.time_slot, "14:00");

        assert_eq!(slot_status(&conn, "2024-06-10", "10:00"), SlotStatus::Available);
        assert_eq!(
            slot_status(&conn, "2024-06-11", "14:00"),
            SlotStatus::Booked {
                booked_by: booking.id
            }
        );
    }

    #[test]
    fn test_update_noop_reschedule_to_same_slot_is_allowed() {
        let conn = setup_db();
        let booking = create_booking(
            &conn,
            &valid_input(),
            BookedBy::Admin,
            PaymentStatus::Completed,
            today(),
        )
        .unwrap();

        let patch = BookingPatch {
            selected_date: Some("2024-06-10".to_string()),
            selected_time_slot: Some("10:00".to_string()),
            ..Default::default()
        };
        let updated = update_booking(&conn, &booking.id, &patch, today()).unwrap();
        assert_eq!(updated.test_date, booking.test_date);
        assert_eq!(updated.time_slot, booking.time_slot);
    }

    #[test]
    fn test_update_to_occupied_slot_rolls_back() {
        let conn = setup_db();
        let first = create_booking(
            &conn,
            &valid_input(),
            BookedBy::Admin,
            PaymentStatus::Completed,
            today(),
        )
        .unwrap();

        let mut other = valid_input();
        other.selected_time_slot = Some("11:00".to_string());
        let second = create_booking(
            &conn,
            &other,
            BookedBy::Admin,
            PaymentStatus::Completed,
            today(),
        )
        .unwrap();

        let patch = BookingPatch {
            selected_time_slot: Some("10:00".to_string()),
            ..Default::default()
        };
        let err = update_booking(&conn, &second.id, &patch, today()).unwrap_err();
        assert!(matches!(err, AppError::SlotUnavailable(_)));

        // Both bookings keep their original slots.
        assert_eq!(
            slot_status(&conn, "2024-06-10", "10:00"),
            SlotStatus::Booked {
                booked_by: first.id
            }
        );
        assert_eq!(
            slot_status(&conn, "2024-06-10", "11:00"),
            SlotStatus::Booked {
                booked_by: second.id
            }
        );
    }

    #[test]
    fn test_update_partial_fields_only() {
        let conn = setup_db();
        let booking = create_booking(
            &conn,
            &valid_input(),
            BookedBy::Admin,
            PaymentStatus::Completed,
            today(),
        )
        .unwrap();

        let patch = BookingPatch {
            make_and_model: Some("Vauxhall Vivaro".to_string()),
            ..Default::default()
        };
        let updated = update_booking(&conn, &booking.id, &patch, today()).unwrap();
        assert_eq!(updated.make_and_model, "Vauxhall Vivaro");
        assert_eq!(updated.first_name, "Alice");
        assert_eq!(updated.test_date, booking.test_date);
    }

    #[test]
    fn test_update_missing_booking_is_not_found() {
        let conn = setup_db();
        let err = update_booking(&conn, "nope", &BookingPatch::default(), today()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_cancel_frees_slot_and_removes_record() {
        let conn = setup_db();
        let booking = create_booking(
            &conn,
            &valid_input(),
            BookedBy::Customer,
            PaymentStatus::Pending,
            today(),
        )
        .unwrap();

        cancel_booking(&conn, &booking.id).unwrap();
        assert!(queries::get_booking_by_id(&conn, &booking.id).unwrap().is_none());
        assert_eq!(slot_status(&conn, "2024-06-10", "10:00"), SlotStatus::Available);
    }

    #[test]
    fn test_cancel_with_missing_slot_rolls_back_delete() {
        let conn = setup_db();
        let booking = create_booking(
            &conn,
            &valid_input(),
            BookedBy::Customer,
            PaymentStatus::Pending,
            today(),
        )
        .unwrap();

        // Simulate a stray calendar: the slot entry vanished out from under us.
        queries::delete_slot_entry(&conn, booking.test_date, &booking.time_slot).unwrap();

        let err = cancel_booking(&conn, &booking.id).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // The booking record survives the failed cancellation.
        assert!(queries::get_booking_by_id(&conn, &booking.id).unwrap().is_some());
    }

    #[test]
    fn test_capture_payment_completes_and_is_idempotent() {
        let conn = setup_db();
        let booking = create_booking(
            &conn,
            &valid_input(),
            BookedBy::Customer,
            PaymentStatus::Pending,
            today(),
        )
        .unwrap();

        let outcome = CaptureOutcome {
            completed: true,
            capture_id: Some("CAP-1".to_string()),
        };
        let (captured, replay) = capture_payment(&conn, &booking.order_id, &outcome).unwrap();
        assert_eq!(captured.payment_status, PaymentStatus::Completed);
        assert_eq!(captured.capture_id.as_deref(), Some("CAP-1"));
        assert!(!replay);

        // Second capture returns without reprocessing.
        let (again, replay) = capture_payment(&conn, &booking.order_id, &outcome).unwrap();
        assert_eq!(again.payment_status, PaymentStatus::Completed);
        assert!(replay);
    }

    #[test]
    fn test_capture_failure_marks_failed_and_keeps_slot() {
        let conn = setup_db();
        let booking = create_booking(
            &conn,
            &valid_input(),
            BookedBy::Customer,
            PaymentStatus::Pending,
            today(),
        )
        .unwrap();

        let outcome = CaptureOutcome {
            completed: false,
            capture_id: None,
        };
        let err = capture_payment(&conn, &booking.order_id, &outcome).unwrap_err();
        assert!(matches!(err, AppError::Payment(_)));

        let stored = queries::get_booking_by_id(&conn, &booking.id).unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Failed);
        // Not auto-cancelled: the slot stays held.
        assert_eq!(
            slot_status(&conn, "2024-06-10", "10:00"),
            SlotStatus::Booked {
                booked_by: booking.id
            }
        );
    }

    #[test]
    fn test_capture_unknown_order_is_not_found() {
        let conn = setup_db();
        let outcome = CaptureOutcome {
            completed: true,
            capture_id: None,
        };
        let err = capture_payment(&conn, "ORD-unknown", &outcome).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_cancel_pending_payment_requires_pending() {
        let conn = setup_db();
        let booking = create_booking(
            &conn,
            &valid_input(),
            BookedBy::Customer,
            PaymentStatus::Pending,
            today(),
        )
        .unwrap();

        capture_payment(
            &conn,
            &booking.order_id,
            &CaptureOutcome {
                completed: true,
                capture_id: None,
            },
        )
        .unwrap();

        let err = cancel_pending_payment(&conn, &booking.order_id).unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[test]
    fn test_cancel_pending_payment_removes_booking_and_slot() {
        let conn = setup_db();
        let booking = create_booking(
            &conn,
            &valid_input(),
            BookedBy::Customer,
            PaymentStatus::Pending,
            today(),
        )
        .unwrap();

        cancel_pending_payment(&conn, &booking.order_id).unwrap();
        assert!(queries::get_booking_by_id(&conn, &booking.id).unwrap().is_none());
        assert_eq!(slot_status(&conn, "2024-06-10", "10:00"), SlotStatus::Available);
    }
}
