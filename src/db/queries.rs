use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};

use crate::models::{
    Booking, BookedBy, PaymentMethod, PaymentStatus, RefundStatus, SlotEntry, VehicleClass,
};

const BOOKING_COLS: &str = "id, first_name, last_name, email, contact_number, test_date, time_slot, \
     total_price, make_and_model, registration_no, class_selection, payment_method, payment_status, \
     order_id, capture_id, refund_id, refund_status, refund_amount, refund_reason, refund_date, \
     booked_by, created_at, updated_at";

// ── Bookings ──

pub fn insert_booking(conn: &Connection, b: &Booking) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)"
        ),
        params![
            b.id,
            b.first_name,
            b.last_name,
            b.email,
            b.contact_number,
            b.test_date.format("%Y-%m-%d").to_string(),
            b.time_slot,
            b.total_price,
            b.make_and_model,
            b.registration_no,
            b.class_selection.as_str(),
            b.payment_method.as_str(),
            b.payment_status.as_str(),
            b.order_id,
            b.capture_id,
            b.refund_id,
            b.refund_status.map(|s| s.as_str()),
            b.refund_amount,
            b.refund_reason,
            b.refund_date.map(|d| d.format("%Y-%m-%d").to_string()),
            b.booked_by.as_str(),
            b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn update_booking(conn: &Connection, b: &Booking) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET
             first_name = ?2, last_name = ?3, email = ?4, contact_number = ?5,
             test_date = ?6, time_slot = ?7, total_price = ?8, make_and_model = ?9,
             registration_no = ?10, class_selection = ?11, payment_method = ?12,
             payment_status = ?13, capture_id = ?14, refund_id = ?15, refund_status = ?16,
             refund_amount = ?17, refund_reason = ?18, refund_date = ?19, updated_at = ?20
         WHERE id = ?1",
        params![
            b.id,
            b.first_name,
            b.last_name,
            b.email,
            b.contact_number,
            b.test_date.format("%Y-%m-%d").to_string(),
            b.time_slot,
            b.total_price,
            b.make_and_model,
            b.registration_no,
            b.class_selection.as_str(),
            b.payment_method.as_str(),
            b.payment_status.as_str(),
            b.capture_id,
            b.refund_id,
            b.refund_status.map(|s| s.as_str()),
            b.refund_amount,
            b.refund_reason,
            b.refund_date.map(|d| d.format("%Y-%m-%d").to_string()),
            b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn get_booking_by_order_id(
    conn: &Connection,
    order_id: &str,
) -> rusqlite::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLS} FROM bookings WHERE order_id = ?1"),
        params![order_id],
        parse_booking_row,
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

const SEARCH_FILTER: &str = "(first_name LIKE ?1 OR last_name LIKE ?1 OR email LIKE ?1 \
     OR contact_number LIKE ?1 OR registration_no LIKE ?1 OR time_slot LIKE ?1 \
     OR payment_status LIKE ?1 OR booked_by LIKE ?1)";

pub fn list_bookings(
    conn: &Connection,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> rusqlite::Result<Vec<Booking>> {
    let mut bookings = vec![];

    match search {
        Some(term) => {
            let pattern = format!("%{term}%");
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLS} FROM bookings WHERE {SEARCH_FILTER}
                 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt.query_map(params![pattern, limit, offset], parse_booking_row)?;
            for row in rows {
                bookings.push(row?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLS} FROM bookings ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt.query_map(params![limit, offset], parse_booking_row)?;
            for row in rows {
                bookings.push(row?);
            }
        }
    }

    Ok(bookings)
}

pub fn count_bookings(conn: &Connection, search: Option<&str>) -> rusqlite::Result<i64> {
    match search {
        Some(term) => {
            let pattern = format!("%{term}%");
            conn.query_row(
                &format!("SELECT COUNT(*) FROM bookings WHERE {SEARCH_FILTER}"),
                params![pattern],
                |row| row.get(0),
            )
        }
        None => conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0)),
    }
}

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let test_date_str: String = row.get(5)?;
    let class_str: String = row.get(10)?;
    let method_str: String = row.get(11)?;
    let status_str: String = row.get(12)?;
    let refund_status_str: Option<String> = row.get(16)?;
    let refund_date_str: Option<String> = row.get(19)?;
    let booked_by_str: String = row.get(20)?;
    let created_at_str: String = row.get(21)?;
    let updated_at_str: String = row.get(22)?;

    Ok(Booking {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        contact_number: row.get(4)?,
        test_date: parse_date(5, &test_date_str)?,
        time_slot: row.get(6)?,
        total_price: row.get(7)?,
        make_and_model: row.get(8)?,
        registration_no: row.get(9)?,
        class_selection: VehicleClass::parse(&class_str)
            .ok_or_else(|| bad_cell(10, &format!("unknown vehicle class: {class_str}")))?,
        payment_method: PaymentMethod::parse(&method_str)
            .ok_or_else(|| bad_cell(11, &format!("unknown payment method: {method_str}")))?,
        payment_status: PaymentStatus::parse(&status_str),
        order_id: row.get(13)?,
        capture_id: row.get(14)?,
        refund_id: row.get(15)?,
        refund_status: refund_status_str.as_deref().and_then(RefundStatus::parse),
        refund_amount: row.get(17)?,
        refund_reason: row.get(18)?,
        refund_date: match refund_date_str {
            Some(s) => Some(parse_date(19, &s)?),
            None => None,
        },
        booked_by: BookedBy::parse(&booked_by_str),
        created_at: parse_datetime(21, &created_at_str)?,
        updated_at: parse_datetime(22, &updated_at_str)?,
    })
}

fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| bad_cell(idx, &e.to_string()))
}

fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map_err(|e| bad_cell(idx, &e.to_string()))
}

fn bad_cell(idx: usize, msg: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        msg.to_string().into(),
    )
}

// ── Slot calendar ──

pub fn ensure_day(conn: &Connection, date: NaiveDate) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO slot_days (date) VALUES (?1)",
        params![date.format("%Y-%m-%d").to_string()],
    )?;
    Ok(())
}

pub fn day_exists(conn: &Connection, date: NaiveDate) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM slot_days WHERE date = ?1",
        params![date.format("%Y-%m-%d").to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_slot_entry(
    conn: &Connection,
    date: NaiveDate,
    time: &str,
) -> rusqlite::Result<Option<SlotEntry>> {
    let result = conn.query_row(
        "SELECT time, booked_by, blocked_by FROM slot_entries WHERE date = ?1 AND time = ?2",
        params![date.format("%Y-%m-%d").to_string(), time],
        |row| {
            Ok(SlotEntry {
                time: row.get(0)?,
                booked_by: row.get(1)?,
                blocked_by: row.get(2)?,
            })
        },
    );

    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Conditional take of a slot for a booking. The upsert only fires when the
/// existing entry carries neither reference, so two concurrent callers cannot
/// both win: the loser sees zero rows changed.
pub fn try_reserve_slot(
    conn: &Connection,
    date: NaiveDate,
    time: &str,
    booking_id: &str,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "INSERT INTO slot_entries (date, time, booked_by) VALUES (?1, ?2, ?3)
         ON CONFLICT(date, time) DO UPDATE SET booked_by = excluded.booked_by
         WHERE slot_entries.booked_by IS NULL AND slot_entries.blocked_by IS NULL",
        params![date.format("%Y-%m-%d").to_string(), time, booking_id],
    )?;
    Ok(count > 0)
}

pub fn try_block_slot(
    conn: &Connection,
    date: NaiveDate,
    time: &str,
    actor_id: &str,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "INSERT INTO slot_entries (date, time, blocked_by) VALUES (?1, ?2, ?3)
         ON CONFLICT(date, time) DO UPDATE SET blocked_by = excluded.blocked_by
         WHERE slot_entries.booked_by IS NULL AND slot_entries.blocked_by IS NULL",
        params![date.format("%Y-%m-%d").to_string(), time, actor_id],
    )?;
    Ok(count > 0)
}

/// Entries hold exactly one reference, so clearing it means removing the row.
pub fn delete_slot_entry(conn: &Connection, date: NaiveDate, time: &str) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "DELETE FROM slot_entries WHERE date = ?1 AND time = ?2",
        params![date.format("%Y-%m-%d").to_string(), time],
    )?;
    Ok(count > 0)
}

/// Dates in `[start, end]` where every canonical label is present and blocked.
/// Booked slots do not count toward a day being disabled.
pub fn fully_blocked_dates_in_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
    menu_len: i64,
) -> rusqlite::Result<Vec<NaiveDate>> {
    let mut stmt = conn.prepare(
        "SELECT date FROM slot_entries
         WHERE date >= ?1 AND date <= ?2
         GROUP BY date
         HAVING COUNT(*) = ?3 AND COUNT(blocked_by) = ?3
         ORDER BY date ASC",
    )?;

    let rows = stmt.query_map(
        params![
            start.format("%Y-%m-%d").to_string(),
            end.format("%Y-%m-%d").to_string(),
            menu_len
        ],
        |row| row.get::<_, String>(0),
    )?;

    let mut dates = vec![];
    for row in rows {
        let s = row?;
        dates.push(parse_date(0, &s)?);
    }
    Ok(dates)
}
