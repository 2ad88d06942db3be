pub mod migrations;
pub mod queries;

use anyhow::Context;
use rusqlite::Connection;

/// Opens the booking database and brings its schema up to date. WAL keeps
/// availability reads cheap while bookings are written; foreign keys back the
/// `slot_entries` -> `slot_days` link.
pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open booking database at {path}"))?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to configure sqlite pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}
