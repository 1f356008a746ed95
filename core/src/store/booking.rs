use super::{decimal_at, BookingRow, EscrowStore};
use crate::{error::EscrowResult, types::BookingId};
use rusqlite::{params, OptionalExtension, Row};

pub(super) const BOOKING_COLUMNS: &str = "b.id, b.owner_id, b.status, b.escrow_status, b.payout_status,
     b.total_amount, b.platform_fee, b.owner_payout, b.escrow_hold_reason, b.escrow_released_at";

/// Map the ten `BOOKING_COLUMNS` starting at column 0.
pub(super) fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<BookingRow> {
    Ok(BookingRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        status: row.get(2)?,
        escrow_status: row.get(3)?,
        payout_status: row.get(4)?,
        total_amount: decimal_at(row, 5)?,
        platform_fee: decimal_at(row, 6)?,
        owner_payout: decimal_at(row, 7)?,
        escrow_hold_reason: row.get(8)?,
        escrow_released_at: row.get(9)?,
    })
}

impl EscrowStore {
    // ── Booking ───────────────────────────────────────────────────

    pub fn booking(&self, booking_id: BookingId) -> EscrowResult<Option<BookingRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1"),
                params![booking_id],
                booking_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub(super) fn all_bookings(&self) -> EscrowResult<Vec<BookingRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {BOOKING_COLUMNS} FROM bookings b ORDER BY b.id ASC"))?;
        let rows = stmt.query_map([], booking_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Bookings in the given escrow status, by id.
    pub fn bookings_with_escrow_status(&self, escrow_status: &str) -> EscrowResult<Vec<BookingRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b
             WHERE b.escrow_status = ?1 ORDER BY b.id ASC"
        ))?;
        let rows = stmt.query_map(params![escrow_status], booking_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
