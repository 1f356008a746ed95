use super::{decimal_at, EscrowRow, EscrowStore};
use crate::{error::EscrowResult, types::BookingId};
use rusqlite::{params, OptionalExtension, Row};

const ESCROW_COLUMNS: &str =
    "id, booking_id, amount, status, held_at, released_at, release_reason, processed_by";

fn escrow_from_row(row: &Row<'_>) -> rusqlite::Result<EscrowRow> {
    Ok(EscrowRow {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        amount: decimal_at(row, 2)?,
        status: row.get(3)?,
        held_at: row.get(4)?,
        released_at: row.get(5)?,
        release_reason: row.get(6)?,
        processed_by: row.get(7)?,
    })
}

impl EscrowStore {
    // ── Escrow ────────────────────────────────────────────────────

    pub fn escrow_for_booking(&self, booking_id: BookingId) -> EscrowResult<Option<EscrowRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ESCROW_COLUMNS} FROM escrow WHERE booking_id = ?1"),
                params![booking_id],
                escrow_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub(super) fn all_escrow(&self) -> EscrowResult<Vec<EscrowRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ESCROW_COLUMNS} FROM escrow ORDER BY id ASC"))?;
        let rows = stmt.query_map([], escrow_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
