use super::{
    booking::{booking_from_row, BOOKING_COLUMNS},
    NewPayout, ReleaseContextRow, StoreTx,
};
use crate::{
    error::{persistence, EscrowError, EscrowResult},
    status::{BookingEscrowStatus, EscrowStatus, PayoutStatus},
    types::{AdminId, BookingId, RowId},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

/// Writes inside a release must touch exactly one row.
fn expect_one_row(action: &'static str, affected: usize) -> EscrowResult<()> {
    if affected != 1 {
        return Err(EscrowError::RowsAffected { action, affected });
    }
    Ok(())
}

impl StoreTx<'_> {
    // ── Release: reads ────────────────────────────────────────────

    /// Booking ⟕ payment ⟕ owner for one booking id.
    pub fn release_context(&self, booking_id: BookingId) -> EscrowResult<Option<ReleaseContextRow>> {
        let row = self
            .tx
            .query_row(
                &format!(
                    "SELECT {BOOKING_COLUMNS},
                            p.payment_status,
                            u.fullname, u.gcash_number
                     FROM bookings b
                     LEFT JOIN payments p ON b.id = p.booking_id
                     LEFT JOIN users u ON b.owner_id = u.id
                     WHERE b.id = ?1"
                ),
                params![booking_id],
                |row| {
                    Ok(ReleaseContextRow {
                        booking: booking_from_row(row)?,
                        payment_status: row.get(10)?,
                        owner_name: row.get(11)?,
                        owner_gcash: row.get(12)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn escrow_id_for_booking(&self, booking_id: BookingId) -> EscrowResult<Option<RowId>> {
        let id = self
            .tx
            .query_row(
                "SELECT id FROM escrow WHERE booking_id = ?1 LIMIT 1",
                params![booking_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    // ── Release: writes ───────────────────────────────────────────

    pub fn mark_escrow_released(
        &self,
        booking_id: BookingId,
        admin: AdminId,
        released_at: DateTime<Utc>,
        reason: &str,
    ) -> EscrowResult<()> {
        let affected = self
            .tx
            .execute(
                "UPDATE escrow
                 SET status = ?1, released_at = ?2, release_reason = ?3, processed_by = ?4
                 WHERE booking_id = ?5 AND status = ?6",
                params![
                    EscrowStatus::Released.as_str(),
                    released_at,
                    reason,
                    admin.get(),
                    booking_id,
                    EscrowStatus::Held.as_str(),
                ],
            )
            .map_err(persistence("update escrow table"))?;
        expect_one_row("update escrow table", affected)
    }

    pub fn mark_booking_released(
        &self,
        booking_id: BookingId,
        released_at: DateTime<Utc>,
    ) -> EscrowResult<()> {
        let affected = self
            .tx
            .execute(
                "UPDATE bookings
                 SET escrow_status = ?1, escrow_released_at = ?2, payout_status = ?3
                 WHERE id = ?4 AND escrow_status = ?5",
                params![
                    BookingEscrowStatus::ReleasedToOwner.as_str(),
                    released_at,
                    PayoutStatus::Pending.as_str(),
                    booking_id,
                    BookingEscrowStatus::Held.as_str(),
                ],
            )
            .map_err(persistence("update escrow status"))?;
        expect_one_row("update escrow status", affected)
    }

    /// Schedule a pending payout. Returns the new payout id.
    pub fn insert_payout(&self, payout: &NewPayout) -> EscrowResult<RowId> {
        self.tx
            .execute(
                "INSERT INTO payouts (
                    booking_id, owner_id, escrow_id, amount, platform_fee, net_amount,
                    payout_method, payout_account, status, scheduled_at, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    payout.booking_id,
                    payout.owner_id,
                    payout.escrow_id,
                    payout.amount.to_string(),
                    payout.platform_fee.to_string(),
                    payout.net_amount.to_string(),
                    payout.payout_method,
                    payout.payout_account,
                    PayoutStatus::Pending.as_str(),
                    payout.scheduled_at,
                ],
            )
            .map_err(persistence("create payout record"))?;
        Ok(self.tx.last_insert_rowid())
    }
}
