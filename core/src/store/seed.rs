use super::{BookingRow, EscrowStore};
use crate::{
    error::EscrowResult,
    status::EscrowStatus,
    types::{BookingId, RowId, UserId},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rusqlite::params;

impl EscrowStore {
    // ── Seeding ───────────────────────────────────────────────────
    //
    // The booking and payment subsystems own these rows in production.
    // These inserts exist for tests and the runner's demo mode.

    pub fn insert_user(
        &self,
        id: UserId,
        fullname: &str,
        email: Option<&str>,
        gcash_number: Option<&str>,
    ) -> EscrowResult<()> {
        self.conn.execute(
            "INSERT INTO users (id, fullname, email, gcash_number) VALUES (?1, ?2, ?3, ?4)",
            params![id, fullname, email, gcash_number],
        )?;
        Ok(())
    }

    pub fn insert_booking(&self, b: &BookingRow) -> EscrowResult<()> {
        self.conn.execute(
            "INSERT INTO bookings (
                id, owner_id, status, escrow_status, payout_status,
                total_amount, platform_fee, owner_payout, escrow_hold_reason, escrow_released_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                b.id,
                b.owner_id,
                b.status,
                b.escrow_status,
                b.payout_status,
                b.total_amount.to_string(),
                b.platform_fee.to_string(),
                b.owner_payout.to_string(),
                b.escrow_hold_reason,
                b.escrow_released_at,
            ],
        )?;
        Ok(())
    }

    pub fn insert_payment(&self, booking_id: BookingId, payment_status: &str) -> EscrowResult<()> {
        self.conn.execute(
            "INSERT INTO payments (booking_id, payment_status) VALUES (?1, ?2)",
            params![booking_id, payment_status],
        )?;
        Ok(())
    }

    /// Place funds in escrow for a booking. Returns the escrow id.
    pub fn insert_escrow(
        &self,
        booking_id: BookingId,
        amount: Decimal,
        held_at: DateTime<Utc>,
    ) -> EscrowResult<RowId> {
        self.conn.execute(
            "INSERT INTO escrow (booking_id, amount, status, held_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                booking_id,
                amount.to_string(),
                EscrowStatus::Held.as_str(),
                held_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}
