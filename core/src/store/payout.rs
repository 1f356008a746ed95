use super::{decimal_at, EscrowStore, PayoutRow};
use crate::{error::EscrowResult, types::BookingId};
use rusqlite::{params, Row};

const PAYOUT_COLUMNS: &str = "id, booking_id, owner_id, escrow_id, amount, platform_fee, net_amount,
     payout_method, payout_account, status, scheduled_at, created_at";

fn payout_from_row(row: &Row<'_>) -> rusqlite::Result<PayoutRow> {
    Ok(PayoutRow {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        owner_id: row.get(2)?,
        escrow_id: row.get(3)?,
        amount: decimal_at(row, 4)?,
        platform_fee: decimal_at(row, 5)?,
        net_amount: decimal_at(row, 6)?,
        payout_method: row.get(7)?,
        payout_account: row.get(8)?,
        status: row.get(9)?,
        scheduled_at: row.get(10)?,
        created_at: row.get(11)?,
    })
}

impl EscrowStore {
    // ── Payouts ───────────────────────────────────────────────────

    pub fn payouts_for_booking(&self, booking_id: BookingId) -> EscrowResult<Vec<PayoutRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM payouts WHERE booking_id = ?1 ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![booking_id], payout_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn payout_count(&self) -> EscrowResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM payouts", [], |row| row.get(0))?;
        Ok(count)
    }

    pub(super) fn all_payouts(&self) -> EscrowResult<Vec<PayoutRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PAYOUT_COLUMNS} FROM payouts ORDER BY id ASC"))?;
        let rows = stmt.query_map([], payout_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
