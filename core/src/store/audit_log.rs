use super::{AuditLogRow, EscrowStore, StoreTx};
use crate::{audit::AuditEntry, error::EscrowResult, types::BookingId};
use rusqlite::params;

impl StoreTx<'_> {
    // ── Escrow audit log ──────────────────────────────────────────

    pub fn insert_audit_entry(&self, entry: &AuditEntry) -> EscrowResult<()> {
        self.tx.execute(
            "INSERT INTO escrow_logs (
                booking_id, action, previous_status, new_status, admin_id, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.booking_id,
                entry.action.as_str(),
                entry.previous_status.as_str(),
                entry.new_status.as_str(),
                entry.admin.get(),
                entry.notes,
                entry.created_at,
            ],
        )?;
        Ok(())
    }
}

impl EscrowStore {
    pub fn audit_entries_for_booking(&self, booking_id: BookingId) -> EscrowResult<Vec<AuditLogRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, booking_id, action, previous_status, new_status, admin_id, notes, created_at
             FROM escrow_logs WHERE booking_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![booking_id], |row| {
            Ok(AuditLogRow {
                id: row.get(0)?,
                booking_id: row.get(1)?,
                action: row.get(2)?,
                previous_status: row.get(3)?,
                new_status: row.get(4)?,
                admin_id: row.get(5)?,
                notes: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
