//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The release workflow calls `StoreTx` methods and never executes SQL directly.

mod audit_log;
mod booking;
mod escrow;
mod payout;
mod release;
mod seed;

use crate::{
    error::EscrowResult,
    types::{BookingId, RowId, UserId},
};
use chrono::{DateTime, Utc};
use rusqlite::{types::Type, Connection, Row, Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use serde::Serialize;
use std::{str::FromStr, time::Duration};

pub struct EscrowStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl EscrowStore {
    pub fn open(path: &str) -> EscrowResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EscrowResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    /// For file-based databases, this opens the same file.
    pub fn reopen(&self) -> EscrowResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// How long a write waits for another connection's lock.
    pub fn set_busy_timeout(&self, timeout: Duration) -> EscrowResult<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Apply the core schema.
    pub fn migrate(&self) -> EscrowResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_rental_escrow.sql"))?;
        Ok(())
    }

    /// Create the optional `escrow_logs` table.
    /// Only needed when the table-backed audit sink is in use.
    pub fn migrate_audit_log(&self) -> EscrowResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/002_escrow_logs.sql"))?;
        Ok(())
    }

    /// Start a write transaction that holds the database write lock from the
    /// first read onward, so concurrent releases run one after another.
    ///
    /// Dropping the returned value without `commit()` rolls everything back.
    pub fn begin_immediate(&mut self) -> EscrowResult<StoreTx<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(StoreTx { tx })
    }

    /// Every booking, escrow and payout row, ordered by id.
    /// Two snapshots compare equal iff none of the three tables changed.
    pub fn financial_snapshot(&self) -> EscrowResult<FinancialSnapshot> {
        Ok(FinancialSnapshot {
            bookings: self.all_bookings()?,
            escrow: self.all_escrow()?,
            payouts: self.all_payouts()?,
        })
    }
}

/// A write transaction on the escrow tables.
pub struct StoreTx<'conn> {
    tx: Transaction<'conn>,
}

impl StoreTx<'_> {
    pub fn commit(self) -> EscrowResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

/// Money columns are TEXT holding an exact decimal.
fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ── Row types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingRow {
    pub id: BookingId,
    pub owner_id: UserId,
    pub status: String,
    pub escrow_status: String,
    pub payout_status: Option<String>,
    pub total_amount: Decimal,
    pub platform_fee: Decimal,
    pub owner_payout: Decimal,
    pub escrow_hold_reason: Option<String>,
    pub escrow_released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscrowRow {
    pub id: RowId,
    pub booking_id: BookingId,
    pub amount: Decimal,
    pub status: String,
    pub held_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    pub release_reason: Option<String>,
    pub processed_by: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutRow {
    pub id: RowId,
    pub booking_id: BookingId,
    pub owner_id: UserId,
    pub escrow_id: RowId,
    pub amount: Decimal,
    pub platform_fee: Decimal,
    pub net_amount: Decimal,
    pub payout_method: String,
    pub payout_account: String,
    pub status: String,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A payout obligation about to be scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayout {
    pub booking_id: BookingId,
    pub owner_id: UserId,
    pub escrow_id: RowId,
    pub amount: Decimal,
    pub platform_fee: Decimal,
    pub net_amount: Decimal,
    pub payout_method: String,
    pub payout_account: String,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLogRow {
    pub id: RowId,
    pub booking_id: BookingId,
    pub action: String,
    pub previous_status: String,
    pub new_status: String,
    pub admin_id: UserId,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Booking joined with its payment and owner: everything the release
/// preconditions look at, read once.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseContextRow {
    pub booking: BookingRow,
    pub payment_status: Option<String>,
    pub owner_name: Option<String>,
    pub owner_gcash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    pub bookings: Vec<BookingRow>,
    pub escrow: Vec<EscrowRow>,
    pub payouts: Vec<PayoutRow>,
}
