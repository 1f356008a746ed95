//! Escrow audit trail.
//!
//! The release workflow always hands its audit entry to an `AuditSink`.
//! Whether anything is written is the sink's business: `TableAuditSink`
//! appends to `escrow_logs` inside the release transaction, `NoopAuditSink`
//! drops the entry. Sink failures never undo a release.

use crate::{
    config::ReleaseConfig,
    error::EscrowResult,
    status::{AuditAction, BookingEscrowStatus},
    store::StoreTx,
    types::{AdminId, BookingId},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub booking_id: BookingId,
    pub action: AuditAction,
    pub previous_status: BookingEscrowStatus,
    pub new_status: BookingEscrowStatus,
    pub admin: AdminId,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// What happened to the audit entry of a committed release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// The entry was persisted with the release.
    Recorded,
    /// The sink does not persist entries (auditing disabled).
    Skipped,
    /// The sink failed; the release committed without an entry.
    Failed,
}

pub trait AuditSink: Send + Sync {
    /// Stable name, used in logs.
    fn name(&self) -> &'static str;

    /// Record `entry` as part of the open transaction `tx`.
    /// Returns `Recorded` when something was written, `Skipped` otherwise.
    fn record(&self, tx: &StoreTx<'_>, entry: &AuditEntry) -> EscrowResult<AuditStatus>;
}

/// Appends to the `escrow_logs` table.
/// The table must exist (`EscrowStore::migrate_audit_log`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TableAuditSink;

impl AuditSink for TableAuditSink {
    fn name(&self) -> &'static str {
        "escrow_logs"
    }

    fn record(&self, tx: &StoreTx<'_>, entry: &AuditEntry) -> EscrowResult<AuditStatus> {
        tx.insert_audit_entry(entry)?;
        Ok(AuditStatus::Recorded)
    }
}

/// Auditing disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn record(&self, _tx: &StoreTx<'_>, _entry: &AuditEntry) -> EscrowResult<AuditStatus> {
        Ok(AuditStatus::Skipped)
    }
}

/// The sink matching `config.audit_enabled`.
pub fn sink_for(config: &ReleaseConfig) -> Box<dyn AuditSink> {
    if config.audit_enabled {
        Box::new(TableAuditSink)
    } else {
        Box::new(NoopAuditSink)
    }
}
