//! Escrow release. Moves a booking from "escrow held" to
//! "escrow released, payout scheduled".
//!
//! Everything happens inside one IMMEDIATE transaction:
//!   1. read booking ⟕ payment ⟕ owner
//!   2. check preconditions (escrow held, no hold reason, payment verified,
//!      booking status releasable)
//!   3. look up the escrow row
//!   4. mark escrow released, mark booking released, insert payout
//!   5. hand an audit entry to the sink (best effort)
//!
//! Any error before commit drops the transaction, which rolls back every
//! write made so far. The audit sink is only reached once all writes
//! have succeeded.

use crate::{
    audit::{AuditEntry, AuditSink, AuditStatus},
    clock::ReleaseClock,
    config::ReleaseConfig,
    error::{EscrowError, EscrowResult},
    status::{AuditAction, BookingEscrowStatus},
    store::{EscrowStore, NewPayout, ReleaseContextRow},
    types::{AdminId, BookingId, RowId},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// What a successful release produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseOutcome {
    pub booking_id: BookingId,
    pub escrow_id: RowId,
    pub payout_id: RowId,
    pub owner_payout: Decimal,
    pub owner_name: Option<String>,
    pub released_at: DateTime<Utc>,
    /// Whether the audit entry was written. `Failed` still means the
    /// release itself committed.
    pub audit: AuditStatus,
}

pub struct EscrowReleaseService {
    config: ReleaseConfig,
    store: EscrowStore,
    audit: Box<dyn AuditSink>,
    clock: ReleaseClock,
}

impl EscrowReleaseService {
    /// Takes ownership of `store` and applies the configured busy timeout to it.
    pub fn new(
        config: ReleaseConfig,
        store: EscrowStore,
        audit: Box<dyn AuditSink>,
    ) -> EscrowResult<Self> {
        config.validate()?;
        store.set_busy_timeout(config.busy_timeout())?;
        Ok(Self {
            config,
            store,
            audit,
            clock: ReleaseClock::System,
        })
    }

    pub fn with_clock(mut self, clock: ReleaseClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &EscrowStore {
        &self.store
    }

    /// Release the escrow of `booking_id` on behalf of `admin`.
    pub fn release_escrow(
        &mut self,
        booking_id: BookingId,
        admin: AdminId,
    ) -> EscrowResult<ReleaseOutcome> {
        match self.try_release(booking_id, admin) {
            Ok(outcome) => {
                log::info!(
                    "booking={booking_id} escrow released by admin={admin}: payout={} net={}",
                    outcome.payout_id,
                    outcome.owner_payout
                );
                // TODO: notify the owner of the scheduled payout once notification delivery exists.
                Ok(outcome)
            }
            Err(e) => {
                log::warn!(
                    "booking={booking_id} escrow release rejected ({}): {e}",
                    e.code()
                );
                Err(e)
            }
        }
    }

    fn try_release(
        &mut self,
        booking_id: BookingId,
        admin: AdminId,
    ) -> EscrowResult<ReleaseOutcome> {
        if booking_id <= 0 {
            return Err(EscrowError::InvalidBookingId { booking_id });
        }

        let now = self.clock.now();
        let tx = self.store.begin_immediate()?;

        let ctx = tx
            .release_context(booking_id)?
            .ok_or(EscrowError::NotFound { booking_id })?;
        check_preconditions(&ctx, &self.config)?;

        let escrow_id = tx
            .escrow_id_for_booking(booking_id)?
            .ok_or(EscrowError::EscrowRecordMissing { booking_id })?;

        tx.mark_escrow_released(booking_id, admin, now, &self.config.release_reason)?;
        tx.mark_booking_released(booking_id, now)?;

        let booking = &ctx.booking;
        let payout = NewPayout {
            booking_id,
            owner_id: booking.owner_id,
            escrow_id,
            amount: booking.total_amount,
            platform_fee: booking.platform_fee,
            net_amount: booking.owner_payout,
            payout_method: self.config.payout_method.clone(),
            payout_account: payout_account(&ctx, &self.config),
            scheduled_at: now,
        };
        let payout_id = tx.insert_payout(&payout)?;

        let entry = AuditEntry {
            booking_id,
            action: AuditAction::Release,
            previous_status: BookingEscrowStatus::Held,
            new_status: BookingEscrowStatus::ReleasedToOwner,
            admin,
            notes: self.config.audit_note.clone(),
            created_at: now,
        };
        let audit = match self.audit.record(&tx, &entry) {
            Ok(status) => status,
            Err(e) => {
                log::warn!(
                    "booking={booking_id} audit sink '{}' failed, release continues: {e}",
                    self.audit.name()
                );
                AuditStatus::Failed
            }
        };

        tx.commit()?;

        Ok(ReleaseOutcome {
            booking_id,
            escrow_id,
            payout_id,
            owner_payout: booking.owner_payout,
            owner_name: ctx.owner_name.clone(),
            released_at: now,
            audit,
        })
    }
}

/// Checks that need only the joined booking read, in the order they are
/// reported: escrow held, no manual hold, payment verified, booking status.
fn check_preconditions(ctx: &ReleaseContextRow, config: &ReleaseConfig) -> EscrowResult<()> {
    let booking = &ctx.booking;
    let booking_id = booking.id;

    if booking.escrow_status != BookingEscrowStatus::Held.as_str() {
        return Err(EscrowError::InvalidState {
            booking_id,
            current: booking.escrow_status.clone(),
        });
    }

    if let Some(reason) = booking
        .escrow_hold_reason
        .as_deref()
        .filter(|r| !r.trim().is_empty())
    {
        return Err(EscrowError::Blocked {
            booking_id,
            reason: reason.to_string(),
        });
    }

    let verified = ctx
        .payment_status
        .as_ref()
        .is_some_and(|s| config.verified_payment_statuses.contains(s));
    if !verified {
        return Err(EscrowError::PaymentNotVerified {
            booking_id,
            current: ctx.payment_status.clone(),
        });
    }

    if !config.releasable_booking_statuses.contains(&booking.status) {
        return Err(EscrowError::InvalidBookingStatus {
            booking_id,
            current: booking.status.clone(),
            allowed: config.releasable_statuses_label(),
        });
    }

    Ok(())
}

/// The owner's GCash number, or the configured placeholder when unset.
fn payout_account(ctx: &ReleaseContextRow, config: &ReleaseConfig) -> String {
    ctx.owner_gcash
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| config.payout_account_fallback.clone())
}
