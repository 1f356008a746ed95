//! Shared fixtures for the escrow release tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use escrow_core::{
    audit::{AuditSink, TableAuditSink},
    clock::ReleaseClock,
    config::ReleaseConfig,
    store::{BookingRow, EscrowStore},
    types::{AdminId, BookingId},
    EscrowReleaseService,
};
use rust_decimal_macros::dec;

pub const BOOKING_ID: BookingId = 42;
pub const OWNER_ID: i64 = 5;
pub const OWNER_NAME: &str = "Juan Dela Cruz";
pub const OWNER_GCASH: &str = "09171234567";

pub fn admin() -> AdminId {
    AdminId::new(7).unwrap()
}

pub fn release_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
}

/// A booking fixture. `Scenario::default()` is the releasable booking 42:
/// total 1000.00, fee 100.00, payout 900.00, payment verified, completed.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub booking: BookingRow,
    pub owner_gcash: Option<&'static str>,
    pub payment_status: Option<&'static str>,
    pub with_escrow: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            booking: BookingRow {
                id: BOOKING_ID,
                owner_id: OWNER_ID,
                status: "completed".into(),
                escrow_status: "held".into(),
                payout_status: None,
                total_amount: dec!(1000.00),
                platform_fee: dec!(100.00),
                owner_payout: dec!(900.00),
                escrow_hold_reason: None,
                escrow_released_at: None,
            },
            owner_gcash: Some(OWNER_GCASH),
            payment_status: Some("verified"),
            with_escrow: true,
        }
    }
}

impl Scenario {
    pub fn seed(&self, store: &EscrowStore) {
        store
            .insert_user(
                self.booking.owner_id,
                OWNER_NAME,
                Some("juan@example.com"),
                self.owner_gcash,
            )
            .unwrap();
        store.insert_booking(&self.booking).unwrap();
        if let Some(status) = self.payment_status {
            store.insert_payment(self.booking.id, status).unwrap();
        }
        if self.with_escrow {
            store
                .insert_escrow(
                    self.booking.id,
                    self.booking.total_amount,
                    release_time() - chrono::Duration::days(3),
                )
                .unwrap();
        }
    }
}

/// Migrated in-memory store with the audit table.
pub fn memory_store() -> EscrowStore {
    let store = EscrowStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.migrate_audit_log().unwrap();
    store
}

/// Migrated store backed by a file, for tests that need a second connection.
pub fn file_store(path: &str) -> EscrowStore {
    let store = EscrowStore::open(path).unwrap();
    store.migrate().unwrap();
    store.migrate_audit_log().unwrap();
    store
}

pub fn service_with(store: EscrowStore, audit: Box<dyn AuditSink>) -> EscrowReleaseService {
    service_with_config(ReleaseConfig::default_test(), store, audit)
}

pub fn service_with_config(
    config: ReleaseConfig,
    store: EscrowStore,
    audit: Box<dyn AuditSink>,
) -> EscrowReleaseService {
    EscrowReleaseService::new(config, store, audit)
        .unwrap()
        .with_clock(ReleaseClock::Fixed(release_time()))
}

pub fn service(store: EscrowStore) -> EscrowReleaseService {
    service_with(store, Box::new(TableAuditSink))
}

/// In-memory service seeded with `scenario`.
pub fn seeded(scenario: &Scenario) -> EscrowReleaseService {
    let store = memory_store();
    scenario.seed(&store);
    service(store)
}
