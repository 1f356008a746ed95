//! Store faults in the middle of a release roll back every earlier write.

mod common;

use common::*;
use rusqlite::Connection;

fn db_path(dir: &tempfile::TempDir) -> String {
    dir.path().join("escrow.db").to_string_lossy().into_owned()
}

/// The payout insert fails after the escrow and booking updates ran.
#[test]
fn payout_insert_fault_rolls_back_escrow_and_booking() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_path(&dir);
    let store = file_store(&path);
    Scenario::default().seed(&store);

    let side = Connection::open(&path).unwrap();
    side.execute_batch(
        "CREATE TRIGGER payouts_fault BEFORE INSERT ON payouts
         BEGIN SELECT RAISE(ABORT, 'simulated store fault'); END;",
    )
    .unwrap();

    let mut svc = service(store);
    let before = svc.store().financial_snapshot().unwrap();
    let err = svc.release_escrow(BOOKING_ID, admin()).unwrap_err();

    assert!(err.is_persistence(), "expected a persistence error, got {err:?}");
    assert!(err.to_string().contains("create payout record"));
    assert_eq!(before, svc.store().financial_snapshot().unwrap());
    assert!(svc.store().audit_entries_for_booking(BOOKING_ID).unwrap().is_empty());

    let escrow = svc.store().escrow_for_booking(BOOKING_ID).unwrap().unwrap();
    assert_eq!(escrow.status, "held");
    assert_eq!(escrow.processed_by, None);

    // Nothing stays locked: once the fault is gone the release goes through.
    side.execute_batch("DROP TRIGGER payouts_fault;").unwrap();
    svc.release_escrow(BOOKING_ID, admin()).unwrap();
    assert_eq!(svc.store().payout_count().unwrap(), 1);
}

/// Booking says held while the escrow row was already released by hand:
/// the escrow update matches no row and the release aborts.
#[test]
fn escrow_update_matching_no_row_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_path(&dir);
    let store = file_store(&path);
    Scenario::default().seed(&store);

    let side = Connection::open(&path).unwrap();
    side.execute("UPDATE escrow SET status = 'released' WHERE booking_id = ?1", [BOOKING_ID])
        .unwrap();

    let mut svc = service(store);
    let before = svc.store().financial_snapshot().unwrap();
    let err = svc.release_escrow(BOOKING_ID, admin()).unwrap_err();

    assert!(
        matches!(err, escrow_core::EscrowError::RowsAffected { affected: 0, .. }),
        "expected RowsAffected, got {err:?}"
    );
    assert_eq!(before, svc.store().financial_snapshot().unwrap());
}
