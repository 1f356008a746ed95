//! escrow-runner: headless escrow release runner.
//!
//! Usage:
//!   escrow-runner --db rentals.db --admin-id 7 --booking-id 42
//!   escrow-runner --db rentals.db --admin-id 7 --ipc-mode
//!   escrow-runner --demo --booking-id 42
//!
//! IPC mode reads one JSON request per line on stdin and writes one JSON
//! response per line on stdout:
//!   {"type":"release_escrow","booking_id":42}
//!   {"type":"get_booking","booking_id":42}
//!   {"type":"list_held"}
//!   {"type":"quit"}

use anyhow::Result;
use escrow_core::{
    audit::{sink_for, AuditStatus},
    config::ReleaseConfig,
    response::ReleaseResponse,
    status::BookingEscrowStatus,
    store::{BookingRow, EscrowStore},
    types::AdminId,
    EscrowError, EscrowReleaseService,
};
use rust_decimal::Decimal;
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    ReleaseEscrow {
        #[serde(default)]
        booking_id: Option<i64>,
        /// Overrides the session admin for this request.
        #[serde(default)]
        admin_id: Option<i64>,
    },
    GetBooking {
        booking_id: i64,
    },
    ListHeld,
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let demo = args.iter().any(|a| a == "--demo");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let session_admin: Option<i64> = parse_arg(&args, "--admin-id");
    let booking_id: Option<i64> = parse_arg(&args, "--booking-id");

    let config = match flag_value(&args, "--data-dir") {
        Some(dir) => ReleaseConfig::load(dir)?,
        None => ReleaseConfig::default(),
    };
    config.validate()?;

    let store = EscrowStore::open(db)?;
    store.migrate()?;
    if config.audit_enabled {
        store.migrate_audit_log()?;
    }
    if demo {
        seed_demo(&store)?;
    }

    let audit = sink_for(&config);
    log::info!("escrow-runner: db={db} audit={}", audit.name());
    let mut service = EscrowReleaseService::new(config, store, audit)?;

    if ipc_mode {
        run_ipc_loop(&mut service, session_admin)?;
    } else {
        // Demo mode defaults to its own admin and booking.
        let admin = session_admin.or(demo.then_some(DEMO_ADMIN_ID));
        let booking = booking_id.or(demo.then_some(DEMO_BOOKING_ID));
        let response = release(&mut service, booking, admin);
        println!("{}", serde_json::to_string(&response)?);
    }

    Ok(())
}

fn run_ipc_loop(service: &mut EscrowReleaseService, session_admin: Option<i64>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let Some(reply) = handle_line(service, session_admin, &buffer) else {
            break;
        };
        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
    }
    Ok(())
}

/// Answer one IPC request line. `None` means the client asked to quit.
/// A line that does not parse gets a failure reply and the session goes on.
fn handle_line(
    service: &mut EscrowReleaseService,
    session_admin: Option<i64>,
    line: &str,
) -> Option<serde_json::Value> {
    let cmd: IpcCommand = match serde_json::from_str(line) {
        Ok(c) => c,
        Err(e) => {
            return Some(serde_json::json!({ "success": false, "message": e.to_string() }));
        }
    };

    let reply = match cmd {
        IpcCommand::Quit => return None,
        IpcCommand::ReleaseEscrow {
            booking_id,
            admin_id,
        } => {
            let response = release(service, booking_id, admin_id.or(session_admin));
            serde_json::to_value(&response)
                .unwrap_or_else(|e| failure_json(&EscrowError::Serialization(e)))
        }
        IpcCommand::GetBooking { booking_id } => booking_view(service.store(), booking_id),
        IpcCommand::ListHeld => match service
            .store()
            .bookings_with_escrow_status(BookingEscrowStatus::Held.as_str())
        {
            Ok(rows) => serde_json::json!({ "success": true, "bookings": rows }),
            Err(e) => failure_json(&e),
        },
    };
    Some(reply)
}

/// Validate the caller-supplied ids, run the release, and shape the reply.
/// Workflow errors become failure responses; they never end the process.
fn release(
    service: &mut EscrowReleaseService,
    booking_id: Option<i64>,
    admin_id: Option<i64>,
) -> ReleaseResponse {
    let admin = match admin_id.map(AdminId::new) {
        Some(Ok(admin)) => admin,
        Some(Err(e)) => return ReleaseResponse::failure(&e),
        None => return ReleaseResponse::failure(&EscrowError::Unauthorized),
    };
    let Some(booking_id) = booking_id.filter(|id| *id > 0) else {
        return ReleaseResponse::failure(&EscrowError::InvalidBookingId {
            booking_id: booking_id.unwrap_or(0),
        });
    };

    let result = service.release_escrow(booking_id, admin);
    if let Ok(outcome) = &result {
        if outcome.audit == AuditStatus::Failed {
            log::warn!("booking={booking_id} released without an audit entry");
        }
    }
    ReleaseResponse::from_result(&result)
}

fn booking_view(store: &EscrowStore, booking_id: i64) -> serde_json::Value {
    let lookup = || -> escrow_core::EscrowResult<serde_json::Value> {
        let Some(booking) = store.booking(booking_id)? else {
            return Err(EscrowError::NotFound { booking_id });
        };
        Ok(serde_json::json!({
            "success": true,
            "booking": booking,
            "escrow": store.escrow_for_booking(booking_id)?,
            "payouts": store.payouts_for_booking(booking_id)?,
        }))
    };
    lookup().unwrap_or_else(|e| failure_json(&e))
}

fn failure_json(err: &EscrowError) -> serde_json::Value {
    serde_json::json!({ "success": false, "message": err.to_string() })
}

const DEMO_ADMIN_ID: i64 = 1;
const DEMO_BOOKING_ID: i64 = 42;

/// Seed the reference rental: booking 42, completed, payment verified,
/// 1000.00 total with a 100.00 platform fee.
fn seed_demo(store: &EscrowStore) -> Result<()> {
    if store.booking(DEMO_BOOKING_ID)?.is_some() {
        log::info!("demo booking {DEMO_BOOKING_ID} already present, skipping seed");
        return Ok(());
    }
    store.insert_user(DEMO_ADMIN_ID, "Platform Admin", Some("admin@cargo.local"), None)?;
    store.insert_user(5, "Juan Dela Cruz", Some("juan@example.com"), Some("09171234567"))?;
    let booking = BookingRow {
        id: DEMO_BOOKING_ID,
        owner_id: 5,
        status: "completed".into(),
        escrow_status: BookingEscrowStatus::Held.as_str().into(),
        payout_status: None,
        total_amount: Decimal::new(100_000, 2),
        platform_fee: Decimal::new(10_000, 2),
        owner_payout: Decimal::new(90_000, 2),
        escrow_hold_reason: None,
        escrow_released_at: None,
    };
    store.insert_booking(&booking)?;
    store.insert_payment(DEMO_BOOKING_ID, "verified")?;
    store.insert_escrow(DEMO_BOOKING_ID, booking.total_amount, chrono::Utc::now())?;
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    flag_value(args, flag).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_service() -> EscrowReleaseService {
        let config = ReleaseConfig::default();
        let store = EscrowStore::in_memory().unwrap();
        store.migrate().unwrap();
        store.migrate_audit_log().unwrap();
        seed_demo(&store).unwrap();
        let audit = sink_for(&config);
        EscrowReleaseService::new(config, store, audit).unwrap()
    }

    fn message(response: &ReleaseResponse) -> (bool, String) {
        let value = serde_json::to_value(response).unwrap();
        (
            value["success"].as_bool().unwrap(),
            value["message"].as_str().unwrap().to_string(),
        )
    }

    #[test]
    fn missing_admin_is_unauthorized() {
        let mut svc = demo_service();
        let response = release(&mut svc, Some(DEMO_BOOKING_ID), None);
        assert_eq!(message(&response), (false, "Unauthorized".to_string()));
        assert_eq!(svc.store().payout_count().unwrap(), 0);
    }

    #[test]
    fn zero_admin_is_unauthorized() {
        let mut svc = demo_service();
        let response = release(&mut svc, Some(DEMO_BOOKING_ID), Some(0));
        assert_eq!(message(&response), (false, "Unauthorized".to_string()));
        assert_eq!(svc.store().payout_count().unwrap(), 0);
    }

    #[test]
    fn missing_booking_id_is_rejected() {
        let mut svc = demo_service();
        let response = release(&mut svc, None, Some(DEMO_ADMIN_ID));
        assert_eq!(message(&response), (false, "Booking ID is required".to_string()));
        assert_eq!(svc.store().payout_count().unwrap(), 0);
    }

    #[test]
    fn demo_booking_releases() {
        let mut svc = demo_service();
        let response = release(&mut svc, Some(DEMO_BOOKING_ID), Some(DEMO_ADMIN_ID));
        assert!(message(&response).0);
        assert_eq!(svc.store().payout_count().unwrap(), 1);
    }

    #[test]
    fn malformed_line_does_not_end_the_session() {
        let mut svc = demo_service();

        let bad = handle_line(&mut svc, Some(DEMO_ADMIN_ID), "{not json").unwrap();
        assert_eq!(bad["success"], false);
        assert!(bad["message"].as_str().is_some_and(|m| !m.is_empty()));

        let good = handle_line(
            &mut svc,
            Some(DEMO_ADMIN_ID),
            r#"{"type":"release_escrow","booking_id":42}"#,
        )
        .unwrap();
        assert_eq!(good["success"], true, "got {good}");
        assert_eq!(good["booking_id"], 42);
    }

    #[test]
    fn request_admin_overrides_session_admin() {
        let mut svc = demo_service();
        let reply = handle_line(
            &mut svc,
            None,
            r#"{"type":"release_escrow","booking_id":42,"admin_id":1}"#,
        )
        .unwrap();
        assert_eq!(reply["success"], true, "got {reply}");
    }

    #[test]
    fn get_booking_and_list_held() {
        let mut svc = demo_service();
        let held = handle_line(&mut svc, None, r#"{"type":"list_held"}"#).unwrap();
        assert_eq!(held["bookings"].as_array().map(Vec::len), Some(1));

        let missing = handle_line(&mut svc, None, r#"{"type":"get_booking","booking_id":99}"#)
            .unwrap();
        assert_eq!(missing["success"], false);
    }

    #[test]
    fn quit_ends_the_session() {
        let mut svc = demo_service();
        assert!(handle_line(&mut svc, None, r#"{"type":"quit"}"#).is_none());
    }
}
