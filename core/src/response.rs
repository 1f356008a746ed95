//! JSON response shape handed back to the caller of a release.
//!
//! `{"success": bool, "message": string}` always; a successful release
//! additionally carries `booking_id`, `owner_payout` and `owner_name`.

use crate::{error::EscrowError, release::ReleaseOutcome, types::BookingId};
use rust_decimal::Decimal;
use serde::Serialize;

pub const RELEASE_SUCCESS_MESSAGE: &str =
    "Escrow released successfully! Payout scheduled for owner.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub details: Option<ReleaseDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseDetails {
    pub booking_id: BookingId,
    #[serde(with = "rust_decimal::serde::float")]
    pub owner_payout: Decimal,
    pub owner_name: Option<String>,
}

impl ReleaseResponse {
    pub fn success(outcome: &ReleaseOutcome) -> Self {
        Self {
            success: true,
            message: RELEASE_SUCCESS_MESSAGE.to_string(),
            details: Some(ReleaseDetails {
                booking_id: outcome.booking_id,
                owner_payout: outcome.owner_payout,
                owner_name: outcome.owner_name.clone(),
            }),
        }
    }

    pub fn failure(err: &EscrowError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            details: None,
        }
    }

    pub fn from_result(result: &Result<ReleaseOutcome, EscrowError>) -> Self {
        match result {
            Ok(outcome) => Self::success(outcome),
            Err(e) => Self::failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn failure_carries_only_success_and_message() {
        let response = ReleaseResponse::failure(&EscrowError::NotFound { booking_id: 9 });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "message": "Booking not found" })
        );
    }

    #[test]
    fn success_flattens_details() {
        let outcome = ReleaseOutcome {
            booking_id: 42,
            escrow_id: 1,
            payout_id: 1,
            owner_payout: Decimal::new(90000, 2),
            owner_name: Some("Juan Dela Cruz".into()),
            released_at: Utc::now(),
            audit: crate::audit::AuditStatus::Recorded,
        };
        let json = serde_json::to_value(ReleaseResponse::success(&outcome)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["booking_id"], 42);
        assert_eq!(json["owner_payout"].as_f64(), Some(900.0));
        assert_eq!(json["owner_name"], "Juan Dela Cruz");
        assert_eq!(json["message"], RELEASE_SUCCESS_MESSAGE);
    }
}
