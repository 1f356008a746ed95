//! Status vocabularies for the rows this crate reads and writes.
//!
//! Rows keep statuses as the raw strings found in the database so that
//! unexpected values can still be reported back verbatim. These enums
//! are the values this crate itself writes or compares against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `bookings.escrow_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingEscrowStatus {
    None,
    Held,
    ReleasedToOwner,
    Refunded,
}

impl BookingEscrowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Held => "held",
            Self::ReleasedToOwner => "released_to_owner",
            Self::Refunded => "refunded",
        }
    }
}

/// `escrow.status`, one-way apart from manual correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    Held,
    Released,
    Refunded,
}

impl EscrowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Held => "held",
            Self::Released => "released",
            Self::Refunded => "refunded",
        }
    }
}

/// `payouts.status` and `bookings.payout_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Paid,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

/// `escrow_logs.action`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Release,
    Hold,
    Refund,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Hold => "hold",
            Self::Refund => "refund",
        }
    }
}

macro_rules! display_as_str {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(BookingEscrowStatus, EscrowStatus, PayoutStatus, AuditAction);
