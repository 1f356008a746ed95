use crate::types::BookingId;
use thiserror::Error;

/// Every way a release can fail.
///
/// Display strings are the human-readable messages handed back to the
/// caller, so they carry current statuses but no internal ids beyond
/// the booking id.
#[derive(Error, Debug)]
pub enum EscrowError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Booking ID is required")]
    InvalidBookingId { booking_id: i64 },

    #[error("Booking not found")]
    NotFound { booking_id: BookingId },

    #[error("Escrow is not in held status. Current status: {current}")]
    InvalidState { booking_id: BookingId, current: String },

    #[error("Cannot release escrow that is on hold. Please resolve the hold first.")]
    Blocked { booking_id: BookingId, reason: String },

    #[error("Payment must be verified before releasing escrow")]
    PaymentNotVerified {
        booking_id: BookingId,
        current: Option<String>,
    },

    #[error("Booking status must be {allowed}. Current: {current}")]
    InvalidBookingStatus {
        booking_id: BookingId,
        current: String,
        allowed: String,
    },

    #[error("Escrow record not found for this booking")]
    EscrowRecordMissing { booking_id: BookingId },

    #[error("Failed to {action}: expected 1 row, {affected} affected")]
    RowsAffected {
        action: &'static str,
        affected: usize,
    },

    #[error("Failed to {action}: {source}")]
    Persistence {
        action: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EscrowError {
    /// Stable snake_case identifier, used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidBookingId { .. } => "invalid_booking_id",
            Self::NotFound { .. } => "not_found",
            Self::InvalidState { .. } => "invalid_state",
            Self::Blocked { .. } => "blocked",
            Self::PaymentNotVerified { .. } => "payment_not_verified",
            Self::InvalidBookingStatus { .. } => "invalid_booking_status",
            Self::EscrowRecordMissing { .. } => "escrow_record_missing",
            Self::RowsAffected { .. } | Self::Persistence { .. } | Self::Database(_) => {
                "persistence_error"
            }
            Self::Serialization(_) => "serialization_error",
            Self::Config(_) => "config_error",
            Self::Other(_) => "internal_error",
        }
    }

    /// True for failures reported by the store rather than by a precondition.
    pub fn is_persistence(&self) -> bool {
        self.code() == "persistence_error"
    }
}

/// Wrap a store failure with the write it interrupted.
pub(crate) fn persistence(action: &'static str) -> impl FnOnce(rusqlite::Error) -> EscrowError {
    move |source| EscrowError::Persistence { action, source }
}

pub type EscrowResult<T> = Result<T, EscrowError>;
