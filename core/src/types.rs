//! Shared primitive types used across the escrow workflow.

use crate::error::{EscrowError, EscrowResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary key of a booking row.
pub type BookingId = i64;

/// Primary key of a user row (owners and admins alike).
pub type UserId = i64;

/// Primary key of any other row (escrow, payout, audit entry).
pub type RowId = i64;

/// An authenticated admin identity.
///
/// Authentication happens outside this crate; the caller hands the
/// workflow an identity it already trusts. Construction only rejects
/// ids that cannot belong to a real user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminId(UserId);

impl AdminId {
    pub fn new(id: UserId) -> EscrowResult<Self> {
        if id <= 0 {
            return Err(EscrowError::Unauthorized);
        }
        Ok(Self(id))
    }

    pub fn get(self) -> UserId {
        self.0
    }
}

impl fmt::Display for AdminId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
