//! escrow-core: escrow release for completed vehicle-rental bookings.
//!
//! RULE: Only the store talks to the database.
//! The release workflow calls store methods inside one transaction
//! and never executes SQL directly.

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod release;
pub mod response;
pub mod status;
pub mod store;
pub mod types;

pub use error::{EscrowError, EscrowResult};
pub use release::{EscrowReleaseService, ReleaseOutcome};
