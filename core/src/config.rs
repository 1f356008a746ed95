use crate::error::{EscrowError, EscrowResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the escrow release workflow.
///
/// Loaded from `{data_dir}/escrow/release.json`. Every field has a default,
/// so the file only needs the keys it overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Written to `escrow.release_reason`.
    pub release_reason: String,
    /// Payout channel recorded on every scheduled payout.
    pub payout_method: String,
    /// Recorded as the payout account when the owner has none on file.
    pub payout_account_fallback: String,
    /// Note attached to the audit entry of a release.
    pub audit_note: String,
    /// Booking statuses that allow release.
    ///
    /// Permissive by default: completed, ongoing and approved all pass.
    /// Whether release should require completion is pending product review.
    pub releasable_booking_statuses: Vec<String>,
    /// Payment statuses that count as verified.
    pub verified_payment_statuses: Vec<String>,
    /// Write `escrow_logs` entries. When false a no-op sink is used.
    pub audit_enabled: bool,
    /// How long a writer waits on a locked database before giving up.
    pub busy_timeout_ms: u64,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            release_reason: "Rental completed".into(),
            payout_method: "gcash".into(),
            payout_account_fallback: "Not Set".into(),
            audit_note: "Escrow released to owner".into(),
            releasable_booking_statuses: vec![
                "completed".into(),
                "ongoing".into(),
                "approved".into(),
            ],
            verified_payment_statuses: vec!["verified".into(), "paid".into()],
            audit_enabled: true,
            busy_timeout_ms: 5_000,
        }
    }
}

impl ReleaseConfig {
    /// Load from the data/ directory.
    /// In tests, use ReleaseConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/escrow/release.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ReleaseConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with a short busy timeout so lock contention in tests
    /// surfaces quickly.
    pub fn default_test() -> Self {
        Self {
            busy_timeout_ms: 2_000,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> EscrowResult<()> {
        if self.releasable_booking_statuses.is_empty() {
            return Err(EscrowError::Config(
                "releasable_booking_statuses must not be empty".into(),
            ));
        }
        if self.verified_payment_statuses.is_empty() {
            return Err(EscrowError::Config(
                "verified_payment_statuses must not be empty".into(),
            ));
        }
        if self.payout_method.trim().is_empty() {
            return Err(EscrowError::Config("payout_method must not be empty".into()));
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// "completed, ongoing, or approved", used in rejection messages.
    pub fn releasable_statuses_label(&self) -> String {
        match self.releasable_booking_statuses.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            [init @ .., last] => format!("{}, or {last}", init.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ReleaseConfig =
            serde_json::from_str(r#"{ "audit_enabled": false }"#).unwrap();
        assert!(!config.audit_enabled);
        assert_eq!(config.payout_method, "gcash");
        assert_eq!(config.verified_payment_statuses, vec!["verified", "paid"]);
    }

    #[test]
    fn label_matches_default_wording() {
        let config = ReleaseConfig::default();
        assert_eq!(
            config.releasable_statuses_label(),
            "completed, ongoing, or approved"
        );
    }

    #[test]
    fn loads_shipped_data_file() {
        let data_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../data");
        let config = ReleaseConfig::load(data_dir).unwrap();
        assert_eq!(config, ReleaseConfig::default());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = ReleaseConfig::load("/nonexistent").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/escrow/release.json"));
    }

    #[test]
    fn empty_status_list_is_rejected() {
        let config = ReleaseConfig {
            releasable_booking_statuses: Vec::new(),
            ..ReleaseConfig::default()
        };
        assert!(matches!(config.validate(), Err(EscrowError::Config(_))));
    }
}
