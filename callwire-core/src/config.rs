//! Call configuration

use crate::media::MediaConstraints;
use crate::metrics::GatheringRequirement;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for one client's calling core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallConfig {
    /// How long to wait for gathering before forcing finalization, in ms
    pub gathering_timeout_ms: i64,
    /// Candidate mix that allows gathering to stop early
    pub gathering_requirement: GatheringRequirement,
    /// getUserMedia constraint ladder, most specific first
    pub constraint_profiles: Vec<MediaConstraints>,
    /// Number of errors kept in the diagnostics journal
    pub error_journal_capacity: usize,
    /// Send `bye` to the remote peer when ending a call locally
    pub notify_remote_on_end: bool,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            gathering_timeout_ms: 5_000,
            gathering_requirement: GatheringRequirement::default(),
            constraint_profiles: MediaConstraints::default_profiles(),
            error_journal_capacity: 50,
            notify_remote_on_end: true,
        }
    }
}

impl CallConfig {
    /// Override the gathering timeout
    #[must_use]
    pub fn with_gathering_timeout(mut self, timeout: Duration) -> Self {
        self.gathering_timeout_ms = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
        self
    }

    /// Override the gathering requirement
    #[must_use]
    pub fn with_requirement(mut self, requirement: GatheringRequirement) -> Self {
        self.gathering_requirement = requirement;
        self
    }

    /// Override the constraint ladder
    #[must_use]
    pub fn with_constraint_profiles(mut self, profiles: Vec<MediaConstraints>) -> Self {
        self.constraint_profiles = profiles;
        self
    }

    /// Parse a JSON configuration; missing fields keep their defaults
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
