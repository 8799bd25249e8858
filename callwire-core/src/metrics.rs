//! ICE candidate classification and the "good enough" gathering policy

use crate::types::{CandidateType, IceCandidate};
use serde::{Deserialize, Serialize};

/// Candidate counts by network path type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidateMetrics {
    /// Host candidates
    pub host: u32,
    /// Server reflexive candidates
    pub srflx: u32,
    /// Peer reflexive candidates
    pub prflx: u32,
    /// Relay candidates
    pub relay: u32,
}

impl IceCandidateMetrics {
    /// Count the candidates of each known type
    ///
    /// Candidates with a missing or unknown type are skipped, so `total()`
    /// may be smaller than the input length.
    pub fn classify<'a, I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = &'a IceCandidate>,
    {
        candidates
            .into_iter()
            .filter_map(IceCandidate::candidate_type)
            .fold(Self::default(), |mut m, t| {
                match t {
                    CandidateType::Host => m.host += 1,
                    CandidateType::Srflx => m.srflx += 1,
                    CandidateType::Prflx => m.prflx += 1,
                    CandidateType::Relay => m.relay += 1,
                }
                m
            })
    }

    /// Sum of all classified candidates
    #[must_use]
    pub fn total(&self) -> u32 {
        self.host
            .saturating_add(self.srflx)
            .saturating_add(self.prflx)
            .saturating_add(self.relay)
    }
}

/// Minimum candidate mix required before gathering may stop early
///
/// `prflx` is carried for completeness but never checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatheringRequirement {
    /// Required host candidates
    pub host: u32,
    /// Required server reflexive candidates
    pub srflx: u32,
    /// Peer reflexive candidates (optional)
    pub prflx: u32,
    /// Required relay candidates
    pub relay: u32,
}

impl Default for GatheringRequirement {
    fn default() -> Self {
        Self {
            host: 1,
            srflx: 1,
            prflx: 0,
            relay: 1,
        }
    }
}

impl GatheringRequirement {
    /// Smallest candidate count that could possibly satisfy the requirement
    #[must_use]
    pub fn minimum_count(&self) -> usize {
        self.host.saturating_add(self.srflx).saturating_add(self.relay) as usize
    }

    /// Cheap pre-check on the raw candidate list length
    #[must_use]
    pub fn has_minimum_count(&self, candidates: &[IceCandidate]) -> bool {
        candidates.len() >= self.minimum_count()
    }

    /// Whether the classified mix satisfies the requirement
    #[must_use]
    pub fn is_met_by(&self, metrics: &IceCandidateMetrics) -> bool {
        metrics.host >= self.host && metrics.srflx >= self.srflx && metrics.relay >= self.relay
    }
}
