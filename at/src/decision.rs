//! Revision decision
//!
//! After every completed cycle the orchestrator asks a [`DecisionPolicy`]
//! whether to loop back to the Code stage or stop. The default policy,
//! [`ReviewGate`], applies [`decide`]:
//!
//! 1. `iteration_count >= max_iterations` → stop
//! 2. `needs_revision` → continue
//! 3. otherwise → stop, approved
//!
//! The cap check comes first, so termination does not depend on how the
//! Review stage behaves. A run stopped by the cap is reported as approved
//! when the final review accepted the code, and as cap-reached otherwise.

use tracing::debug;

use crate::domain::{ArtifactBundle, RunStatus};

/// Why a run stopped without failing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Approved,
    MaxIterationsReached,
}

impl From<StopReason> for RunStatus {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::Approved => RunStatus::Approved,
            StopReason::MaxIterationsReached => RunStatus::MaxIterationsReached,
        }
    }
}

/// Outcome of a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Re-enter the Code stage for a revision pass
    Continue,
    /// Finalize the run
    Stop(StopReason),
}

/// Apply the revision rule to a bundle
pub fn decide(bundle: &ArtifactBundle, max_iterations: u32) -> Decision {
    debug!(
        iteration_count = bundle.iteration_count(),
        max_iterations,
        needs_revision = bundle.needs_revision(),
        "decide: called"
    );
    if bundle.iteration_count() >= max_iterations {
        debug!("decide: cap reached");
        if bundle.needs_revision() {
            Decision::Stop(StopReason::MaxIterationsReached)
        } else {
            Decision::Stop(StopReason::Approved)
        }
    } else if bundle.needs_revision() {
        debug!("decide: revision requested");
        Decision::Continue
    } else {
        debug!("decide: approved");
        Decision::Stop(StopReason::Approved)
    }
}

/// Pluggable decision step
///
/// Implementations are not trusted with the cap: the orchestrator stops at
/// `max_iterations` whatever the policy returns.
pub trait DecisionPolicy: Send + Sync {
    fn decide(&self, bundle: &ArtifactBundle, max_iterations: u32) -> Decision;
}

/// Default policy: loop while the reviewer asks for revisions
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewGate;

impl DecisionPolicy for ReviewGate {
    fn decide(&self, bundle: &ArtifactBundle, max_iterations: u32) -> Decision {
        decide(bundle, max_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bundle_with(cycles: u32, last_needs_revision: bool) -> ArtifactBundle {
        let mut bundle = ArtifactBundle::new("req");
        bundle.record_plan("plan".to_string());
        for cycle in 1..=cycles {
            bundle.begin_cycle();
            bundle.record_code(format!("C{}", cycle));
            bundle.record_tests(format!("T{}", cycle));
            let needs_revision = if cycle == cycles { last_needs_revision } else { true };
            bundle.record_review(format!("R{}", cycle), needs_revision);
            bundle.complete_cycle();
        }
        bundle
    }

    #[test]
    fn test_continue_when_revision_requested_below_cap() {
        let bundle = bundle_with(1, true);
        assert_eq!(decide(&bundle, 3), Decision::Continue);
    }

    #[test]
    fn test_stop_approved() {
        let bundle = bundle_with(2, false);
        assert_eq!(decide(&bundle, 3), Decision::Stop(StopReason::Approved));
    }

    #[test]
    fn test_cap_overrides_revision_request() {
        let bundle = bundle_with(3, true);
        assert_eq!(decide(&bundle, 3), Decision::Stop(StopReason::MaxIterationsReached));
    }

    #[test]
    fn test_approval_on_last_cycle_is_approved() {
        let bundle = bundle_with(3, false);
        assert_eq!(decide(&bundle, 3), Decision::Stop(StopReason::Approved));
    }

    #[test]
    fn test_stop_reason_maps_to_status() {
        assert_eq!(RunStatus::from(StopReason::Approved), RunStatus::Approved);
        assert_eq!(
            RunStatus::from(StopReason::MaxIterationsReached),
            RunStatus::MaxIterationsReached
        );
    }

    proptest! {
        #[test]
        fn prop_never_continues_at_cap(cycles in 1u32..8, max in 1u32..8, needs_revision: bool) {
            let bundle = bundle_with(cycles, needs_revision);
            let decision = ReviewGate.decide(&bundle, max);
            if cycles >= max {
                prop_assert_ne!(decision, Decision::Continue);
                if needs_revision {
                    prop_assert_eq!(decision, Decision::Stop(StopReason::MaxIterationsReached));
                }
            } else if needs_revision {
                prop_assert_eq!(decision, Decision::Continue);
            } else {
                prop_assert_eq!(decision, Decision::Stop(StopReason::Approved));
            }
        }
    }
}
