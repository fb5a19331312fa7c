use std::fmt;

use serde::{Deserialize, Serialize};

/// The phases of a single run.
///
/// A run flows: LOAD_STATE → SELECT_RULE → EVALUATE → (SKIP | AGGREGATE) →
/// PUBLISH? → PATCH? → PERSIST → DONE, and may drop into FAILED from any
/// non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    LoadState,
    SelectRule,
    Evaluate,
    Skip,
    Aggregate,
    Publish,
    Patch,
    Persist,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::LoadState => write!(f, "LOAD_STATE"),
            Phase::SelectRule => write!(f, "SELECT_RULE"),
            Phase::Evaluate => write!(f, "EVALUATE"),
            Phase::Skip => write!(f, "SKIP"),
            Phase::Aggregate => write!(f, "AGGREGATE"),
            Phase::Publish => write!(f, "PUBLISH"),
            Phase::Patch => write!(f, "PATCH"),
            Phase::Persist => write!(f, "PERSIST"),
            Phase::Done => write!(f, "DONE"),
            Phase::Failed => write!(f, "FAILED"),
        }
    }
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }

    /// Whether `next` may directly follow `self`.
    pub fn can_advance_to(self, next: Phase) -> bool {
        if next == Phase::Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Phase::LoadState, Phase::SelectRule)
                | (Phase::SelectRule, Phase::Evaluate)
                | (Phase::Evaluate, Phase::Skip | Phase::Aggregate)
                | (Phase::Skip, Phase::Done)
                | (Phase::Aggregate, Phase::Publish | Phase::Patch | Phase::Persist)
                | (Phase::Publish, Phase::Patch | Phase::Persist)
                | (Phase::Patch, Phase::Persist)
                | (Phase::Persist, Phase::Done)
        )
    }
}

/// Records the phases a run has passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseTrace {
    current: Phase,
    history: Vec<Phase>,
}

impl Default for PhaseTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTrace {
    pub fn new() -> Self {
        Self {
            current: Phase::LoadState,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    /// Move to `next`, recording the phase being left.
    pub fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.current.can_advance_to(next),
            "illegal phase transition {} -> {next}",
            self.current
        );
        tracing::debug!(from = %self.current, to = %next, "phase transition");
        self.history.push(self.current);
        self.current = next;
    }

    /// Move to FAILED, returning the phase that failed.
    pub fn fail(&mut self) -> Phase {
        let failed = self.current;
        self.advance(Phase::Failed);
        failed
    }

    /// Every phase visited, including the current one.
    pub fn phases(&self) -> Vec<Phase> {
        let mut phases = self.history.clone();
        phases.push(self.current);
        phases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_run_path_is_legal() {
        let mut trace = PhaseTrace::new();
        for next in [
            Phase::SelectRule,
            Phase::Evaluate,
            Phase::Aggregate,
            Phase::Publish,
            Phase::Patch,
            Phase::Persist,
            Phase::Done,
        ] {
            assert!(trace.current().can_advance_to(next));
            trace.advance(next);
        }
        assert_eq!(trace.phases().len(), 8);
        assert_eq!(trace.current(), Phase::Done);
    }

    #[test]
    fn skip_path() {
        let mut trace = PhaseTrace::new();
        trace.advance(Phase::SelectRule);
        trace.advance(Phase::Evaluate);
        trace.advance(Phase::Skip);
        trace.advance(Phase::Done);
        assert_eq!(
            trace.phases(),
            vec![
                Phase::LoadState,
                Phase::SelectRule,
                Phase::Evaluate,
                Phase::Skip,
                Phase::Done
            ]
        );
    }

    #[test]
    fn fail_reports_failing_phase() {
        let mut trace = PhaseTrace::new();
        trace.advance(Phase::SelectRule);
        assert_eq!(trace.fail(), Phase::SelectRule);
        assert_eq!(trace.current(), Phase::Failed);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        assert!(!Phase::Evaluate.can_advance_to(Phase::Publish));
        assert!(!Phase::Skip.can_advance_to(Phase::Persist));
        assert!(!Phase::Patch.can_advance_to(Phase::Publish));
        assert!(!Phase::Done.can_advance_to(Phase::Failed));
        assert!(!Phase::Failed.can_advance_to(Phase::Failed));
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::LoadState.to_string(), "LOAD_STATE");
        assert_eq!(Phase::SelectRule.to_string(), "SELECT_RULE");
        assert_eq!(Phase::Persist.to_string(), "PERSIST");
        assert_eq!(Phase::Failed.to_string(), "FAILED");
    }
}
