use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::error::OrchestrationError;

/// Phases of a single orchestration run, in the order they occur.
///
/// Transitions are strictly linear: each state may only advance to its
/// immediate successor, and `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Nothing launched yet.
    Idle,
    /// Capture, detectors, and the simulation engine are live.
    Running,
    /// Pulling the full alert set out of the store.
    Extracting,
    /// Writing export artifacts for the extracted snapshot.
    Exporting,
    /// Terminating children and sweeping transient files.
    Cleanup,
    /// Run finished; no further transitions are possible.
    Terminated,
}

impl LifecycleState {
    fn successor(self) -> Option<LifecycleState> {
        match self {
            LifecycleState::Idle => Some(LifecycleState::Running),
            LifecycleState::Running => Some(LifecycleState::Extracting),
            LifecycleState::Extracting => Some(LifecycleState::Exporting),
            LifecycleState::Exporting => Some(LifecycleState::Cleanup),
            LifecycleState::Cleanup => Some(LifecycleState::Terminated),
            LifecycleState::Terminated => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Running => "running",
            LifecycleState::Extracting => "extracting",
            LifecycleState::Exporting => "exporting",
            LifecycleState::Cleanup => "cleanup",
            LifecycleState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Callback invoked after every committed state transition.
pub type StateObserver = Arc<dyn Fn(LifecycleState) + Send + Sync>;

/// Linear state machine guarding the ordering of run phases.
pub struct Lifecycle {
    state: LifecycleState,
    observer: Option<StateObserver>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Idle,
            observer: None,
        }
    }

    /// Registers a hook that fires after each transition commits.
    pub fn set_observer(&mut self, observer: StateObserver) {
        self.observer = Some(observer);
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Advances to `next`, rejecting anything but the immediate successor.
    pub fn advance(&mut self, next: LifecycleState) -> Result<(), OrchestrationError> {
        if self.state.successor() != Some(next) {
            return Err(OrchestrationError::Lifecycle {
                from: self.state,
                to: next,
            });
        }
        info!(from = %self.state, to = %next, "Lifecycle transition");
        self.state = next;
        if let Some(observer) = &self.observer {
            observer(next);
        }
        Ok(())
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
