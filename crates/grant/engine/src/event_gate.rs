//! Event gate: the subscription predicate
//!
//! Only user tasks that just became ready for assignment are handed to
//! the reconciler. The gate is silent; rejected events leave no trace.

use grant_types::{EngineEvent, TaskState};

#[derive(Clone, Copy, Debug, Default)]
pub struct EventGate;

impl EventGate {
    pub fn new() -> Self {
        Self
    }

    pub fn is_interested(&self, event: &EngineEvent) -> bool {
        event
            .human_task()
            .is_some_and(|task| task.is_user_task() && task.state == TaskState::READY)
    }
}
