//! Engine events delivered to subscribed handlers

use crate::{CaseId, HumanTask};
use serde::{Deserialize, Serialize};

/// Well-known event type names
pub mod event_types {
    pub const ACTIVITY_STATE_UPDATED: &str = "ACTIVITYINSTANCE_STATE_UPDATED";
    pub const PROCESS_STATE_UPDATED: &str = "PROCESSINSTANCE_STATE_UPDATED";
}

/// The object an event carries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// A human task instance
    HumanTask(HumanTask),
    /// A process instance (case)
    ProcessInstance { case_id: CaseId },
    /// Anything else the engine publishes
    Other { type_name: String },
}

/// A lifecycle event published by the engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub event_type: String,
    pub payload: EventPayload,
}

impl EngineEvent {
    pub fn new(event_type: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// A state-update event carrying `task`.
    pub fn task_updated(task: HumanTask) -> Self {
        Self::new(
            event_types::ACTIVITY_STATE_UPDATED,
            EventPayload::HumanTask(task),
        )
    }

    /// The task carried by this event, if the payload is task-shaped.
    pub fn human_task(&self) -> Option<&HumanTask> {
        match &self.payload {
            EventPayload::HumanTask(task) => Some(task),
            _ => None,
        }
    }
}
