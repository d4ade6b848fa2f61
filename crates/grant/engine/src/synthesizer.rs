//! Grant synthesizer: builds the inert record for one candidate

use grant_types::{GrantRecord, HumanTask, TaskPriority, TaskState, UserId, COMPLETED_STATE_NAME};

/// Builds grant records from the triggering task
#[derive(Clone, Debug)]
pub struct GrantSynthesizer {
    name: String,
    description: String,
    delegate: UserId,
}

impl GrantSynthesizer {
    pub fn new(name: impl Into<String>, description: impl Into<String>, delegate: UserId) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            delegate,
        }
    }

    /// A completed, terminal record granting `candidate` visibility of the
    /// task's case.
    ///
    /// The logical groups keep the record attached to the task's lineage,
    /// and the claimed time is the moment the task became ready rather
    /// than the moment reconciliation ran.
    pub fn synthesize(&self, task: &HumanTask, candidate: UserId) -> GrantRecord {
        GrantRecord {
            name: self.name.clone(),
            description: self.description.clone(),
            flow_node_definition_id: task.flow_node_definition_id,
            case_id: task.case_id,
            root_case_id: task.case_id,
            actor_id: task.actor_id,
            priority: TaskPriority::Lowest,
            logical_group1: task.logical_group1,
            logical_group2: task.logical_group2,
            executed_by: candidate,
            executed_by_substitute: self.delegate,
            assignee_id: candidate,
            state_name: COMPLETED_STATE_NAME.to_string(),
            state: TaskState::COMPLETED,
            stable: true,
            terminal: true,
            claimed_at: task.reached_state_at,
            tenant_id: task.tenant_id,
        }
    }
}
