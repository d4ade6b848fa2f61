//! Human tasks as the engine reports them
//!
//! Only the attributes the grant reconciler reads are modelled here.
//! The engine owns the full task lifecycle.

use crate::{CaseId, ProcessDefinitionId, TaskId, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Node Type ────────────────────────────────────────────────────────

/// Kind of flow node a task was instantiated from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowNodeType {
    UserTask,
    ManualTask,
    AutomaticTask,
    CallActivity,
    Gateway,
}

// ── Lifecycle State ──────────────────────────────────────────────────

/// Numeric lifecycle state as enumerated by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskState(pub u32);

impl TaskState {
    /// Terminal "completed"
    pub const COMPLETED: TaskState = TaskState(2);
    /// Ready for assignment
    pub const READY: TaskState = TaskState(4);

    pub fn id(&self) -> u32 {
        self.0
    }

    pub fn is_ready(&self) -> bool {
        *self == Self::READY
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task priority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Lowest,
    UnderNormal,
    #[default]
    Normal,
    AboveNormal,
    Highest,
}

// ── Human Task ───────────────────────────────────────────────────────

/// A human task instance belonging to a case
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HumanTask {
    pub id: TaskId,
    pub name: String,
    pub node_type: FlowNodeType,
    pub state: TaskState,
    /// The case (process instance) the task runs in
    pub case_id: CaseId,
    pub root_case_id: CaseId,
    pub process_definition_id: ProcessDefinitionId,
    /// Template the task was instantiated from
    pub flow_node_definition_id: u64,
    /// Actor (role mapping) the task is assigned to
    pub actor_id: u64,
    /// `None` while the task is unclaimed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
    /// Opaque correlation fields tying records to the task's lineage
    pub logical_group1: u64,
    pub logical_group2: u64,
    pub reached_state_at: DateTime<Utc>,
    pub priority: TaskPriority,
    pub tenant_id: TenantId,
}

impl HumanTask {
    /// A ready, unassigned user task on `case_id`.
    pub fn user_task(
        id: TaskId,
        case_id: CaseId,
        process_definition_id: ProcessDefinitionId,
    ) -> Self {
        Self {
            id,
            name: String::new(),
            node_type: FlowNodeType::UserTask,
            state: TaskState::READY,
            case_id,
            root_case_id: case_id,
            process_definition_id,
            flow_node_definition_id: 0,
            actor_id: 0,
            assignee_id: None,
            logical_group1: 0,
            logical_group2: 0,
            reached_state_at: Utc::now(),
            priority: TaskPriority::Normal,
            tenant_id: TenantId::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_assignee(mut self, user: UserId) -> Self {
        self.assignee_id = Some(user);
        self
    }

    pub fn with_state(mut self, state: TaskState) -> Self {
        self.state = state;
        self
    }

    pub fn with_node_type(mut self, node_type: FlowNodeType) -> Self {
        self.node_type = node_type;
        self
    }

    pub fn with_logical_groups(mut self, group1: u64, group2: u64) -> Self {
        self.logical_group1 = group1;
        self.logical_group2 = group2;
        self
    }

    pub fn with_reached_state_at(mut self, at: DateTime<Utc>) -> Self {
        self.reached_state_at = at;
        self
    }

    pub fn with_template(mut self, flow_node_definition_id: u64, actor_id: u64) -> Self {
        self.flow_node_definition_id = flow_node_definition_id;
        self.actor_id = actor_id;
        self
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn is_user_task(&self) -> bool {
        self.node_type == FlowNodeType::UserTask
    }

    pub fn is_assigned_to(&self, user: UserId) -> bool {
        self.assignee_id == Some(user)
    }
}
