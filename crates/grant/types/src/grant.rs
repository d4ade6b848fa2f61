//! Grant records: inert, terminal tasks that mark case visibility
//!
//! A grant record never becomes actionable. It is created already
//! completed and is archived straight away, so the only trace it leaves
//! is an entry in the case's history naming the granted user.

use crate::{CaseId, TaskPriority, TaskState, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State name written on every grant record
pub const COMPLETED_STATE_NAME: &str = "completed";

/// A synthesized visibility grant for one user on one case
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub name: String,
    pub description: String,
    /// Template of the task that triggered the grant
    pub flow_node_definition_id: u64,
    pub case_id: CaseId,
    pub root_case_id: CaseId,
    pub actor_id: u64,
    pub priority: TaskPriority,
    pub logical_group1: u64,
    pub logical_group2: u64,
    /// The user being granted visibility
    pub executed_by: UserId,
    /// System identity that executed on the user's behalf
    pub executed_by_substitute: UserId,
    pub assignee_id: UserId,
    pub state_name: String,
    pub state: TaskState,
    pub stable: bool,
    pub terminal: bool,
    /// When the triggering task became ready
    pub claimed_at: DateTime<Utc>,
    pub tenant_id: TenantId,
}

impl GrantRecord {
    pub fn grantee(&self) -> UserId {
        self.executed_by
    }

    /// Completed, stable and terminal.
    pub fn is_inert(&self) -> bool {
        self.state == TaskState::COMPLETED && self.stable && self.terminal
    }
}
