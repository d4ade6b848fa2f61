//! Archived activity entries: the case history used as the grant ledger

use crate::{CaseId, UserId};
use serde::{Deserialize, Serialize};

/// One archived activity of a case
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedActivity {
    pub case_id: CaseId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_by_substitute: Option<UserId>,
}

impl ArchivedActivity {
    pub fn new(case_id: CaseId, name: impl Into<String>) -> Self {
        Self {
            case_id,
            name: name.into(),
            executed_by: None,
            executed_by_substitute: None,
        }
    }

    pub fn executed_by(mut self, user: UserId) -> Self {
        self.executed_by = Some(user);
        self
    }

    pub fn on_behalf_of(mut self, substitute: UserId) -> Self {
        self.executed_by_substitute = Some(substitute);
        self
    }

    /// Whether `user` executed this activity, directly or as substitute.
    pub fn involves(&self, user: UserId) -> bool {
        self.executed_by == Some(user) || self.executed_by_substitute == Some(user)
    }
}
