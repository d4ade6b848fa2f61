//! Tenant service wiring
//!
//! The reconciler receives its collaborators explicitly. A
//! [`ServiceAccessor`] resolves the bundle for a tenant once, when the
//! handler is built; nothing is looked up lazily afterwards.

use crate::traits::{
    ActivityHistory, CandidateLookup, CategoryStore, ParameterStore, TaskArchiver, TaskCreator,
};
use grant_types::{EngineResult, TenantId};
use std::fmt;
use std::sync::Arc;

/// The engine services one tenant exposes to the reconciler
#[derive(Clone)]
pub struct TenantServices {
    pub parameters: Arc<dyn ParameterStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub candidates: Arc<dyn CandidateLookup>,
    pub history: Arc<dyn ActivityHistory>,
    pub creator: Arc<dyn TaskCreator>,
    pub archiver: Arc<dyn TaskArchiver>,
}

impl TenantServices {
    /// Use one object for every contract.
    pub fn from_engine<E>(engine: Arc<E>) -> Self
    where
        E: ParameterStore
            + CategoryStore
            + CandidateLookup
            + ActivityHistory
            + TaskCreator
            + TaskArchiver
            + 'static,
    {
        Self {
            parameters: engine.clone(),
            categories: engine.clone(),
            candidates: engine.clone(),
            history: engine.clone(),
            creator: engine.clone(),
            archiver: engine,
        }
    }
}

impl fmt::Debug for TenantServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantServices").finish_non_exhaustive()
    }
}

/// Resolves the service bundle for a tenant
pub trait ServiceAccessor: Send + Sync {
    /// Fails with `EngineError::ServiceAccess` when the tenant's services
    /// cannot be reached.
    fn tenant_services(&self, tenant_id: TenantId) -> EngineResult<TenantServices>;
}
