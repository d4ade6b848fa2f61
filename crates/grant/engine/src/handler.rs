//! Engine-facing handler
//!
//! The host engine subscribes handlers to its event bus. For each event
//! it first asks [`EventHandler::is_interested`] and only then calls
//! [`EventHandler::execute`] on the dispatching thread.

use crate::config::GranterConfig;
use crate::error::{HandlerError, HandlerResult};
use crate::event_gate::EventGate;
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::services::{ServiceAccessor, TenantServices};
use grant_types::{EngineEvent, TenantId};

/// A subscriber to engine events
pub trait EventHandler: Send + Sync {
    type Output;

    /// Unique per handler instance
    fn identifier(&self) -> &str;

    fn is_interested(&self, event: &EngineEvent) -> bool;

    fn execute(&self, event: &EngineEvent) -> HandlerResult<Self::Output>;
}

/// Grants case visibility to every candidate of a newly ready user task
pub struct SecurityGrantHandler {
    identifier: String,
    tenant_id: TenantId,
    gate: EventGate,
    reconciler: Reconciler,
}

impl SecurityGrantHandler {
    /// Build a handler over an already resolved service bundle.
    pub fn new(config: GranterConfig, services: TenantServices) -> HandlerResult<Self> {
        config.validate()?;
        let handler = Self {
            identifier: uuid::Uuid::new_v4().to_string(),
            tenant_id: config.tenant_id,
            gate: EventGate::new(),
            reconciler: Reconciler::new(&services, &config),
        };
        tracing::info!(
            handler_id = %handler.identifier,
            tenant_id = %handler.tenant_id,
            "Security grant handler ready"
        );
        Ok(handler)
    }

    /// Resolve the tenant's services through `accessor`, then build the
    /// handler. Without services the handler cannot run at all, so an
    /// access failure is returned rather than deferred to the first event.
    pub fn connect(config: GranterConfig, accessor: &dyn ServiceAccessor) -> HandlerResult<Self> {
        let services = accessor
            .tenant_services(config.tenant_id)
            .map_err(HandlerError::ServiceAccess)?;
        Self::new(config, services)
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

impl EventHandler for SecurityGrantHandler {
    type Output = ReconcileOutcome;

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn is_interested(&self, event: &EngineEvent) -> bool {
        self.gate.is_interested(event)
    }

    fn execute(&self, event: &EngineEvent) -> HandlerResult<ReconcileOutcome> {
        let task = event
            .human_task()
            .ok_or_else(|| HandlerError::UnexpectedPayload(event.event_type.clone()))?;
        Ok(self.reconciler.reconcile(task))
    }
}

impl std::fmt::Debug for SecurityGrantHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityGrantHandler")
            .field("identifier", &self.identifier)
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}
