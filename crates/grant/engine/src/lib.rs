//! Grant reconciler for case-management engines
//!
//! When a user task becomes ready, the engine lets only its assignee see
//! the case. This crate subscribes to those events and writes an inert,
//! archived grant record for every other candidate who could have
//! executed the task, so they keep visibility of the case.
//!
//! # Architecture
//!
//! [`SecurityGrantHandler`] is what the engine registers. It composes:
//!
//! - [`EventGate`] accepts only ready user tasks
//! - [`Reconciler`] runs one event through its phases
//! - [`PolicyEvaluator`] applies the per-process opt-out
//! - [`CandidateResolver`] performs the bounded candidate lookup
//! - [`LedgerReader`] finds who already holds a grant on the case
//! - [`GrantSynthesizer`] builds the completed, terminal grant record
//!
//! All engine access goes through the contracts in [`traits`], bundled
//! per tenant in [`TenantServices`].
//!
//! # Example
//!
//! ```rust
//! use grant_engine::{EventHandler, GranterConfig, InMemoryEngine, SecurityGrantHandler, TenantServices};
//! use grant_types::*;
//! use std::sync::Arc;
//!
//! let engine = Arc::new(InMemoryEngine::new());
//! engine.set_candidates(TaskId::new(1), [5, 7, 9].map(UserId::new));
//!
//! let handler = SecurityGrantHandler::new(
//!     GranterConfig::default(),
//!     TenantServices::from_engine(engine.clone()),
//! )
//! .unwrap();
//!
//! let task = HumanTask::user_task(TaskId::new(1), CaseId::new(40), ProcessDefinitionId::new(2))
//!     .with_assignee(UserId::new(5));
//! let event = EngineEvent::task_updated(task);
//!
//! assert!(handler.is_interested(&event));
//! let outcome = handler.execute(&event).unwrap();
//! assert_eq!(outcome.granted(), &[UserId::new(7), UserId::new(9)]);
//! assert_eq!(engine.grants_on(CaseId::new(40)).len(), 2);
//! ```

#![deny(unsafe_code)]

pub mod candidate_resolver;
pub mod case_lock;
pub mod config;
pub mod error;
pub mod event_gate;
pub mod handler;
pub mod ledger_reader;
pub mod memory;
pub mod policy_evaluator;
pub mod reconciler;
pub mod services;
pub mod synthesizer;
pub mod traits;

// Re-export main types
pub use candidate_resolver::CandidateResolver;
pub use case_lock::CaseLocks;
pub use config::{GranterConfig, LedgerReadPolicy};
pub use error::{ConfigError, HandlerError, HandlerResult};
pub use event_gate::EventGate;
pub use handler::{EventHandler, SecurityGrantHandler};
pub use ledger_reader::{GrantLedger, LedgerReader};
pub use memory::{InMemoryEngine, StaticAccessor};
pub use policy_evaluator::{ExemptionSource, PolicyEvaluator};
pub use reconciler::{
    GrantFailure, GrantStage, ReconcileOutcome, ReconcilePhase, ReconcileReport, Reconciler,
};
pub use services::{ServiceAccessor, TenantServices};
pub use synthesizer::GrantSynthesizer;
