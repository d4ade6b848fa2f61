//! Domain types for candidate visibility grants
//!
//! A case-management engine only lets the assignee of a task see the
//! case. The grant reconciler compensates by writing an inert, archived
//! grant record for every other eligible candidate. This crate holds the
//! vocabulary shared between the reconciler and the engine services it
//! talks to.
//!
//! # Key Concepts
//!
//! - **HumanTask**: a task instance as reported by the engine.
//! - **EngineEvent**: a lifecycle event carrying a payload such as a task.
//! - **GrantRecord**: the completed, terminal record written per candidate.
//! - **ArchivedActivity**: one entry of a case's history (the ledger).
//! - **Parameter / Category**: process definition configuration rows,
//!   used to opt a process out of reconciliation.

#![deny(unsafe_code)]

mod errors;
mod event;
mod grant;
mod ids;
mod ledger;
mod store;
mod task;

pub use errors::*;
pub use event::*;
pub use grant::*;
pub use ids::*;
pub use ledger::*;
pub use store::*;
pub use task::*;
