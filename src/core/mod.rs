//! Core job logic - framework-agnostic income generation, reconciliation and
//! cleanup operations. Every job takes its database connection and `now`
//! explicitly.

pub mod budget;
pub mod budget_guard;
pub mod cadence;
pub mod cleanup;
pub mod clock;
pub mod job_state;
pub mod materializer;
pub mod reconciler;
pub mod report;
pub mod runner;
