//! Release pipeline
//!
//! - **trigger**: decide whether an event starts a run
//! - **plan**: expand the matrix into a content-hashed job plan
//! - **graph**: job dependency graph and execution phases
//! - **executor**: run the plan with failure isolation between target jobs
//! - **report**: per-job outcomes and the overall run status

pub mod executor;
pub mod graph;
pub mod plan;
pub mod report;
pub mod trigger;
