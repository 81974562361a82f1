// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! htn-planner: iterative hierarchical task network planner.
//!
//! A [`Planner`] refines a list of tasks, goals, and multigoals into a
//! sequence of primitive actions by depth-first search over an explicit
//! decomposition [`Tree`]. Each decomposable node keeps a resumable method
//! cursor and a state snapshot, so failure is handled by chronological
//! backtracking rather than recursion. After an execution failure,
//! [`Planner::replan`] reuses the committed prefix of the tree and returns
//! only the repaired suffix.
//!
//! Domains are plain tables of function pointers built once with
//! [`Domain`] and shared read-only behind an `Arc`.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod backtrack;
pub mod config;
mod domain;
mod engine_impl;
mod executor;
mod ident;
mod multigoal;
mod payload;
mod replan;
mod state;
mod tree;
mod value;

pub use config::{ConfigError, ConfigService, ConfigStore, ExecutorConfig, PlannerConfig};
pub use domain::{
    Action, ActionFn, ActionModel, Domain, DomainError, Method, MethodFn, MultiGoalMethod,
    MultiGoalMethodFn,
};
pub use engine_impl::{PlanError, Planner};
pub use executor::{ExecutionStep, MonteCarloExecutor};
pub use ident::NodeId;
pub use multigoal::{split_multigoal, MultiGoal};
pub use payload::{Call, Todo};
pub use state::{Bindings, State};
pub use tree::{Decomposition, Node, NodeKind, NodePayload, Status, Tag, Tree, TreeError};
pub use value::Value;
