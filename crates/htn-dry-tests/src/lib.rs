// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixture domains and test doubles for htn-planner.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`blocks`] - Goal-based blocks world with three problem instances
//! - [`chain`] - Numbered flag chain used for replanning scenarios
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`flags`] - Single-flag domain that forces chronological backtracking
//! - [`light`] - Light switch whose only method undoes its own goal
//! - [`travel`] - Task-based simple travel (walk or taxi)

pub mod blocks;
pub mod chain;
pub mod config;
pub mod flags;
pub mod light;
pub mod travel;

pub use config::InMemoryConfigStore;
