// src/group/mod.rs

//! Structured concurrency for the process lifecycle.
//!
//! A [`TaskGroup`] runs any number of named tasks on the tokio runtime and
//! shares one cancellation token between them:
//! - the first task to fail (error or panic) cancels the token, so siblings
//!   waiting on it wake up;
//! - [`TaskGroup::wait`] only returns once every task has finished, and
//!   yields the first failure in completion order.
//!
//! The primary/janitor pair wired up in [`crate::run`] is one use of it.

pub mod task_group;

pub use task_group::TaskGroup;
