//! Habit tracker client library.
//!
//! [`store::TaskStore`] owns the task collection shown to the user and keeps
//! it in step with the remote task API through an [`api::TaskApi`].

pub mod api;
pub mod cli;
pub mod config;
pub mod form;
pub mod render;
pub mod store;
