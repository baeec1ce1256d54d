//! Shared wire definitions for the habit tracker task API.

pub mod dates;
pub mod error;
mod lenient;
pub mod statistics;
pub mod task;
