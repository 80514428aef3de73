//! Task domain
//!
//! - [`ProjectState`]: aggregate owning a project's subtasks
//! - [`SubTask`] / [`TaskStatus`]: one unit of work and its lifecycle
//! - [`parsing`]: subtasks from decomposition responses

pub mod entities;
pub mod parsing;
pub mod project;

pub use entities::{SubTask, TaskRef, TaskStatus};
pub use parsing::{parse_subtasks, try_parse_subtasks};
pub use project::ProjectState;
