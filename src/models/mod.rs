// Core data models for Taskboard
// These structs represent the domain entities

pub mod project;
pub mod stage;
pub mod task;
pub mod attachment;

pub use project::*;
pub use stage::*;
pub use task::*;
pub use attachment::*;
