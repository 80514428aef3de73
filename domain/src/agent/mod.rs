//! Agent domain module
//!
//! Specializations, lifecycle state, memory and the value objects of the
//! think/act/reflect loop. The runtime that drives them lives in the
//! application layer.

pub mod kind;
pub mod memory;
pub mod parsing;
pub mod state;
pub mod value_objects;

pub use kind::{AgentKind, AgentProfile};
pub use memory::{AgentMemory, MemoryEntry, MemoryEntryKind, MemorySnapshot};
pub use parsing::{
    CodeBlock, extract_code_blocks, extract_confidence, extract_pattern, extract_steps,
    parse_thought,
};
pub use state::AgentState;
pub use value_objects::{Action, ActionResult, Insight, RiskLevel, Thought};
