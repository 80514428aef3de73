//! Consensus domain
//!
//! Weighted voting among agents, with a security veto.
//!
//! ```text
//! Vote ─┐
//! Vote ─┼─▶ ConsensusBuilder ──get_result()──▶ ConsensusResult
//! Vote ─┘        │
//!                └─ security Reject + concern ─▶ vetoed (permanent)
//! ```

pub mod builder;
pub mod parsing;
pub mod vote;

pub use builder::{ConsensusBuilder, ConsensusResult};
pub use parsing::{extract_bullets, parse_review_response, parse_security_review};
pub use vote::{Vote, VoteType};
