//! Identifier and clock helpers shared by all subdomains.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Length of the short identifiers used for projects, tasks and sessions.
pub const SHORT_ID_LEN: usize = 8;

/// Generate a short identifier (first 8 hex characters of a v4 UUID).
///
/// Short ids key persisted project/task records; message ids use the full
/// UUID via [`generate_message_id`].
pub fn generate_short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(SHORT_ID_LEN);
    id
}

/// Generate a globally unique message identifier.
pub fn generate_message_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current wall-clock time in UTC
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_shape() {
        let id = generate_short_id();
        assert_eq!(id.len(), SHORT_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_message_ids_are_unique() {
        assert_ne!(generate_message_id(), generate_message_id());
    }
}
