//! Unique identifiers for taskwire entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Declares a ULID-backed identifier displayed as `<prefix><ulid>`.
macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            /// Generate a fresh identifier
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.strip_prefix($prefix).unwrap_or(s).parse()?))
            }
        }
    };
}

ulid_id!(
    /// Unique identifier for a Task
    TaskId,
    ""
);

ulid_id!(
    /// Unique identifier for one submission of a task to a scheduler.
    ///
    /// Re-submitting the same task yields a new id.
    SubmissionId,
    "sub_"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_roundtrips_through_display() {
        let id = TaskId::new();
        let parsed: TaskId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_submission_id_roundtrips_with_prefix() {
        let id = SubmissionId::new();
        let shown = id.to_string();
        assert!(shown.starts_with("sub_"));
        assert_eq!(shown.parse::<SubmissionId>().unwrap(), id);
    }

    #[test]
    fn test_submission_ids_are_unique() {
        assert_ne!(SubmissionId::new(), SubmissionId::new());
    }

    #[test]
    fn test_invalid_id_is_rejected() {
        assert!("sub_not-a-ulid".parse::<SubmissionId>().is_err());
    }
}
