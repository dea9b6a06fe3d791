//! Data handle scope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Visibility scope a data handle was created for.
///
/// The execution engine carries the scope but never interprets it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Shared by the tasks of one pipeline
    #[default]
    Pipeline,
    /// Shared by every pipeline of a scenario
    Scenario,
    /// Shared by every scenario of a cycle
    Cycle,
    /// Shared by everything
    Global,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Pipeline => write!(f, "pipeline"),
            Scope::Scenario => write!(f, "scenario"),
            Scope::Cycle => write!(f, "cycle"),
            Scope::Global => write!(f, "global"),
        }
    }
}
