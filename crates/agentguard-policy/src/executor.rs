//! Simulated action execution

use crate::action::{OPEN_FILE, SEARCH, UNKNOWN};
use agentguard_core::ActionRequest;

/// Describes what executing an approved action would do.
///
/// Nothing is executed. The returned message stands in for the side effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionExecutor;

impl ActionExecutor {
    /// Create an executor
    pub fn new() -> Self {
        Self
    }

    /// Simulated outcome of `action`; `None` for `unknown`
    pub fn describe(&self, action: &ActionRequest) -> Option<String> {
        match action.kind.as_str() {
            UNKNOWN => None,
            SEARCH => Some(format!(
                "Simulating a search for: '{}'",
                action.param("query").unwrap_or_default()
            )),
            OPEN_FILE => Some(format!(
                "Simulating opening the file: '{}'",
                action.param("filename").unwrap_or_default()
            )),
            other => Some(format!("Action '{}' is recognized but not implemented", other)),
        }
    }
}
