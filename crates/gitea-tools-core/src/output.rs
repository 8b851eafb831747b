use gitea_tools_api::ActionsError;
use serde::Serialize;

/// Textual result of a tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// Normalises an error into a human-readable message.
    ///
    /// Caller-side failures read `Error: ...`, transport failures are prefixed
    /// with what the tool was doing, e.g. `Error fetching job logs: ...`.
    pub fn failure(context: &str, err: &ActionsError) -> Self {
        let text = if err.is_caller_side() {
            format!("Error: {}", err)
        } else {
            format!("{}: {}", context, err)
        };
        Self {
            text,
            is_error: true,
        }
    }

    pub fn from_result(context: &str, result: Result<String, ActionsError>) -> Self {
        match result {
            Ok(text) => Self::success(text),
            Err(e) => Self::failure(context, &e),
        }
    }
}

/// Pretty JSON rendering shared by the reporting tools
pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, ActionsError> {
    serde_json::to_string_pretty(value).map_err(ActionsError::from)
}
