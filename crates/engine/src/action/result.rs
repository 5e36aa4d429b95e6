use serde::Serialize;
use thiserror::Error;

use crate::nav::Unreachable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    #[default]
    Idle,
    MovingToTarget,
    PerformingAction,
    WaitingForAnimation,
    Complete,
    Failed,
}

impl ExecutionState {
    /// States in which a new command may be accepted.
    pub fn accepts_commands(self) -> bool {
        matches!(self, Self::Idle | Self::Complete | Self::Failed)
    }

    pub fn is_in_flight(self) -> bool {
        !self.accepts_commands()
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::MovingToTarget => "moving_to_target",
            Self::PerformingAction => "performing_action",
            Self::WaitingForAnimation => "waiting_for_animation",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "idle" => Some(Self::Idle),
            "moving_to_target" => Some(Self::MovingToTarget),
            "performing_action" => Some(Self::PerformingAction),
            "waiting_for_animation" => Some(Self::WaitingForAnimation),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionErrorKind {
    Busy,
    UnknownAction,
    Validation,
    Unreachable,
    Precondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(
        "busy: '{active}' is still {}; retry after it completes or reset",
        .state.as_token()
    )]
    Busy {
        active: &'static str,
        state: ExecutionState,
    },
    #[error("unknown action '{kind}'")]
    UnknownAction { kind: String },
    #[error("invalid field '{field}': {reason}")]
    Validation { field: &'static str, reason: String },
    #[error(transparent)]
    Unreachable(#[from] Unreachable),
    #[error("precondition failed: {0}")]
    Precondition(String),
}

impl ActionError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ActionErrorKind {
        match self {
            Self::Busy { .. } => ActionErrorKind::Busy,
            Self::UnknownAction { .. } => ActionErrorKind::UnknownAction,
            Self::Validation { .. } => ActionErrorKind::Validation,
            Self::Unreachable(_) => ActionErrorKind::Unreachable,
            Self::Precondition(_) => ActionErrorKind::Precondition,
        }
    }
}

/// Outcome handed back to the transport. Exactly one of `message` and
/// `error` is populated; the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    success: bool,
    message: Option<String>,
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ActionErrorKind>,
    state: ExecutionState,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>, state: ExecutionState) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            error_kind: None,
            state,
        }
    }

    pub fn err(error: &ActionError, state: ExecutionState) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            state,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_kind(&self) -> Option<ActionErrorKind> {
        self.error_kind
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn only_idle_complete_failed_accept_commands() {
        let accepting = [
            ExecutionState::Idle,
            ExecutionState::Complete,
            ExecutionState::Failed,
        ];
        let busy = [
            ExecutionState::MovingToTarget,
            ExecutionState::PerformingAction,
            ExecutionState::WaitingForAnimation,
        ];
        assert!(accepting.iter().all(|state| state.accepts_commands()));
        assert!(busy.iter().all(|state| state.is_in_flight()));
    }

    #[test]
    fn state_tokens_round_trip_through_from_token() {
        for state in [
            ExecutionState::Idle,
            ExecutionState::MovingToTarget,
            ExecutionState::PerformingAction,
            ExecutionState::WaitingForAnimation,
            ExecutionState::Complete,
            ExecutionState::Failed,
        ] {
            assert_eq!(ExecutionState::from_token(state.as_token()), Some(state));
        }
        assert_eq!(ExecutionState::from_token("sleeping"), None);
    }

    #[test]
    fn result_json_populates_exactly_one_of_message_and_error() {
        let ok = ActionResult::ok("faced up", ExecutionState::Complete);
        assert_eq!(
            serde_json::to_value(&ok).expect("json"),
            json!({
                "success": true,
                "message": "faced up",
                "error": null,
                "state": "complete"
            })
        );

        let error = ActionError::validation("slot", "slot 12 is outside 0..=11");
        let failed = ActionResult::err(&error, ExecutionState::Idle);
        assert_eq!(
            serde_json::to_value(&failed).expect("json"),
            json!({
                "success": false,
                "message": null,
                "error": "invalid field 'slot': slot 12 is outside 0..=11",
                "error_kind": "validation",
                "state": "idle"
            })
        );
    }
}
