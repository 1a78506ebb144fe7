use super::errors::FailureReason;
use super::model::IdentificationResult;

/// Observable state of the identification pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum IdentificationState {
    #[default]
    Idle,
    Processing,
    /// `attempt` is the 1-indexed attempt about to run or running.
    Retrying { attempt: u32, max_attempts: u32 },
    Success(Box<IdentificationResult>),
    Error(FailureReason),
}

impl IdentificationState {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            IdentificationState::Processing | IdentificationState::Retrying { .. }
        )
    }

    /// True for states that only a new `identify` call can leave.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IdentificationState::Success(_) | IdentificationState::Error(_)
        )
    }

    pub fn result(&self) -> Option<&IdentificationResult> {
        match self {
            IdentificationState::Success(result) => Some(result),
            _ => None,
        }
    }
}

impl std::fmt::Display for IdentificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentificationState::Idle => write!(f, "idle"),
            IdentificationState::Processing => write!(f, "processing"),
            IdentificationState::Retrying {
                attempt,
                max_attempts,
            } => write!(f, "retrying({}/{})", attempt, max_attempts),
            IdentificationState::Success(result) => write!(f, "success({})", result.name),
            IdentificationState::Error(reason) => write!(f, "error({})", reason),
        }
    }
}
