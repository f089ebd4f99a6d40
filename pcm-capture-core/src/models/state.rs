use super::error::RecordError;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → opening → running → stopping → closed
///           ↓         ↓
///         failed ←────┘
/// ```
/// An opening that is vetoed by the ready precondition returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Opening,
    Running,
    Stopping,
    Closed,
    Failed(RecordError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed(_))
    }
}

/// Container writer lifecycle.
///
/// ```text
/// unopened → open → closed
///              ↓
///          cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Unopened,
    Open,
    Closed,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(CaptureState::Closed.is_terminal());
        assert!(CaptureState::Failed(RecordError::ReadError).is_terminal());
        assert!(!CaptureState::Stopping.is_terminal());
        assert!(!CaptureState::Idle.is_terminal());
    }
}
