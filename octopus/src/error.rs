//! Engine status codes and the typed errors they map to.

use std::fmt;

use thiserror::Error;

/// Result type alias for Octopus operations.
pub type Result<T> = std::result::Result<T, OctopusError>;

/// Status codes reported by the engine.
///
/// The numeric values match `pv_status_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Success = 0,
    OutOfMemory = 1,
    IoError = 2,
    InvalidArgument = 3,
    StopIteration = 4,
    KeyError = 5,
    InvalidState = 6,
    RuntimeError = 7,
    ActivationError = 8,
    ActivationLimitReached = 9,
    ActivationThrottled = 10,
    ActivationRefused = 11,
}

impl Status {
    /// All statuses in code order.
    pub const ALL: [Status; 12] = [
        Status::Success,
        Status::OutOfMemory,
        Status::IoError,
        Status::InvalidArgument,
        Status::StopIteration,
        Status::KeyError,
        Status::InvalidState,
        Status::RuntimeError,
        Status::ActivationError,
        Status::ActivationLimitReached,
        Status::ActivationThrottled,
        Status::ActivationRefused,
    ];

    /// Returns the status for a raw engine code, or `None` if the code is unknown.
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Returns the raw engine code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Returns the canonical upper-case name (e.g. `"INVALID_ARGUMENT"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::OutOfMemory => "OUT_OF_MEMORY",
            Self::IoError => "IO_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::StopIteration => "STOP_ITERATION",
            Self::KeyError => "KEY_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::RuntimeError => "RUNTIME_ERROR",
            Self::ActivationError => "ACTIVATION_ERROR",
            Self::ActivationLimitReached => "ACTIVATION_LIMIT_REACHED",
            Self::ActivationThrottled => "ACTIVATION_THROTTLED",
            Self::ActivationRefused => "ACTIVATION_REFUSED",
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message and diagnostic stack attached to every [`OctopusError`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Failure {
    /// What the caller was doing when the failure happened.
    pub message: String,
    /// Chain of causes reported by the engine, outermost first.
    pub message_stack: Vec<String>,
}

impl Failure {
    pub fn new(message: impl Into<String>, message_stack: Vec<String>) -> Self {
        Self {
            message: message.into(),
            message_stack,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if !self.message_stack.is_empty() {
            f.write_str(":")?;
            for (i, entry) in self.message_stack.iter().enumerate() {
                write!(f, "\n  [{i}] {entry}")?;
            }
        }
        Ok(())
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Self::new(message, Vec::new())
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Self::new(message, Vec::new())
    }
}

/// Errors returned by Octopus operations, one variant per failing [`Status`].
#[derive(Debug, Clone, Error)]
pub enum OctopusError {
    #[error("octopus: out of memory: {0}")]
    OutOfMemory(Failure),

    #[error("octopus: io error: {0}")]
    Io(Failure),

    #[error("octopus: invalid argument: {0}")]
    InvalidArgument(Failure),

    #[error("octopus: stop iteration: {0}")]
    StopIteration(Failure),

    #[error("octopus: key error: {0}")]
    Key(Failure),

    #[error("octopus: invalid state: {0}")]
    InvalidState(Failure),

    #[error("octopus: runtime error: {0}")]
    Runtime(Failure),

    #[error("octopus: activation error: {0}")]
    Activation(Failure),

    #[error("octopus: activation limit reached: {0}")]
    ActivationLimitReached(Failure),

    #[error("octopus: activation throttled: {0}")]
    ActivationThrottled(Failure),

    #[error("octopus: activation refused: {0}")]
    ActivationRefused(Failure),
}

impl OctopusError {
    /// Maps an engine status to its typed error.
    ///
    /// This is the only place statuses are translated; every call site goes
    /// through it. `Success` is never an error, so it maps to `Runtime`.
    pub fn from_status(status: Status, message: impl Into<String>, message_stack: Vec<String>) -> Self {
        let failure = Failure::new(message, message_stack);
        match status {
            Status::OutOfMemory => Self::OutOfMemory(failure),
            Status::IoError => Self::Io(failure),
            Status::InvalidArgument => Self::InvalidArgument(failure),
            Status::StopIteration => Self::StopIteration(failure),
            Status::KeyError => Self::Key(failure),
            Status::InvalidState => Self::InvalidState(failure),
            Status::RuntimeError => Self::Runtime(failure),
            Status::ActivationError => Self::Activation(failure),
            Status::ActivationLimitReached => Self::ActivationLimitReached(failure),
            Status::ActivationThrottled => Self::ActivationThrottled(failure),
            Status::ActivationRefused => Self::ActivationRefused(failure),
            Status::Success => {
                let mut failure = failure;
                failure
                    .message_stack
                    .push("engine reported SUCCESS on a failing call".to_string());
                Self::Runtime(failure)
            }
        }
    }

    /// Maps a raw engine code. Unknown codes become `Runtime` errors.
    pub fn from_code(code: i32, message: impl Into<String>, message_stack: Vec<String>) -> Self {
        match Status::from_code(code) {
            Some(status) => Self::from_status(status, message, message_stack),
            None => {
                let mut stack = message_stack;
                stack.push(format!("unknown status code {code}"));
                Self::Runtime(Failure::new(message, stack))
            }
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(Failure::new(message, Vec::new()))
    }

    pub(crate) fn io(message: impl Into<String>) -> Self {
        Self::Io(Failure::new(message, Vec::new()))
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(Failure::new(message, Vec::new()))
    }

    pub(crate) fn out_of_memory(message: impl Into<String>) -> Self {
        Self::OutOfMemory(Failure::new(message, Vec::new()))
    }

    /// Returns the status this error corresponds to.
    pub fn status(&self) -> Status {
        match self {
            Self::OutOfMemory(_) => Status::OutOfMemory,
            Self::Io(_) => Status::IoError,
            Self::InvalidArgument(_) => Status::InvalidArgument,
            Self::StopIteration(_) => Status::StopIteration,
            Self::Key(_) => Status::KeyError,
            Self::InvalidState(_) => Status::InvalidState,
            Self::Runtime(_) => Status::RuntimeError,
            Self::Activation(_) => Status::ActivationError,
            Self::ActivationLimitReached(_) => Status::ActivationLimitReached,
            Self::ActivationThrottled(_) => Status::ActivationThrottled,
            Self::ActivationRefused(_) => Status::ActivationRefused,
        }
    }

    fn failure(&self) -> &Failure {
        match self {
            Self::OutOfMemory(f)
            | Self::Io(f)
            | Self::InvalidArgument(f)
            | Self::StopIteration(f)
            | Self::Key(f)
            | Self::InvalidState(f)
            | Self::Runtime(f)
            | Self::Activation(f)
            | Self::ActivationLimitReached(f)
            | Self::ActivationThrottled(f)
            | Self::ActivationRefused(f) => f,
        }
    }

    pub fn message(&self) -> &str {
        &self.failure().message
    }

    /// Diagnostic stack copied from the engine when the error was raised.
    pub fn message_stack(&self) -> &[String] {
        &self.failure().message_stack
    }

    /// Returns true for credential/licensing failures.
    ///
    /// Callers typically prompt for a new access key, back off, or give up
    /// depending on the exact variant.
    pub fn is_activation(&self) -> bool {
        matches!(
            self,
            Self::Activation(_)
                | Self::ActivationLimitReached(_)
                | Self::ActivationThrottled(_)
                | Self::ActivationRefused(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for status in Status::ALL {
            assert_eq!(Status::from_code(status.code()), Some(status));
        }
        assert_eq!(Status::from_code(-1), None);
        assert_eq!(Status::from_code(12), None);
    }

    #[test]
    fn status_names() {
        assert_eq!(Status::Success.to_string(), "SUCCESS");
        assert_eq!(Status::ActivationLimitReached.as_str(), "ACTIVATION_LIMIT_REACHED");
        assert!(Status::Success.is_success());
        assert!(!Status::KeyError.is_success());
    }

    #[test]
    fn every_failing_status_maps_to_itself() {
        for status in Status::ALL.into_iter().filter(|s| !s.is_success()) {
            let err = OctopusError::from_status(status, "op failed", vec!["cause".into()]);
            assert_eq!(err.status(), status);
            assert_eq!(err.message(), "op failed");
            assert_eq!(err.message_stack(), ["cause"]);
        }
    }

    #[test]
    fn success_and_unknown_codes_become_runtime() {
        let err = OctopusError::from_status(Status::Success, "weird", Vec::new());
        assert_eq!(err.status(), Status::RuntimeError);

        let err = OctopusError::from_code(42, "weird", vec!["a".into()]);
        assert_eq!(err.status(), Status::RuntimeError);
        assert_eq!(err.message_stack().len(), 2);
        assert!(err.message_stack()[1].contains("42"));
    }

    #[test]
    fn activation_family() {
        let activation = [
            Status::ActivationError,
            Status::ActivationLimitReached,
            Status::ActivationThrottled,
            Status::ActivationRefused,
        ];
        for status in Status::ALL.into_iter().filter(|s| !s.is_success()) {
            let err = OctopusError::from_status(status, "", Vec::new());
            assert_eq!(err.is_activation(), activation.contains(&status), "{status}");
        }
    }

    #[test]
    fn display_includes_stack() {
        let err = OctopusError::from_status(
            Status::InvalidArgument,
            "Search failed",
            vec!["first".into(), "second".into()],
        );
        assert_eq!(
            err.to_string(),
            "octopus: invalid argument: Search failed:\n  [0] first\n  [1] second"
        );

        let err = OctopusError::invalid_state("closed");
        assert_eq!(err.to_string(), "octopus: invalid state: closed");
    }
}
