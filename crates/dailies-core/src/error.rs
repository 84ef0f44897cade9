use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes for command layers and chat adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    EmptyTaskText,
    NothingToCarry,
    InvalidSetting,
    InvalidDayKey,
    InvalidSelector,
    CarryIntoSameDay,
    InvalidThreadRef,
    UnknownJob,
    PositionOutOfRange,
    LedgerReadFailed,
    LedgerWriteFailed,
    SettingsWriteFailed,
    LockContention,
    CollaboratorFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EmptyTaskText => "E1001",
            Self::NothingToCarry => "E1002",
            Self::InvalidSetting => "E1003",
            Self::InvalidDayKey => "E1004",
            Self::InvalidSelector => "E1005",
            Self::CarryIntoSameDay => "E1006",
            Self::InvalidThreadRef => "E1007",
            Self::UnknownJob => "E1008",
            Self::PositionOutOfRange => "E2001",
            Self::LedgerReadFailed => "E5001",
            Self::LedgerWriteFailed => "E5002",
            Self::SettingsWriteFailed => "E5003",
            Self::LockContention => "E5004",
            Self::CollaboratorFailed => "E7001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::EmptyTaskText => "No task text given",
            Self::NothingToCarry => "No valid items to carry",
            Self::InvalidSetting => "Invalid setting value",
            Self::InvalidDayKey => "Invalid day key",
            Self::InvalidSelector => "Invalid carry-over selector",
            Self::UnknownJob => "Unknown scheduled job",
            Self::CarryIntoSameDay => "Source and destination day are the same",
            Self::InvalidThreadRef => "Invalid thread reference",
            Self::PositionOutOfRange => "Task number out of range",
            Self::LedgerReadFailed => "Ledger read failed",
            Self::LedgerWriteFailed => "Ledger write failed",
            Self::SettingsWriteFailed => "Settings write failed",
            Self::LockContention => "Lock contention",
            Self::CollaboratorFailed => "Thread or notification delivery failed",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::EmptyTaskText => {
                Some("Give at least one task, e.g. `add homework` or `add homework, groceries`.")
            }
            Self::NothingToCarry => Some("List yesterday's unfinished tasks and pick valid numbers."),
            Self::InvalidSetting => {
                Some("Day start hour must be 0-23 and the report weekday 0-6 (Sunday = 0).")
            }
            Self::InvalidDayKey => Some("Use the YYYY-MM-DD form, e.g. 2024-03-09."),
            Self::InvalidSelector => Some("Use `all` or task numbers such as `1,3`."),
            Self::CarryIntoSameDay => Some("Carry from an earlier day, e.g. yesterday into today."),
            Self::InvalidThreadRef => Some("Pass the non-empty id of an existing thread."),
            Self::UnknownJob => Some("Use `cleanup` or `weekly`."),
            Self::PositionOutOfRange => Some("List the tasks again and use a number shown there."),
            Self::LedgerReadFailed => Some(
                "The ledger file is unusable and no backup copy could be made; fix its permissions or move it aside.",
            ),
            Self::LedgerWriteFailed | Self::SettingsWriteFailed => {
                Some("Check disk space and write permissions, then retry.")
            }
            Self::LockContention => Some("Retry after the other `dly` process finishes."),
            Self::CollaboratorFailed => {
                Some("The task data was saved; retry the notification later.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Top-level error for every core operation.
#[derive(Debug, thiserror::Error)]
pub enum DailiesError {
    /// Caller-supplied input failed a precondition.
    #[error("{message}")]
    Validation { code: ErrorCode, message: String },

    /// A 1-based task number outside `[1, len]`.
    #[error("task #{position} does not exist (the list has {len} task(s))")]
    Range { position: usize, len: usize },

    /// The store could not durably read or write.
    #[error("{action} {}: {source}", .path.display())]
    Persistence {
        code: ErrorCode,
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external thread or notification layer failed.
    #[error("{collaborator}: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },
}

impl DailiesError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn persistence(
        code: ErrorCode,
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Persistence {
            code,
            action,
            path: path.into(),
            source,
        }
    }

    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator,
            message: message.into(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } | Self::Persistence { code, .. } => *code,
            Self::Range { .. } => ErrorCode::PositionOutOfRange,
            Self::Collaborator { .. } => ErrorCode::CollaboratorFailed,
        }
    }

    /// Stable `E####` string, convenient for JSON output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        self.code().code()
    }

    /// Remediation hint, falling back to the code summary.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.code();
        code.hint().unwrap_or_else(|| code.message()).to_string()
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    #[must_use]
    pub const fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. })
    }
}

pub type Result<T, E = DailiesError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::{DailiesError, ErrorCode};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::EmptyTaskText,
            ErrorCode::NothingToCarry,
            ErrorCode::InvalidSetting,
            ErrorCode::InvalidDayKey,
            ErrorCode::InvalidSelector,
            ErrorCode::CarryIntoSameDay,
            ErrorCode::InvalidThreadRef,
            ErrorCode::UnknownJob,
            ErrorCode::PositionOutOfRange,
            ErrorCode::LedgerReadFailed,
            ErrorCode::LedgerWriteFailed,
            ErrorCode::SettingsWriteFailed,
            ErrorCode::LockContention,
            ErrorCode::CollaboratorFailed,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::PositionOutOfRange.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn range_error_reports_position_and_hint() {
        let err = DailiesError::Range { position: 4, len: 2 };
        assert!(err.is_range());
        assert_eq!(err.error_code(), "E2001");
        assert!(err.to_string().contains("#4"));
        assert!(err.suggestion().contains("List the tasks"));
    }

    #[test]
    fn collaborator_error_keeps_data_hint() {
        let err = DailiesError::collaborator("outbox", "disk full");
        assert_eq!(err.code(), ErrorCode::CollaboratorFailed);
        assert_eq!(err.to_string(), "outbox: disk full");
        assert!(err.suggestion().contains("saved"));
    }
}
