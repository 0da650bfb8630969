//! Child process exit status

use serde::{Deserialize, Serialize};

/// Exit status of a helper process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    /// Exit code if the process exited normally
    pub code: Option<i32>,

    /// Signal number if the process was killed by one
    pub signal: Option<i32>,
}

impl ExitStatus {
    pub fn success() -> Self {
        Self::with_code(0)
    }

    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn signaled(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        match (status.code(), status.signal()) {
            (Some(code), _) => Self::with_code(code),
            (None, Some(signal)) => Self::signaled(signal),
            (None, None) => Self::with_code(-1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status() {
        assert!(ExitStatus::success().is_success());
        assert!(!ExitStatus::with_code(1).is_success());
        assert!(!ExitStatus::signaled(9).is_success());
    }

    #[test]
    fn exit_status_serialization() {
        let json = serde_json::to_string(&ExitStatus::signaled(9)).unwrap();
        let parsed: ExitStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.signal, Some(9));
        assert_eq!(parsed.code, None);
    }
}
