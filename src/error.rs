use thiserror::Error;

/// Exit code for bad configuration or CLI usage.
pub const EXIT_USAGE: u8 = 2;
/// Exit code for a dataset that could not be understood.
pub const EXIT_MALFORMED: u8 = 3;
/// Exit code for fetch, filesystem, and terminal failures.
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures raised while retrieving or decoding a dataset.
///
/// "Valid but empty" is never an error: an empty array decodes to an empty
/// dataset. `Malformed` is reserved for responses whose shape cannot be read.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("request to {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("malformed {dataset} dataset: {reason}")]
    Malformed { dataset: &'static str, reason: String },

    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },
}

impl DataError {
    pub fn malformed(dataset: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Malformed {
            dataset,
            reason: reason.to_string(),
        }
    }

    /// True when the failure means the payload itself is unusable, as opposed
    /// to the transport or file being unavailable.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        let code = if err.is_malformed() {
            EXIT_MALFORMED
        } else {
            EXIT_RUNTIME
        };
        AppError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_maps_to_its_own_exit_code() {
        let err: AppError = DataError::malformed("prices", "expected an array").into();
        assert_eq!(err.exit_code(), EXIT_MALFORMED);
        assert!(err.to_string().contains("prices"));

        let err: AppError = DataError::Fetch {
            url: "http://localhost:5000/api/prices".to_string(),
            reason: "connection refused".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), EXIT_RUNTIME);
    }
}
