use azure_core::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuickstartError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The storage service answered with a non-success HTTP response.
    #[error("Service error {status}: {code}")]
    Service { status: u16, code: String },

    #[error("IO error: {0}")]
    LocalIo(#[from] std::io::Error),

    /// The SDK failed without an HTTP response (DNS, TLS, connection reset).
    #[error("{0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, QuickstartError>;

impl QuickstartError {
    pub fn service(status: u16, code: impl Into<String>) -> Self {
        QuickstartError::Service {
            status,
            code: code.into(),
        }
    }

    pub fn is_service(&self) -> bool {
        matches!(self, QuickstartError::Service { .. })
    }

    /// HTTP status of a service error.
    pub fn status(&self) -> Option<u16> {
        match self {
            QuickstartError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Console line for a failure in the main region of the workflow.
    pub fn workflow_message(&self) -> String {
        match self {
            QuickstartError::Service { status, code } => format!(
                "Error returned from the service. Http code: {} and error code: {}",
                status, code
            ),
            QuickstartError::LocalIo(err) => err.to_string(),
            QuickstartError::Configuration(msg) | QuickstartError::Transport(msg) => msg.clone(),
        }
    }

    /// Console line for a failure while deleting the container.
    pub fn cleanup_message(&self) -> String {
        match self {
            QuickstartError::Service { status, code } => format!(
                "Service error. Http code: {} and error code: {}",
                status, code
            ),
            other => other.workflow_message(),
        }
    }
}

impl From<azure_core::Error> for QuickstartError {
    fn from(err: azure_core::Error) -> Self {
        match err.kind() {
            ErrorKind::HttpResponse { status, error_code } => QuickstartError::Service {
                status: *status as u16,
                code: error_code.clone().unwrap_or_else(|| "Unknown".to_string()),
            },
            _ => QuickstartError::Transport(err.to_string()),
        }
    }
}
