use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The backend could not be reached (connection refused, timeout, DNS, ...).
    #[error("Backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with an error payload. `message` is the backend's text, unmodified.
    #[error("{message}")]
    Backend { status: Option<u16>, message: String },

    #[error("Malformed backend response from {endpoint}: {reason}")]
    MalformedBody { endpoint: String, reason: String },

    #[error("Command must not be empty")]
    EmptyCommand,

    #[error("Unknown workload type '{0}'")]
    UnknownWorkloadType(String),

    #[error("Unknown job status '{0}'")]
    UnknownJobStatus(String),

    #[error("{element} is missing required field '{field}'")]
    MissingField { element: String, field: &'static str },

    #[error("Cancel is not offered for job {job_id} in state {status}")]
    CancelNotOffered { job_id: String, status: String },

    #[error("Job {0} is not known to the job store")]
    UnknownJob(String),

    #[error("Failed to build graph: {0}")]
    GraphConstruction(String),

    #[error("Node {0} is not part of the rendered graph")]
    UnknownNode(String),

    #[error("Dashboard view has been torn down")]
    TornDown,
}

impl Error {
    pub fn backend(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Backend { status, message: message.into() }
    }

    /// Transport and body faults are transient: the caller recovers locally (fallback data or next tick).
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::MalformedBody { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
