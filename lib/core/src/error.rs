use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("School not found: {0}")]
    SchoolNotFound(u64),

    /// A fault raised by whatever sits behind a `CandidateSource`: a driver,
    /// a connection pool, a remote API. Carries the driver's error code and
    /// the fault it wraps, which is what the retry classifier inspects.
    #[error("{message}")]
    Upstream {
        message: String,
        code: Option<String>,
        #[source]
        cause: Option<Box<Error>>,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn upstream(message: impl Into<String>) -> Self {
        Error::Upstream {
            message: message.into(),
            code: None,
            cause: None,
        }
    }

    /// Attach a driver error code. No-op on variants other than `Upstream`.
    #[must_use]
    pub fn with_code(mut self, new_code: impl Into<String>) -> Self {
        if let Error::Upstream { code, .. } = &mut self {
            *code = Some(new_code.into());
        }
        self
    }

    /// Wrap `inner` as the cause. No-op on variants other than `Upstream`.
    #[must_use]
    pub fn caused_by(mut self, inner: Error) -> Self {
        if let Error::Upstream { cause, .. } = &mut self {
            *cause = Some(Box::new(inner));
        }
        self
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
